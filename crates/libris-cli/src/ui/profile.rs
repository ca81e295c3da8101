//! Profile screen: identity summary and the preferences form.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::Paragraph,
};

use super::{dim, pane, with_banner};
use crate::app::{App, PreferenceField};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let session = app.session.snapshot();
  let Some(user) = session.user else {
    let block = pane("Profile");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      Paragraph::new(Line::from(dim("Please log in to view your profile. Press i."))),
      inner,
    );
    return;
  };

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(6), Constraint::Min(0)])
    .split(area);

  let block = pane("Profile");
  let inner = block.inner(rows[0]);
  f.render_widget(block, rows[0]);
  let mut lines = vec![
    Line::from(Span::styled(
      user.username.clone(),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::from(vec![dim("email   "), Span::raw(user.email.clone())]),
  ];
  if let Some(joined) = user.created_at {
    lines.push(Line::from(vec![
      dim("joined  "),
      Span::raw(joined.format("%Y-%m-%d").to_string()),
    ]));
  }
  if user.is_admin {
    lines.push(Line::from(Span::styled("admin", Style::default().fg(Color::Magenta))));
  }
  f.render_widget(Paragraph::new(lines), inner);

  let block = pane("Reading preferences");
  let inner = block.inner(rows[1]);
  f.render_widget(block, rows[1]);
  let inner = with_banner(f, inner, &app.profile.prefs);

  let editing = app.profile.editing;
  let field = |label: &str, value: &str, which: PreferenceField| {
    let active = editing == Some(which);
    let style = if active {
      Style::default().fg(Color::Yellow)
    } else {
      Style::default()
    };
    let caret = if active { "_" } else { "" };
    Line::from(vec![
      dim(format!("{label:<18}")),
      Span::styled(format!("{value}{caret}"), style),
    ])
  };
  let lines = vec![
    field("favorite genres", &app.profile.genres, PreferenceField::Genres),
    field("favorite authors", &app.profile.authors, PreferenceField::Authors),
    Line::from(""),
    Line::from(dim("Comma-separated, e.g. Fiction, History")),
  ];
  f.render_widget(Paragraph::new(lines), inner);
}
