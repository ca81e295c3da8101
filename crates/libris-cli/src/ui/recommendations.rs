//! Recommendations screen.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState},
};

use super::{cursor_style, dim, draw_placeholder, pane, with_banner};
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = pane("Recommended for you");
  let inner = block.inner(area);
  f.render_widget(block, area);

  let fetch = &app.recs.recs;
  let inner = with_banner(f, inner, fetch);
  let Some(recs) = fetch.data().filter(|r| !r.is_empty()) else {
    draw_placeholder(
      f,
      inner,
      fetch,
      "No recommendations yet. Borrow or review a few books first.",
    );
    return;
  };

  let items: Vec<ListItem> = recs
    .iter()
    .enumerate()
    .map(|(i, rec)| {
      ListItem::new(vec![
        Line::from(vec![
          Span::styled(rec.book.title.clone(), cursor_style(i == app.recs.cursor)),
          dim(format!("  {}", rec.book.author)),
          Span::styled(
            format!("  {:.0}%", rec.score * 100.0),
            Style::default().fg(Color::Green),
          ),
        ]),
        Line::from(dim(format!("  {}", rec.reason))),
      ])
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.recs.cursor));
  f.render_stateful_widget(List::new(items), inner, &mut state);
}
