//! Login / registration form.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::Paragraph,
};

use super::{dim, pane};
use crate::app::{App, LoginField, LoginMode};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let login = &app.login;
  let title = match login.mode {
    LoginMode::SignIn => "Login",
    LoginMode::Register => "Register",
  };

  // Center a fixed-size form.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Percentage(30),
      Constraint::Length(9),
      Constraint::Min(0),
    ])
    .split(area);
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage(25),
      Constraint::Percentage(50),
      Constraint::Percentage(25),
    ])
    .split(rows[1]);

  let block = pane(title);
  let inner = block.inner(cols[1]);
  f.render_widget(block, cols[1]);

  let focused = login.focused();
  let mut lines: Vec<Line> = login
    .mode
    .fields()
    .iter()
    .map(|field| {
      let (label, shown) = match field {
        LoginField::Email => ("email", login.email.clone()),
        LoginField::Username => ("username", login.username.clone()),
        LoginField::Password => ("password", "•".repeat(login.password.chars().count())),
      };
      let active = *field == focused;
      let style = if active {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
      } else {
        Style::default()
      };
      let caret = if active { "_" } else { "" };
      Line::from(vec![
        dim(format!("{label:<10}")),
        Span::styled(format!("{shown}{caret}"), style),
      ])
    })
    .collect();

  lines.push(Line::from(""));
  lines.push(if login.pending {
    Line::from(dim("Signing in…"))
  } else {
    match login.mode {
      LoginMode::SignIn => Line::from(dim("No account? Press F2 to register.")),
      LoginMode::Register => Line::from(dim("Have an account? Press F2 to log in.")),
    }
  });

  f.render_widget(Paragraph::new(lines), inner);
}
