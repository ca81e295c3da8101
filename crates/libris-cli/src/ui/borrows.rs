//! My-books screen: active borrows (returnable) above the returned history.

use libris_core::borrow::{self, Borrow};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph},
};

use super::{cursor_style, dim, draw_placeholder, pane, with_banner};
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let fetch = &app.borrows.borrows;
  let Some(all) = fetch.data() else {
    let block = pane("Currently borrowed");
    let inner = block.inner(area);
    f.render_widget(block, area);
    draw_placeholder(f, inner, fetch, "No borrows yet.");
    return;
  };
  let (active, returned) = borrow::partition(all);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
    .split(area);

  let block = pane(&format!("Currently borrowed ({})", active.len()));
  let inner = block.inner(rows[0]);
  f.render_widget(block, rows[0]);
  let inner = with_banner(f, inner, fetch);
  if active.is_empty() {
    f.render_widget(Paragraph::new(Line::from(dim("No books currently borrowed."))), inner);
  } else {
    let items: Vec<ListItem> = active
      .iter()
      .enumerate()
      .map(|(i, b)| {
        ListItem::new(Line::from(vec![
          Span::styled(b.title(), cursor_style(i == app.borrows.cursor)),
          dim(format!("  since {}", b.borrowed_at.format("%Y-%m-%d"))),
        ]))
      })
      .collect();
    let mut state = ListState::default();
    state.select(Some(app.borrows.cursor));
    f.render_stateful_widget(List::new(items), inner, &mut state);
  }

  let block = pane(&format!("History ({})", returned.len()));
  let inner = block.inner(rows[1]);
  f.render_widget(block, rows[1]);
  let items: Vec<ListItem> = returned.iter().map(|b| history_item(b)).collect();
  f.render_widget(List::new(items), inner);
}

fn history_item(b: &Borrow) -> ListItem<'static> {
  let returned = b
    .returned_at
    .map(|at| format!("  returned {}", at.format("%Y-%m-%d")))
    .unwrap_or_default();
  ListItem::new(Line::from(vec![
    Span::styled(b.title(), Style::default().fg(Color::Gray)),
    dim(format!("  borrowed {}", b.borrowed_at.format("%Y-%m-%d"))),
    dim(returned),
  ]))
}
