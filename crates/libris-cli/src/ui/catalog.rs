//! Catalog screen: filter bar, book list, and a preview of the selection.

use libris_core::book::Book;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use super::{cursor_style, dim, draw_placeholder, pane, with_banner};
use crate::app::{App, CatalogField};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Min(0)])
    .split(area);
  draw_filters(f, rows[0], app);

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
    .split(rows[1]);
  draw_list(f, cols[0], app);
  draw_preview(f, cols[1], app.catalog.selected());
}

fn draw_filters(f: &mut Frame, area: Rect, app: &App) {
  let field = |label: &str, value: &str, active: bool| {
    let style = if active {
      Style::default().fg(Color::Yellow)
    } else {
      Style::default().fg(Color::Gray)
    };
    let caret = if active { "_" } else { "" };
    Span::styled(format!(" {label}: {value}{caret} "), style)
  };
  let editing = app.catalog.editing;
  let line = Line::from(vec![
    field("search", &app.catalog.search, editing == Some(CatalogField::Search)),
    field("genre", &app.catalog.genre, editing == Some(CatalogField::Genre)),
  ]);
  f.render_widget(Paragraph::new(line), area);
}

fn draw_list(f: &mut Frame, area: Rect, app: &App) {
  let books = app.catalog.books.data();
  let title = match books {
    Some(b) => format!("Books ({})", b.len()),
    None => "Books".to_owned(),
  };
  let block = pane(&title);
  let inner = block.inner(area);
  f.render_widget(block, area);

  let inner = with_banner(f, inner, &app.catalog.books);
  let Some(books) = books.filter(|b| !b.is_empty()) else {
    draw_placeholder(f, inner, &app.catalog.books, "No books found.");
    return;
  };

  let items: Vec<ListItem> = books
    .iter()
    .enumerate()
    .map(|(i, book)| {
      let style = cursor_style(i == app.catalog.cursor);
      let copies = if book.is_available() {
        Span::styled(
          format!("  {}/{}", book.available_copies, book.total_copies),
          Style::default().fg(Color::Green),
        )
      } else {
        Span::styled("  out", Style::default().fg(Color::Red))
      };
      ListItem::new(Line::from(vec![
        Span::styled(book.title.clone(), style),
        dim(format!("  {}", book.author)),
        copies,
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.catalog.cursor));
  f.render_stateful_widget(List::new(items), inner, &mut state);
}

fn draw_preview(f: &mut Frame, area: Rect, book: Option<&Book>) {
  let block = pane("Preview");
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(book) = book else {
    f.render_widget(Paragraph::new(Line::from(dim("Select a book."))), inner);
    return;
  };

  let mut lines = vec![
    Line::from(Span::styled(
      book.title.clone(),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::from(format!("by {}", book.author)),
    Line::from(""),
  ];
  if let Some(genre) = &book.genre {
    lines.push(Line::from(vec![dim("genre   "), Span::raw(genre.clone())]));
  }
  if let Some(year) = book.year {
    lines.push(Line::from(vec![dim("year    "), Span::raw(year.to_string())]));
  }
  if let Some(rating) = book.avg_rating {
    lines.push(Line::from(vec![dim("rating  "), Span::raw(format!("{rating:.1} / 5"))]));
  }
  if let Some(summary) = book.ai_summary.as_ref().or(book.description.as_ref()) {
    lines.push(Line::from(""));
    lines.push(Line::from(summary.clone()));
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}
