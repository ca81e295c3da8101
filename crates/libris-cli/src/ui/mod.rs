//! TUI rendering: header tabs, the active screen, and the status bar.

pub mod book_detail;
pub mod borrows;
pub mod catalog;
pub mod login;
pub mod profile;
pub mod recommendations;

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::{
  app::{App, Screen},
  fetch::Fetch,
};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Catalog => catalog::draw(f, rows[1], app),
    Screen::BookDetail => book_detail::draw(f, rows[1], app),
    Screen::Borrows => borrows::draw(f, rows[1], app),
    Screen::Recommendations => recommendations::draw(f, rows[1], app),
    Screen::Profile => profile::draw(f, rows[1], app),
    Screen::Login => login::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Shared pieces ────────────────────────────────────────────────────────────

pub(crate) fn pane(title: &str) -> Block<'static> {
  Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

pub(crate) fn dim(text: impl Into<String>) -> Span<'static> {
  Span::styled(text.into(), Style::default().fg(Color::DarkGray))
}

pub(crate) fn cursor_style(selected: bool) -> Style {
  if selected {
    Style::default()
      .bg(Color::Blue)
      .fg(Color::White)
      .add_modifier(Modifier::BOLD)
  } else {
    Style::default()
  }
}

/// Loading / error banner for a fetch, if there is one to show.
pub(crate) fn fetch_banner<T>(fetch: &Fetch<T>) -> Option<Line<'static>> {
  if let Some(message) = fetch.error() {
    return Some(Line::from(Span::styled(
      message.to_owned(),
      Style::default().fg(Color::Red),
    )));
  }
  fetch.is_loading().then(|| Line::from(dim("Loading…")))
}

/// Draw a fetch that has nothing to show yet: its banner, or `empty`.
pub(crate) fn draw_placeholder<T>(f: &mut Frame, area: Rect, fetch: &Fetch<T>, empty: &str) {
  let line = fetch_banner(fetch).unwrap_or_else(|| Line::from(dim(empty.to_owned())));
  f.render_widget(Paragraph::new(line), area);
}

/// Split off a one-line banner at the top of `area` when the fetch has one.
pub(crate) fn with_banner<T>(f: &mut Frame, area: Rect, fetch: &Fetch<T>) -> Rect {
  let Some(banner) = fetch_banner(fetch) else {
    return area;
  };
  if area.height < 2 {
    return area;
  }
  f.render_widget(Paragraph::new(banner), Rect { height: 1, ..area });
  Rect {
    y: area.y + 1,
    height: area.height - 1,
    ..area
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let mut spans = vec![Span::styled(
    " libris ",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  )];
  for (i, screen) in Screen::TABS.iter().enumerate() {
    let active = app.screen == *screen
      || (*screen == Screen::Catalog && app.screen == Screen::BookDetail);
    let style = if active {
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::White)
    };
    spans.push(Span::raw(" "));
    spans.push(Span::styled(format!("[{}] {}", i + 1, screen.title()), style));
  }

  let session = app.session.snapshot();
  let right = match &session.user {
    Some(user) => format!("{} ", user.username),
    None => "not signed in  [i] login ".to_owned(),
  };

  let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
  let pad = (area.width as usize)
    .saturating_sub(used)
    .saturating_sub(right.chars().count());
  spans.push(Span::raw(" ".repeat(pad)));
  spans.push(Span::styled(right, Style::default().fg(Color::Gray)));

  f.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.screen {
    Screen::Catalog if app.catalog.editing.is_some() => {
      ("FILTER", "Type to filter  Tab switch field  Enter/Esc done")
    }
    Screen::Catalog => (
      "CATALOG",
      "↑↓/jk move  Enter open  b borrow  / search  g genre  q quit",
    ),
    Screen::BookDetail if app.detail.composing => {
      ("REVIEW", "Type your review  ←→ rating  Enter post  Esc cancel")
    }
    Screen::BookDetail => (
      "BOOK",
      "b borrow  w write review  d delete review  Esc back  q quit",
    ),
    Screen::Borrows => ("MY BOOKS", "↑↓/jk move  t return  r reload  q quit"),
    Screen::Recommendations => ("FOR YOU", "↑↓/jk move  Enter open  r reload  q quit"),
    Screen::Profile if app.profile.editing.is_some() => {
      ("EDIT", "Type to edit  Tab switch field  Enter/Esc done")
    }
    Screen::Profile => ("PROFILE", "g genres  a authors  s save  o sign out  q quit"),
    Screen::Login => ("LOGIN", "Tab next field  Enter submit  F2 sign in/register  Esc back"),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_owned()
  } else {
    app.status_msg.clone()
  };

  let line = Line::from(vec![
    Span::styled(
      format!(" {mode_label} "),
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {status}"), Style::default().fg(Color::Gray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
