//! Book detail screen: metadata, availability, reviews and the review form.

use libris_core::{book::Book, review::Review};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Paragraph, Wrap},
};

use super::{cursor_style, dim, draw_placeholder, pane, with_banner};
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
    .split(area);

  draw_book(f, cols[0], app);

  if app.detail.composing {
    let rows = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(0), Constraint::Length(5)])
      .split(cols[1]);
    draw_reviews(f, rows[0], app);
    draw_form(f, rows[1], app);
  } else {
    draw_reviews(f, cols[1], app);
  }
}

fn draw_book(f: &mut Frame, area: Rect, app: &App) {
  let fetch = &app.detail.book;
  let title = fetch.data().map_or("Book", |b| b.title.as_str());
  let block = pane(title);
  let inner = block.inner(area);
  f.render_widget(block, area);

  let inner = with_banner(f, inner, fetch);
  let Some(book) = fetch.data() else {
    draw_placeholder(f, inner, fetch, "Book not found.");
    return;
  };
  f.render_widget(
    Paragraph::new(book_lines(book, app)).wrap(Wrap { trim: true }),
    inner,
  );
}

fn book_lines(book: &Book, app: &App) -> Vec<Line<'static>> {
  let label = |s: &str| dim(format!("{s:<14}"));
  let mut lines = vec![
    Line::from(Span::styled(
      book.title.clone(),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::from(format!("by {}", book.author)),
    Line::from(""),
  ];

  let optional = [
    ("genre", book.genre.clone()),
    ("year", book.year.map(|y| y.to_string())),
    ("isbn", book.isbn.clone()),
    ("rating", book.avg_rating.map(|r| format!("{r:.1} / 5"))),
  ];
  for (name, value) in optional {
    if let Some(value) = value {
      lines.push(Line::from(vec![label(name), Span::raw(value)]));
    }
  }

  let availability = if book.is_available() {
    Span::styled(
      format!("{} of {} available", book.available_copies, book.total_copies),
      Style::default().fg(Color::Green),
    )
  } else {
    Span::styled("No copies available", Style::default().fg(Color::Red))
  };
  lines.push(Line::from(vec![label("copies"), availability]));

  if book.has_file() {
    let url = app.download_url(book.id);
    lines.push(Line::from(vec![label("download"), Span::raw(url)]));
  }

  for (heading, text) in [
    ("Description", &book.description),
    ("AI summary", &book.ai_summary),
    ("What readers say", &book.review_consensus),
  ] {
    if let Some(text) = text {
      lines.push(Line::from(""));
      lines.push(Line::from(Span::styled(
        heading.to_owned(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
      )));
      lines.push(Line::from(text.clone()));
    }
  }
  lines
}

fn draw_reviews(f: &mut Frame, area: Rect, app: &App) {
  let fetch = &app.detail.reviews;
  let title = match fetch.data() {
    Some(r) => format!("Reviews ({})", r.len()),
    None => "Reviews".to_owned(),
  };
  let block = pane(&title);
  let inner = block.inner(area);
  f.render_widget(block, area);

  let inner = with_banner(f, inner, fetch);
  let Some(reviews) = fetch.data().filter(|r| !r.is_empty()) else {
    draw_placeholder(f, inner, fetch, "No reviews yet. Press w to write one.");
    return;
  };

  let mut lines = Vec::new();
  for (i, review) in reviews.iter().enumerate() {
    lines.extend(review_lines(review, i == app.detail.cursor));
    lines.push(Line::from(""));
  }
  let scroll = reviews
    .iter()
    .take(app.detail.cursor)
    .map(|r| if r.text.is_some() { 3 } else { 2 })
    .sum::<u16>();
  f.render_widget(
    Paragraph::new(lines)
      .wrap(Wrap { trim: true })
      .scroll((scroll, 0)),
    inner,
  );
}

fn review_lines(review: &Review, selected: bool) -> Vec<Line<'static>> {
  let stars = "★".repeat(review.rating as usize) + &"☆".repeat(5usize.saturating_sub(review.rating as usize));
  let who = review
    .username
    .clone()
    .unwrap_or_else(|| format!("user #{}", review.user_id));
  let mut header = vec![
    Span::styled(who, cursor_style(selected)),
    Span::styled(format!("  {stars}"), Style::default().fg(Color::Yellow)),
    dim(format!("  {}", review.created_at.format("%Y-%m-%d"))),
  ];
  if let Some(sentiment) = &review.sentiment {
    header.push(dim(format!("  ({sentiment})")));
  }

  let mut lines = vec![Line::from(header)];
  if let Some(text) = &review.text {
    lines.push(Line::from(text.clone()));
  }
  lines
}

fn draw_form(f: &mut Frame, area: Rect, app: &App) {
  let block = pane("Write a review").border_style(Style::default().fg(Color::Yellow));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let rating = app.detail.rating as usize;
  let lines = vec![
    Line::from(vec![
      dim("rating  "),
      Span::styled(
        "★".repeat(rating) + &"☆".repeat(5 - rating.min(5)),
        Style::default().fg(Color::Yellow),
      ),
    ]),
    Line::from(vec![dim("text    "), Span::raw(format!("{}_", app.detail.text))]),
  ];
  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
