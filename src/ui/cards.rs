use crate::app::{App, FeedContainer, Page};
use crate::feed::{FeedKind, FormulaCard};
use crate::util::{display_width, sanitize_field, truncate_to_width};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Number of frames in the loading spinner animation.
pub(super) const SPINNER_FRAMES: usize = SPINNER.len();

/// Format an update time relative to `now`.
pub fn format_relative_time(updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = updated else {
        return String::new();
    };

    let diff = (now - ts).num_seconds();

    // Clock skew between us and the store
    if diff < 0 {
        return "now".to_string();
    }

    if diff < 3600 {
        return format!("{}m", diff / 60);
    }

    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }

    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }

    ts.format("%b %d").to_string()
}

/// One card as a single line: name, concentration, then age.
fn card_line<'a>(
    card: &'a FormulaCard,
    width: usize,
    now: DateTime<Utc>,
    app: &App,
    selected: bool,
) -> Line<'a> {
    let age = format_relative_time(card.updated, now);
    let concentration = truncate_to_width(&card.concentration, 12);
    // Two-space gaps around the concentration column
    let reserved = display_width(&concentration) + 2 + if age.is_empty() { 0 } else { age.len() + 2 };
    let name = truncate_to_width(&card.name, width.saturating_sub(reserved).max(1));

    let (name_style, conc_style, meta_style) = if selected {
        let s = app.style("card_selected");
        (s, s, s)
    } else {
        (
            app.style("card_name"),
            app.style("card_concentration"),
            app.style("card_meta"),
        )
    };

    let mut spans = vec![
        Span::styled(name, name_style),
        Span::styled("  ", name_style),
        Span::styled(concentration, conc_style),
    ];
    if !age.is_empty() {
        spans.push(Span::styled(format!("  {}", age), meta_style));
    }
    Line::from(spans)
}

fn placeholder(f: &mut Frame, block: Block<'_>, text: String, style: Style, area: Rect) {
    let paragraph = Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(paragraph, area);
}

/// Render a feed page: its placeholder, or its cards.
pub fn render(f: &mut Frame, app: &App, kind: FeedKind, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let page = match kind {
        FeedKind::Home => Page::Home,
        FeedKind::My => Page::My,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border_focused"))
        .title(format!(" {} ", page.title()));

    match app.container(kind) {
        FeedContainer::Untouched => {
            let text = if kind == FeedKind::My && app.session.is_none() {
                "Sign in to see your formulas (s)"
            } else {
                ""
            };
            placeholder(f, block, text.to_string(), app.style("placeholder_empty"), area);
        }
        FeedContainer::Loading => {
            let frame = SPINNER[app.spinner_frame % SPINNER_FRAMES];
            placeholder(
                f,
                block,
                format!("{} Loading formulas...", frame),
                app.style("placeholder_loading"),
                area,
            );
        }
        FeedContainer::Empty => {
            placeholder(
                f,
                block,
                "No formulas found".to_string(),
                app.style("placeholder_empty"),
                area,
            );
        }
        FeedContainer::Failed(msg) => {
            placeholder(
                f,
                block,
                format!("Could not load formulas: {}\n\nPress r to retry", sanitize_field(msg)),
                app.style("placeholder_error"),
                area,
            );
        }
        FeedContainer::Cards(cards) => {
            let inner_width = area.width.saturating_sub(2) as usize;
            let visible = area.height.saturating_sub(2) as usize;
            // Keep the selection on screen
            let skip = app.selected_card.saturating_sub(visible.saturating_sub(1));
            let now = Utc::now();

            let items: Vec<ListItem> = cards
                .iter()
                .enumerate()
                .skip(skip)
                .take(visible)
                .map(|(i, card)| {
                    ListItem::new(card_line(card, inner_width, now, app, i == app.selected_card))
                })
                .collect();

            let title = format!(" {} ({}) ", page.title(), cards.len());
            let list = List::new(items).block(block.title(title));
            f.render_widget(list, area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = now();
        assert_eq!(format_relative_time(None, now), "");
        assert_eq!(
            format_relative_time(Some(now - chrono::Duration::minutes(5)), now),
            "5m"
        );
        assert_eq!(
            format_relative_time(Some(now - chrono::Duration::hours(3)), now),
            "3h"
        );
        assert_eq!(
            format_relative_time(Some(now - chrono::Duration::days(2)), now),
            "2d"
        );
        assert_eq!(
            format_relative_time(Some(now - chrono::Duration::days(30)), now),
            "Feb 09"
        );
    }

    #[test]
    fn test_future_time_is_now() {
        let now = now();
        assert_eq!(
            format_relative_time(Some(now + chrono::Duration::hours(1)), now),
            "now"
        );
    }
}
