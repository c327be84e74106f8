//! Help overlay: keybinding table.

use crate::app::App;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Row, Table},
    Frame,
};

/// Groups of (key, description), in display order.
const BINDINGS: [(&str, &[(&str, &str)]); 3] = [
    (
        "General",
        &[
            ("m / Tab", "Open menu"),
            ("r", "Reload current page"),
            ("t", "Toggle dark mode"),
            ("s", "Sign in"),
            ("x", "Sign out"),
            ("?", "Toggle help"),
            ("q", "Quit"),
        ],
    ),
    (
        "Formulas",
        &[("j / Down", "Next formula"), ("k / Up", "Previous formula")],
    ),
    (
        "Menu",
        &[
            ("j / k", "Move cursor"),
            ("Enter", "Open page"),
            ("Esc", "Close menu"),
        ],
    ),
];

/// Render the help overlay on top of the current view.
pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(60, 70, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let mut rows: Vec<Row> = Vec::new();
    for (label, bindings) in BINDINGS {
        rows.push(
            Row::new(vec![
                Line::from(Span::styled(
                    format!("-- {} --", label),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ])
            .style(app.style("header")),
        );
        for (key, description) in bindings {
            rows.push(Row::new(vec![format!("  {}", key), description.to_string()]));
        }
        rows.push(Row::new(vec![String::new(), String::new()]));
    }
    rows.pop();

    let widths = [Constraint::Length(14), Constraint::Min(20)];
    let table = Table::new(rows, widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Help (? to close) "),
        )
        .style(app.style("body"));

    f.render_widget(table, overlay);
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    // u32 so wide terminals cannot overflow the multiply
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = (u32::from(area.height) * u32::from(percent_y.min(100)) / 100) as u16;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
