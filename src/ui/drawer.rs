use crate::app::{App, Page};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem},
    Frame,
};

/// Width of the navigation drawer, border included.
const DRAWER_WIDTH: u16 = 26;

/// Dim the whole frame behind the drawer.
pub fn render_overlay(f: &mut Frame, app: &App) {
    let area = f.area();
    let buf = f.buffer_mut();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_style(app.style("overlay_dim"));
            }
        }
    }
}

/// Left-hand navigation panel listing every page.
pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    let width = DRAWER_WIDTH.min(area.width);
    if width < 8 || area.height < 4 {
        return;
    }
    let panel = Rect::new(area.x, area.y, width, area.height);
    f.render_widget(Clear, panel);

    let items: Vec<ListItem> = Page::ALL
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let style = if i == app.drawer_cursor {
                app.style("drawer_cursor")
            } else if app.view.active_page == Some(*page) {
                app.style("drawer_active")
            } else {
                app.style("drawer_item")
            };
            let marker = if app.view.active_page == Some(*page) { "● " } else { "  " };
            ListItem::new(Line::from(Span::styled(
                format!("{}{}", marker, page.title()),
                style,
            )))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style("panel_border_focused"))
            .title(" Menu "),
    );
    f.render_widget(list, panel);
}
