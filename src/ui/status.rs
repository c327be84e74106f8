use crate::app::App;
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.view.drawer_open {
        Cow::Borrowed("[j/k]move [Enter]open [Esc]close")
    } else if app.sign_in_visible() {
        Cow::Borrowed("[m]enu [r]eload [t]heme [s]ign in [?]help [q]uit")
    } else {
        Cow::Borrowed("[m]enu [r]eload [t]heme [x] sign out [?]help [q]uit")
    };

    let paragraph = Paragraph::new(text).style(app.style("status_bar"));
    f.render_widget(paragraph, area);
}
