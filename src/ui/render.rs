//! Render functions for the TUI.
//!
//! Draws the header, the active page and the status bar, then any overlay
//! (drawer, notice, sign-in dialog, help) on top.

use crate::app::{App, Page, SignInDialog, SignInStage};
use crate::util::{sanitize_field, truncate_to_width};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{cards, drawer, help, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 10;

const ABOUT_TEXT: &str = "formulary\n\n\
Browse public perfume formulas and your own private ones.\n\n\
Records are read-only here; edit them in the web app.";

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_page(f, app, chunks[1]);
    status::render(f, app, chunks[2]);

    if app.view.overlay_visible {
        drawer::render_overlay(f, app);
    }
    if app.view.drawer_open {
        drawer::render(f, app);
    }

    if let Some(dialog) = &app.sign_in {
        render_sign_in_overlay(f, app, dialog);
    }

    if let Some(notice) = app.notice {
        render_notice_overlay(f, app, notice);
    }

    if app.show_help {
        help::render(f, app);
    }
}

/// Title on the left, account on the right.
fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.view.active_page {
        Some(page) => format!(" formulary · {}", page.title()),
        None => " formulary".to_string(),
    };

    let account = match (app.account_label(), app.avatar_url()) {
        (Some(label), Some(avatar)) => {
            format!("{} <{}> ", sanitize_field(label), sanitize_field(avatar))
        }
        (Some(label), None) => format!("{} ", sanitize_field(label)),
        (None, _) => "Signed out · [s]ign in ".to_string(),
    };

    let width = area.width as usize;
    let account = truncate_to_width(&account, width / 2).into_owned();
    let gap = width
        .saturating_sub(crate::util::display_width(&title))
        .saturating_sub(crate::util::display_width(&account));

    let line = Line::from(vec![
        Span::styled(title, app.style("header")),
        Span::styled(" ".repeat(gap), app.style("header")),
        Span::styled(account, app.style("header_account")),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_page(f: &mut Frame, app: &App, area: Rect) {
    let Some(page) = app.view.active_page else {
        // Unknown page: blank view
        f.render_widget(Block::default().style(app.style("body")), area);
        return;
    };

    match page {
        Page::Home | Page::My => {
            if let Some(kind) = page.feed() {
                cards::render(f, app, kind, area);
            }
        }
        Page::Settings => render_settings(f, app, area),
        Page::About => render_static(f, app, area, page.title(), ABOUT_TEXT.to_string()),
    }
}

fn render_settings(f: &mut Frame, app: &App, area: Rect) {
    let account = match app.account_label() {
        Some(label) => format!("Signed in as {}  (x to sign out)", sanitize_field(label)),
        None => "Not signed in  (s to sign in)".to_string(),
    };
    let text = format!(
        "Theme:   {}  (t to toggle)\nAccount: {}",
        app.theme_variant.name(),
        account
    );
    render_static(f, app, area, Page::Settings.title(), text);
}

fn render_static(f: &mut Frame, app: &App, area: Rect, title: &str, text: String) {
    let paragraph = Paragraph::new(text)
        .style(app.style("body"))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border"))
                .title(format!(" {} ", title)),
        );
    f.render_widget(paragraph, area);
}

/// Center a fixed-size box, clamped to the frame.
fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Render the blocking notice centered on screen.
fn render_notice_overlay(f: &mut Frame, app: &App, notice: &str) {
    let overlay = popup_rect(f.area(), 40, 5);
    if overlay.width < 10 || overlay.height < 3 {
        return;
    }
    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(format!("{}\n\n(any key)", notice))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Notice "),
        )
        .alignment(Alignment::Center)
        .style(app.style("notice"));
    f.render_widget(paragraph, overlay);
}

/// Render the sign-in dialog centered on screen.
fn render_sign_in_overlay(f: &mut Frame, app: &App, dialog: &SignInDialog) {
    let overlay = popup_rect(f.area(), 50, 8);
    if overlay.width < 20 || overlay.height < 5 {
        return;
    }
    f.render_widget(Clear, overlay);

    let masked = "*".repeat(dialog.password.chars().count());
    let text = match dialog.stage {
        SignInStage::Email => format!(
            "Email:    {}_\nPassword:\n\n(Enter) Next  (Esc) Cancel",
            dialog.email
        ),
        SignInStage::Password => format!(
            "Email:    {}\nPassword: {}_\n\n(Enter) Sign in  (Esc) Cancel",
            dialog.email, masked
        ),
        SignInStage::Submitting => format!(
            "Signing in as {}...\n\nPlease wait.\n\n(Esc) Cancel",
            dialog.email
        ),
    };

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Sign in "),
        )
        .style(app.style("body"));
    f.render_widget(paragraph, overlay);
}
