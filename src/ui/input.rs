//! Input handling for the TUI.
//!
//! Overlays capture every key while visible, in this order: help, notice,
//! sign-in dialog, drawer. Otherwise keys act on the active page.

use crate::app::{App, SignInStage};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};

use super::Action;

/// Longest email or password the dialog accepts.
const MAX_FIELD_LEN: usize = 256;

/// Main input dispatch function.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    if app.show_help {
        if matches!(code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return Ok(Action::Continue);
    }

    // Blocking notice: any key dismisses it and does nothing else.
    if app.notice.is_some() {
        app.dismiss_notice();
        return Ok(Action::Continue);
    }

    if app.sign_in.is_some() {
        handle_sign_in_input(app, code);
        return Ok(Action::Continue);
    }

    if app.view.drawer_open {
        handle_drawer_input(app, code);
        return Ok(Action::Continue);
    }

    handle_page_input(app, code).await
}

fn handle_sign_in_input(app: &mut App, code: KeyCode) {
    if code == KeyCode::Esc {
        app.cancel_sign_in();
        return;
    }

    let Some(dialog) = app.sign_in.as_mut() else {
        return;
    };

    match (dialog.stage, code) {
        (SignInStage::Submitting, _) => {}
        (SignInStage::Email, KeyCode::Enter) => {
            if !dialog.email.trim().is_empty() {
                dialog.stage = SignInStage::Password;
            }
        }
        (SignInStage::Password, KeyCode::Enter) => {
            if !dialog.password.is_empty() {
                app.submit_sign_in();
            }
        }
        (SignInStage::Email, KeyCode::Backspace) => {
            dialog.email.pop();
        }
        (SignInStage::Password, KeyCode::Backspace) => {
            if dialog.password.pop().is_none() {
                dialog.stage = SignInStage::Email;
            }
        }
        (stage, KeyCode::Char(c)) if !c.is_control() => {
            let field = match stage {
                SignInStage::Email => &mut dialog.email,
                _ => &mut dialog.password,
            };
            if field.len() < MAX_FIELD_LEN {
                field.push(c);
            }
        }
        _ => {}
    }
}

fn handle_drawer_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Char('m') | KeyCode::Tab => app.close_drawer(),
        KeyCode::Char('j') | KeyCode::Down => app.drawer_next(),
        KeyCode::Char('k') | KeyCode::Up => app.drawer_prev(),
        KeyCode::Enter => app.drawer_activate(),
        _ => {}
    }
}

async fn handle_page_input(app: &mut App, code: KeyCode) -> Result<Action> {
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('m') | KeyCode::Tab => app.open_drawer(),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('t') => {
            let name = app.toggle_theme().await;
            app.set_status(format!("Theme: {}", name));
        }
        KeyCode::Char('s') => {
            if app.sign_in_visible() {
                app.begin_sign_in();
            }
        }
        KeyCode::Char('x') => {
            if app.sign_out_visible() {
                app.sign_out();
            }
        }
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        _ => {}
    }
    Ok(Action::Continue)
}
