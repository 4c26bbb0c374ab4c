//! Key handling for the game screen.

use crate::game::ControlSignal;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press means to the game loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Control(ControlSignal),
    /// Stand-in for a hand over the sensor (keyboard mode only).
    Proximity,
    None,
}

pub fn map_key(key: KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyAction::Control(ControlSignal::Quit)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            KeyAction::Control(ControlSignal::Quit)
        }
        KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Control(ControlSignal::Restart),
        KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => KeyAction::Proximity,
        _ => KeyAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(map_key(press(KeyCode::Char('q'))), KeyAction::Control(ControlSignal::Quit));
        assert_eq!(map_key(press(KeyCode::Esc)), KeyAction::Control(ControlSignal::Quit));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Control(ControlSignal::Quit)
        );
    }

    #[test]
    fn test_restart_key() {
        assert_eq!(
            map_key(press(KeyCode::Char('r'))),
            KeyAction::Control(ControlSignal::Restart)
        );
    }

    #[test]
    fn test_plain_c_does_nothing() {
        assert_eq!(map_key(press(KeyCode::Char('c'))), KeyAction::None);
    }

    #[test]
    fn test_space_is_proximity() {
        assert_eq!(map_key(press(KeyCode::Char(' '))), KeyAction::Proximity);
    }

    #[test]
    fn test_release_ignored() {
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert_eq!(map_key(key), KeyAction::None);
    }
}
