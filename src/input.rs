//! Keyboard mapping for the terminal frontend

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

/// Everything a keypress can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    HardDrop,
    Pause,
    Restart,
    ToggleSound,
    ToggleMusic,
    Quit,
}

/// Key bindings - each action accepts one or more keys
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub rotate: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub hard_drop: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub restart: Vec<KeyCode>,
    pub toggle_sound: Vec<KeyCode>,
    pub toggle_music: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            move_left: vec![KeyCode::Left, KeyCode::Char('a')],
            move_right: vec![KeyCode::Right, KeyCode::Char('d')],
            rotate: vec![KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('x')],
            soft_drop: vec![KeyCode::Down, KeyCode::Char('s')],
            hard_drop: vec![KeyCode::Char(' ')],
            pause: vec![KeyCode::Char('p'), KeyCode::Esc],
            restart: vec![KeyCode::Char('r')],
            toggle_sound: vec![KeyCode::Char('n')],
            toggle_music: vec![KeyCode::Char('m')],
            quit: vec![KeyCode::Char('q')],
        }
    }
}

impl KeyMap {
    /// Map a key event to an action. Release events are ignored; key
    /// repeat from the terminal drives auto-movement.
    pub fn action_for(&self, event: &KeyEvent) -> Option<InputAction> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let code = event.code;
        let bindings = [
            (&self.move_left, InputAction::MoveLeft),
            (&self.move_right, InputAction::MoveRight),
            (&self.rotate, InputAction::Rotate),
            (&self.soft_drop, InputAction::SoftDrop),
            (&self.hard_drop, InputAction::HardDrop),
            (&self.pause, InputAction::Pause),
            (&self.restart, InputAction::Restart),
            (&self.toggle_sound, InputAction::ToggleSound),
            (&self.toggle_music, InputAction::ToggleMusic),
            (&self.quit, InputAction::Quit),
        ];
        bindings
            .iter()
            .find(|(keys, _)| keys.contains(&code))
            .map(|&(_, action)| action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn default_bindings_cover_the_command_api() {
        let map = KeyMap::default();
        assert_eq!(
            map.action_for(&press(KeyCode::Left)),
            Some(InputAction::MoveLeft)
        );
        assert_eq!(
            map.action_for(&press(KeyCode::Char(' '))),
            Some(InputAction::HardDrop)
        );
        assert_eq!(
            map.action_for(&press(KeyCode::Char('q'))),
            Some(InputAction::Quit)
        );
        assert_eq!(map.action_for(&press(KeyCode::Char('?'))), None);
    }

    #[test]
    fn release_events_are_ignored() {
        let map = KeyMap::default();
        let mut event = press(KeyCode::Left);
        event.kind = KeyEventKind::Release;
        assert_eq!(map.action_for(&event), None);
    }
}
