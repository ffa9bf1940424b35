#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveLeft,
    MoveRight,
    Jump,
    Confirm,
    Menu,
    /// Gives up on the current room and restarts it.
    Reset,
    Minimap,
}

const ACTION_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn clear(&mut self) {
        self.down = [false; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveLeft => 0,
            InputAction::MoveRight => 1,
            InputAction::Jump => 2,
            InputAction::Confirm => 3,
            InputAction::Menu => 4,
            InputAction::Reset => 5,
            InputAction::Minimap => 6,
        }
    }
}

/// Logical input for one frame: held actions plus press edges since the previous frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    quit_requested: bool,
    down: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, down: ActionStates, pressed: ActionStates) -> Self {
        Self {
            quit_requested,
            down,
            pressed,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down.is_down(action)
    }

    /// True only on the frame the action went down.
    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.down.set(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.down.set(action, true);
        self.pressed.set(action, true);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_action_is_also_down() {
        let snapshot = InputSnapshot::empty().with_action_pressed(InputAction::Confirm);
        assert!(snapshot.is_down(InputAction::Confirm));
        assert!(snapshot.was_pressed(InputAction::Confirm));
        assert!(!snapshot.was_pressed(InputAction::Jump));
    }

    #[test]
    fn held_action_is_not_a_press() {
        let snapshot = InputSnapshot::empty().with_action_down(InputAction::Jump, true);
        assert!(snapshot.is_down(InputAction::Jump));
        assert!(!snapshot.was_pressed(InputAction::Jump));
    }
}
