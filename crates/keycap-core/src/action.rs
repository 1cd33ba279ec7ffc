// Keycap Key Edges
// Down, up and auto-repeat edges shared by hooked and synthesized events

use strum_macros::Display;

/// Edge of a key or mouse button event.
///
/// Discriminants are the `value` field of a Linux `EV_KEY` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[repr(i32)]
pub enum Action {
    #[strum(serialize = "up")]
    Release = 0,
    #[strum(serialize = "down")]
    Press = 1,
    #[strum(serialize = "repeat")]
    Repeat = 2,
}

impl Action {
    /// Press or auto-repeat
    pub fn is_down(self) -> bool {
        !matches!(self, Action::Release)
    }

    pub fn is_repeat(self) -> bool {
        self == Action::Repeat
    }
}

impl TryFrom<i32> for Action {
    /// The unrecognized event value
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Release),
            1 => Ok(Action::Press),
            2 => Ok(Action::Repeat),
            other => Err(other),
        }
    }
}

impl From<Action> for i32 {
    fn from(action: Action) -> Self {
        action as i32
    }
}
