#![forbid(unsafe_code)]

//! Error/reset policy.
//!
//! Pure decision table consulted by the view when the error state meets a
//! user interaction or the end of the error animation.
//!
//! | Policy | Trigger | Action |
//! |--------|---------|--------|
//! | `None` | n/a | nothing automatic |
//! | `OnUserInteraction` | begin-editing while in error | reset the code |
//! | `AfterError(delay)` | error animation finished | reset after `delay` |
//!
//! Under `None` and `AfterError`, beginning to edit while in error only
//! clears the error flag and keeps the code.

use std::time::Duration;

/// Rule governing automatic clearing of the code after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPolicy {
    /// Never reset automatically.
    #[default]
    None,
    /// Reset on the next begin-editing event while in error.
    OnUserInteraction,
    /// Reset `delay` after the error animation finishes.
    AfterError(Duration),
}

/// What to do when editing begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginEditingAction {
    /// Not in error; nothing to do.
    Nothing,
    /// Clear the error flag, keeping the code.
    ClearError,
    /// Reset the code (which also clears the error flag).
    Reset,
}

impl ResetPolicy {
    /// Decide the reaction to a begin-editing event.
    #[must_use]
    pub fn on_begin_editing(self, in_error: bool) -> BeginEditingAction {
        match (in_error, self) {
            (false, _) => BeginEditingAction::Nothing,
            (true, Self::OnUserInteraction) => BeginEditingAction::Reset,
            (true, _) => BeginEditingAction::ClearError,
        }
    }

    /// Delay before resetting once the error animation has finished, if any.
    #[must_use]
    pub fn reset_delay_after_error(self) -> Option<Duration> {
        match self {
            Self::AfterError(delay) => Some(delay),
            Self::None | Self::OnUserInteraction => None,
        }
    }
}
