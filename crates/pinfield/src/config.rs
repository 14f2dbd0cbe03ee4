#![forbid(unsafe_code)]

//! View configuration.

use std::fmt;
use std::time::Duration;

use crate::policy::ResetPolicy;

/// Default number of slots.
pub const DEFAULT_LENGTH: usize = 4;

/// Default spacing between slots, in host units.
pub const DEFAULT_SPACING: f32 = 16.0;

/// Default time a freshly entered character stays visible under secure entry.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(300);

/// Keyboard the host should present for the hidden input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyboardType {
    #[default]
    NumberPad,
    PhonePad,
    AsciiCapable,
    Standard,
}

/// Recognized options for a [`PinCodeView`](crate::PinCodeView).
///
/// Layout direction is not configurable here; it is derived from the host
/// environment at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PinCodeConfig {
    /// Number of slots. Must be at least 1.
    pub length: usize,
    pub spacing: f32,
    pub keyboard_type: KeyboardType,
    /// Mask filled slots after `reveal_delay`.
    pub secure_entry: bool,
    pub reveal_delay: Duration,
    /// When false, deletions are rejected.
    pub clear_enabled: bool,
    /// Delay applied to every accepted edit before it reaches the buffer.
    pub editing_delay: Duration,
    pub close_keyboard_on_complete: bool,
    pub shake_on_error: bool,
    /// Let styles animate the selected slot.
    pub animate_selected_slot: bool,
    pub reset_policy: ResetPolicy,
    pub enabled: bool,
}

impl Default for PinCodeConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            spacing: DEFAULT_SPACING,
            keyboard_type: KeyboardType::default(),
            secure_entry: false,
            reveal_delay: DEFAULT_REVEAL_DELAY,
            clear_enabled: true,
            editing_delay: Duration::ZERO,
            close_keyboard_on_complete: true,
            shake_on_error: true,
            animate_selected_slot: true,
            reset_policy: ResetPolicy::default(),
            enabled: true,
        }
    }
}

impl PinCodeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    #[must_use]
    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    #[must_use]
    pub fn with_keyboard_type(mut self, keyboard_type: KeyboardType) -> Self {
        self.keyboard_type = keyboard_type;
        self
    }

    #[must_use]
    pub fn with_secure_entry(mut self, secure: bool) -> Self {
        self.secure_entry = secure;
        self
    }

    #[must_use]
    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = delay;
        self
    }

    #[must_use]
    pub fn with_clear_enabled(mut self, enabled: bool) -> Self {
        self.clear_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_editing_delay(mut self, delay: Duration) -> Self {
        self.editing_delay = delay;
        self
    }

    #[must_use]
    pub fn with_close_keyboard_on_complete(mut self, close: bool) -> Self {
        self.close_keyboard_on_complete = close;
        self
    }

    #[must_use]
    pub fn with_shake_on_error(mut self, shake: bool) -> Self {
        self.shake_on_error = shake;
        self
    }

    #[must_use]
    pub fn with_animate_selected_slot(mut self, animate: bool) -> Self {
        self.animate_selected_slot = animate;
        self
    }

    #[must_use]
    pub fn with_reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.reset_policy = policy;
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroSlots`] when `length` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.length == 0 {
            return Err(ConfigError::ZeroSlots);
        }
        Ok(())
    }
}

/// Invalid view configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A PIN row needs at least one slot.
    ZeroSlots,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSlots => write!(f, "pin code view requires at least one slot"),
        }
    }
}

impl std::error::Error for ConfigError {}
