#![forbid(unsafe_code)]

//! A single character box in the PIN row.
//!
//! A [`Slot`] owns its display text, its state flags and its own
//! [`SlotStyle`] instance. Flag setters compare old and new values and notify
//! the style only on change:
//!
//! - `selected` or `locked` toggled → `on_update_selected_state`
//! - `error` toggled → `on_update_error_state`
//! - cleared or created → `on_set_style`
//!
//! Setting `error` always drops the lock and any pending reveal, because an
//! error shows every slot in the same state.
//!
//! A slot never reaches back into its view. Deferred locking is coordinated
//! through a reveal token that the view compares at fire time.

use std::fmt;

use bitflags::bitflags;

use crate::style::{Appearance, SlotStyle};

bitflags! {
    /// State flags carried by a slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SlotFlags: u8 {
        /// The slot is the active one.
        const SELECTED = 1 << 0;
        /// Error styling is applied.
        const ERROR = 1 << 1;
        /// The character is masked (secure entry).
        const LOCKED = 1 << 2;
        /// The style may animate while the slot is selected.
        const ANIMATE_WHILE_SELECTED = 1 << 3;
    }
}

/// Read-only slot state handed to style hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotState {
    index: usize,
    text: String,
    flags: SlotFlags,
}

impl SlotState {
    /// Logical index of the slot in the code.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The character shown in this slot, or `""`.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether no character is shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[must_use]
    pub fn flags(&self) -> SlotFlags {
        self.flags
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.flags.contains(SlotFlags::SELECTED)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.flags.contains(SlotFlags::ERROR)
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.flags.contains(SlotFlags::LOCKED)
    }

    #[must_use]
    pub fn animate_while_selected(&self) -> bool {
        self.flags.contains(SlotFlags::ANIMATE_WHILE_SELECTED)
    }

    /// Resolved appearance for hosts that draw slots themselves.
    #[must_use]
    pub fn appearance(&self) -> Appearance {
        Appearance::of(self)
    }

    /// Text to draw: `mask` when locked and filled, the character otherwise.
    #[must_use]
    pub fn display<'a>(&'a self, mask: &'a str) -> &'a str {
        if self.is_locked() && !self.is_empty() {
            mask
        } else {
            &self.text
        }
    }
}

/// One visual unit of the PIN row.
pub struct Slot {
    state: SlotState,
    style: Box<dyn SlotStyle>,
    /// Token of the pending delayed lock, if any.
    reveal: Option<u64>,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("state", &self.state)
            .field("reveal", &self.reveal)
            .finish_non_exhaustive()
    }
}

impl Slot {
    /// Create an empty slot and apply its initial style.
    pub(crate) fn new(index: usize, style: Box<dyn SlotStyle>, animate_while_selected: bool) -> Self {
        let mut flags = SlotFlags::empty();
        flags.set(SlotFlags::ANIMATE_WHILE_SELECTED, animate_while_selected);
        let mut slot = Self {
            state: SlotState {
                index,
                text: String::new(),
                flags,
            },
            style,
            reveal: None,
        };
        slot.apply_fresh_style();
        slot
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SlotState {
        &self.state
    }

    /// Whether a delayed lock is pending for this slot.
    #[must_use]
    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }

    pub(crate) fn set_text(&mut self, text: &str) {
        self.state.text.clear();
        self.state.text.push_str(text);
    }

    pub(crate) fn set_animate_while_selected(&mut self, animate: bool) {
        self.state
            .flags
            .set(SlotFlags::ANIMATE_WHILE_SELECTED, animate);
    }

    /// Returns `true` if the flag changed.
    pub(crate) fn set_selected(&mut self, selected: bool) -> bool {
        if self.state.is_selected() == selected {
            return false;
        }
        self.state.flags.set(SlotFlags::SELECTED, selected);
        self.style.on_update_selected_state(&self.state);
        true
    }

    /// Returns `true` if the flag changed.
    pub(crate) fn set_locked(&mut self, locked: bool) -> bool {
        if self.state.is_locked() == locked {
            return false;
        }
        self.state.flags.set(SlotFlags::LOCKED, locked);
        self.style.on_update_selected_state(&self.state);
        true
    }

    /// Set the error flag, dropping any lock and pending reveal.
    ///
    /// Exactly one hook fires per call that changes state: the error hook if
    /// `error` toggled, otherwise the selected hook if only the lock dropped.
    pub(crate) fn set_error(&mut self, error: bool) -> bool {
        self.reveal = None;
        let was_locked = self.state.is_locked();
        self.state.flags.remove(SlotFlags::LOCKED);
        if self.state.is_error() != error {
            self.state.flags.set(SlotFlags::ERROR, error);
            self.style.on_update_error_state(&self.state);
            return true;
        }
        if was_locked {
            self.style.on_update_selected_state(&self.state);
        }
        false
    }

    /// Remove the character, the lock and any pending reveal, then restore the
    /// initial look.
    pub(crate) fn clear(&mut self) {
        self.state.text.clear();
        self.state.flags.remove(SlotFlags::LOCKED);
        self.reveal = None;
        self.apply_fresh_style();
    }

    pub(crate) fn apply_fresh_style(&mut self) {
        self.style.on_set_style(&self.state);
    }

    pub(crate) fn layout(&mut self) {
        self.style.on_layout(&self.state);
    }

    /// Record a pending delayed lock, superseding any earlier one.
    pub(crate) fn begin_reveal(&mut self, token: u64) {
        self.reveal = Some(token);
    }

    /// Consume the pending reveal if `token` is the current one.
    pub(crate) fn finish_reveal(&mut self, token: u64) -> bool {
        if self.reveal == Some(token) {
            self.reveal = None;
            true
        } else {
            false
        }
    }
}
