#![forbid(unsafe_code)]

//! Style capability for PIN slots.
//!
//! A [`SlotStyle`] decides how a single slot looks. The view never draws
//! anything itself: every visual change is announced to the slot's style
//! through one of the hooks below, with a read-only view of the slot state.
//!
//! Styles are produced by a [`StyleFactory`], which is called once per slot
//! whenever the slot row is (re)built, so each slot owns its own instance.
//!
//! # Hook contract
//!
//! | Hook | Fired when |
//! |------|-----------|
//! | [`on_set_style`](SlotStyle::on_set_style) | slot created, or reset to its initial look |
//! | [`on_update_selected_state`](SlotStyle::on_update_selected_state) | `selected` or `locked` toggled |
//! | [`on_update_error_state`](SlotStyle::on_update_error_state) | `error` toggled |
//! | [`on_layout`](SlotStyle::on_layout) | host requested a layout pass |
//!
//! Implementations receive `&SlotState` for the duration of the call only.

use crate::slot::SlotState;

/// Pluggable appearance strategy a slot delegates to.
pub trait SlotStyle {
    /// Apply the initial, non-selected, non-error look.
    fn on_set_style(&mut self, slot: &SlotState);

    /// The slot's `selected` or `locked` flag changed.
    fn on_update_selected_state(&mut self, slot: &SlotState);

    /// The slot's `error` flag changed.
    fn on_update_error_state(&mut self, slot: &SlotState);

    /// The host laid the slot out; sizes may have changed.
    fn on_layout(&mut self, _slot: &SlotState) {}
}

/// Factory invoked once per slot at creation.
pub type StyleFactory = Box<dyn Fn() -> Box<dyn SlotStyle>>;

/// Style that ignores every hook. Used when no factory is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStyle;

impl SlotStyle for NoopStyle {
    fn on_set_style(&mut self, _slot: &SlotState) {}
    fn on_update_selected_state(&mut self, _slot: &SlotState) {}
    fn on_update_error_state(&mut self, _slot: &SlotState) {}
}

/// Resolved visual state of a slot, in precedence order.
///
/// Hosts that draw slots themselves can match on this instead of inspecting
/// individual flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Appearance {
    /// Error styling (applies uniformly to every slot).
    Error,
    /// The active slot.
    Selected,
    /// A filled slot whose character is masked.
    Locked,
    /// A filled, visible slot.
    Filled,
    /// No character.
    Empty,
}

impl Appearance {
    /// Resolve the appearance of a slot from its flags.
    #[must_use]
    pub fn of(slot: &SlotState) -> Self {
        if slot.is_error() {
            Self::Error
        } else if slot.is_selected() {
            Self::Selected
        } else if slot.is_locked() {
            Self::Locked
        } else if slot.is_empty() {
            Self::Empty
        } else {
            Self::Filled
        }
    }
}
