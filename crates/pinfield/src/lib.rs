#![forbid(unsafe_code)]

//! Pinfield: a headless state engine for segmented PIN/OTP entry.
//!
//! A [`PinCodeView`] keeps one hidden text buffer in sync with a row of
//! single-character [`Slot`]s. Appearance is delegated to a pluggable
//! [`SlotStyle`]; time-based behavior (secure-entry reveal, error shake,
//! post-error reset) advances only through [`PinCodeView::tick`].

pub mod config;
pub mod direction;
pub mod logging;
pub mod policy;
pub mod schedule;
pub mod shake;
pub mod slot;
pub mod style;
pub mod view;

pub use config::{ConfigError, KeyboardType, PinCodeConfig};
pub use direction::LayoutDirection;
pub use policy::{BeginEditingAction, ResetPolicy};
pub use shake::Shake;
pub use slot::{Slot, SlotFlags, SlotState};
pub use style::{Appearance, NoopStyle, SlotStyle, StyleFactory};
pub use view::{ErrorSetter, PinCodeView, Rejection, Validator, ViewState};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, info, trace};
