#![forbid(unsafe_code)]

//! PIN code view: the input-state synchronizer.
//!
//! [`PinCodeView`] owns the authoritative code, the hidden raw text buffer
//! and one [`Slot`] per character. Every edit follows the same path:
//!
//! ```text
//! propose_* ──gate──▶ raw buffer ──▶ on_raw_text_changed ──▶ slots ──▶ styles
//! ```
//!
//! Rejected proposals never touch the buffer. Deferred work (secure-entry
//! locks, post-error resets, delayed edits) is queued on a virtual clock and
//! runs from [`tick`](PinCodeView::tick).
//!
//! # Example
//!
//! ```
//! use pinfield::{PinCodeConfig, PinCodeView, LayoutDirection};
//!
//! let mut view = PinCodeView::with_direction(PinCodeConfig::default(), LayoutDirection::Ltr)?;
//! view.on_complete(|code, errors| {
//!     if code != "1111" {
//!         errors.set_error(true);
//!     }
//! });
//!
//! view.begin_editing();
//! for digit in ["1", "2", "3", "4"] {
//!     assert!(view.propose_insert(digit));
//! }
//! assert_eq!(view.code(), "1234");
//! assert!(view.is_error());
//! # Ok::<(), pinfield::ConfigError>(())
//! ```
//!
//! # Invariants
//!
//! 1. `code_len() <= length()` at all times.
//! 2. Slot `i` shows the `i`-th grapheme of the code iff `i < code_len()`.
//! 3. At most one slot is selected; none while unfocused or in error.
//! 4. Under secure entry and outside the error state, every filled slot other
//!    than the selected one is locked, except the last entered slot while its
//!    reveal delay is running.
//! 5. A deferred task that fires after the state it captured has changed is
//!    a no-op.
//!
//! # Failure Modes
//!
//! | Scenario | Behavior |
//! |----------|----------|
//! | Insert while full, disabled or invalid | Rejected, no state change |
//! | Paste longer than the free slots | Truncated to fit |
//! | Stale lock after delete or error | Discarded at fire time |
//! | Stale reset after error cleared | Discarded at fire time |

use std::fmt;
use std::time::Duration;

use unicode_segmentation::UnicodeSegmentation;

use crate::config::{ConfigError, KeyboardType, PinCodeConfig};
use crate::direction::LayoutDirection;
use crate::policy::{BeginEditingAction, ResetPolicy};
use crate::schedule::{Edit, Scheduler, Task};
use crate::shake::Shake;
use crate::slot::Slot;
use crate::style::{NoopStyle, SlotStyle, StyleFactory};

/// Per-keystroke validator. Returns `true` to accept the proposed text.
pub type Validator = Box<dyn Fn(&str) -> bool>;

type CompleteCallback = Box<dyn FnMut(&str, &mut ErrorSetter)>;
type CodeChangedCallback = Box<dyn FnMut(&str)>;
type FocusCallback = Box<dyn FnMut()>;

/// Handle passed to the completion callback to request the error state.
#[derive(Debug, Default)]
pub struct ErrorSetter {
    requested: Option<bool>,
}

impl ErrorSetter {
    /// Request the view's error flag be set to `error` once the callback returns.
    pub fn set_error(&mut self, error: bool) {
        self.requested = Some(error);
    }

    /// The pending request, if any.
    #[must_use]
    pub fn requested(&self) -> Option<bool> {
        self.requested
    }
}

/// Coarse container state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewState {
    /// Not focused, no error.
    Idle,
    /// Focused and accepting input.
    Editing,
    /// Every slot is filled.
    Complete,
    /// Error flag set.
    Error,
}

/// Why the gate refused a proposed edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The view is disabled.
    Disabled,
    /// The validator refused the text.
    Invalid,
    /// Every slot is filled.
    Full,
    /// Deletion is turned off.
    ClearDisabled,
    /// A delayed edit has not been applied yet.
    EditPending,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Disabled => "view is disabled",
            Self::Invalid => "rejected by validator",
            Self::Full => "all slots are filled",
            Self::ClearDisabled => "clearing is disabled",
            Self::EditPending => "a delayed edit is pending",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetCause {
    Explicit,
    UserInteraction,
    AfterError,
    SecureEntryToggled,
}

/// Segmented PIN entry: N single-character slots over one hidden buffer.
pub struct PinCodeView {
    config: PinCodeConfig,
    direction: LayoutDirection,
    code: String,
    raw: String,
    slots: Vec<Slot>,
    style_factory: Option<StyleFactory>,
    validator: Option<Validator>,
    on_complete: Option<CompleteCallback>,
    on_code_changed: Option<CodeChangedCallback>,
    on_begin_editing: Option<FocusCallback>,
    on_keyboard_closed: Option<FocusCallback>,
    focused: bool,
    error: bool,
    /// Bumped every time the error flag turns on.
    error_epoch: u64,
    shake: Option<Shake>,
    scheduler: Scheduler,
    now: Duration,
    next_reveal_token: u64,
    /// Bumped on reset; delayed edits from an older generation are dropped.
    edit_generation: u64,
    edit_pending: bool,
}

impl fmt::Debug for PinCodeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinCodeView")
            .field("config", &self.config)
            .field("direction", &self.direction)
            .field("code_len", &self.code_len())
            .field("slots", &self.slots)
            .field("focused", &self.focused)
            .field("error", &self.error)
            .field("shake", &self.shake)
            .field("pending_tasks", &self.scheduler.len())
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

fn make_style(factory: Option<&StyleFactory>) -> Box<dyn SlotStyle> {
    match factory {
        Some(factory) => factory(),
        None => Box::new(NoopStyle),
    }
}

impl PinCodeView {
    /// Create a view whose layout direction follows the process locale.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: PinCodeConfig) -> Result<Self, ConfigError> {
        Self::with_direction(config, LayoutDirection::detect())
    }

    /// Create a view with the host-provided layout direction.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn with_direction(
        config: PinCodeConfig,
        direction: LayoutDirection,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut view = Self {
            config,
            direction,
            code: String::new(),
            raw: String::new(),
            slots: Vec::new(),
            style_factory: None,
            validator: None,
            on_complete: None,
            on_code_changed: None,
            on_begin_editing: None,
            on_keyboard_closed: None,
            focused: false,
            error: false,
            error_epoch: 0,
            shake: None,
            scheduler: Scheduler::new(),
            now: Duration::ZERO,
            next_reveal_token: 0,
            edit_generation: 0,
            edit_pending: false,
        };
        view.rebuild_slots();
        Ok(view)
    }

    // --- Callbacks ---

    /// Fires once per full entry with the code and an error setter.
    pub fn on_complete(&mut self, callback: impl FnMut(&str, &mut ErrorSetter) + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Fires after every accepted mutation of the code.
    pub fn on_code_changed(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_code_changed = Some(Box::new(callback));
    }

    /// Fires when the view gains focus.
    pub fn on_begin_editing(&mut self, callback: impl FnMut() + 'static) {
        self.on_begin_editing = Some(Box::new(callback));
    }

    /// Fires when [`close_keyboard`](Self::close_keyboard) dismisses an open keyboard.
    pub fn on_keyboard_closed(&mut self, callback: impl FnMut() + 'static) {
        self.on_keyboard_closed = Some(Box::new(callback));
    }

    /// Install a validator consulted for every proposed insertion.
    pub fn set_validator(&mut self, validator: impl Fn(&str) -> bool + 'static) {
        self.validator = Some(Box::new(validator));
    }

    pub fn clear_validator(&mut self) {
        self.validator = None;
    }

    /// Install a style factory. All slots are recreated with fresh styles.
    pub fn set_style_factory(&mut self, factory: impl Fn() -> Box<dyn SlotStyle> + 'static) {
        self.style_factory = Some(Box::new(factory));
        self.rebuild_slots();
        self.restore_slots_from_code();
    }

    // --- Accessors ---

    /// The entered code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Number of entered characters (graphemes).
    #[must_use]
    pub fn code_len(&self) -> usize {
        grapheme_len(&self.code)
    }

    /// Number of slots.
    #[must_use]
    pub fn length(&self) -> usize {
        self.slots.len()
    }

    /// Contents of the hidden text buffer.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Logical index of the slot currently accepting input.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.code_len().saturating_sub(1)
    }

    #[must_use]
    pub fn direction(&self) -> LayoutDirection {
        self.direction
    }

    /// Map a logical index to its visual position.
    #[must_use]
    pub fn normalize(&self, index: usize) -> usize {
        self.direction.normalize(index, self.length())
    }

    /// Slots in logical order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slot at logical index `index`.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Slot at visual position `visual` (0 is leftmost).
    #[must_use]
    pub fn visual_slot(&self, visual: usize) -> Option<&Slot> {
        if visual >= self.length() {
            return None;
        }
        self.slots.get(self.normalize(visual))
    }

    /// Slots in visual order, left to right.
    pub fn visual_slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        (0..self.length()).map(move |visual| &self.slots[self.normalize(visual)])
    }

    #[must_use]
    pub fn config(&self) -> &PinCodeConfig {
        &self.config
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error
    }

    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Opacity hint for the host: dimmed while disabled.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        if self.config.enabled { 1.0 } else { 0.5 }
    }

    #[must_use]
    pub fn state(&self) -> ViewState {
        if self.error {
            ViewState::Error
        } else if self.code_len() == self.length() {
            ViewState::Complete
        } else if self.focused {
            ViewState::Editing
        } else {
            ViewState::Idle
        }
    }

    /// Whether the error shake is playing.
    #[must_use]
    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    /// Current horizontal shake offset, 0.0 at rest.
    #[must_use]
    pub fn shake_offset(&self) -> f32 {
        self.shake.map_or(0.0, |shake| shake.offset())
    }

    /// Virtual time elapsed since creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Whether the host still needs to call [`tick`](Self::tick).
    #[must_use]
    pub fn needs_tick(&self) -> bool {
        self.shake.is_some() || !self.scheduler.is_empty()
    }

    /// Queued deferred tasks, stale ones included.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Virtual time at which the next deferred task is due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    // --- Configuration ---

    /// Change the slot count. Slots are recreated and the code is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroSlots`] when `length` is 0.
    pub fn set_length(&mut self, length: usize) -> Result<(), ConfigError> {
        if length == 0 {
            return Err(ConfigError::ZeroSlots);
        }
        let had_code = !self.code.is_empty();
        self.config.length = length;
        self.scheduler.clear();
        self.code.clear();
        self.raw.clear();
        self.error = false;
        self.shake = None;
        self.invalidate_pending_edit();
        self.rebuild_slots();
        if self.focused {
            self.highlight_active(0);
        }
        if had_code {
            self.notify_code_changed();
        }
        Ok(())
    }

    /// Toggle secure entry. Changing it resets the code.
    pub fn set_secure_entry(&mut self, secure: bool) {
        if self.config.secure_entry == secure {
            return;
        }
        self.config.secure_entry = secure;
        self.reset_with(ResetCause::SecureEntryToggled);
    }

    pub fn set_reveal_delay(&mut self, delay: Duration) {
        self.config.reveal_delay = delay;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    pub fn set_clear_enabled(&mut self, enabled: bool) {
        self.config.clear_enabled = enabled;
    }

    pub fn set_editing_delay(&mut self, delay: Duration) {
        self.config.editing_delay = delay;
    }

    pub fn set_spacing(&mut self, spacing: f32) {
        self.config.spacing = spacing;
    }

    pub fn set_keyboard_type(&mut self, keyboard_type: KeyboardType) {
        self.config.keyboard_type = keyboard_type;
    }

    pub fn set_close_keyboard_on_complete(&mut self, close: bool) {
        self.config.close_keyboard_on_complete = close;
    }

    pub fn set_shake_on_error(&mut self, shake: bool) {
        self.config.shake_on_error = shake;
    }

    pub fn set_reset_policy(&mut self, policy: ResetPolicy) {
        self.config.reset_policy = policy;
    }

    pub fn set_animate_selected_slot(&mut self, animate: bool) {
        self.config.animate_selected_slot = animate;
        for slot in &mut self.slots {
            slot.set_animate_while_selected(animate);
        }
    }

    // --- Gate ---

    /// Check whether inserting `text` would be accepted.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] reason when the insertion would be refused.
    pub fn check_insert(&self, text: &str) -> Result<(), Rejection> {
        if !self.config.enabled {
            return Err(Rejection::Disabled);
        }
        if self.edit_pending {
            return Err(Rejection::EditPending);
        }
        if let Some(validator) = &self.validator
            && !validator(text)
        {
            return Err(Rejection::Invalid);
        }
        if self.code_len() >= self.length() {
            return Err(Rejection::Full);
        }
        Ok(())
    }

    /// Check whether deleting the last character would be accepted.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] reason when the deletion would be refused.
    pub fn check_delete(&self) -> Result<(), Rejection> {
        if !self.config.clear_enabled {
            return Err(Rejection::ClearDisabled);
        }
        if self.edit_pending {
            return Err(Rejection::EditPending);
        }
        Ok(())
    }

    /// Propose inserting `text` at the end of the code.
    ///
    /// Returns `true` if the gate accepted the edit. Text longer than the free
    /// slots is truncated. An empty string is accepted and changes nothing.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn propose_insert(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return true;
        }
        match self.check_insert(text) {
            Ok(()) => {
                self.submit(Edit::Insert(text.to_owned()));
                true
            }
            Err(reason) => {
                crate::debug!(%reason, "insert rejected");
                false
            }
        }
    }

    /// Propose deleting the last character.
    ///
    /// Returns `true` if the gate accepted the edit.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn propose_delete(&mut self) -> bool {
        match self.check_delete() {
            Ok(()) => {
                self.submit(Edit::Delete);
                true
            }
            Err(reason) => {
                crate::debug!(%reason, "delete rejected");
                false
            }
        }
    }

    fn submit(&mut self, edit: Edit) {
        if self.config.editing_delay.is_zero() {
            self.apply_edit(edit);
            return;
        }
        self.edit_pending = true;
        let due = self.now.saturating_add(self.config.editing_delay);
        self.scheduler.schedule(
            due,
            Task::ApplyEdit {
                edit,
                generation: self.edit_generation,
            },
        );
    }

    fn apply_edit(&mut self, edit: Edit) {
        match edit {
            Edit::Insert(text) => {
                for grapheme in text.graphemes(true) {
                    if self.code_len() >= self.length() {
                        break;
                    }
                    self.raw.push_str(grapheme);
                    self.sync_from_raw();
                }
            }
            Edit::Delete => {
                if let Some((offset, _)) = self.raw.grapheme_indices(true).next_back() {
                    self.raw.truncate(offset);
                }
                self.sync_from_raw();
            }
        }
    }

    fn invalidate_pending_edit(&mut self) {
        self.edit_pending = false;
        self.edit_generation = self.edit_generation.wrapping_add(1);
    }

    // --- Synchronization ---

    /// Synchronize slots with a new hidden-buffer value.
    ///
    /// For hosts that own the text buffer: call this after every accepted
    /// edit. A shorter value deletes from the end; a longer one appends its
    /// last character.
    pub fn on_raw_text_changed(&mut self, new_text: &str) {
        self.raw.clear();
        self.raw.push_str(new_text);
        self.sync_from_raw();
    }

    /// Apply the raw-buffer change to the code, then make the buffer mirror
    /// the code again so later edits start from the same text.
    fn sync_from_raw(&mut self) {
        let new_len = grapheme_len(&self.raw);
        let old_len = self.code_len();

        let appended = if new_len < old_len {
            self.delete_to(new_len, old_len);
            false
        } else if new_len > old_len && self.append_last_raw_grapheme() {
            true
        } else {
            self.raw.clone_from(&self.code);
            return;
        };
        self.raw.clone_from(&self.code);

        self.highlight_active(self.active_index());
        self.notify_code_changed();

        if appended && self.code_len() == self.length() {
            self.complete();
        }
    }

    fn delete_to(&mut self, new_len: usize, old_len: usize) {
        for index in (new_len..old_len).rev() {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.clear();
            }
        }
        if let Some((offset, _)) = self.code.grapheme_indices(true).nth(new_len) {
            self.code.truncate(offset);
        }
        crate::debug!(len = new_len, removed = old_len - new_len, "deleted");
    }

    fn append_last_raw_grapheme(&mut self) -> bool {
        let index = self.code_len();
        if index >= self.length() {
            return false;
        }
        let Some(grapheme) = self.raw.graphemes(true).next_back() else {
            return false;
        };
        let grapheme = grapheme.to_owned();
        self.slots[index].set_text(&grapheme);
        self.code.push_str(&grapheme);
        if self.config.secure_entry {
            self.schedule_reveal(index);
        }
        crate::debug!(slot = index, len = index + 1, "appended");
        true
    }

    fn schedule_reveal(&mut self, index: usize) {
        let token = self.next_reveal_token;
        self.next_reveal_token = self.next_reveal_token.wrapping_add(1);
        self.slots[index].begin_reveal(token);
        let due = self.now.saturating_add(self.config.reveal_delay);
        self.scheduler.schedule(
            due,
            Task::Lock {
                slot: index,
                token,
                error: self.error,
            },
        );
    }

    /// Select the slot at logical `index` and, under secure entry, mask every
    /// filled slot except the selected one.
    ///
    /// Nothing is selected while unfocused or in error. The slot at `index`
    /// stays unmasked while its reveal delay is running.
    fn highlight_active(&mut self, index: usize) {
        let len = self.length();
        if self.error {
            for slot in &mut self.slots {
                slot.set_selected(false);
            }
            return;
        }
        let active_visual = self.direction.normalize(index, len);
        let filled = self.code_len();
        let secure = self.config.secure_entry;
        let focused = self.focused;
        for visual in 0..len {
            let logical = self.direction.normalize(visual, len);
            let selected = focused && visual == active_visual;
            let slot = &mut self.slots[logical];
            slot.set_selected(selected);
            if secure {
                let revealing = logical == index && slot.is_revealing();
                slot.set_locked(logical < filled && !selected && !revealing);
            }
        }
    }

    fn complete(&mut self) {
        crate::info!(len = self.code_len(), "code complete");
        if self.config.close_keyboard_on_complete {
            self.close_keyboard();
        }
        let mut setter = ErrorSetter::default();
        if let Some(callback) = self.on_complete.as_mut() {
            callback(&self.code, &mut setter);
        }
        if let Some(error) = setter.requested() {
            self.set_error(error);
        }
    }

    fn notify_code_changed(&mut self) {
        if let Some(callback) = self.on_code_changed.as_mut() {
            callback(&self.code);
        }
    }

    // --- Focus ---

    /// The view gained focus (tap or programmatic focus).
    ///
    /// On the first focus gain this fires the begin-editing callback and
    /// applies the reset policy if the view is in error. The active slot is
    /// selected in every case.
    pub fn begin_editing(&mut self) {
        if !self.focused {
            self.focused = true;
            if let Some(callback) = self.on_begin_editing.as_mut() {
                callback();
            }
            match self.config.reset_policy.on_begin_editing(self.error) {
                BeginEditingAction::Nothing => {}
                BeginEditingAction::ClearError => self.set_error(false),
                BeginEditingAction::Reset => self.reset_with(ResetCause::UserInteraction),
            }
        }
        self.highlight_active(self.active_index());
    }

    /// The view lost focus. Deselects the active slot unless in error.
    pub fn end_editing(&mut self) {
        if !self.focused {
            return;
        }
        self.focused = false;
        if !self.error {
            self.highlight_active(self.active_index());
        }
    }

    /// Dismiss the keyboard, ending the editing session.
    pub fn close_keyboard(&mut self) {
        if !self.focused {
            return;
        }
        self.end_editing();
        if let Some(callback) = self.on_keyboard_closed.as_mut() {
            callback();
        }
    }

    // --- Error & reset ---

    /// Enter or leave the error state.
    ///
    /// Entering deselects the active slot, starts the shake if enabled and
    /// applies error styling to every slot. Leaving restores normal styling
    /// and keeps the code.
    pub fn set_error(&mut self, error: bool) {
        if self.error == error {
            return;
        }
        self.error = error;
        if error {
            self.error_epoch = self.error_epoch.wrapping_add(1);
            let index = self.active_index();
            self.slots[index].set_selected(false);
            if self.config.shake_on_error {
                self.shake = Some(Shake::default());
            } else {
                self.schedule_reset_after_error(self.now);
            }
        } else {
            self.shake = None;
        }

        for slot in &mut self.slots {
            slot.set_error(error);
        }

        if !error {
            self.highlight_active(self.active_index());
        }
        crate::debug!(error, "error state changed");
    }

    /// Clear the code, the buffer, every slot and the error flag.
    pub fn reset(&mut self) {
        self.reset_with(ResetCause::Explicit);
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn reset_with(&mut self, cause: ResetCause) {
        let had_code = !self.code.is_empty();
        self.code.clear();
        self.raw.clear();
        self.invalidate_pending_edit();
        for slot in &mut self.slots {
            slot.clear();
        }
        self.set_error(false);
        if self.focused {
            self.highlight_active(0);
        }
        crate::info!(cause = ?cause, "code reset");
        if had_code {
            self.notify_code_changed();
        }
    }

    fn schedule_reset_after_error(&mut self, from: Duration) {
        if let Some(delay) = self.config.reset_policy.reset_delay_after_error() {
            self.scheduler.schedule(
                from.saturating_add(delay),
                Task::Reset {
                    epoch: self.error_epoch,
                },
            );
        }
    }

    // --- Layout & time ---

    /// Forward a layout pass to every slot's style.
    pub fn layout(&mut self) {
        for slot in &mut self.slots {
            slot.layout();
        }
    }

    /// Advance virtual time by `dt`, running the shake and every due task.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn tick(&mut self, dt: Duration) {
        let dt_us = u64::try_from(dt.as_micros()).unwrap_or(u64::MAX);
        let _guard = crate::debug_span!("pin_code_view_tick", dt_us).entered();
        self.now = self.now.saturating_add(dt);

        if let Some(shake) = self.shake.as_mut() {
            shake.tick(dt);
            if shake.is_complete() {
                let finished_at = self.now.saturating_sub(shake.overshoot());
                self.shake = None;
                if self.error {
                    self.schedule_reset_after_error(finished_at);
                }
            }
        }

        while let Some(task) = self.scheduler.pop_due(self.now) {
            self.run_task(task);
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Lock { slot, token, error } => self.run_lock(slot, token, error),
            Task::Reset { epoch } => {
                if self.error && epoch == self.error_epoch {
                    self.reset_with(ResetCause::AfterError);
                } else {
                    crate::trace!(epoch, "stale reset discarded");
                }
            }
            Task::ApplyEdit { edit, generation } => {
                if generation != self.edit_generation {
                    crate::trace!(generation, "stale edit discarded");
                    return;
                }
                self.edit_pending = false;
                self.apply_edit(edit);
            }
        }
    }

    fn run_lock(&mut self, index: usize, token: u64, error: bool) {
        let stale = error != self.error || self.code.is_empty();
        let secure = self.config.secure_entry;
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if !slot.finish_reveal(token) || stale || slot.state().is_empty() {
            crate::trace!(slot = index, "stale lock discarded");
            return;
        }
        if secure && !slot.state().is_selected() {
            slot.set_locked(true);
        }
        crate::trace!(slot = index, "reveal elapsed");
    }

    // --- Slot construction ---

    fn rebuild_slots(&mut self) {
        let animate = self.config.animate_selected_slot;
        let factory = self.style_factory.as_ref();
        let slots: Vec<Slot> = (0..self.config.length)
            .map(|index| Slot::new(index, make_style(factory), animate))
            .collect();
        self.slots = slots;
    }

    /// Re-populate freshly built slots from the current code and flags.
    fn restore_slots_from_code(&mut self) {
        for (slot, grapheme) in self.slots.iter_mut().zip(self.code.graphemes(true)) {
            slot.set_text(grapheme);
        }
        if self.error {
            for slot in &mut self.slots {
                slot.set_error(true);
            }
        } else {
            self.highlight_active(self.active_index());
        }
    }
}
