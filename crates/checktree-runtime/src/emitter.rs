//! Debounced record emission.
//!
//! User edits arrive in bursts — a click storm on nearby checkboxes
//! should reach the host as one record, not five. The emitter tracks a
//! single pending window that restarts on every edit (latest wins) and
//! resolves on poll once the window has elapsed. Content that matches
//! the last emission is suppressed, so reordering or toggling back and
//! forth never produces a spurious notification.
//!
//! Time is injected (`*_at` methods take an [`Instant`]) so tests drive
//! the window deterministically, in the same way the host's event loop
//! would.
//!
//! # Invariants
//!
//! - At most one emission is pending at a time; a new edit restarts the
//!   window rather than queueing a second emission.
//! - No intermediate record is ever emitted: polling resolves with
//!   whatever candidate the caller synthesizes at fire time.
//! - An externally applied record becomes the suppression baseline, so
//!   the engine never echoes an incoming record back to the host.

use std::time::{Duration, Instant};

use checktree_core::OverrideRecord;

/// Default coalescing window: long enough to merge rapid successive
/// clicks, short enough to feel immediate.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Outcome of polling the emitter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmitAction {
    /// Nothing to do: no pending window, or it has not elapsed yet.
    None,
    /// The window fired and the candidate differs from the last
    /// emission — hand this record to the host.
    Emit(OverrideRecord),
    /// The window fired but the candidate matches the last emission;
    /// the notification is suppressed.
    Unchanged,
}

/// Latest-wins debounce window over record synthesis.
#[derive(Clone, Debug)]
pub struct DebouncedEmitter {
    window: Duration,
    /// Time of the most recent edit; `Some` while an emission is pending.
    dirty_since: Option<Instant>,
    /// Baseline for change suppression: the last record handed to the
    /// host, or the last record the host handed to us.
    last_emitted: Option<OverrideRecord>,
}

impl DebouncedEmitter {
    /// Create an emitter with the given coalescing window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            dirty_since: None,
            last_emitted: None,
        }
    }

    /// Whether an emission is currently pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// The suppression baseline, if any record has been seen yet.
    #[must_use]
    pub fn last_emitted(&self) -> Option<&OverrideRecord> {
        self.last_emitted.as_ref()
    }

    /// Note an edit at `now`, starting or restarting the window.
    pub fn mark_dirty_at(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    /// Note an externally applied record: cancel any pending window and
    /// make the record the suppression baseline.
    pub fn note_external(&mut self, record: &OverrideRecord) {
        self.dirty_since = None;
        self.last_emitted = Some(record.clone());
    }

    /// Remaining time until the pending window fires, if one is pending.
    #[must_use]
    pub fn time_until_emit(&self, now: Instant) -> Option<Duration> {
        let dirty_since = self.dirty_since?;
        let elapsed = now
            .checked_duration_since(dirty_since)
            .unwrap_or(Duration::ZERO);
        Some(self.window.saturating_sub(elapsed))
    }

    /// Poll at `now` with the candidate record synthesized by the caller.
    ///
    /// Resolves the pending window when it has elapsed; otherwise
    /// returns [`EmitAction::None`] and keeps waiting.
    pub fn poll_at(&mut self, now: Instant, candidate: &OverrideRecord) -> EmitAction {
        let Some(dirty_since) = self.dirty_since else {
            return EmitAction::None;
        };
        let elapsed = now
            .checked_duration_since(dirty_since)
            .unwrap_or(Duration::ZERO);
        if elapsed < self.window {
            return EmitAction::None;
        }

        self.dirty_since = None;
        if self.last_emitted.as_ref() == Some(candidate) {
            return EmitAction::Unchanged;
        }
        self.last_emitted = Some(candidate.clone());
        EmitAction::Emit(candidate.clone())
    }
}

impl Default for DebouncedEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
