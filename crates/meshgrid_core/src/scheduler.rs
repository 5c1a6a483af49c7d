//! Keep-alive animation scheduler.
//!
//! Every party that needs frames (the core interaction tracker, each effect
//! plugin) registers a voter. The frame loop runs while at least one voter is
//! requesting and pauses once the set has been empty for [`PAUSE_DEBOUNCE`].
//! Visibility overrides the votes entirely.
//!
//! ```text
//!   request ──▶ ┌─────────┐  set empty   ┌──────────┐  debounce  ┌────────┐
//!               │ Running │ ───────────▶ │ Draining │ ─────────▶ │ Paused │
//!   force ────▶ └─────────┘ ◀─────────── └──────────┘            └────────┘
//!                    ▲          request                               │
//!                    └──────────── request / force_resume ────────────┘
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Seconds the voter set must stay empty before the loop pauses.
pub const PAUSE_DEBOUNCE: f64 = 0.150;

/// Identifier of one keep-alive voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoterId(u32);

/// Scheduler state for one grid instance.
#[derive(Debug)]
pub struct AnimationScheduler {
    voters: HashSet<VoterId>,
    labels: Vec<&'static str>,
    running: bool,
    empty_since: Option<f64>,
    visible: bool,
    debounce: f64,
}

impl AnimationScheduler {
    /// Creates a running, visible scheduler with the default debounce.
    #[must_use]
    pub fn new() -> Self {
        Self::with_debounce(PAUSE_DEBOUNCE)
    }

    /// Creates a scheduler with a custom debounce in seconds.
    #[must_use]
    pub fn with_debounce(debounce: f64) -> Self {
        Self {
            voters: HashSet::new(),
            labels: Vec::new(),
            running: true,
            empty_since: None,
            visible: true,
            debounce,
        }
    }

    /// Wraps the scheduler for sharing with plugins and host callbacks.
    #[must_use]
    pub fn shared(self) -> SharedScheduler {
        Arc::new(Mutex::new(self))
    }

    /// Allocates a voter id. The label is only used for logging.
    pub fn register_voter(&mut self, label: &'static str) -> VoterId {
        #[allow(clippy::cast_possible_truncation)]
        let id = VoterId(self.labels.len() as u32);
        self.labels.push(label);
        id
    }

    /// Adds a keep-alive vote and resumes the loop immediately.
    pub fn request(&mut self, voter: VoterId) {
        if self.voters.insert(voter) {
            tracing::trace!("keep-alive requested by {}", self.label(voter));
        }
        self.empty_since = None;
        self.resume();
    }

    /// Removes a keep-alive vote. The loop keeps running through the debounce.
    pub fn release(&mut self, voter: VoterId) {
        if self.voters.remove(&voter) {
            tracing::trace!("keep-alive released by {}", self.label(voter));
        }
    }

    /// Resumes the loop regardless of debounce state.
    pub fn force_resume(&mut self) {
        self.empty_since = None;
        self.resume();
    }

    /// Updates visibility. Hiding pauses and clears every vote; showing
    /// force-resumes so voters can re-register on the next frame.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.force_resume();
        } else {
            self.voters.clear();
            self.empty_since = None;
            if self.running {
                tracing::debug!("animation paused: host hidden");
            }
            self.running = false;
        }
    }

    /// Decides whether the frame at `now` (seconds) should run.
    pub fn tick(&mut self, now: f64) -> bool {
        if !self.visible {
            return false;
        }
        if !self.running {
            return false;
        }
        if self.voters.is_empty() {
            let since = *self.empty_since.get_or_insert(now);
            if now - since >= self.debounce {
                self.running = false;
                self.empty_since = None;
                tracing::debug!("animation paused: no keep-alive voters");
                return false;
            }
        } else {
            self.empty_since = None;
        }
        true
    }

    /// Returns true if the loop is running (including the debounce window).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.visible && self.running
    }

    /// Number of active votes.
    #[must_use]
    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    /// Returns true if `voter` currently holds a vote.
    #[must_use]
    pub fn is_requesting(&self, voter: VoterId) -> bool {
        self.voters.contains(&voter)
    }

    fn resume(&mut self) {
        if self.visible && !self.running {
            self.running = true;
            tracing::debug!("animation resumed");
        }
    }

    fn label(&self, voter: VoterId) -> &'static str {
        self.labels.get(voter.0 as usize).copied().unwrap_or("unknown")
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Scheduler shared between the instance, its plugins and host callbacks.
pub type SharedScheduler = Arc<Mutex<AnimationScheduler>>;

/// A voter's handle onto the shared scheduler.
#[derive(Debug, Clone)]
pub struct KeepAlive {
    scheduler: SharedScheduler,
    voter: VoterId,
}

impl KeepAlive {
    /// Registers a new voter on `scheduler`.
    #[must_use]
    pub fn register(scheduler: &SharedScheduler, label: &'static str) -> Self {
        let voter = scheduler.lock().register_voter(label);
        Self {
            scheduler: Arc::clone(scheduler),
            voter,
        }
    }

    /// Requests continued animation.
    pub fn request(&self) {
        self.scheduler.lock().request(self.voter);
    }

    /// Releases this voter's request.
    pub fn release(&self) {
        self.scheduler.lock().release(self.voter);
    }

    /// Resumes the loop immediately.
    pub fn force_resume(&self) {
        self.scheduler.lock().force_resume();
    }

    /// Returns true if this voter currently holds a vote.
    #[must_use]
    pub fn is_requesting(&self) -> bool {
        self.scheduler.lock().is_requesting(self.voter)
    }

    /// This handle's voter id.
    #[must_use]
    pub fn voter(&self) -> VoterId {
        self.voter
    }
}
