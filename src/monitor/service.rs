//! Monitor implementations: a silent one and a thread-shareable one.
//!
//! `StandardMonitor` keeps its state behind `Arc<Mutex<_>>` so that another
//! thread holding a `MonitorHandle` can cancel the run, read progress and
//! fetch the latest preview while the loop runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::evaluation::domain::LearningCurve;

use super::domain::{Progress, TaskMonitor};

/// Cooperative cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Token that is not cancelled yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; seen at the next abort check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Never aborts and discards everything it is told.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMonitor;

impl TaskMonitor for NullMonitor {
    fn should_abort(&self) -> bool {
        false
    }

    fn set_progress(&mut self, _progress: Progress) {}

    fn preview_requested(&self) -> bool {
        false
    }

    fn publish_preview(&mut self, _preview: &LearningCurve) {}
}

#[derive(Clone, Debug)]
struct MonitorState {
    activity: String,
    progress: Progress,
    preview: Option<LearningCurve>,
    polls: u64,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            activity: String::new(),
            progress: Progress::Indeterminate,
            preview: None,
            polls: 0,
        }
    }
}

fn lock(state: &Mutex<MonitorState>) -> MutexGuard<'_, MonitorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Monitor backed by a cancel token and shared state.
#[derive(Debug)]
pub struct StandardMonitor {
    token: CancelToken,
    state: Arc<Mutex<MonitorState>>,
    previews: bool,
}

impl StandardMonitor {
    /// Monitor publishing previews and aborting once `token` is cancelled.
    pub fn new(token: CancelToken) -> Self {
        Self {
            token,
            state: Arc::new(Mutex::new(MonitorState::default())),
            previews: true,
        }
    }

    /// Skip preview copies when nobody renders them.
    pub fn without_previews(mut self) -> Self {
        self.previews = false;
        self
    }

    /// Handle sharing this monitor's token and state.
    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            token: self.token.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl TaskMonitor for StandardMonitor {
    fn set_activity(&mut self, description: &str) {
        lock(&self.state).activity = description.to_string();
    }

    fn should_abort(&self) -> bool {
        lock(&self.state).polls += 1;
        self.token.is_cancelled()
    }

    fn set_progress(&mut self, progress: Progress) {
        lock(&self.state).progress = progress;
    }

    fn preview_requested(&self) -> bool {
        self.previews
    }

    fn publish_preview(&mut self, preview: &LearningCurve) {
        lock(&self.state).preview = Some(preview.clone());
    }
}

/// Read/cancel access to a `StandardMonitor` from any thread.
#[derive(Clone, Debug)]
pub struct MonitorHandle {
    token: CancelToken,
    state: Arc<Mutex<MonitorState>>,
}

impl MonitorHandle {
    /// Cancel the monitored run.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Last activity description.
    pub fn activity(&self) -> String {
        lock(&self.state).activity.clone()
    }

    /// Last reported progress.
    pub fn progress(&self) -> Progress {
        lock(&self.state).progress
    }

    /// Copy of the most recent preview, if any.
    pub fn latest_preview(&self) -> Option<LearningCurve> {
        lock(&self.state).preview.clone()
    }

    /// Number of abort checks performed so far.
    pub fn polls(&self) -> u64 {
        lock(&self.state).polls
    }
}
