// 📣 User Feedback - notifications and progress indicator
//
// Stores never print. They report through a Notifier (one message per
// failed action) and a Progress indicator (start/increment/stop around
// each request). The CLI plugs in console sinks; tests plug in a Recorder.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use crate::api::RequestOptions;

/// Increment applied when `Progress::increment` is called without an amount
pub const DEFAULT_INCREMENT: f64 = 5.0;

// ============================================================================
// TRAITS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Negative,
    Warning,
    Positive,
    Info,
}

impl NotifyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyKind::Negative => "negative",
            NotifyKind::Warning => "warning",
            NotifyKind::Positive => "positive",
            NotifyKind::Info => "info",
        }
    }
}

/// Surfaces a message to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NotifyKind);
}

/// Progress indicator measured in percent (0-100)
pub trait Progress: Send + Sync {
    fn start(&self);
    /// Advance by `amount` percent, or by `DEFAULT_INCREMENT` when None
    fn increment(&self, amount: Option<f64>);
    fn stop(&self);
}

// ============================================================================
// FEEDBACK BUNDLE
// ============================================================================

/// Notifier + progress pair injected into every store
#[derive(Clone)]
pub struct Feedback {
    notifier: Arc<dyn Notifier>,
    progress: Arc<dyn Progress>,
}

impl Feedback {
    pub fn new(notifier: Arc<dyn Notifier>, progress: Arc<dyn Progress>) -> Self {
        Feedback { notifier, progress }
    }

    /// Messages go to the log, progress is discarded
    pub fn headless() -> Self {
        Feedback::new(Arc::new(LogNotifier), Arc::new(NoProgress))
    }

    /// Messages and a progress bar on stderr
    pub fn console(show_progress: bool) -> Self {
        let progress: Arc<dyn Progress> = if show_progress {
            Arc::new(ConsoleProgress::default())
        } else {
            Arc::new(NoProgress)
        };
        Feedback::new(Arc::new(ConsoleNotifier), progress)
    }

    /// Feedback that records every event, plus the recorder to inspect them
    pub fn recording() -> (Self, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let feedback = Feedback::new(recorder.clone(), recorder.clone());
        (feedback, recorder)
    }

    pub fn notify(&self, message: &str, kind: NotifyKind) {
        self.notifier.notify(message, kind);
    }

    pub fn increment(&self, amount: Option<f64>) {
        self.progress.increment(amount);
    }

    pub fn stop(&self) {
        self.progress.stop();
    }

    /// Start the indicator and build request options that advance it.
    ///
    /// The indicator moves 10% before the request is built, up to 80% with
    /// the upload, and 20% once the request is ready to go.
    pub fn progress_init(&self) -> RequestOptions {
        self.progress.start();
        self.progress.increment(Some(10.0));

        let progress = Arc::clone(&self.progress);
        let options = RequestOptions::new()
            .on_upload_progress(move |fraction| progress.increment(Some(fraction * 80.0)));

        self.progress.increment(Some(20.0));
        options
    }
}

// ============================================================================
// CONSOLE SINKS
// ============================================================================

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, kind: NotifyKind) {
        let marker = match kind {
            NotifyKind::Negative => "✗",
            NotifyKind::Warning => "⚠",
            NotifyKind::Positive => "✓",
            NotifyKind::Info => "•",
        };
        eprintln!("{} {}", marker, message);
    }
}

/// Routes messages to `tracing`
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, kind: NotifyKind) {
        match kind {
            NotifyKind::Negative | NotifyKind::Warning => {
                tracing::warn!(kind = kind.as_str(), "{}", message)
            }
            NotifyKind::Positive | NotifyKind::Info => {
                tracing::info!(kind = kind.as_str(), "{}", message)
            }
        }
    }
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self) {}
    fn increment(&self, _amount: Option<f64>) {}
    fn stop(&self) {}
}

#[derive(Debug, Default)]
struct BarState {
    active: bool,
    value: f64,
}

/// Single-line progress bar redrawn in place on stderr
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    state: Mutex<BarState>,
}

const BAR_WIDTH: usize = 24;

impl ConsoleProgress {
    fn draw(value: f64) {
        let filled = ((value / 100.0) * BAR_WIDTH as f64).round() as usize;
        let mut stderr = std::io::stderr();
        let _ = write!(
            stderr,
            "\r[{}{}] {:>3.0}%",
            "=".repeat(filled.min(BAR_WIDTH)),
            " ".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
            value
        );
        let _ = stderr.flush();
    }

    fn finish(state: &mut BarState) {
        if state.active {
            state.active = false;
            state.value = 0.0;
            eprintln!();
        }
    }
}

impl Progress for ConsoleProgress {
    fn start(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.active = true;
        state.value = 0.0;
        Self::draw(0.0);
    }

    fn increment(&self, amount: Option<f64>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.active {
            return;
        }
        state.value = (state.value + amount.unwrap_or(DEFAULT_INCREMENT)).min(100.0);
        Self::draw(state.value);
        if state.value >= 100.0 {
            Self::finish(&mut state);
        }
    }

    fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::finish(&mut state);
    }
}

// ============================================================================
// RECORDER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackEvent {
    Notify(String, NotifyKind),
    Start,
    Increment(Option<f64>),
    Stop,
}

/// Keeps every feedback event in order; for tests and embedding
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<FeedbackEvent>>,
}

impl Recorder {
    fn push(&self, event: FeedbackEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Only the notifications, in order
    pub fn notifications(&self) -> Vec<(String, NotifyKind)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FeedbackEvent::Notify(message, kind) => Some((message, kind)),
                _ => None,
            })
            .collect()
    }

    pub fn stopped(&self) -> bool {
        self.events().contains(&FeedbackEvent::Stop)
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for Recorder {
    fn notify(&self, message: &str, kind: NotifyKind) {
        self.push(FeedbackEvent::Notify(message.to_string(), kind));
    }
}

impl Progress for Recorder {
    fn start(&self) {
        self.push(FeedbackEvent::Start);
    }

    fn increment(&self, amount: Option<f64>) {
        self.push(FeedbackEvent::Increment(amount));
    }

    fn stop(&self) {
        self.push(FeedbackEvent::Stop);
    }
}

// ============================================================================
// TESTS
// ============================================================================
