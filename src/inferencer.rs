use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{error, info, warn};

use crate::collaborators::{Inferencer, PrinterControl};

/// Default length of a warning cooldown.
pub const DEFAULT_COOLDOWN_SECONDS: i64 = 300;

/// Service-side state of the anomaly inferencer.
///
/// The detection model lives elsewhere and reports through
/// [`InferenceHandle::flag_anomaly`] and [`InferenceHandle::raise_warning`];
/// this handle tracks whether the service is running and answers the flag
/// queries the lifecycle controller makes.
pub struct InferenceHandle {
    printer: Arc<dyn PrinterControl>,
    running: AtomicBool,
    triggered: AtomicBool,
    warning: AtomicBool,
    cooldown: chrono::Duration,
    cooldown_until: Mutex<Option<DateTime<Utc>>>,
}

impl InferenceHandle {
    pub fn new(printer: Arc<dyn PrinterControl>) -> Self {
        Self::with_cooldown(printer, chrono::Duration::seconds(DEFAULT_COOLDOWN_SECONDS))
    }

    pub fn with_cooldown(printer: Arc<dyn PrinterControl>, cooldown: chrono::Duration) -> Self {
        Self {
            printer,
            running: AtomicBool::new(false),
            triggered: AtomicBool::new(false),
            warning: AtomicBool::new(false),
            cooldown,
            cooldown_until: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Called by the model when an anomaly crosses the action threshold.
    /// Ignored while the service is stopped.
    pub fn flag_anomaly(&self) {
        if self.is_running() {
            warn!("Anomaly flagged by inferencer");
            self.triggered.store(true, Ordering::Release);
        }
    }

    /// Called by the model when an anomaly crosses the notification
    /// threshold. Returns whether a warning is now shown; warnings raised
    /// during a cooldown are dropped.
    pub fn raise_warning(&self) -> bool {
        self.raise_warning_at(Utc::now())
    }

    pub fn raise_warning_at(&self, now: DateTime<Utc>) -> bool {
        if self.in_cooldown_at(now) {
            return false;
        }
        self.warning.store(true, Ordering::Release);
        true
    }

    pub fn clear_warning(&self) {
        self.warning.store(false, Ordering::Release);
    }

    pub fn in_cooldown_at(&self, now: DateTime<Utc>) -> bool {
        let until = *self.lock_cooldown();
        until.is_some_and(|until| now < until)
    }

    fn begin_cooldown_at(&self, now: DateTime<Utc>) {
        *self.lock_cooldown() = Some(now + self.cooldown);
        self.warning.store(false, Ordering::Release);
        info!("Warning cooldown active for {}s", self.cooldown.num_seconds());
    }

    fn lock_cooldown(&self) -> std::sync::MutexGuard<'_, Option<DateTime<Utc>>> {
        self.cooldown_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inferencer for InferenceHandle {
    fn start_service(&self) {
        // A fresh monitoring session starts untriggered.
        self.triggered.store(false, Ordering::Release);
        if !self.running.swap(true, Ordering::AcqRel) {
            info!("Inferencer started");
        }
    }

    fn kill_service(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("Inferencer stopped");
        }
    }

    fn shutoff_event(&self) {
        warn!("Anomaly response: pausing printer");
        if let Err(e) = self.printer.pause() {
            error!("Failed to pause printer: {}", e);
        }
    }

    fn begin_cooldown(&self) {
        self.begin_cooldown_at(Utc::now());
    }

    fn triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    fn warning_notification(&self) -> bool {
        self.warning.load(Ordering::Acquire)
    }
}
