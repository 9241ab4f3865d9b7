use crate::error::{MachineSurferError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Exit status used when the user interrupts a run.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Counts Ctrl+C presses. The first stops the run before its next unit,
/// so no partial workbook is written; the second exits immediately.
#[derive(Clone)]
pub struct GracefulShutdown {
    interrupts: Arc<AtomicUsize>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let shutdown = Self::new_for_test();
        let interrupts = shutdown.interrupts.clone();

        ctrlc::set_handler(move || {
            if interrupts.fetch_add(1, Ordering::SeqCst) == 0 {
                eprintln!("\nStopping before the next unit; no output will be written. Press Ctrl+C again to quit now.");
            } else {
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        })
        .map_err(|e| MachineSurferError::Config {
            message: format!("Failed to install Ctrl+C handler: {}", e),
        })?;

        Ok(shutdown)
    }

    /// No process-wide handler; only `request_shutdown` stops it.
    pub fn new_for_test() -> Self {
        Self {
            interrupts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst) == 0
    }

    pub fn check_shutdown(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(MachineSurferError::Cancelled)
        }
    }

    /// Same effect as a first Ctrl+C.
    pub fn request_shutdown(&self) {
        let _ = self
            .interrupts
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst);
    }
}
