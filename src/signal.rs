//! Ctrl+C handling.
//!
//! A single `Arc<AtomicBool>` is shared with the walker, the coordinator and
//! every partitioner. Pressing Ctrl+C sets it; each component stops at its
//! next check and releases whatever it holds open.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler that has not been triggered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request cancellation without a signal.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to [`FinderConfig::with_shutdown_flag`](crate::duplicates::FinderConfig::with_shutdown_flag).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error installing the Ctrl+C hook.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The `ctrlc` crate refused the handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: Mutex<Option<ShutdownHandler>> = Mutex::new(None);

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// The hook can only be registered once per process. Later calls return the
/// same handler with its flag cleared, so library users and tests may call
/// [`crate::run_app`] repeatedly.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if a Ctrl+C hook this module does
/// not own is already registered.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let mut installed = GLOBAL_HANDLER
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(ref handler) = *installed {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing open files...");
        log::info!("Shutdown signal received");
    })?;

    *installed = Some(handler.clone());
    Ok(handler)
}
