//! Download side-effect hooks.
//!
//! The engine never draws UI. It reports progress and outcomes through a
//! [`DownloadNotifier`], which a host application implements to show
//! notifications; [`LoggingNotifier`] just writes them to the log.

use tracing::info;

use crate::services::converter::format_file_size;
use crate::types::notification::NotificationTarget;

pub trait DownloadNotifier: Send + Sync {
    /// A running download advanced to `percent`.
    fn on_progress(&self, target: &NotificationTarget, percent: u8);
    /// A download finished, or was already complete when resubmitted.
    fn on_success(&self, target: &NotificationTarget, total_bytes: u64);
    fn on_failure(&self, target: &NotificationTarget);
    /// The download with `id` was cancelled by the caller; dismiss anything shown for it.
    fn on_cancel_requested(&self, id: i32);
}

/// Notifier that reports every hook through `tracing`.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

impl DownloadNotifier for LoggingNotifier {
    fn on_progress(&self, target: &NotificationTarget, percent: u8) {
        info!(id = target.id, file = %target.file_name, "Downloading {}: {}%", target.file_name, percent);
    }

    fn on_success(&self, target: &NotificationTarget, total_bytes: u64) {
        info!(
            id = target.id,
            file = %target.file_name,
            "Download successful ({}).",
            format_file_size(total_bytes)
        );
    }

    fn on_failure(&self, target: &NotificationTarget) {
        info!(id = target.id, file = %target.file_name, "Download failed.");
    }

    fn on_cancel_requested(&self, id: i32) {
        info!(id, "Download cancelled.");
    }
}
