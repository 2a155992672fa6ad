use crate::types::errors::TransferError;

/// One step of a single streaming fetch attempt.
///
/// A fetch yields any number of `Downloading` events followed by exactly
/// one terminal `Success` or `Error`.
#[derive(Debug)]
pub enum TransferEvent {
    /// `progress` is a percentage in `0..=100`, `bytes` the running byte count.
    Downloading { progress: u8, bytes: u64 },
    /// All bytes were written; carries the declared content length.
    Success { total_bytes: u64 },
    Error(TransferError),
}

impl TransferEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferEvent::Downloading { .. })
    }
}
