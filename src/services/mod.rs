// leech services
// Services implement behaviour: id derivation, conversions, transport, transfers, the worker, notifications, settings.

pub mod converter;
pub mod download_worker;
pub mod notifier;
pub mod settings_engine;
pub mod transfer_executor;
pub mod transport;
pub mod unique_id;
