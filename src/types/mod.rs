// leech shared type definitions
// Each submodule defines types used across the crate.

pub mod download;
pub mod errors;
pub mod job;
pub mod notification;
pub mod settings;
pub mod transfer;
