//! Stack inventory and diagnostics capture for one switch.

pub mod artifacts;
mod diagnostics;
mod inventory;

pub use artifacts::{ArtifactStore, HostLog};
pub use diagnostics::{
    CaptureReport, REGISTER_READ, SEPARATOR, SUMMARY_COMMANDS, capture_host, register_read_command,
};
pub use inventory::{parse_members, stack_members};
