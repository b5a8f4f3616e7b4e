//! # checkstack
//!
//! Collects StackWise cabling diagnostics from Cisco Catalyst switch
//! stacks that are only reachable through a jump host.
//!
//! One SSH connection to the jump host carries the whole run. For every
//! switch in the host list, checkstack pings it locally, opens a nested
//! `ssh` to it from the jump-host shell, captures the stack summaries and
//! each member's ring CRC error register, then returns to the jump-host
//! prompt for the next switch.
//!
//! ## Features
//!
//! - Async SSH to the jump host via russh, with known_hosts checking
//! - Expect-style prompt matching with per-prompt timeouts
//! - Explicit login state machine for nested switch shells
//! - Per-host failure isolation with prompt resynchronisation
//! - Append-only host transcripts and timestamped per-member dumps
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use checkstack::capture::ArtifactStore;
//! use checkstack::credentials::{self, TerminalPrompter};
//! use checkstack::reachability::ReachabilityStrategy;
//! use checkstack::{JumpHostSession, RunConfig, Runner, hostlist};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), checkstack::Error> {
//!     let config = RunConfig::builder().jump_host("bastion.example.net").build()?;
//!     let creds = credentials::collect(&mut TerminalPrompter, &config.jump_host, false)?;
//!
//!     let mut session = JumpHostSession::open(&config, &creds).await?;
//!     let probe = ReachabilityStrategy::from_mode(config.reachability);
//!     let store = ArtifactStore::new(&config.output_dir);
//!     let hosts = hostlist::read("switches.txt".as_ref())?;
//!
//!     let summary = Runner::new(&mut session, &probe, &store, &creds.switch)
//!         .run(&hosts)
//!         .await?;
//!     println!("{} stacks captured", summary.captured());
//!
//!     session.close().await
//! }
//! ```

pub mod capture;
pub mod channel;
pub mod config;
pub mod credentials;
pub mod error;
pub mod hostlist;
pub mod reachability;
pub mod runner;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use config::{FailurePolicy, RunConfig, RunConfigBuilder};
pub use error::{Error, Result};
pub use runner::{HostOutcome, HostResult, RunSummary, Runner};
pub use session::{JumpHostSession, SessionState};
