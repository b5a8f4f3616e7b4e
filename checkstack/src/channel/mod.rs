//! Channel layer for pattern matching over an interactive shell.
//!
//! This module handles the expect/send exchange with a remote shell,
//! including tail-search prompt detection and ANSI stripping.

mod buffer;
mod expect;
pub mod patterns;
mod shell;

pub use buffer::PatternBuffer;
pub use expect::{ExpectChannel, ExpectConfig, Expectation};
pub use shell::ShellIo;
