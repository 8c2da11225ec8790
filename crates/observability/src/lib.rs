//! Process-wide logging setup for stockroom binaries and tests.

pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
