//! graphtap command line support
//!
//! Input formats and replay driving for the `graphtap` binary.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod har;
mod logging;
mod replay;

pub use har::{parse_har, HarContent, HarEntry, HarFile, HarLog, HarRequest, HarResponse};
pub use logging::{init_tracing, DEFAULT_FILTER};
pub use replay::{load, parse_jsonl, replay, ReplayFormat, ReplayReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
