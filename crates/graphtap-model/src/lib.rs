//! graphtap model
//!
//! Shared vocabulary of the capture pipeline.
//!
//! # Core Concepts
//!
//! - [`CapturedExchange`]: one response observed by one hook
//! - [`Classification`]: the [`Category`] assigned to an exchange and the stage that chose it
//! - [`DedupKey`]: Blake3 hash over a bounded canonical prefix of a payload
//! - [`Entity`]: typed domain records resolved from a payload
//! - [`ForwardedEvent`]: what subscribers receive

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod classification;
mod entity;
mod error;
mod event;
mod exchange;
mod hash;

pub use classification::{Category, Classification, MatchedBy};
pub use entity::{
    AnalyticsFigure, Comment, ConnectionRecord, Engagement, Entity, MediaKind, Post, Profile,
    RelationshipKind, COMMENT_WEIGHT, LIKE_WEIGHT, SHARE_WEIGHT,
};
pub use error::ModelError;
pub use event::ForwardedEvent;
pub use exchange::{CapturedExchange, HookOrigin, HttpMethod};
pub use hash::{canonical_prefix, DedupKey};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
