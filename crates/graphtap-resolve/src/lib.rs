//! graphtap entity resolver
//!
//! Decodes normalized graph payloads (a flat `included` pool of typed
//! records plus reference strings into it) into typed domain entities.
//!
//! # Core Concepts
//!
//! - [`EntityPool`]: the payload's records indexed by identity
//! - [`KindResolver`]: recognizes and resolves one record family
//! - [`EntityResolver`]: runs the kinds a category calls for
//!
//! Resolution is lenient: a malformed field degrades one entity, never the
//! batch.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod kinds;
mod pool;
mod resolver;
mod strategies;

pub use error::{json_kind, ResolveError};
pub use kinds::{
    AnalyticsResolver, CommentResolver, ConnectionResolver, KindResolver, PostResolver,
    ProfileResolver, RootPattern, METRIC_KEYS,
};
pub use pool::{
    get_path, identity_of, reference_of, type_of, EntityPool, IDENTITY_KEYS, REFERENCE_PREFIX,
    TYPE_KEYS,
};
pub use resolver::EntityResolver;
pub use strategies::{
    activity_timestamp, actor, engagement, epoch_millis, first_text, lenient_u64, media_kind,
    parse_human_number, person_name, picture_url, post_text, text_of, ActorInfo,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
