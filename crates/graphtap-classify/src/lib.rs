//! graphtap classifier
//!
//! Decides what kind of domain data an exchange carries.
//!
//! # Example
//!
//! ```
//! use graphtap_classify::Classifier;
//! use graphtap_model::{Category, MatchedBy};
//! use serde_json::json;
//!
//! let classifier = Classifier::builtin();
//! let c = classifier.classify(
//!     Some("/voyager/api/graphql?queryId=voyagerFeedDashMainFeed.abc123"),
//!     &json!({}),
//! );
//! assert_eq!(c.category, Category::Feed);
//! assert_eq!(c.matched_by, MatchedBy::Identifier);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod address;
mod classifier;
mod error;
mod shape;
mod tables;

pub use address::{
    extract_identifier, identifier_name, matches_pattern, query_param, split_address, Pattern,
};
pub use classifier::Classifier;
pub use error::ClassifyError;
pub use shape::{fingerprint, is_shape_bearing, ShapeMatch, ShapeRule, SHAPE_RULES};
pub use tables::{ClassifierTables, TableEntry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
