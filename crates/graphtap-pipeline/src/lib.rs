//! graphtap capture pipeline
//!
//! Observes the host's I/O primitives, recovers missing request addresses,
//! classifies, deduplicates and resolves every captured exchange, and
//! publishes one [`ForwardedEvent`](graphtap_model::ForwardedEvent) per
//! admitted exchange.
//!
//! ```text
//! hooks ──► CaptureSink ──► Pipeline::process
//!                              ├─ correlate (CorrelationTracker)
//!                              ├─ classify  (Classifier)
//!                              ├─ dedup     (Deduplicator)
//!                              ├─ resolve   (EntityResolver)
//!                              └─ publish   (EventBus) ──► Subscription
//! ```
//!
//! # Example
//!
//! ```
//! use graphtap_model::{CapturedExchange, Category, HookOrigin};
//! use graphtap_pipeline::{Pipeline, PipelineConfig};
//! use serde_json::json;
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let exchange = CapturedExchange::new(HookOrigin::PrimaryCall, json!({"elements": []}), chrono::Utc::now())
//!     .with_address("/voyager/api/graphql?queryId=voyagerFeedDashMainFeed.abc123");
//! let outcome = pipeline.process(exchange);
//! assert_eq!(outcome.event().unwrap().category(), Category::Feed);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod bus;
mod clock;
mod config;
mod correlation;
mod dedup;
mod error;
mod intercept;
mod pipeline;

pub use bus::{EventBus, Subscription};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CorrelationConfig, DedupConfig, PipelineConfig, MAX_WINDOW_MS};
pub use correlation::{CorrelationTracker, TimingEntry};
pub use dedup::Deduplicator;
pub use error::{ConfigError, DecodeError, PipelineError, TransportError};
pub use intercept::{
    BufferedBody, CaptureSink, Deserializer, FetchRequest, FetchResponse, Guardian, HookSlot,
    HostHooks, HttpClient, Interceptor, JsonDeserializer, LegacyRequest, LegacyResponse,
    LoadCallback, Observable, ObservedBody, ObservedDeserializer, ObservedHttpClient,
    ObservedRequestFactory, ObservedWorkerChannel, Observation, RequestFactory, ResponseBody,
};
pub use pipeline::{Pipeline, PipelineHandle, PipelineOutcome, PipelineStats};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
