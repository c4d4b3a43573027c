//! Forwarded events published to external consumers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classification::{Category, Classification, MatchedBy};
use crate::entity::Entity;
use crate::exchange::{HookOrigin, HttpMethod};
use crate::hash::DedupKey;

/// One notification per forwarded exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardedEvent {
    /// Category and the stage that assigned it
    pub classification: Classification,
    /// Address of the originating request, direct or correlated
    pub origin_address: Option<String>,
    /// Whether `origin_address` was recovered by the correlation tracker
    pub address_correlated: bool,
    /// Hook that captured the exchange
    pub hook_origin: HookOrigin,
    /// Request method
    pub method: HttpMethod,
    /// When the exchange was observed
    pub observed_at: DateTime<Utc>,
    /// Dedup key the exchange was admitted under
    pub key: DedupKey,
    /// Entities resolved from the payload
    pub entities: Vec<Entity>,
    /// Untouched payload for consumers needing unresolved fields
    pub raw_payload: Value,
}

impl ForwardedEvent {
    /// Category shortcut
    #[inline]
    #[must_use]
    pub fn category(&self) -> Category {
        self.classification.category
    }

    /// Match stage shortcut
    #[inline]
    #[must_use]
    pub fn matched_by(&self) -> MatchedBy {
        self.classification.matched_by
    }

    /// Count entities of a kind (see [`Entity::kind`])
    #[must_use]
    pub fn count_kind(&self, kind: &str) -> usize {
        self.entities.iter().filter(|e| e.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Post;
    use serde_json::json;

    #[test]
    fn event_shortcuts() {
        let event = ForwardedEvent {
            classification: Classification::new(Category::Feed, MatchedBy::Identifier),
            origin_address: None,
            address_correlated: false,
            hook_origin: HookOrigin::DecodeJson,
            method: HttpMethod::Get,
            observed_at: Utc::now(),
            key: DedupKey::compute(b"x"),
            entities: vec![Entity::Post(Post::default()), Entity::Post(Post::default())],
            raw_payload: json!({}),
        };
        assert_eq!(event.category(), Category::Feed);
        assert_eq!(event.matched_by(), MatchedBy::Identifier);
        assert_eq!(event.count_kind("post"), 2);
        assert_eq!(event.count_kind("comment"), 0);
    }
}
