//! Precedence-ordered classifier
//!
//! Stages, first match wins:
//!
//! 1. identifier: per-call identifier from a query parameter
//! 2. exclusion: administrative traffic, authoritative
//! 3. address heuristic: ordered path fragments
//! 4. shape heuristic: only when no address stage produced a signal
//!
//! Nothing matched means `unclassified`.

use graphtap_model::{CapturedExchange, Category, Classification, MatchedBy};
use serde_json::Value;
use tracing::trace;

use crate::address::{extract_identifier, identifier_name, split_address, Pattern};
use crate::error::ClassifyError;
use crate::shape;
use crate::tables::{ClassifierTables, TableEntry};

#[derive(Debug, Clone)]
struct CompiledEntry {
    pattern: Pattern,
    category: Category,
}

impl CompiledEntry {
    fn compile(entries: &[TableEntry]) -> Vec<Self> {
        entries
            .iter()
            .map(|entry| Self {
                pattern: Pattern::new(&entry.pattern),
                category: entry.category,
            })
            .collect()
    }
}

/// Classifier over a fixed set of tables
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Classifier {
    tables: ClassifierTables,
    identifiers: Vec<CompiledEntry>,
    exclusions: Vec<Pattern>,
    fragments: Vec<CompiledEntry>,
    api_markers: Vec<Pattern>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Classifier {
    /// Build a classifier from validated tables
    ///
    /// # Errors
    /// Returns the first table validation error
    pub fn new(tables: ClassifierTables) -> Result<Self, ClassifyError> {
        tables.validate()?;
        Ok(Self::compile(tables))
    }

    /// Classifier over the curated built-in tables
    #[must_use]
    pub fn builtin() -> Self {
        Self::compile(ClassifierTables::builtin())
    }

    fn compile(tables: ClassifierTables) -> Self {
        Self {
            identifiers: CompiledEntry::compile(&tables.identifiers),
            exclusions: tables.exclusions.iter().map(|p| Pattern::new(p)).collect(),
            fragments: CompiledEntry::compile(&tables.fragments),
            api_markers: tables.api_markers.iter().map(|p| Pattern::new(p)).collect(),
            tables,
        }
    }

    /// Tables this classifier was built from
    #[inline]
    #[must_use]
    pub fn tables(&self) -> &ClassifierTables {
        &self.tables
    }

    /// Classify an exchange
    #[must_use]
    pub fn classify_exchange(&self, exchange: &CapturedExchange) -> Classification {
        self.classify(exchange.address(), &exchange.payload)
    }

    /// Classify a payload observed at an optional address
    #[must_use]
    pub fn classify(&self, address: Option<&str>, payload: &Value) -> Classification {
        if let Some(found) = address.and_then(|a| self.classify_address(a)) {
            return found;
        }
        match self.match_shape(payload) {
            Some(found) => found,
            None => {
                trace!(address = address.unwrap_or(""), "no stage matched");
                Classification::unclassified()
            }
        }
    }

    /// Run the address stages (identifier, exclusion, fragment)
    #[must_use]
    pub fn classify_address(&self, address: &str) -> Option<Classification> {
        self.match_identifier(address)
            .or_else(|| self.match_exclusion(address))
            .or_else(|| self.match_fragment(address))
    }

    /// Stage 1: identifier table lookup
    #[must_use]
    pub fn match_identifier(&self, address: &str) -> Option<Classification> {
        let identifier = extract_identifier(address, &self.tables.identifier_params)?;
        let name = identifier_name(&identifier).to_ascii_lowercase();
        let hit = self
            .identifiers
            .iter()
            .find(|entry| entry.pattern.matches_lowercase(&name));
        if hit.is_none() {
            trace!(identifier = %identifier, "identifier not in table");
        }
        hit.map(|entry| {
            Classification::new(entry.category, MatchedBy::Identifier)
                .with_rule(entry.pattern.as_str())
        })
    }

    /// Stage 2: exclusion list
    #[must_use]
    pub fn match_exclusion(&self, address: &str) -> Option<Classification> {
        let lower = address.to_ascii_lowercase();
        self.exclusions
            .iter()
            .find(|pattern| pattern.matches_lowercase(&lower))
            .map(|pattern| {
                Classification::new(Category::Excluded, MatchedBy::Exclusion)
                    .with_rule(pattern.as_str())
            })
    }

    /// Stage 3: address fragment table over the path
    #[must_use]
    pub fn match_fragment(&self, address: &str) -> Option<Classification> {
        let (path, _) = split_address(address);
        let lower = path.to_ascii_lowercase();
        self.fragments
            .iter()
            .find(|entry| entry.pattern.matches_lowercase(&lower))
            .map(|entry| {
                Classification::new(entry.category, MatchedBy::AddressHeuristic)
                    .with_rule(entry.pattern.as_str())
            })
    }

    /// Stage 4: payload shape fingerprint
    #[must_use]
    pub fn match_shape(&self, payload: &Value) -> Option<Classification> {
        shape::fingerprint(payload).map(|found| {
            Classification::new(found.category, MatchedBy::ShapeHeuristic).with_rule(found.rule)
        })
    }

    /// Whether an address is worth remembering for correlation
    ///
    /// Excluded addresses never are. Otherwise the address must hit the
    /// identifier or fragment table, or carry an API marker.
    #[must_use]
    pub fn is_relevant_address(&self, address: &str) -> bool {
        if self.match_exclusion(address).is_some() {
            return false;
        }
        if self.match_identifier(address).is_some() || self.match_fragment(address).is_some() {
            return true;
        }
        let lower = address.to_ascii_lowercase();
        self.api_markers
            .iter()
            .any(|marker| marker.matches_lowercase(&lower))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FEED: &str = "https://www.linkedin.com/voyager/api/graphql?variables=(start:0)&queryId=voyagerFeedDashMainFeed.abc123";

    #[test]
    fn identifier_stage() {
        let c = Classifier::builtin().classify(Some(FEED), &json!({}));
        assert_eq!(c.category, Category::Feed);
        assert_eq!(c.matched_by, MatchedBy::Identifier);
        assert_eq!(c.rule.as_deref(), Some("voyagerFeedDashMainFeed"));
    }

    #[test]
    fn decoration_identifier_is_consulted() {
        let address = "/voyager/api/identity/dash/profiles?decorationId=com.linkedin.voyager.dash.deco.identity.profile.FullProfile-76";
        let c = Classifier::builtin().classify(Some(address), &json!({}));
        assert_eq!(c.category, Category::Profile);
        assert_eq!(c.matched_by, MatchedBy::Identifier);
    }

    #[test]
    fn fragment_stage_prefers_specific() {
        let classifier = Classifier::builtin();
        let c = classifier.classify(Some("/voyager/api/feed/comments?count=10"), &json!({}));
        assert_eq!(c.category, Category::Comments);
        assert_eq!(c.matched_by, MatchedBy::AddressHeuristic);

        let c = classifier.classify(Some("/voyager/api/identity/profiles/abc/posts"), &json!({}));
        assert_eq!(c.category, Category::AuthoredContent);

        let c = classifier.classify(Some("/voyager/api/identity/profiles/abc"), &json!({}));
        assert_eq!(c.category, Category::Profile);
    }

    #[test]
    fn unknown_identifier_falls_through() {
        let c = Classifier::builtin().classify(
            Some("/voyager/api/graphql?queryId=voyagerSomethingNew.1a2b"),
            &json!({}),
        );
        assert_eq!(c, Classification::unclassified());
    }

    #[test]
    fn shape_stage_when_address_silent() {
        let payload = json!({"included": [{"$type": "com.linkedin.voyager.dash.feed.Update", "updateMetadata": {}}]});
        let c = Classifier::builtin().classify(None, &payload);
        assert_eq!(c.category, Category::Feed);
        assert_eq!(c.matched_by, MatchedBy::ShapeHeuristic);
    }

    #[test]
    fn relevance_filter() {
        let classifier = Classifier::builtin();
        assert!(classifier.is_relevant_address(FEED));
        assert!(classifier.is_relevant_address("/voyager/api/messaging/conversations"));
        assert!(!classifier.is_relevant_address("/li/track?x=1"));
        assert!(!classifier.is_relevant_address("https://static.example.com/app.js"));
    }

    #[test]
    fn new_rejects_invalid_tables() {
        let mut tables = ClassifierTables::empty();
        tables.register_exclusion("");
        assert!(Classifier::new(tables).is_err());
    }

    #[test]
    fn custom_tables_change_mapping() {
        let mut tables = ClassifierTables::builtin();
        tables.prepend_identifier("voyagerFeedDashMainFeed", Category::Events);
        let classifier = Classifier::new(tables).unwrap();
        assert_eq!(classifier.classify(Some(FEED), &json!({})).category, Category::Events);
    }
}
