//! Categories and classification results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Domain category of a captured payload (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Feed,
    AuthoredContent,
    Comments,
    Reactions,
    Messaging,
    Profile,
    Network,
    Analytics,
    Notifications,
    Invitations,
    Search,
    Jobs,
    Organization,
    Learning,
    Events,
    /// Administrative traffic; authoritative, never re-classified
    Excluded,
    /// No stage produced a signal
    Unclassified,
}

impl Category {
    /// Every category, in declaration order
    pub const ALL: [Category; 17] = [
        Category::Feed,
        Category::AuthoredContent,
        Category::Comments,
        Category::Reactions,
        Category::Messaging,
        Category::Profile,
        Category::Network,
        Category::Analytics,
        Category::Notifications,
        Category::Invitations,
        Category::Search,
        Category::Jobs,
        Category::Organization,
        Category::Learning,
        Category::Events,
        Category::Excluded,
        Category::Unclassified,
    ];

    /// Stable kebab-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Feed => "feed",
            Category::AuthoredContent => "authored-content",
            Category::Comments => "comments",
            Category::Reactions => "reactions",
            Category::Messaging => "messaging",
            Category::Profile => "profile",
            Category::Network => "network",
            Category::Analytics => "analytics",
            Category::Notifications => "notifications",
            Category::Invitations => "invitations",
            Category::Search => "search",
            Category::Jobs => "jobs",
            Category::Organization => "organization",
            Category::Learning => "learning",
            Category::Events => "events",
            Category::Excluded => "excluded",
            Category::Unclassified => "unclassified",
        }
    }

    /// Whether this is a real domain category (not excluded/unclassified)
    #[inline]
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        !matches!(self, Category::Excluded | Category::Unclassified)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ModelError::UnknownCategory(s.to_string()))
    }
}

/// Which classifier stage produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchedBy {
    /// Per-call identifier table
    Identifier,
    /// Exclusion list
    Exclusion,
    /// Address fragment table
    AddressHeuristic,
    /// Payload shape fingerprints
    ShapeHeuristic,
    /// No stage matched
    None,
}

impl MatchedBy {
    /// Stable kebab-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MatchedBy::Identifier => "identifier",
            MatchedBy::Exclusion => "exclusion",
            MatchedBy::AddressHeuristic => "address-heuristic",
            MatchedBy::ShapeHeuristic => "shape-heuristic",
            MatchedBy::None => "none",
        }
    }
}

impl fmt::Display for MatchedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchedBy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            MatchedBy::Identifier,
            MatchedBy::Exclusion,
            MatchedBy::AddressHeuristic,
            MatchedBy::ShapeHeuristic,
            MatchedBy::None,
        ]
        .into_iter()
        .find(|m| m.as_str() == s)
        .ok_or_else(|| ModelError::UnknownMatchStage(s.to_string()))
    }
}

/// Result of classifying one exchange
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    /// Assigned category
    pub category: Category,
    /// Stage that decided it
    pub matched_by: MatchedBy,
    /// Table entry or fingerprint that matched, for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl Classification {
    /// Create new classification
    #[inline]
    #[must_use]
    pub fn new(category: Category, matched_by: MatchedBy) -> Self {
        Self {
            category,
            matched_by,
            rule: None,
        }
    }

    /// With the rule that matched
    #[inline]
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// The `unclassified` result
    #[inline]
    #[must_use]
    pub fn unclassified() -> Self {
        Self::new(Category::Unclassified, MatchedBy::None)
    }

    /// Whether the exchange was excluded
    #[inline]
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.category == Category::Excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names_roundtrip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn category_serde_matches_as_str() {
        let encoded = serde_json::to_string(&Category::AuthoredContent).unwrap();
        assert_eq!(encoded, "\"authored-content\"");
    }

    #[test]
    fn domain_categories() {
        assert!(Category::Feed.is_domain());
        assert!(!Category::Excluded.is_domain());
        assert!(!Category::Unclassified.is_domain());
    }

    #[test]
    fn classification_builder() {
        let c = Classification::new(Category::Feed, MatchedBy::Identifier).with_rule("voyagerFeedDash");
        assert_eq!(c.rule.as_deref(), Some("voyagerFeedDash"));
        assert!(!c.is_excluded());
        assert_eq!(Classification::unclassified().matched_by, MatchedBy::None);
    }

    #[test]
    fn matched_by_parse() {
        assert_eq!("shape-heuristic".parse::<MatchedBy>().unwrap(), MatchedBy::ShapeHeuristic);
        assert!("guess".parse::<MatchedBy>().is_err());
    }
}
