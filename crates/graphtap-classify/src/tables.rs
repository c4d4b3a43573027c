//! Classifier tables
//!
//! Pure data: swapping tables changes what gets classified as what, never
//! how the precedence chain runs. The built-in tables are curated from the
//! host's observed traffic; order inside each table matters (first match
//! wins), so more specific patterns come first.

use graphtap_model::Category;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;

/// One pattern → category mapping
///
/// Patterns are ASCII case-insensitive substrings; `*` separates pieces that
/// must appear in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub pattern: String,
    pub category: Category,
}

impl TableEntry {
    /// Create new entry
    #[inline]
    #[must_use]
    pub fn new(pattern: impl Into<String>, category: Category) -> Self {
        Self {
            pattern: pattern.into(),
            category,
        }
    }
}

/// All data the classifier consults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierTables {
    /// Query parameters carrying the per-call identifier, in lookup order
    pub identifier_params: Vec<String>,
    /// Identifier-name substring → category
    pub identifiers: Vec<TableEntry>,
    /// Address substrings of administrative traffic
    pub exclusions: Vec<String>,
    /// Address fragment → category, specific before generic
    pub fragments: Vec<TableEntry>,
    /// Address substrings marking the host's data API, for correlation relevance
    pub api_markers: Vec<String>,
}

impl Default for ClassifierTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ClassifierTables {
    /// Create empty tables with the default identifier parameters
    #[must_use]
    pub fn empty() -> Self {
        Self {
            identifier_params: default_identifier_params(),
            identifiers: Vec::new(),
            exclusions: Vec::new(),
            fragments: Vec::new(),
            api_markers: Vec::new(),
        }
    }

    /// Curated built-in tables
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            identifier_params: default_identifier_params(),
            identifiers: entries(BUILTIN_IDENTIFIERS),
            exclusions: BUILTIN_EXCLUSIONS.iter().map(|s| (*s).to_string()).collect(),
            fragments: entries(BUILTIN_FRAGMENTS),
            api_markers: BUILTIN_API_MARKERS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Register an identifier mapping (appended, lowest priority)
    pub fn register_identifier(&mut self, pattern: impl Into<String>, category: Category) {
        self.identifiers.push(TableEntry::new(pattern, category));
    }

    /// Register an identifier mapping ahead of all others
    pub fn prepend_identifier(&mut self, pattern: impl Into<String>, category: Category) {
        self.identifiers.insert(0, TableEntry::new(pattern, category));
    }

    /// Register an exclusion substring
    pub fn register_exclusion(&mut self, pattern: impl Into<String>) {
        self.exclusions.push(pattern.into());
    }

    /// Remove an exclusion substring
    pub fn remove_exclusion(&mut self, pattern: &str) -> bool {
        let before = self.exclusions.len();
        self.exclusions.retain(|p| p != pattern);
        before != self.exclusions.len()
    }

    /// Register an address fragment mapping (appended, lowest priority)
    pub fn register_fragment(&mut self, pattern: impl Into<String>, category: Category) {
        self.fragments.push(TableEntry::new(pattern, category));
    }

    /// Register an address fragment mapping ahead of all others
    pub fn prepend_fragment(&mut self, pattern: impl Into<String>, category: Category) {
        self.fragments.insert(0, TableEntry::new(pattern, category));
    }

    /// Check the tables are usable
    ///
    /// # Errors
    /// - `ClassifyError::NoIdentifierParams` if no identifier parameter is set
    /// - `ClassifyError::EmptyPattern` for any empty pattern
    /// - `ClassifyError::NonDomainCategory` if a table maps to `excluded`/`unclassified`
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.identifier_params.iter().all(|p| p.trim().is_empty()) {
            return Err(ClassifyError::NoIdentifierParams);
        }
        check_entries("identifier", &self.identifiers)?;
        check_entries("fragment", &self.fragments)?;
        if let Some(index) = self.exclusions.iter().position(|p| p.trim().is_empty()) {
            return Err(ClassifyError::empty_pattern("exclusion", index));
        }
        if let Some(index) = self.api_markers.iter().position(|p| p.trim().is_empty()) {
            return Err(ClassifyError::empty_pattern("api-marker", index));
        }
        Ok(())
    }
}

fn check_entries(table: &'static str, entries: &[TableEntry]) -> Result<(), ClassifyError> {
    for (index, entry) in entries.iter().enumerate() {
        if entry.pattern.trim().is_empty() {
            return Err(ClassifyError::empty_pattern(table, index));
        }
        if !entry.category.is_domain() {
            return Err(ClassifyError::NonDomainCategory {
                table,
                pattern: entry.pattern.clone(),
                category: entry.category.to_string(),
            });
        }
    }
    Ok(())
}

fn default_identifier_params() -> Vec<String> {
    vec!["queryId".to_string(), "decorationId".to_string()]
}

fn entries(raw: &[(&str, Category)]) -> Vec<TableEntry> {
    raw.iter()
        .map(|(pattern, category)| TableEntry::new(*pattern, *category))
        .collect()
}

const BUILTIN_IDENTIFIERS: &[(&str, Category)] = &[
    ("analytics", Category::Analytics),
    ("voyagerIdentityDashWvmp", Category::Analytics),
    ("voyagerFeedDashProfileUpdates", Category::AuthoredContent),
    ("voyagerFeedDashRecentActivity", Category::AuthoredContent),
    ("voyagerFeedDashMainFeed", Category::Feed),
    ("voyagerFeedDashUpdates", Category::Feed),
    ("voyagerSocialDashComments", Category::Comments),
    ("voyagerSocialDashReplies", Category::Comments),
    ("voyagerSocialDashReactions", Category::Reactions),
    ("voyagerSocialDashReactors", Category::Reactions),
    ("messengerConversations", Category::Messaging),
    ("messengerMessages", Category::Messaging),
    ("voyagerMessagingDash", Category::Messaging),
    ("voyagerRelationshipsDashInvitation", Category::Invitations),
    ("voyagerRelationshipsDashConnections", Category::Network),
    ("voyagerRelationshipsDashFollow", Category::Network),
    ("voyagerRelationshipsDashMemberRelationships", Category::Network),
    ("voyagerIdentityDashProfiles", Category::Profile),
    ("voyagerIdentityDashProfileCards", Category::Profile),
    ("voyagerIdentityDashProfileComponents", Category::Profile),
    ("voyagerNotificationsDash", Category::Notifications),
    ("voyagerSearchDash", Category::Search),
    ("voyagerJobsDash", Category::Jobs),
    ("voyagerOrganizationDash", Category::Organization),
    ("voyagerLearningDash", Category::Learning),
    ("voyagerEventsDash", Category::Events),
    ("deco.social.comment", Category::Comments),
    ("deco.feed", Category::Feed),
    ("deco.relationships.invitation", Category::Invitations),
    ("deco.relationships", Category::Network),
    ("deco.identity.profile", Category::Profile),
    ("voyagerFeedDash", Category::Feed),
];

const BUILTIN_EXCLUSIONS: &[&str] = &[
    "thirdpartyidsync",
    "/li/track",
    "/litms/",
    "/sensorcollect",
    "/csp/",
    "/tscp-serving/",
    "lixtreatments",
    "/lix/",
    "/voyagerlaunchpad",
    "/onboarding",
    "experimentassignment",
    "/platform-telemetry",
    "/telemetry",
    "/beacon",
    "/pixel",
    "/realtime/connectivitytracking",
];

const BUILTIN_FRAGMENTS: &[(&str, Category)] = &[
    ("/identity/profileUpdates", Category::AuthoredContent),
    ("/identity/*/posts", Category::AuthoredContent),
    ("/recent-activity", Category::AuthoredContent),
    ("/feed/comments", Category::Comments),
    ("/socialActions/*/comments", Category::Comments),
    ("/voyagerSocialDashComments", Category::Comments),
    ("/feed/reactions", Category::Reactions),
    ("/socialActions/*/likes", Category::Reactions),
    ("/voyagerSocialDashReactions", Category::Reactions),
    ("/feed/follows", Category::Network),
    ("/feed/updates", Category::Feed),
    ("/feed/", Category::Feed),
    ("/messaging/", Category::Messaging),
    ("/voyagerMessagingGraphQL", Category::Messaging),
    ("/relationships/invitation", Category::Invitations),
    ("/relationships/sentInvitation", Category::Invitations),
    ("/relationships/", Category::Network),
    ("/identity/wvmpCards", Category::Analytics),
    ("/identity/panels", Category::Analytics),
    ("/analytics", Category::Analytics),
    ("/notifications", Category::Notifications),
    ("/search/", Category::Search),
    ("/jobs/", Category::Jobs),
    ("/organization/", Category::Organization),
    ("/learning/", Category::Learning),
    ("/events/", Category::Events),
    ("/identity/", Category::Profile),
];

const BUILTIN_API_MARKERS: &[&str] = &["/voyager/api/", "/graphql", "/api/"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_validate() {
        let tables = ClassifierTables::builtin();
        assert!(tables.validate().is_ok());
        assert_eq!(tables.identifier_params, vec!["queryId", "decorationId"]);
    }

    #[test]
    fn validate_rejects_empty_pattern() {
        let mut tables = ClassifierTables::empty();
        tables.register_fragment("  ", Category::Feed);
        assert!(matches!(
            tables.validate(),
            Err(ClassifyError::EmptyPattern { table: "fragment", index: 0 })
        ));
    }

    #[test]
    fn validate_rejects_non_domain_category() {
        let mut tables = ClassifierTables::empty();
        tables.register_identifier("voyagerX", Category::Excluded);
        assert!(matches!(
            tables.validate(),
            Err(ClassifyError::NonDomainCategory { .. })
        ));
    }

    #[test]
    fn validate_requires_identifier_params() {
        let mut tables = ClassifierTables::empty();
        tables.identifier_params.clear();
        assert!(matches!(tables.validate(), Err(ClassifyError::NoIdentifierParams)));
    }

    #[test]
    fn register_and_remove_exclusion() {
        let mut tables = ClassifierTables::empty();
        tables.register_exclusion("/ads/");
        assert!(tables.remove_exclusion("/ads/"));
        assert!(!tables.remove_exclusion("/ads/"));
    }

    #[test]
    fn prepend_takes_priority() {
        let mut tables = ClassifierTables::builtin();
        tables.prepend_fragment("/feed/special", Category::Events);
        assert_eq!(tables.fragments[0].pattern, "/feed/special");
    }

    #[test]
    fn tables_deserialize_with_defaults() {
        let tables: ClassifierTables =
            serde_json::from_str(r#"{"exclusions": ["/only"]}"#).unwrap();
        assert_eq!(tables.exclusions, vec!["/only"]);
        assert!(!tables.identifiers.is_empty());
    }
}
