//! Per-kind resolvers
//!
//! Each resolver recognizes its root records and turns one record into
//! zero or more entities. Recognition is by type tag when the record has
//! one, otherwise by the keys it carries.

use graphtap_model::{
    AnalyticsFigure, Category, Comment, ConnectionRecord, Entity, Post, Profile, RelationshipKind,
};
use serde_json::Value;

use crate::pool::{identity_of, reference_of, type_of, EntityPool};
use crate::strategies::{
    activity_timestamp, actor, engagement, epoch_millis, first_text, lenient_u64, media_kind,
    parse_human_number, picture_url, post_text, text_of,
};

/// Type-tag markers and untagged key groups identifying root records
#[derive(Debug, Clone, Copy)]
pub struct RootPattern {
    /// Case-insensitive type-tag substrings
    pub type_markers: &'static [&'static str],
    /// Key groups; an untagged record carrying every key of one group matches
    pub key_groups: &'static [&'static [&'static str]],
}

impl RootPattern {
    /// Whether a record is a root for this pattern
    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        if !record.is_object() {
            return false;
        }
        match type_of(record) {
            Some(tag) => {
                let tag = tag.to_ascii_lowercase();
                self.type_markers
                    .iter()
                    .any(|marker| tag.contains(&marker.to_ascii_lowercase()))
            }
            None => self
                .key_groups
                .iter()
                .any(|group| group.iter().all(|key| record.get(*key).is_some())),
        }
    }
}

/// Resolver for one entity kind
///
/// Implement this trait to teach the resolver a new record family.
pub trait KindResolver: Send + Sync + 'static {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether this resolver runs for a category
    fn handles(&self, category: Category) -> bool;

    /// Root-record pattern
    fn root_pattern(&self) -> RootPattern;

    /// Resolve one root record
    ///
    /// Returns nothing when the record has no identity and no usable text.
    fn resolve(&self, pool: &EntityPool<'_>, record: &Value) -> Vec<Entity>;
}

/// Posts (feed updates, authored content)
#[derive(Debug, Clone, Copy, Default)]
pub struct PostResolver;

impl KindResolver for PostResolver {
    fn name(&self) -> &'static str {
        "post"
    }

    fn handles(&self, category: Category) -> bool {
        matches!(category, Category::Feed | Category::AuthoredContent)
    }

    fn root_pattern(&self) -> RootPattern {
        RootPattern {
            type_markers: &["feed.Update", "ugcPost", "feed.Share"],
            key_groups: &[
                &["actor", "commentary"],
                &["*actor", "commentary"],
                &["actor", "*socialDetail"],
                &["*actor", "*socialDetail"],
                &["resharedUpdate"],
                &["*resharedUpdate"],
            ],
        }
    }

    fn resolve(&self, pool: &EntityPool<'_>, record: &Value) -> Vec<Entity> {
        let identity = identity_of(record).map(str::to_string);
        let text = post_text(pool, record);
        if identity.is_none() && text.is_none() {
            return Vec::new();
        }
        let author = actor(pool, record, "actor");
        let published_at = epoch_millis(record, &["publishedAt", "createdAt", "created.time"])
            .or_else(|| identity.as_deref().and_then(activity_timestamp));
        vec![Entity::Post(Post {
            identity,
            author_ref: author.reference,
            author_name: author.name,
            text,
            engagement: engagement(pool, record),
            media_kind: media_kind(pool, record),
            published_at,
        })]
    }
}

/// Comments and replies
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentResolver;

impl CommentResolver {
    /// Parent reference: parent comment, thread, then the commented update
    fn parent_ref(record: &Value, identity: Option<&str>) -> Option<String> {
        ["parentComment", "parentCommentUrn", "thread", "threadUrn", "update", "updateUrn"]
            .iter()
            .find_map(|key| reference_of(record, key))
            .map(str::to_string)
            .or_else(|| identity.and_then(commented_update))
    }
}

/// Second element of a `(commentId,urn:...)` tuple identity
fn commented_update(identity: &str) -> Option<String> {
    let inner = identity.split_once('(')?.1.strip_suffix(')')?;
    let (_, target) = inner.split_once(',')?;
    let target = target.trim();
    target.starts_with("urn:").then(|| target.to_string())
}

impl KindResolver for CommentResolver {
    fn name(&self) -> &'static str {
        "comment"
    }

    fn handles(&self, category: Category) -> bool {
        matches!(
            category,
            Category::Feed | Category::AuthoredContent | Category::Comments
        )
    }

    fn root_pattern(&self) -> RootPattern {
        RootPattern {
            type_markers: &["social.Comment"],
            key_groups: &[&["commenter"], &["*commenter"]],
        }
    }

    fn resolve(&self, pool: &EntityPool<'_>, record: &Value) -> Vec<Entity> {
        let identity = identity_of(record).map(str::to_string);
        let text = first_text(record, &["commentary", "commentV2", "comment"]);
        if identity.is_none() && text.is_none() {
            return Vec::new();
        }
        let author = actor(pool, record, "commenter");
        vec![Entity::Comment(Comment {
            parent_ref: Self::parent_ref(record, identity.as_deref()),
            identity,
            author_ref: author.reference,
            author_name: author.name,
            text,
            like_count: engagement(pool, record).likes,
            created_at: epoch_millis(record, &["createdAt", "createdTime", "created.time"]),
        })]
    }
}

/// Member profiles
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileResolver;

impl KindResolver for ProfileResolver {
    fn name(&self) -> &'static str {
        "profile"
    }

    fn handles(&self, category: Category) -> bool {
        matches!(
            category,
            Category::Profile | Category::Network | Category::Invitations | Category::Search
        )
    }

    fn root_pattern(&self) -> RootPattern {
        RootPattern {
            type_markers: &["identity.profile.Profile", "MiniProfile", "EntityResultViewModel"],
            key_groups: &[&["firstName", "lastName"], &["publicIdentifier"]],
        }
    }

    fn resolve(&self, _pool: &EntityPool<'_>, record: &Value) -> Vec<Entity> {
        let identity = identity_of(record).map(str::to_string);
        let first_name = record.get("firstName").and_then(text_of);
        let last_name = record.get("lastName").and_then(text_of);
        let display_name = first_text(record, &["name", "title"]);
        if identity.is_none() && first_name.is_none() && last_name.is_none() && display_name.is_none() {
            return Vec::new();
        }
        vec![Entity::Profile(Profile {
            identity,
            first_name,
            last_name,
            display_name,
            headline: first_text(record, &["headline", "occupation", "description", "primarySubtitle"]),
            picture_url: picture_url(record),
            public_handle: record.get("publicIdentifier").and_then(text_of),
        })]
    }
}

/// Connection and follow records
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionResolver;

impl KindResolver for ConnectionResolver {
    fn name(&self) -> &'static str {
        "connection"
    }

    fn handles(&self, category: Category) -> bool {
        matches!(category, Category::Network | Category::Invitations)
    }

    fn root_pattern(&self) -> RootPattern {
        RootPattern {
            type_markers: &[
                "relationships.Connection",
                "FollowingState",
                "MemberRelationship",
                "invitation.Invitation",
            ],
            key_groups: &[
                &["connectedMember"],
                &["*connectedMember"],
                &["following", "followerCount"],
                &["*inviter"],
                &["*toMember"],
            ],
        }
    }

    fn resolve(&self, pool: &EntityPool<'_>, record: &Value) -> Vec<Entity> {
        let identity = identity_of(record).map(str::to_string);
        let following = record.get("following").and_then(Value::as_bool);
        let invitation = type_of(record)
            .is_some_and(|tag| tag.to_ascii_lowercase().contains("invitation"))
            || reference_of(record, "inviter").is_some()
            || reference_of(record, "toMember").is_some();
        let kind = match following {
            Some(true) => RelationshipKind::Following,
            Some(false) => RelationshipKind::FollowState,
            None if invitation => RelationshipKind::Invitation,
            None => RelationshipKind::Connection,
        };
        let peer_field = ["connectedMember", "followee", "member", "inviter", "toMember"]
            .into_iter()
            .find(|key| reference_of(record, key).is_some() || record.get(*key).is_some_and(Value::is_object));
        let peer = peer_field.map(|key| actor(pool, record, key)).unwrap_or_default();
        if identity.is_none() && peer.reference.is_none() {
            return Vec::new();
        }
        vec![Entity::Connection(ConnectionRecord {
            identity,
            kind,
            peer_ref: peer.reference,
            peer_name: peer.name,
            established_at: epoch_millis(record, &["createdAt", "connectedAt", "sentTime"]),
            following,
            follower_count: record.get("followerCount").and_then(lenient_u64),
        })]
    }
}

/// Analytics cards and metric records
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsResolver;

/// Numeric metric keys carried by analytics-typed records
pub const METRIC_KEYS: [&str; 8] = [
    "numViews",
    "numProfileViews",
    "impressionCount",
    "uniqueImpressionsCount",
    "clickCount",
    "engagementRate",
    "searchAppearances",
    "followerGains",
];

impl AnalyticsResolver {
    fn card(record: &Value, source_ref: Option<&str>) -> Option<Entity> {
        let metric_name = first_text(record, &["title", "header", "metricName"])?;
        let raw = record.get("value").or_else(|| record.get("metricValue"))?;
        let value = match raw {
            Value::Number(n) => n.as_f64()?,
            other => parse_human_number(&text_of(other)?)?,
        };
        Some(Entity::Analytics(AnalyticsFigure {
            metric_name,
            value,
            period_label: first_text(record, &["timeRange", "subtitle", "period", "insight"]),
            source_ref: source_ref.map(str::to_string),
        }))
    }
}

impl KindResolver for AnalyticsResolver {
    fn name(&self) -> &'static str {
        "analytics"
    }

    fn handles(&self, category: Category) -> bool {
        matches!(category, Category::Analytics)
    }

    fn root_pattern(&self) -> RootPattern {
        RootPattern {
            type_markers: &["analytics", "wvmp"],
            key_groups: &[
                &["title", "value"],
                &["numViews"],
                &["impressionCount"],
                &["numProfileViews"],
            ],
        }
    }

    fn resolve(&self, _pool: &EntityPool<'_>, record: &Value) -> Vec<Entity> {
        let source_ref = identity_of(record);
        if let Some(card) = Self::card(record, source_ref) {
            return vec![card];
        }
        METRIC_KEYS
            .iter()
            .filter_map(|key| {
                let value = record.get(*key)?.as_f64()?;
                Some(Entity::Analytics(AnalyticsFigure {
                    metric_name: (*key).to_string(),
                    value,
                    period_label: first_text(record, &["timeRange", "period"]),
                    source_ref: source_ref.map(str::to_string),
                }))
            })
            .collect()
    }
}
