//! Resolved domain entities
//!
//! One stable shape per entity kind, independent of which host schema
//! revision the data was decoded from. Every field the host might omit is
//! optional or defaults to zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weight of a like in the engagement score
pub const LIKE_WEIGHT: u64 = 1;
/// Weight of a comment in the engagement score
pub const COMMENT_WEIGHT: u64 = 2;
/// Weight of a share in the engagement score
pub const SHARE_WEIGHT: u64 = 3;

/// Social engagement counts with a derived weighted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    /// `likes + 2 * comments + 3 * shares`
    pub score: u64,
}

impl Engagement {
    /// Create engagement and compute its score
    #[must_use]
    pub fn new(likes: u64, comments: u64, shares: u64) -> Self {
        let score = likes
            .saturating_mul(LIKE_WEIGHT)
            .saturating_add(comments.saturating_mul(COMMENT_WEIGHT))
            .saturating_add(shares.saturating_mul(SHARE_WEIGHT));
        Self {
            likes,
            comments,
            shares,
            score,
        }
    }

    /// Total raw interactions
    #[inline]
    #[must_use]
    pub fn total(&self) -> u64 {
        self.likes
            .saturating_add(self.comments)
            .saturating_add(self.shares)
    }
}

/// Kind of media attached to a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    /// Text only
    #[default]
    None,
    Image,
    Video,
    Article,
    Document,
    Poll,
    Event,
    Celebration,
    /// Content present but of an unrecognized shape
    Other,
}

/// Authored post
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Post {
    pub identity: Option<String>,
    pub author_ref: Option<String>,
    pub author_name: Option<String>,
    pub text: Option<String>,
    pub engagement: Engagement,
    pub media_kind: MediaKind,
    pub published_at: Option<DateTime<Utc>>,
}

/// Comment on a post or another comment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comment {
    pub identity: Option<String>,
    pub author_ref: Option<String>,
    pub author_name: Option<String>,
    pub text: Option<String>,
    pub parent_ref: Option<String>,
    pub like_count: u64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Actor or member profile
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub identity: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Display name when the host sends one pre-joined
    pub display_name: Option<String>,
    pub headline: Option<String>,
    pub picture_url: Option<String>,
    pub public_handle: Option<String>,
}

impl Profile {
    /// Best available full name
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => self.display_name.clone(),
        }
    }
}

/// Kind of relationship record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    /// Mutual connection
    #[default]
    Connection,
    /// The viewer follows the peer
    Following,
    /// Follow state whose direction the payload does not say
    FollowState,
    /// Pending invitation to connect
    Invitation,
}

/// Connection or follow relationship
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub identity: Option<String>,
    pub kind: RelationshipKind,
    pub peer_ref: Option<String>,
    pub peer_name: Option<String>,
    pub established_at: Option<DateTime<Utc>>,
    pub following: Option<bool>,
    pub follower_count: Option<u64>,
}

/// One analytics figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsFigure {
    pub metric_name: String,
    pub value: f64,
    pub period_label: Option<String>,
    /// Identity of the record the figure came from
    pub source_ref: Option<String>,
}

/// Any resolved entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Entity {
    Post(Post),
    Comment(Comment),
    Profile(Profile),
    Connection(ConnectionRecord),
    Analytics(AnalyticsFigure),
}

impl Entity {
    /// Identity of the entity, when it has one
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        match self {
            Entity::Post(p) => p.identity.as_deref(),
            Entity::Comment(c) => c.identity.as_deref(),
            Entity::Profile(p) => p.identity.as_deref(),
            Entity::Connection(c) => c.identity.as_deref(),
            Entity::Analytics(a) => a.source_ref.as_deref(),
        }
    }

    /// Short kind name
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Entity::Post(_) => "post",
            Entity::Comment(_) => "comment",
            Entity::Profile(_) => "profile",
            Entity::Connection(_) => "connection",
            Entity::Analytics(_) => "analytics",
        }
    }
}
