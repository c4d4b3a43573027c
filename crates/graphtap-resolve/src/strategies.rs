//! Field extraction strategies
//!
//! The host has shipped several naming schemes for the same fields. Each
//! helper here tries a fixed list of strategies in order and takes the first
//! usable value; a missing or malformed field yields `None`, never an error.

use chrono::{DateTime, Utc};
use graphtap_model::{Engagement, MediaKind};
use serde_json::Value;

use crate::pool::{get_path, identity_of, reference_of, EntityPool};

/// Text paths of a post, in preference order
const POST_TEXT_PATHS: [&str; 6] = [
    "commentary",
    "commentaryV2",
    "content.shareText",
    "shareText",
    "summary",
    "updateMetadata.shareText",
];

/// Count keys, in preference order
const LIKE_KEYS: [&str; 3] = ["numLikes", "likeCount", "reactionCount"];
const COMMENT_KEYS: [&str; 2] = ["numComments", "commentCount"];
const SHARE_KEYS: [&str; 3] = ["numShares", "shareCount", "repostCount"];

/// Fields of an inline actor pointing at its profile
const PROFILE_FIELDS: [&str; 3] = ["profile", "miniProfile", "profileUrn"];

/// Identity segments followed by a time-ordered numeric id
const TIME_ORDERED_IDS: [&str; 3] = ["activity:", "ugcPost:", "share:"];

/// Media component key → kind
const MEDIA_COMPONENTS: [(&str, MediaKind); 9] = [
    ("imageComponent", MediaKind::Image),
    ("linkedInVideoComponent", MediaKind::Video),
    ("externalVideoComponent", MediaKind::Video),
    ("articleComponent", MediaKind::Article),
    ("documentComponent", MediaKind::Document),
    ("pollComponent", MediaKind::Poll),
    ("eventComponent", MediaKind::Event),
    ("celebrationComponent", MediaKind::Celebration),
    ("carouselComponent", MediaKind::Image),
];

/// Who authored a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorInfo {
    pub reference: Option<String>,
    pub name: Option<String>,
}

/// Non-empty text of a value
///
/// Accepts a plain string or an object whose `text` field (recursively)
/// is one.
#[must_use]
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Object(map) => map.get("text").and_then(text_of),
        _ => None,
    }
}

/// First non-empty text found at any of `paths`
#[must_use]
pub fn first_text(record: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| get_path(record, path).and_then(text_of))
}

/// Text of a post, falling back to the reshared update
#[must_use]
pub fn post_text(pool: &EntityPool<'_>, record: &Value) -> Option<String> {
    first_text(record, &POST_TEXT_PATHS).or_else(|| {
        pool.field(record, "resharedUpdate")
            .and_then(|reshared| first_text(reshared, &POST_TEXT_PATHS))
    })
}

/// Display name of a profile-like record
#[must_use]
pub fn person_name(record: &Value) -> Option<String> {
    if let Some(name) = first_text(record, &["name", "title"]) {
        return Some(name);
    }
    let first = record.get("firstName").and_then(text_of);
    let last = record.get("lastName").and_then(text_of);
    match (first, last) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (first, last) => first.or(last),
    }
}

/// Author of a record reachable through `field` (`actor`, `commenter`, ...)
///
/// Pool reference first, then the inline object, which may itself point at
/// a pooled profile.
#[must_use]
pub fn actor(pool: &EntityPool<'_>, record: &Value, field: &str) -> ActorInfo {
    let direct_ref = reference_of(record, field).map(str::to_string);
    let Some(actor) = pool.field(record, field) else {
        return ActorInfo {
            reference: direct_ref,
            name: None,
        };
    };

    let profile = PROFILE_FIELDS
        .iter()
        .find_map(|key| pool.field(actor, key).filter(|p| p.is_object()));
    let nested_ref = PROFILE_FIELDS.iter().find_map(|key| reference_of(actor, key));

    let reference = direct_ref
        .or_else(|| nested_ref.map(str::to_string))
        .or_else(|| identity_of(actor).map(str::to_string))
        .or_else(|| {
            ["backendUrn", "urn"]
                .iter()
                .find_map(|key| actor.get(*key).and_then(Value::as_str))
                .map(str::to_string)
        });
    let name = person_name(actor).or_else(|| profile.and_then(person_name));

    ActorInfo { reference, name }
}

/// First count found under any of `keys`
fn count(record: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| record.get(*key).and_then(lenient_u64))
}

/// Unsigned integer from a number or numeric string
#[must_use]
pub fn lenient_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => parse_human_number(s).filter(|f| *f >= 0.0).map(|f| f as u64),
        _ => None,
    }
}

/// Engagement counts of a record
///
/// Strategies: social detail → total counts (pooled or inline), social
/// detail counts directly, counts on the record itself. Absent counts are
/// zero.
#[must_use]
pub fn engagement(pool: &EntityPool<'_>, record: &Value) -> Engagement {
    let sources = [
        pool.follow(record, "socialDetail.totalSocialActivityCounts"),
        pool.field(record, "totalSocialActivityCounts"),
        pool.field(record, "socialDetail"),
        Some(record),
    ];
    let counts = sources
        .into_iter()
        .flatten()
        .find(|source| {
            count(source, &LIKE_KEYS).is_some()
                || count(source, &COMMENT_KEYS).is_some()
                || count(source, &SHARE_KEYS).is_some()
        });
    match counts {
        Some(c) => Engagement::new(
            count(c, &LIKE_KEYS).unwrap_or(0),
            count(c, &COMMENT_KEYS).unwrap_or(0),
            count(c, &SHARE_KEYS).unwrap_or(0),
        ),
        None => Engagement::default(),
    }
}

/// Kind of media attached to a post
#[must_use]
pub fn media_kind(pool: &EntityPool<'_>, record: &Value) -> MediaKind {
    let Some(content) = pool.field(record, "content") else {
        return MediaKind::None;
    };
    if let Some((_, kind)) = MEDIA_COMPONENTS
        .iter()
        .find(|(key, _)| content.get(*key).is_some_and(|c| !c.is_null()))
    {
        return *kind;
    }
    match content {
        Value::Object(map) if map.values().any(|v| !v.is_null()) => MediaKind::Other,
        _ => MediaKind::None,
    }
}

/// Timestamp from an epoch-milliseconds field
#[must_use]
pub fn epoch_millis(record: &Value, paths: &[&str]) -> Option<DateTime<Utc>> {
    paths.iter().find_map(|path| {
        get_path(record, path)
            .and_then(Value::as_i64)
            .filter(|ms| *ms > 0)
            .and_then(DateTime::from_timestamp_millis)
    })
}

/// Creation time encoded in a time-ordered activity id
///
/// The high bits of an activity id are epoch milliseconds: `id >> 22`.
#[must_use]
pub fn activity_timestamp(identity: &str) -> Option<DateTime<Utc>> {
    TIME_ORDERED_IDS.iter().find_map(|marker| {
        let start = identity.find(marker)? + marker.len();
        let digits: String = identity[start..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        let id: u64 = digits.parse().ok()?;
        let millis = i64::try_from(id >> 22).ok()?;
        (millis > 0).then(|| DateTime::from_timestamp_millis(millis)).flatten()
    })
}

/// Picture URL: vector image root plus the widest artifact
#[must_use]
pub fn picture_url(record: &Value) -> Option<String> {
    let legacy = record.get("picture");
    let candidates = [
        get_path(record, "profilePicture.displayImageReference.vectorImage"),
        get_path(record, "profilePicture.displayImageReferenceResolutionResult.vectorImage"),
        // key contains dots, so it cannot go through get_path
        legacy.and_then(|p| p.get("com.linkedin.common.VectorImage")),
        legacy,
    ];
    candidates.into_iter().flatten().find_map(vector_image_url)
}

fn vector_image_url(image: &Value) -> Option<String> {
    let root = image.get("rootUrl").and_then(Value::as_str)?;
    let widest = image
        .get("artifacts")?
        .as_array()?
        .iter()
        .filter_map(|a| {
            let width = a.get("width").and_then(Value::as_u64).unwrap_or(0);
            let segment = a.get("fileIdentifyingUrlPathSegment").and_then(Value::as_str)?;
            Some((width, segment))
        })
        .max_by_key(|(width, _)| *width)?;
    Some(format!("{root}{}", widest.1))
}

/// Parse a human-formatted number (`1,234`, `2.5K`, `3M`, `12%`)
#[must_use]
pub fn parse_human_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',' && *c != '%').collect();
    let cleaned = cleaned.trim();
    let (number, multiplier) = match cleaned.chars().last()? {
        'k' | 'K' => (&cleaned[..cleaned.len() - 1], 1_000.0),
        'm' | 'M' => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        'b' | 'B' => (&cleaned[..cleaned.len() - 1], 1_000_000_000.0),
        _ => (cleaned, 1.0),
    };
    number.trim().parse::<f64>().ok().map(|n| n * multiplier)
}
