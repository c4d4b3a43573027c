//! Payload shape fingerprinting
//!
//! Last-resort classification for exchanges whose address gave no signal.
//! Records are collected from `included` and `elements` collections at any
//! nesting level (GraphQL results keep them under an opaque field name), then
//! each record votes for the first rule it fits. The heaviest category wins.

use graphtap_model::Category;
use serde_json::Value;

/// Deepest object nesting searched for record collections
const MAX_DEPTH: usize = 5;

/// Keys naming a record's type tag, in lookup order
const TYPE_KEYS: [&str; 3] = ["$type", "_type", "$recipeType"];

/// One shape fingerprint
#[derive(Debug, Clone, Copy)]
pub struct ShapeRule {
    /// Rule name reported in the classification
    pub name: &'static str,
    pub category: Category,
    /// Type-tag substrings (case-insensitive)
    pub type_markers: &'static [&'static str],
    /// Groups of keys; a record carrying every key of one group fits
    pub key_groups: &'static [&'static [&'static str]],
    /// Vote weight of one fitting record
    pub weight: u32,
}

impl ShapeRule {
    /// Whether a record fits this rule
    #[must_use]
    pub fn fits(&self, record: &serde_json::Map<String, Value>) -> bool {
        if let Some(tag) = type_tag(record) {
            let tag = tag.to_ascii_lowercase();
            if self
                .type_markers
                .iter()
                .any(|marker| tag.contains(&marker.to_ascii_lowercase()))
            {
                return true;
            }
        }
        self.key_groups
            .iter()
            .any(|group| group.iter().all(|key| record.contains_key(*key)))
    }
}

/// Built-in fingerprints, most specific first
pub const SHAPE_RULES: &[ShapeRule] = &[
    ShapeRule {
        name: "comment-record",
        category: Category::Comments,
        type_markers: &["social.Comment"],
        key_groups: &[&["commenter", "commentary"], &["*commenter", "commentary"]],
        weight: 2,
    },
    ShapeRule {
        name: "feed-update",
        category: Category::Feed,
        type_markers: &["feed.Update"],
        key_groups: &[
            &["actor", "commentary"],
            &["*actor", "commentary"],
            &["actor", "*socialDetail"],
            &["updateMetadata"],
        ],
        weight: 3,
    },
    ShapeRule {
        name: "reaction",
        category: Category::Reactions,
        type_markers: &["social.Reaction"],
        key_groups: &[&["reactionType", "*actor"], &["reactionType", "actorUrn"]],
        weight: 2,
    },
    ShapeRule {
        name: "conversation",
        category: Category::Messaging,
        type_markers: &["messenger.", "messaging.", "Conversation"],
        key_groups: &[&["conversationParticipants"], &["*conversation", "body"]],
        weight: 2,
    },
    ShapeRule {
        name: "invitation",
        category: Category::Invitations,
        type_markers: &["Invitation"],
        key_groups: &[&["invitationType", "*inviter"], &["invitationType", "inviter"]],
        weight: 2,
    },
    ShapeRule {
        name: "relationship",
        category: Category::Network,
        type_markers: &["relationships.Connection", "MemberRelationship", "FollowingState"],
        key_groups: &[&["connectedMember"], &["*connectedMember"], &["followerCount", "following"]],
        weight: 2,
    },
    ShapeRule {
        name: "analytics-card",
        category: Category::Analytics,
        type_markers: &["analytics", "wvmp"],
        key_groups: &[&["numViews"], &["impressionCount"]],
        weight: 2,
    },
    ShapeRule {
        name: "notification",
        category: Category::Notifications,
        type_markers: &["notifications."],
        key_groups: &[],
        weight: 2,
    },
    ShapeRule {
        name: "search-result",
        category: Category::Search,
        type_markers: &["search."],
        key_groups: &[],
        weight: 2,
    },
    ShapeRule {
        name: "job-posting",
        category: Category::Jobs,
        type_markers: &["jobs.", "JobPosting"],
        key_groups: &[&["jobPostingTitle"]],
        weight: 2,
    },
    ShapeRule {
        name: "organization",
        category: Category::Organization,
        type_markers: &["organization."],
        key_groups: &[&["staffCount", "universalName"]],
        weight: 2,
    },
    ShapeRule {
        name: "learning",
        category: Category::Learning,
        type_markers: &["learning."],
        key_groups: &[],
        weight: 2,
    },
    ShapeRule {
        name: "event",
        category: Category::Events,
        type_markers: &["ProfessionalEvent"],
        key_groups: &[],
        weight: 2,
    },
    ShapeRule {
        name: "profile",
        category: Category::Profile,
        type_markers: &["identity.profile.Profile", "MiniProfile"],
        key_groups: &[&["firstName", "lastName"]],
        weight: 1,
    },
];

/// Winning fingerprint of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMatch {
    pub category: Category,
    pub rule: &'static str,
    pub score: u32,
}

/// Fingerprint a payload
///
/// Returns `None` when no record fits any rule. Ties go to the rule listed
/// first.
#[must_use]
pub fn fingerprint(payload: &Value) -> Option<ShapeMatch> {
    let mut records = Vec::new();
    collect_records(payload, 0, &mut records);

    let mut scores = vec![0u32; SHAPE_RULES.len()];
    for record in records {
        if let Some(index) = SHAPE_RULES.iter().position(|rule| rule.fits(record)) {
            scores[index] = scores[index].saturating_add(SHAPE_RULES[index].weight);
        }
    }

    let mut best: Option<(usize, u32)> = None;
    for (index, score) in scores.into_iter().enumerate() {
        if score > 0 && best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best.map(|(index, score)| ShapeMatch {
        category: SHAPE_RULES[index].category,
        rule: SHAPE_RULES[index].name,
        score,
    })
}

/// Whether a value looks like a graph payload at all
///
/// Used by hooks that see every deserialized value (generic deserializer,
/// worker messages) to skip anything that is not a data response.
#[must_use]
pub fn is_shape_bearing(value: &Value) -> bool {
    value.as_object().is_some_and(|map| {
        ["included", "data", "elements"]
            .iter()
            .any(|key| map.contains_key(*key))
    })
}

fn type_tag(record: &serde_json::Map<String, Value>) -> Option<&str> {
    TYPE_KEYS
        .iter()
        .find_map(|key| record.get(*key).and_then(Value::as_str))
}

fn collect_records<'a>(
    value: &'a Value,
    depth: usize,
    out: &mut Vec<&'a serde_json::Map<String, Value>>,
) {
    if depth > MAX_DEPTH {
        return;
    }
    let Value::Object(map) = value else {
        return;
    };
    for (key, child) in map {
        match child {
            Value::Array(items) if key == "included" || key == "elements" => {
                for item in items {
                    if let Value::Object(record) = item {
                        out.push(record);
                        collect_records(item, depth + 1, out);
                    }
                }
            }
            Value::Object(_) => collect_records(child, depth + 1, out),
            _ => {}
        }
    }
}
