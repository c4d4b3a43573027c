//! Testing utilities for the graphtap workspace
//!
//! Shared payload fixtures, addresses and exchange builders.

#![allow(missing_docs)]

use chrono::{DateTime, TimeZone, Utc};
use graphtap_model::{CapturedExchange, HookOrigin, HttpMethod};
use serde_json::{json, Value};

pub const FEED_ADDRESS: &str =
    "https://www.linkedin.com/voyager/api/graphql?variables=(start:0,count:10)&queryId=voyagerFeedDashMainFeed.abc123";
pub const MESSAGING_ADDRESS: &str =
    "https://www.linkedin.com/voyager/api/voyagerMessagingGraphQL/graphql?queryId=messengerConversations.0d5e6781bbee71c3e51c8843c6519f48";
/// Messaging endpoint without a query identifier
pub const MESSAGING_REST_ADDRESS: &str =
    "https://www.linkedin.com/voyager/api/messaging/conversations?keyVersion=LEGACY_INBOX";
pub const PROFILE_ADDRESS: &str =
    "https://www.linkedin.com/voyager/api/graphql?queryId=voyagerIdentityDashProfiles.a1a483e719b20537a256b6853cdca711";
pub const COMMENTS_ADDRESS: &str =
    "https://www.linkedin.com/voyager/api/graphql?queryId=voyagerSocialDashComments.cd3d2a3fd6c9b2881c7cac32847ec05e";
pub const NETWORK_ADDRESS: &str =
    "https://www.linkedin.com/voyager/api/relationships/dash/connections?decorationId=com.linkedin.voyager.dash.deco.web.mynetwork.ConnectionListWithProfile-16";
pub const ANALYTICS_ADDRESS: &str =
    "https://www.linkedin.com/voyager/api/identity/wvmpCards";
pub const TELEMETRY_ADDRESS: &str =
    "https://www.linkedin.com/thirdpartyidsync/api/partners?trk=feed";

pub const ACTOR_URN: &str = "urn:li:fsd_profile:ACoAAA1";
pub const ACTIVITY_ID: u64 = 7_100_000_000_000_000_000;
pub const UPDATE_URN: &str = "urn:li:fsd_update:(urn:li:activity:7100000000000000000,MAIN_FEED,EMPTY,DEFAULT,false)";
pub const SOCIAL_DETAIL_URN: &str = "urn:li:fsd_socialDetail:(urn:li:activity:7100000000000000000)";
pub const COUNTS_URN: &str = "urn:li:fsd_socialActivityCounts:urn:li:activity:7100000000000000000";

/// Fixed observation instant used by fixtures
#[must_use]
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Exchange builder with a fixed timestamp
#[must_use]
pub fn exchange(origin: HookOrigin, address: Option<&str>, payload: Value) -> CapturedExchange {
    CapturedExchange::new(origin, payload, fixed_time())
        .with_optional_address(address.map(str::to_string))
        .with_method(HttpMethod::Get)
}

/// Actor profile record
#[must_use]
pub fn actor_record() -> Value {
    json!({
        "$type": "com.linkedin.voyager.dash.identity.profile.Profile",
        "entityUrn": ACTOR_URN,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "headline": "Analytical engine programmer",
        "publicIdentifier": "ada-lovelace",
        "profilePicture": {
            "displayImageReference": {
                "vectorImage": {
                    "rootUrl": "https://media.licdn.com/dms/image/C4E03AQ/",
                    "artifacts": [
                        {"width": 100, "height": 100, "fileIdentifyingUrlPathSegment": "100_100/photo.jpg"},
                        {"width": 800, "height": 800, "fileIdentifyingUrlPathSegment": "800_800/photo.jpg"},
                        {"width": 200, "height": 200, "fileIdentifyingUrlPathSegment": "200_200/photo.jpg"}
                    ]
                }
            }
        }
    })
}

/// Feed update referencing the actor by pool reference
#[must_use]
pub fn update_record() -> Value {
    json!({
        "$type": "com.linkedin.voyager.dash.feed.Update",
        "entityUrn": UPDATE_URN,
        "*actor": ACTOR_URN,
        "commentary": {"text": {"text": "Shipping the new parser today"}},
        "*socialDetail": SOCIAL_DETAIL_URN,
        "content": {"imageComponent": {"images": []}}
    })
}

/// Feed payload in the normalized REST layout
#[must_use]
pub fn feed_payload() -> Value {
    json!({
        "data": {
            "$type": "com.linkedin.restli.common.CollectionResponse",
            "*elements": [UPDATE_URN],
            "paging": {"start": 0, "count": 10, "total": 1}
        },
        "included": [
            actor_record(),
            update_record(),
            {
                "$type": "com.linkedin.voyager.dash.feed.SocialDetail",
                "entityUrn": SOCIAL_DETAIL_URN,
                "*totalSocialActivityCounts": COUNTS_URN
            },
            {
                "$type": "com.linkedin.voyager.dash.feed.shared.SocialActivityCounts",
                "entityUrn": COUNTS_URN,
                "numLikes": 42,
                "numComments": 5,
                "numShares": 2
            }
        ]
    })
}

/// Minimal Scenario-A style payload: one actor, one update
#[must_use]
pub fn minimal_feed_payload() -> Value {
    json!({"included": [actor_record(), update_record()]})
}

/// Feed payload in the GraphQL layout with an inline actor
#[must_use]
pub fn graphql_feed_payload() -> Value {
    json!({
        "data": {
            "data": {
                "feedDashMainFeedByMainFeed": {
                    "*elements": ["urn:li:fsd_update:(urn:li:activity:7100000000000000123,MAIN_FEED)"],
                    "paging": {"start": 0, "count": 1}
                }
            }
        },
        "included": [
            {
                "$type": "com.linkedin.voyager.dash.feed.Update",
                "entityUrn": "urn:li:fsd_update:(urn:li:activity:7100000000000000123,MAIN_FEED)",
                "actor": {
                    "name": {"text": "Grace Hopper"},
                    "description": {"text": "Rear admiral"},
                    "backendUrn": "urn:li:member:42"
                },
                "commentary": {"text": "Inline actor post"},
                "socialDetail": {
                    "totalSocialActivityCounts": {"numLikes": 7, "numComments": 1, "numShares": 0}
                }
            }
        ]
    })
}

/// Reshare whose own commentary is empty
#[must_use]
pub fn reshare_payload() -> Value {
    json!({
        "included": [
            actor_record(),
            {
                "$type": "com.linkedin.voyager.dash.feed.Update",
                "entityUrn": "urn:li:fsd_update:(urn:li:activity:7100000000000000999,MAIN_FEED)",
                "*actor": ACTOR_URN,
                "*resharedUpdate": "urn:li:fsd_update:(urn:li:activity:7000000000000000001,RESHARED)"
            },
            {
                "$type": "com.linkedin.voyager.dash.feed.Update",
                "entityUrn": "urn:li:fsd_update:(urn:li:activity:7000000000000000001,RESHARED)",
                "commentary": {"text": {"text": "Original thoughts"}}
            }
        ]
    })
}

/// Comments payload with a reply
#[must_use]
pub fn comments_payload() -> Value {
    json!({
        "data": {"*elements": [
            "urn:li:fsd_comment:(7100000000000000500,urn:li:activity:7100000000000000000)",
            "urn:li:fsd_comment:(7100000000000000501,urn:li:activity:7100000000000000000)"
        ]},
        "included": [
            actor_record(),
            {
                "$type": "com.linkedin.voyager.dash.social.Comment",
                "entityUrn": "urn:li:fsd_comment:(7100000000000000500,urn:li:activity:7100000000000000000)",
                "commenter": {"*profile": ACTOR_URN, "title": {"text": "Ada Lovelace"}},
                "commentary": {"text": "Great work"},
                "createdAt": 1_709_294_400_000_i64,
                "threadUrn": "urn:li:activity:7100000000000000000",
                "socialDetail": {"totalSocialActivityCounts": {"numLikes": 3}}
            },
            {
                "$type": "com.linkedin.voyager.dash.social.Comment",
                "entityUrn": "urn:li:fsd_comment:(7100000000000000501,urn:li:activity:7100000000000000000)",
                "commenter": {"title": {"text": "Charles Babbage"}},
                "commentary": {"text": "Agreed"},
                "parentCommentUrn": "urn:li:fsd_comment:(7100000000000000500,urn:li:activity:7100000000000000000)"
            }
        ]
    })
}

/// Profile payload
#[must_use]
pub fn profile_payload() -> Value {
    json!({
        "data": {"*elements": [ACTOR_URN]},
        "included": [actor_record()]
    })
}

/// Messaging payload in the GraphQL layout
#[must_use]
pub fn messaging_payload() -> Value {
    json!({
        "data": {
            "data": {
                "messengerConversationsBySyncToken": {
                    "elements": [
                        {
                            "_type": "com.linkedin.messenger.Conversation",
                            "entityUrn": "urn:li:msg_conversation:(urn:li:fsd_profile:ACoAAA1,2-abc)",
                            "conversationParticipants": [{"hostIdentityUrn": ACTOR_URN}],
                            "unreadCount": 1
                        }
                    ]
                }
            }
        }
    })
}

/// Connections and follow state
#[must_use]
pub fn network_payload() -> Value {
    json!({
        "included": [
            actor_record(),
            {
                "$type": "com.linkedin.voyager.dash.relationships.Connection",
                "entityUrn": "urn:li:fsd_connection:ACoAAA1",
                "*connectedMemberResolutionResult": ACTOR_URN,
                "connectedMember": ACTOR_URN,
                "createdAt": 1_700_000_000_000_i64
            },
            {
                "$type": "com.linkedin.voyager.dash.feed.FollowingState",
                "entityUrn": "urn:li:fsd_followingState:urn:li:fsd_profile:ACoAAA1",
                "following": true,
                "followerCount": 1_250
            }
        ]
    })
}

/// Pending invitation from a pooled profile
#[must_use]
pub fn invitations_payload() -> Value {
    json!({
        "included": [
            actor_record(),
            {
                "$type": "com.linkedin.voyager.dash.relationships.invitation.Invitation",
                "entityUrn": "urn:li:fsd_invitation:7200000000000000000",
                "*inviter": ACTOR_URN,
                "sentTime": 1_710_000_000_000_i64,
                "invitationType": "CONNECTION"
            }
        ]
    })
}

/// People search results
#[must_use]
pub fn search_payload() -> Value {
    json!({
        "data": {
            "searchDashClustersByAll": {
                "elements": [
                    {
                        "$type": "com.linkedin.voyager.dash.search.EntityResultViewModel",
                        "entityUrn": "urn:li:fsd_entityResultViewModel:(urn:li:fsd_profile:ACoAAA2,SEARCH_SRP,DEFAULT)",
                        "title": {"text": "Grace Hopper"},
                        "primarySubtitle": {"text": "Compiler pioneer"}
                    }
                ]
            }
        },
        "included": [actor_record()]
    })
}

/// Analytics cards plus a typed record with numeric metrics
#[must_use]
pub fn analytics_payload() -> Value {
    json!({
        "elements": [
            {
                "$type": "com.linkedin.voyager.identity.me.wvmpOverview.WvmpViewersCard",
                "entityUrn": "urn:li:wvmpCard:viewers",
                "title": {"text": "Profile viewers"},
                "value": {"text": "1,234"},
                "timeRange": {"text": "Past 90 days"}
            },
            {
                "$type": "com.linkedin.voyager.dash.analytics.AnalyticsCard",
                "entityUrn": "urn:li:analyticsCard:impressions",
                "title": "Post impressions",
                "value": "2.5K",
                "subtitle": "Past 7 days"
            }
        ],
        "included": [
            {
                "$type": "com.linkedin.voyager.dash.analytics.ContentSummary",
                "entityUrn": "urn:li:contentSummary:1",
                "numViews": 310,
                "impressionCount": 5_000
            }
        ]
    })
}

/// Payload carrying only pagination metadata
#[must_use]
pub fn empty_collection_payload() -> Value {
    json!({"data": {"*elements": [], "paging": {"start": 0, "count": 0}}, "included": []})
}
