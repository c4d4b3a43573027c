//! Address helpers
//!
//! Addresses may be absolute URLs or bare paths; only the path and query
//! are ever inspected, so no full URL parser is needed.

use std::borrow::Cow;

/// Split an address into its path-and-host part and its query string
///
/// Anything after `#` is dropped.
#[must_use]
pub fn split_address(address: &str) -> (&str, Option<&str>) {
    let without_fragment = address.split('#').next().unwrap_or(address);
    match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    }
}

/// Value of a query parameter, percent-decoded
///
/// Returns the first occurrence. Undecodable values are returned raw.
#[must_use]
pub fn query_param(address: &str, name: &str) -> Option<String> {
    let (_, query) = split_address(address);
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if decode(key) == name {
            Some(decode(value).into_owned())
        } else {
            None
        }
    })
}

/// Per-call identifier embedded in the address
///
/// Parameters are consulted in order; the first non-empty value wins.
#[must_use]
pub fn extract_identifier<S: AsRef<str>>(address: &str, params: &[S]) -> Option<String> {
    params
        .iter()
        .filter_map(|param| query_param(address, param.as_ref()))
        .find(|value| !value.is_empty())
}

/// Feature name part of an identifier (`voyagerFeedDashMainFeed.abc123` → `voyagerFeedDashMainFeed`)
#[must_use]
pub fn identifier_name(identifier: &str) -> &str {
    match identifier.rsplit_once('.') {
        Some((name, suffix)) if is_hash_suffix(suffix) => name,
        _ => identifier,
    }
}

fn is_hash_suffix(suffix: &str) -> bool {
    !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_alphanumeric())
        && suffix.chars().any(|c| c.is_ascii_digit())
}

fn decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Compiled `*`-separated pattern
///
/// Matching is ASCII case-insensitive. A pattern without `*` is a plain
/// substring test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    pieces: Vec<String>,
}

impl Pattern {
    /// Compile a pattern
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            pieces: source
                .split('*')
                .filter(|p| !p.is_empty())
                .map(str::to_ascii_lowercase)
                .collect(),
        }
    }

    /// Pattern as written
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match against an already lowercased haystack
    #[must_use]
    pub fn matches_lowercase(&self, haystack: &str) -> bool {
        let mut rest = haystack;
        for piece in &self.pieces {
            match rest.find(piece.as_str()) {
                Some(pos) => rest = &rest[pos + piece.len()..],
                None => return false,
            }
        }
        true
    }
}

/// Whether `haystack` contains every `*`-separated piece of `pattern`, in order
#[must_use]
pub fn matches_pattern(haystack: &str, pattern: &str) -> bool {
    Pattern::new(pattern).matches_lowercase(&haystack.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_address_variants() {
        assert_eq!(split_address("/a/b?x=1#frag"), ("/a/b", Some("x=1")));
        assert_eq!(split_address("https://h/a"), ("https://h/a", None));
    }

    #[test]
    fn query_param_decodes() {
        let address = "/voyager/api/graphql?variables=(start:0)&queryId=voyagerFeedDashMainFeed.abc123";
        assert_eq!(
            query_param(address, "queryId").as_deref(),
            Some("voyagerFeedDashMainFeed.abc123")
        );
        assert_eq!(
            query_param("/x?q=a%20b", "q").as_deref(),
            Some("a b")
        );
        assert_eq!(query_param("/x?flag", "flag").as_deref(), Some(""));
        assert_eq!(query_param("/x", "q"), None);
    }

    #[test]
    fn extract_identifier_in_param_order() {
        let address = "/api?decorationId=deco.profile-1&queryId=voyagerIdentityDashProfiles.9f";
        let params = ["queryId", "decorationId"];
        assert_eq!(
            extract_identifier(address, &params).as_deref(),
            Some("voyagerIdentityDashProfiles.9f")
        );
        assert_eq!(
            extract_identifier("/api?queryId=&decorationId=deco.x", &params).as_deref(),
            Some("deco.x")
        );
    }

    #[test]
    fn identifier_name_strips_hash() {
        assert_eq!(identifier_name("voyagerFeedDashMainFeed.abc123"), "voyagerFeedDashMainFeed");
        assert_eq!(
            identifier_name("com.linkedin.voyager.dash.deco.identity.profile"),
            "com.linkedin.voyager.dash.deco.identity.profile"
        );
    }

    #[test]
    fn pattern_pieces_in_order() {
        assert!(matches_pattern("/voyager/api/identity/profiles/abc/posts", "/identity/*/posts"));
        assert!(!matches_pattern("/posts/identity/", "/identity/*/posts"));
        assert!(matches_pattern("/Feed/Updates", "/feed/updates"));
    }

    #[test]
    fn compiled_pattern_keeps_source() {
        let pattern = Pattern::new("/socialActions/*/comments");
        assert_eq!(pattern.as_str(), "/socialActions/*/comments");
        assert!(pattern.matches_lowercase("/voyager/api/feed/socialactions/urn:1/comments"));
    }
}
