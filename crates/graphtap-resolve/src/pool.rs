//! Entity pool
//!
//! A graph payload is a flat pool of typed records (`included`) plus
//! reference strings pointing into it. A field named `*name` holds the
//! identity of the record that `name` would otherwise inline.
//!
//! The pool borrows from the payload and lives for one resolution pass.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Prefix marking a field as a pool reference
pub const REFERENCE_PREFIX: char = '*';

/// Keys carrying a record's identity, in lookup order
pub const IDENTITY_KEYS: [&str; 3] = ["entityUrn", "urn", "$id"];

/// Keys carrying a record's type tag, in lookup order
pub const TYPE_KEYS: [&str; 3] = ["$type", "_type", "$recipeType"];

/// Deepest object nesting searched for root collections
const MAX_ROOT_DEPTH: usize = 5;

/// Identity of a record
#[must_use]
pub fn identity_of(record: &Value) -> Option<&str> {
    IDENTITY_KEYS
        .iter()
        .find_map(|key| record.get(*key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

/// Type tag of a record
#[must_use]
pub fn type_of(record: &Value) -> Option<&str> {
    TYPE_KEYS
        .iter()
        .find_map(|key| record.get(*key).and_then(Value::as_str))
}

/// Identity a field points at, without requiring the target to be pooled
///
/// Checks the `*name` reference, then a string-valued `name`.
#[must_use]
pub fn reference_of<'v>(record: &'v Value, name: &str) -> Option<&'v str> {
    let reference = format!("{REFERENCE_PREFIX}{name}");
    record
        .get(&reference)
        .and_then(Value::as_str)
        .or_else(|| record.get(name).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

/// Get value at a dot-separated path
///
/// Returns `None` as soon as a segment is missing or a non-object is hit.
#[must_use]
pub fn get_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = value;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Records of one payload, indexed by identity
#[derive(Debug, Default)]
pub struct EntityPool<'a> {
    by_identity: IndexMap<&'a str, &'a Value>,
    records: Vec<&'a Value>,
    roots: Vec<&'a Value>,
}

impl<'a> EntityPool<'a> {
    /// Index a payload
    ///
    /// Non-object payloads and non-array `included` sections give an empty
    /// pool.
    #[must_use]
    pub fn from_payload(payload: &'a Value) -> Self {
        let mut pool = Self::default();
        if let Some(Value::Array(items)) = payload.get("included") {
            for item in items.iter().filter(|item| item.is_object()) {
                pool.insert(item);
            }
        }
        if let Value::Object(map) = payload {
            let mut roots = Vec::new();
            pool.collect_roots(map, 0, &mut roots);
            pool.roots = dedup_by_address(roots);
        }
        pool
    }

    fn insert(&mut self, record: &'a Value) {
        self.records.push(record);
        if let Some(identity) = identity_of(record) {
            // first occurrence wins
            self.by_identity.entry(identity).or_insert(record);
        }
    }

    fn collect_roots(&self, map: &'a Map<String, Value>, depth: usize, out: &mut Vec<&'a Value>) {
        if depth > MAX_ROOT_DEPTH {
            return;
        }
        for (key, child) in map {
            match (key.as_str(), child) {
                ("included", _) => {}
                ("elements", Value::Array(items)) => {
                    for item in items {
                        match item {
                            Value::Object(_) => out.push(item),
                            Value::String(identity) => out.extend(self.get(identity)),
                            _ => {}
                        }
                    }
                }
                ("*elements", Value::Array(items)) => {
                    out.extend(items.iter().filter_map(Value::as_str).filter_map(|id| self.get(id)));
                }
                (_, Value::Object(inner)) => self.collect_roots(inner, depth + 1, out),
                _ => {}
            }
        }
    }

    /// Record with the given identity
    #[inline]
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&'a Value> {
        self.by_identity.get(identity).copied()
    }

    /// All pool records in payload order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[&'a Value] {
        &self.records
    }

    /// Root records named by `elements` / `*elements` collections
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[&'a Value] {
        &self.roots
    }

    /// Number of pool records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the pool holds no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Follow one field of a record
    ///
    /// Lookup order: the `*name` reference, then `name` itself. A string
    /// value is treated as an identity and looked up; anything else is
    /// returned inline.
    #[must_use]
    pub fn field<'v>(&self, record: &'v Value, name: &str) -> Option<&'v Value>
    where
        'a: 'v,
    {
        let reference = format!("{REFERENCE_PREFIX}{name}");
        if let Some(target) = record
            .get(&reference)
            .and_then(Value::as_str)
            .and_then(|id| self.get(id))
        {
            return Some(target);
        }
        match record.get(name)? {
            Value::String(identity) => self.get(identity),
            Value::Null => None,
            inline => Some(inline),
        }
    }

    /// Follow a dot-separated path, resolving references at every step
    #[must_use]
    pub fn follow<'v>(&self, record: &'v Value, path: &str) -> Option<&'v Value>
    where
        'a: 'v,
    {
        let mut current = record;
        for segment in path.split('.') {
            current = self.field(current, segment)?;
        }
        Some(current)
    }
}

fn dedup_by_address(values: Vec<&Value>) -> Vec<&Value> {
    let mut out: Vec<&Value> = Vec::with_capacity(values.len());
    for value in values {
        if !out.iter().any(|seen| std::ptr::eq(*seen, value)) {
            out.push(value);
        }
    }
    out
}
