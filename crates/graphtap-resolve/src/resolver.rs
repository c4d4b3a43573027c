//! Entity resolver
//!
//! Runs every registered [`KindResolver`] that handles the exchange's
//! category over the payload's candidate roots.
//!
//! Candidates for one kind are, in order: `elements` roots matching the
//! kind's root pattern, then pool records matching it. Each record is
//! resolved at most once per kind. Output order depends only on the
//! payload, so resolving the same payload twice gives identical entities.

use graphtap_model::{Category, Entity};
use serde_json::Value;
use tracing::trace;

use crate::error::ResolveError;
use crate::kinds::{
    AnalyticsResolver, CommentResolver, ConnectionResolver, KindResolver, PostResolver,
    ProfileResolver,
};
use crate::pool::EntityPool;

/// Registry of per-kind resolvers
pub struct EntityResolver {
    kinds: Vec<Box<dyn KindResolver>>,
}

impl Default for EntityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityResolver")
            .field("kinds", &self.kind_names())
            .finish()
    }
}

impl EntityResolver {
    /// Resolver with every built-in kind registered
    #[must_use]
    pub fn new() -> Self {
        let mut resolver = Self::empty();
        resolver.register(PostResolver);
        resolver.register(CommentResolver);
        resolver.register(ProfileResolver);
        resolver.register(ConnectionResolver);
        resolver.register(AnalyticsResolver);
        resolver
    }

    /// Resolver with no kinds registered
    #[must_use]
    pub fn empty() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Register a kind resolver; kinds run in registration order
    pub fn register<K: KindResolver>(&mut self, kind: K) {
        self.kinds.push(Box::new(kind));
    }

    /// Names of registered kinds
    #[must_use]
    pub fn kind_names(&self) -> Vec<&'static str> {
        self.kinds.iter().map(|k| k.name()).collect()
    }

    /// Resolve a payload, ignoring anything that does not fit
    #[must_use]
    pub fn resolve(&self, category: Category, payload: &Value) -> Vec<Entity> {
        let pool = EntityPool::from_payload(payload);
        self.resolve_pool(category, &pool)
    }

    /// Resolve a payload, rejecting payloads without the graph layout
    ///
    /// # Errors
    /// - `ResolveError::NotAnObject` if the payload is not an object
    /// - `ResolveError::MalformedPool` if `included` is not an array
    pub fn try_resolve(&self, category: Category, payload: &Value) -> Result<Vec<Entity>, ResolveError> {
        if !payload.is_object() {
            return Err(ResolveError::not_an_object(payload));
        }
        if let Some(included) = payload.get("included").filter(|v| !v.is_array()) {
            return Err(ResolveError::malformed_pool(included));
        }
        Ok(self.resolve(category, payload))
    }

    /// Resolve an already indexed pool
    #[must_use]
    pub fn resolve_pool(&self, category: Category, pool: &EntityPool<'_>) -> Vec<Entity> {
        let mut entities = Vec::new();
        for kind in self.kinds.iter().filter(|k| k.handles(category)) {
            let pattern = kind.root_pattern();
            let mut seen: Vec<&Value> = Vec::new();
            let candidates = pool
                .roots()
                .iter()
                .chain(pool.records().iter())
                .copied()
                .filter(|record| pattern.matches(record));
            let before = entities.len();
            for record in candidates {
                if seen.iter().any(|s| std::ptr::eq(*s, record)) {
                    continue;
                }
                seen.push(record);
                entities.extend(kind.resolve(pool, record));
            }
            trace!(
                kind = kind.name(),
                category = %category,
                candidates = seen.len(),
                resolved = entities.len() - before,
                "kind resolved"
            );
        }
        entities
    }
}
