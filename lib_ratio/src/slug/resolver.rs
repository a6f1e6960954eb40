//! # Dynamic Slug Resolver
//!
//! Maps an incoming slug back to an entity name. Lookup order:
//!
//! 1. the curated [`STATIC_SLUGS`] table,
//! 2. the table derived from every entity present in the data,
//! 3. a title-cased reconstruction of the slug (last resort).
//!
//! The derived table is built lazily, once per [`SlugResolver`], and never
//! mutated afterwards. Collisions are first-wins in data order.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{entity_to_slug, static_entity, title_case, STATIC_SLUGS};

/// # Slug Table
///
/// slug -> entity, seeded with the static overrides and extended with the
/// codec slug of every observed entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlugTable {
    entries: HashMap<String, String>,
}

impl SlugTable {
    /// Builds the table from entity names in data order.
    ///
    /// A static override is never replaced. When two entities share a slug
    /// the first one keeps it and the collision is logged.
    pub fn build<I, S>(entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: HashMap<String, String> = STATIC_SLUGS
            .iter()
            .map(|(slug, entity)| (slug.to_string(), entity.to_string()))
            .collect();

        for entity in entities {
            let entity = entity.as_ref();
            let slug = entity_to_slug(entity);
            match entries.entry(slug) {
                Entry::Vacant(slot) => {
                    slot.insert(entity.to_string());
                }
                Entry::Occupied(slot) if slot.get() == entity => {}
                Entry::Occupied(slot) if static_entity(slot.key()).is_some() => {
                    debug!(slug = %slot.key(), entity, "Slug already covered by a static override");
                }
                Entry::Occupied(slot) => {
                    warn!(
                        slug = %slot.key(),
                        kept = %slot.get(),
                        dropped = entity,
                        "Slug collision between entities; keeping the first"
                    );
                }
            }
        }

        Self { entries }
    }

    /// Entity registered for `slug` (exact, already lower-cased), if any.
    pub fn get(&self, slug: &str) -> Option<&str> {
        self.entries.get(slug).map(String::as_str)
    }

    /// Resolves a slug against this table, falling back to the title-cased
    /// reconstruction.
    pub fn resolve(&self, slug: &str) -> String {
        let slug = slug.to_lowercase();
        if let Some(entity) = static_entity(&slug) {
            return entity.to_string();
        }
        match self.get(&slug) {
            Some(entity) => entity.to_string(),
            None => title_case(&slug),
        }
    }

    /// Number of slugs in the table, static overrides included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table holds no slug at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// # Slug Resolver
///
/// Owns the build-once derived table.
#[derive(Debug, Default)]
pub struct SlugResolver {
    table: OnceCell<SlugTable>,
}

impl SlugResolver {
    /// Creates a resolver whose table is not built yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the derived table has been built.
    pub fn is_built(&self) -> bool {
        self.table.initialized()
    }

    /// Resolves `slug` to an entity name.
    ///
    /// Static overrides are answered without touching the data. Otherwise the
    /// derived table is built on first use from `entities` and reused for
    /// every later call; a failed build is not cached.
    ///
    /// # Errors
    /// Propagates the error of `entities` when the table has to be built and
    /// the entity list cannot be produced.
    pub async fn resolve<F, Fut, E>(&self, slug: &str, entities: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, E>>,
    {
        let lowered = slug.to_lowercase();
        if let Some(entity) = static_entity(&lowered) {
            return Ok(entity.to_string());
        }

        let table = self
            .table
            .get_or_try_init(|| async {
                let names = entities().await?;
                let table = SlugTable::build(&names);
                info!(entities = names.len(), slugs = table.len(), "Built slug mapping from data");
                Ok::<_, E>(table)
            })
            .await?;

        Ok(table.resolve(&lowered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn static_overrides_beat_derived_slugs() {
        let table = SlugTable::build(["Europe", "Europe (UN)", "South Korea"]);

        assert_eq!(table.resolve("europe"), "Europe (UN)");
        assert_eq!(table.resolve("europe-un"), "Europe (UN)");
        assert_eq!(table.resolve("south-korea"), "South Korea");
    }

    #[test]
    fn collisions_are_first_wins() {
        let table = SlugTable::build(["Micronesia (country)", "Micronesia country"]);
        assert_eq!(table.get("micronesia-country"), Some("Micronesia (country)"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = SlugTable::build(["Burkina Faso"]);
        assert_eq!(table.resolve("Burkina-Faso"), "Burkina Faso");
        assert_eq!(table.resolve("JAPAN"), "Japan");
    }

    #[test]
    fn unknown_slug_falls_back_to_title_case() {
        let table = SlugTable::build(["Chile"]);
        assert_eq!(table.resolve("atlantis"), "Atlantis");
        assert_eq!(table.resolve("lost-city"), "Lost City");
    }

    #[tokio::test]
    async fn table_is_built_once_and_reused() {
        let resolver = SlugResolver::new();
        let builds = AtomicUsize::new(0);

        for slug in ["chile", "new-zealand", "atlantis"] {
            resolver
                .resolve(slug, || async {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(names(&["Chile", "New Zealand"]))
                })
                .await
                .unwrap();
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(resolver.is_built());
    }

    #[tokio::test]
    async fn static_slug_does_not_load_data() {
        let resolver = SlugResolver::new();
        let entity = resolver
            .resolve("united-kingdom", || async { Err::<Vec<String>, _>("no data") })
            .await
            .unwrap();

        assert_eq!(entity, "United Kingdom");
        assert!(!resolver.is_built());
    }

    #[tokio::test]
    async fn failed_build_is_retried_on_next_call() {
        let resolver = SlugResolver::new();

        let first = resolver
            .resolve("chile", || async { Err::<Vec<String>, _>("offline") })
            .await;
        assert_eq!(first, Err("offline"));
        assert!(!resolver.is_built());

        let second = resolver
            .resolve("chile", || async { Ok::<_, &str>(names(&["Chile"])) })
            .await;
        assert_eq!(second, Ok("Chile".to_string()));
    }
}
