//! # Ratio Service
//!
//! The surface consumed by the presentation layer:
//!
//! - [`RatioService::get_all_countries`]
//! - [`RatioService::get_country_series`]
//! - [`RatioService::slug_to_entity`]
//! - [`RatioService::entity_to_slug`]
//!
//! The service owns its [`FreshnessCache`] and [`SlugResolver`]; nothing is
//! global, so tests and binaries pass an instance around explicitly.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{Clock, FreshnessCache, SnapshotStore};
use crate::catalog;
use crate::configs::RatioConfig;
use crate::error::{RatioError, RatioResult};
use crate::model::{CountrySeries, Row};
use crate::series;
use crate::slug::{self, SlugResolver};
use crate::sources::UpstreamFetcher;

/// # Ratio Service
pub struct RatioService {
    config: RatioConfig,
    cache: FreshnessCache,
    resolver: SlugResolver,
}

impl RatioService {
    /// Wires a service from its collaborators.
    pub fn new(config: RatioConfig, fetcher: Arc<dyn UpstreamFetcher>, clock: Arc<dyn Clock>) -> Self {
        let cache = FreshnessCache::new(
            fetcher,
            SnapshotStore::new(config.cache_file.clone()),
            clock,
            config.freshness_window,
        );
        Self {
            config,
            cache,
            resolver: SlugResolver::new(),
        }
    }

    /// A service talking to the real upstream over HTTP with the system
    /// clock.
    ///
    /// # Errors
    /// `FetchError::ClientError` if the HTTP client cannot be built.
    #[cfg(feature = "retrieve")]
    pub fn from_config(config: RatioConfig) -> Result<Self, crate::error::FetchError> {
        let fetcher = Arc::new(crate::sources::owid::ApiCallOwid::new(&config)?);
        Ok(Self::new(config, fetcher, Arc::new(crate::cache::SystemClock)))
    }

    /// The configuration this service was built with.
    pub fn config(&self) -> &RatioConfig {
        &self.config
    }

    /// The underlying cache.
    pub fn cache(&self) -> &FreshnessCache {
        &self.cache
    }

    /// Current rows of the configured source.
    ///
    /// # Errors
    /// `RatioError::SourceUnavailable` when the upstream had to be fetched and
    /// could not be.
    pub async fn rows(&self) -> RatioResult<Arc<Vec<Row>>> {
        self.cache.get_rows(&self.config.source_url).await
    }

    /// Every entity's series, ascending by latest estimated ratio.
    ///
    /// # Errors
    /// `RatioError::SourceUnavailable`, see [`RatioService::rows`].
    pub async fn get_all_countries(&self) -> RatioResult<Vec<CountrySeries>> {
        let rows = self.rows().await?;
        Ok(catalog::list_all_countries(&rows))
    }

    /// The series of `entity`, `None` when the data never names it.
    ///
    /// # Errors
    /// `RatioError::SourceUnavailable`, see [`RatioService::rows`].
    pub async fn get_country_series(&self, entity: &str) -> RatioResult<Option<CountrySeries>> {
        let rows = self.rows().await?;
        Ok(series::derive_series(&rows, entity))
    }

    /// Resolves a URL slug to an entity name: static overrides, then the
    /// table built from the data, then a title-cased guess.
    ///
    /// # Errors
    /// `RatioError::SourceUnavailable` when the slug table has to be built
    /// and the rows cannot be loaded.
    pub async fn slug_to_entity(&self, slug: &str) -> RatioResult<String> {
        self.resolver
            .resolve(slug, || async {
                let rows = self.rows().await?;
                Ok::<_, RatioError>(catalog::entities(&rows))
            })
            .await
    }

    /// The URL slug of `entity`.
    pub fn entity_to_slug(&self, entity: &str) -> String {
        slug::entity_to_slug(entity)
    }

    /// Resolves `slug` and returns that entity's series, if any.
    ///
    /// # Errors
    /// `RatioError::SourceUnavailable`, see [`RatioService::rows`].
    pub async fn country_by_slug(&self, slug: &str) -> RatioResult<Option<CountrySeries>> {
        let entity = self.slug_to_entity(slug).await?;
        debug!(slug, entity = %entity, "Resolved slug");
        self.get_country_series(&entity).await
    }

    /// Forces the next call to fetch from the upstream. The slug table is
    /// kept.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&self.config.source_url).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const CSV: &str = "\
Entity,Code,Year,Population - Sex: all - Age: 15-64 - Variant: estimates,Population - Sex: all - Age: 65+ - Variant: estimates,Population - Sex: all - Age: 15-64 - Variant: medium,Population - Sex: all - Age: 65+ - Variant: medium
South Korea,KOR,2021,36000000,8800000,,
South Korea,KOR,2050,,,24000000,19000000
Europe (UN),,2021,480000000,140000000,,
Niger,NER,2021,13000000,650000,,
";

    #[derive(Default)]
    struct StaticFetcher {
        calls: AtomicUsize,
        down: AtomicBool,
    }

    #[async_trait]
    impl UpstreamFetcher for StaticFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(FetchError::NetworkError(format!("{url} unreachable")));
            }
            Ok(CSV.to_string())
        }
    }

    fn service(dir: &tempfile::TempDir, fetcher: Arc<StaticFetcher>) -> RatioService {
        let config = RatioConfig {
            source_url: "http://upstream.test/population.csv".to_string(),
            cache_file: dir.path().join(".cache/owid-data.json"),
            ..RatioConfig::default()
        };
        RatioService::new(config, fetcher, Arc::new(ManualClock::new(0)))
    }

    #[tokio::test]
    async fn all_countries_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, Arc::default());

        let countries = service.get_all_countries().await.unwrap();
        let names: Vec<&str> = countries.iter().map(|c| c.entity.as_str()).collect();
        assert_eq!(names, vec!["Europe (UN)", "South Korea", "Niger"]);
    }

    #[tokio::test]
    async fn slugs_resolve_through_static_dynamic_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, Arc::default());

        assert_eq!(service.slug_to_entity("europe").await.unwrap(), "Europe (UN)");
        assert_eq!(service.slug_to_entity("europe-un").await.unwrap(), "Europe (UN)");
        assert_eq!(service.slug_to_entity("niger").await.unwrap(), "Niger");
        assert_eq!(service.slug_to_entity("atlantis").await.unwrap(), "Atlantis");
        assert_eq!(service.entity_to_slug("South Korea"), "south-korea");
    }

    #[tokio::test]
    async fn unknown_slug_has_no_series() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, Arc::default());

        assert_eq!(service.country_by_slug("atlantis").await.unwrap(), None);
        let korea = service.country_by_slug("south-korea").await.unwrap().unwrap();
        assert_eq!(korea.series.len(), 2);
        assert_eq!(korea.latest_estimate.map(|p| p.year), Some(2021));
    }

    #[tokio::test]
    async fn fetch_failure_is_distinct_and_catchable() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(StaticFetcher::default());
        fetcher.down.store(true, Ordering::SeqCst);
        let service = service(&dir, Arc::clone(&fetcher));

        let err = service.get_all_countries().await.unwrap_err();
        assert!(matches!(err, RatioError::SourceUnavailable(FetchError::NetworkError(_))));

        fetcher.down.store(false, Ordering::SeqCst);
        assert_eq!(service.get_all_countries().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn invalidate_refetches() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(StaticFetcher::default());
        let service = service(&dir, Arc::clone(&fetcher));

        service.get_all_countries().await.unwrap();
        service.get_country_series("Niger").await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        service.invalidate().await;
        service.get_country_series("Niger").await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }
}
