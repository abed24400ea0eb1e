use crate::core::cache::QueryCache;
use crate::core::rate::{RateCatalog, RateProvider};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub const ALL_RATES_KEY: &str = "all-currencies";

pub type RateCache = QueryCache<String, Arc<RateCatalog>>;

/// Serves the latest catalog from a shared query cache.
///
/// A failed fetch is logged and served as an empty catalog so callers keep
/// working with zero output.
pub struct RateService<P: RateProvider> {
    inner: Arc<P>,
    cache: Arc<RateCache>,
}

impl<P: RateProvider + 'static> RateService<P> {
    pub fn new(inner: P, cache: Arc<RateCache>) -> Self {
        Self {
            inner: Arc::new(inner),
            cache,
        }
    }

    pub async fn latest(&self) -> Arc<RateCatalog> {
        let inner = Arc::clone(&self.inner);
        let fetched = self
            .cache
            .get_or_fetch(ALL_RATES_KEY.to_string(), || async move {
                inner.fetch_catalog().await.map(Arc::new)
            })
            .await;

        match fetched {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "Rates unavailable, using an empty catalog");
                Arc::new(RateCatalog::empty())
            }
        }
    }
}

#[async_trait]
impl<P: RateProvider + 'static> RateProvider for RateService<P> {
    async fn fetch_catalog(&self) -> Result<RateCatalog> {
        Ok(self.latest().await.as_ref().clone())
    }
}
