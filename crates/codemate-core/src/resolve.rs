//! Per-tool resolution: live scrape, then cache, then the bundled catalog.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::TieredCache;
use crate::catalog::Catalog;
use crate::error::{CodemateError, Result};
use crate::extract::{Extractor, ExtractorRegistry};
use crate::fetch::{Fetch, HttpFetcher};
use crate::settings::Settings;
use crate::tool::ToolRecord;

/// Where a resolved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    Live,
    StaleCache,
    StaticFallback,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Source::Live => "live",
            Source::StaleCache => "cache",
            Source::StaticFallback => "catalog",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub record: ToolRecord,
    pub source: Source,
}

/// States of a single resolution. Each step either finishes or names the
/// next state.
enum Stage {
    Live(Arc<dyn Extractor>),
    Cache { stale_ttl: Duration },
    Catalog,
    Unavailable,
}

/// Resolves tool identifiers to records. Owns nothing global: the cache and
/// catalog are handed in and may be shared between resolvers.
#[derive(Clone)]
pub struct Resolver {
    fetcher: Arc<dyn Fetch>,
    extractors: ExtractorRegistry,
    cache: Arc<TieredCache>,
    catalog: Arc<Catalog>,
    catalog_ttl: Duration,
}

impl Resolver {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        cache: Arc<TieredCache>,
        catalog: Arc<Catalog>,
        catalog_ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            extractors: ExtractorRegistry::with_defaults(),
            cache,
            catalog,
            catalog_ttl,
        }
    }

    /// HTTP fetcher, empty cache and bundled catalog configured from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let fetcher = HttpFetcher::new(settings)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(TieredCache::from_settings(settings)),
            Arc::new(Catalog::bundled()?),
            settings.catalog_ttl(),
        ))
    }

    pub fn cache(&self) -> &TieredCache {
        &self.cache
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Whether `tool_id` has a live pricing source.
    pub fn is_scraped(&self, tool_id: &str) -> bool {
        self.extractors.contains(tool_id)
    }

    /// Resolve one tool. Fetch and extraction failures are absorbed; only
    /// `NotFound`, `Unavailable` and `Validation` reach the caller.
    pub async fn resolve(&self, tool_id: &str) -> Result<Resolved> {
        let tool_id = tool_id.trim();
        if tool_id.is_empty() {
            return Err(CodemateError::Validation("Tool name is required.".into()));
        }

        // Only scraped tools are ever written to the cache, and the registry
        // is fixed, so the lock map stays bounded.
        let scraped = self.extractors.get(tool_id);
        let is_scraped = scraped.is_some();
        let mut stage = match scraped {
            Some(extractor) => Stage::Live(extractor),
            None => Stage::Cache {
                stale_ttl: self.catalog_ttl,
            },
        };

        loop {
            stage = match stage {
                Stage::Live(extractor) => match self.live(extractor.as_ref()).await {
                    Ok(record) => {
                        info!(
                            tool = extractor.tool_id(),
                            tiers = record.tiers.len(),
                            "live pricing"
                        );
                        let _guard = self.cache.lock_key(extractor.tool_id()).await;
                        self.cache.put(extractor.tool_id(), record.clone());
                        return Ok(Resolved {
                            record,
                            source: Source::Live,
                        });
                    }
                    Err(e) => {
                        warn!(tool = extractor.tool_id(), error = %e, "live pricing failed");
                        Stage::Cache {
                            stale_ttl: self.cache.stale_ttl(),
                        }
                    }
                },
                Stage::Cache { stale_ttl } => {
                    let _guard = if is_scraped {
                        Some(self.cache.lock_key(tool_id).await)
                    } else {
                        None
                    };
                    let now = Utc::now();
                    let entry = self
                        .cache
                        .get(tool_id)
                        .map(|entry| (self.cache.freshness(&entry, now, stale_ttl), entry));
                    match entry {
                        Some((band, entry)) if band.is_usable() => {
                            info!(
                                tool = tool_id,
                                ?band,
                                age_secs = entry.age_at(now).as_secs(),
                                "serving cached pricing"
                            );
                            return Ok(Resolved {
                                record: entry.record,
                                source: Source::StaleCache,
                            });
                        }
                        Some((band, _)) => {
                            debug!(tool = tool_id, ?band, "cache entry too old");
                            Stage::Catalog
                        }
                        None => {
                            debug!(tool = tool_id, "no cache entry");
                            Stage::Catalog
                        }
                    }
                }
                Stage::Catalog => match self.catalog.find(tool_id) {
                    Some(record) => {
                        info!(tool = tool_id, "serving catalog pricing");
                        return Ok(Resolved {
                            record: record.clone(),
                            source: Source::StaticFallback,
                        });
                    }
                    None => Stage::Unavailable,
                },
                Stage::Unavailable => {
                    return if is_scraped {
                        warn!(tool = tool_id, "no pricing source left");
                        Err(CodemateError::Unavailable(tool_id.to_string()))
                    } else {
                        debug!(tool = tool_id, "unknown tool");
                        Err(CodemateError::NotFound(tool_id.to_string()))
                    };
                }
            };
        }
    }

    async fn live(&self, extractor: &dyn Extractor) -> Result<ToolRecord> {
        let markup = self.fetcher.fetch(extractor.source_url()).await?;
        extractor
            .extract(&markup)
            .ok_or_else(|| CodemateError::Extraction {
                tool: extractor.tool_id().to_string(),
            })
    }
}
