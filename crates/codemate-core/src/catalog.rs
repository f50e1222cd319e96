use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{CodemateError, Result};
use crate::tool::{annual_discount, tool_key, PricingModel, PricingTier, ToolRecord};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "tool", default)]
    tools: Vec<CatalogTool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogTool {
    tool_id: String,
    source_url: String,
    last_verified: DateTime<Utc>,
    description: Option<String>,
    website: Option<String>,
    logo_url: Option<String>,
    #[serde(rename = "tier", default)]
    tiers: Vec<CatalogTier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogTier {
    name: String,
    price_month: f64,
    /// Yearly billing total, if the tier offers one.
    annual_total: Option<f64>,
    features: Option<Vec<String>>,
    #[serde(rename = "model", default)]
    models: Vec<PricingModel>,
}

impl CatalogTier {
    fn into_tier(self) -> PricingTier {
        PricingTier {
            annual_discount_percentage: self
                .annual_total
                .and_then(|total| annual_discount(self.price_month, total)),
            name: self.name,
            price_month: self.price_month,
            models: self.models,
            features: self.features,
        }
    }
}

/// Read-only table of tool records, loaded once and shared.
#[derive(Debug, Clone)]
pub struct Catalog {
    tools: Vec<ToolRecord>,
}

impl Catalog {
    /// Parse and validate a catalog from TOML.
    pub fn parse(toml_str: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(toml_str)
            .map_err(|e| CodemateError::Catalog(format!("bad catalog.toml: {e}")))?;

        let mut tools: Vec<ToolRecord> = Vec::with_capacity(file.tools.len());
        for raw in file.tools {
            let key = tool_key(&raw.tool_id);
            if key.is_empty() {
                return Err(CodemateError::Catalog("tool with empty toolId".into()));
            }
            if tools.iter().any(|t| t.key() == key) {
                return Err(CodemateError::Catalog(format!(
                    "duplicate tool: {}",
                    raw.tool_id
                )));
            }
            if raw.tiers.is_empty() {
                return Err(CodemateError::Catalog(format!(
                    "{}: at least one tier is required",
                    raw.tool_id
                )));
            }

            let mut tiers: Vec<PricingTier> = Vec::with_capacity(raw.tiers.len());
            for tier in raw.tiers {
                if tier.price_month < 0.0 {
                    return Err(CodemateError::Catalog(format!(
                        "{}/{}: negative price",
                        raw.tool_id, tier.name
                    )));
                }
                if tiers.iter().any(|t| t.name == tier.name) {
                    return Err(CodemateError::Catalog(format!(
                        "{}: duplicate tier {}",
                        raw.tool_id, tier.name
                    )));
                }
                tiers.push(tier.into_tier());
            }

            tools.push(ToolRecord {
                tool_id: raw.tool_id,
                tiers,
                last_verified: raw.last_verified,
                source_url: raw.source_url,
                description: raw.description,
                website: raw.website,
                logo_url: raw.logo_url,
            });
        }
        Ok(Self { tools })
    }

    /// Load the catalog bundled from the data/ directory at compile time.
    pub fn bundled() -> Result<Self> {
        let toml_str = include_str!("../../../data/catalog.toml");
        Self::parse(toml_str)
    }

    /// Case-insensitive lookup by tool identifier.
    pub fn find(&self, tool_id: &str) -> Option<&ToolRecord> {
        let key = tool_key(tool_id);
        self.tools.iter().find(|t| t.key() == key)
    }

    /// Tool identifiers in declared order.
    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.tool_id.as_str()).collect()
    }

    pub fn tools(&self) -> &[ToolRecord] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
