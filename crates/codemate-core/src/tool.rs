use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An AI model exposed within a tier, with optional usage and cost limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_requests: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overage_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_token_cost_per_million: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_token_cost_per_million: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window_tokens: Option<u64>,
}

impl PricingModel {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            included_requests: None,
            overage_cost: None,
            input_token_cost_per_million: None,
            output_token_cost_per_million: None,
            context_window_tokens: None,
        }
    }

    pub fn with_requests(name: impl Into<String>, requests: u64) -> Self {
        Self {
            included_requests: Some(requests),
            ..Self::named(name)
        }
    }
}

/// A named pricing plan within a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTier {
    pub name: String,
    /// Monthly price in USD; 0 means free.
    pub price_month: f64,
    /// Empty means the models are unspecified.
    #[serde(default)]
    pub models: Vec<PricingModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_discount_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl PricingTier {
    pub fn is_free(&self) -> bool {
        self.price_month == 0.0
    }
}

/// Pricing data for one tool. The unit of caching and the unit returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    pub tool_id: String,
    pub tiers: Vec<PricingTier>,
    pub last_verified: DateTime<Utc>,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl ToolRecord {
    /// Lower-cased identifier used for cache and catalog lookups.
    pub fn key(&self) -> String {
        tool_key(&self.tool_id)
    }

    pub fn tier(&self, name: &str) -> Option<&PricingTier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// Cheapest tier with a non-zero price.
    pub fn cheapest_paid(&self) -> Option<&PricingTier> {
        self.tiers
            .iter()
            .filter(|t| !t.is_free())
            .min_by(|a, b| {
                a.price_month
                    .partial_cmp(&b.price_month)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    pub fn has_free_tier(&self) -> bool {
        self.tiers.iter().any(PricingTier::is_free)
    }
}

/// Canonical case-insensitive key for a tool identifier.
pub fn tool_key(tool_id: &str) -> String {
    tool_id.trim().to_lowercase()
}

/// Round to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Percentage saved by paying `annual_total` once a year instead of
/// `monthly` twelve times, rounded to two decimals.
///
/// `None` when the monthly price is zero or the annual total is not a
/// discount (equal to or above twelve monthly payments).
pub fn annual_discount(monthly: f64, annual_total: f64) -> Option<f64> {
    let full_year = monthly * 12.0;
    if full_year <= 0.0 || annual_total < 0.0 || annual_total >= full_year {
        return None;
    }
    Some(round2((full_year - annual_total) / full_year * 100.0))
}

/// Drop later tiers that repeat an earlier name, then order free tiers
/// first and the rest ascending by monthly price. The sort is stable, so
/// equal prices keep discovery order.
pub fn normalize_tiers(tiers: Vec<PricingTier>) -> Vec<PricingTier> {
    let mut out: Vec<PricingTier> = Vec::with_capacity(tiers.len());
    for tier in tiers {
        if out.iter().any(|t| t.name == tier.name) {
            continue;
        }
        out.push(tier);
    }
    out.sort_by(|a, b| match (a.is_free(), b.is_free()) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a
            .price_month
            .partial_cmp(&b.price_month)
            .unwrap_or(std::cmp::Ordering::Equal),
    });
    out
}
