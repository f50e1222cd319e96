//! Best-effort pricing extraction from pricing-page markup.
//!
//! Upstream pages have no shared schema, so each supported tool gets its own
//! [`Extractor`]. The tools differ in where tier sections live and what their
//! tiers are called; both are described by a [`PageProfile`] and run through
//! the same discovery and normalization steps here.

mod copilot;
mod cursor;
mod text;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};

use crate::tool::{
    annual_discount, normalize_tiers, tool_key, PricingModel, PricingTier, ToolRecord,
};

pub use copilot::CopilotExtractor;
pub use cursor::CursorExtractor;
pub use text::{normalize_text, parse_model_line, price_mentions, BillingPeriod};

/// Produce a [`ToolRecord`] from markup for exactly one tool.
///
/// Implementations are pure: no network access, no shared state. `None`
/// means no tier survived discovery.
pub trait Extractor: Send + Sync {
    /// Canonical identifier of the tool this extractor understands.
    fn tool_id(&self) -> &'static str;

    /// Page the markup is expected to come from.
    fn source_url(&self) -> &'static str;

    fn extract(&self, markup: &str) -> Option<ToolRecord>;
}

/// Extractors keyed by case-insensitive tool identifier.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    by_key: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every tool that has a live pricing source.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CopilotExtractor));
        registry.register(Arc::new(CursorExtractor));
        registry
    }

    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        self.by_key.insert(tool_key(extractor.tool_id()), extractor);
    }

    pub fn get(&self, tool_id: &str) -> Option<Arc<dyn Extractor>> {
        self.by_key.get(&tool_key(tool_id)).cloned()
    }

    pub fn contains(&self, tool_id: &str) -> bool {
        self.by_key.contains_key(&tool_key(tool_id))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Known-good tier used when the page cannot supply a value.
pub(crate) struct SkeletonTier {
    pub name: &'static str,
    pub price_month: f64,
    /// Yearly billing total, when the tier offers annual billing.
    pub annual_total: Option<f64>,
    pub models: &'static [(&'static str, Option<u64>)],
    pub features: &'static [&'static str],
}

impl SkeletonTier {
    fn models(&self) -> Vec<PricingModel> {
        self.models
            .iter()
            .map(|(name, requests)| match requests {
                Some(n) => PricingModel::with_requests(*name, *n),
                None => PricingModel::named(*name),
            })
            .collect()
    }

    fn features(&self) -> Option<Vec<String>> {
        if self.features.is_empty() {
            None
        } else {
            Some(self.features.iter().map(|f| f.to_string()).collect())
        }
    }

    fn to_tier(&self) -> PricingTier {
        PricingTier {
            name: self.name.to_string(),
            price_month: self.price_month,
            models: self.models(),
            annual_discount_percentage: self
                .annual_total
                .and_then(|total| annual_discount(self.price_month, total)),
            features: self.features(),
        }
    }
}

/// Static description of one tool's pricing page.
pub(crate) struct PageProfile {
    pub tool_id: &'static str,
    pub source_url: &'static str,
    pub description: &'static str,
    pub website: &'static str,
    pub logo_url: &'static str,
    /// Words whose presence marks the markup as this tool's page.
    pub brand: &'static [&'static str],
    /// CSS selectors for tier cards, tried before heading search.
    pub containers: &'static [&'static str],
    /// Heading words that mark the start of a tier section.
    pub heading_keywords: &'static [&'static str],
    /// Discovered name words → canonical tier name. First match wins.
    pub vocabulary: &'static [(&'static [&'static str], &'static str)],
    pub skeleton: &'static [SkeletonTier],
}

const HEADING_SELECTOR: &str = "h1, h2, h3, h4";
const CARD_NAME_SELECTOR: &str =
    "h1, h2, h3, h4, .plan-name, [class*=\"plan-name\"], [class*=\"title\"]";
const CARD_PRICE_SELECTOR: &str = ".price, [class*=\"price\"], [class*=\"Price\"]";
const ITEM_SELECTOR: &str = "li, .feature-item";
/// How many ancestors of a heading are searched for a price.
const HEADING_CLIMB: usize = 3;

/// A candidate tier section lifted out of the document.
#[derive(Debug, Clone, Default)]
struct Section {
    name_hint: String,
    price_text: String,
    text: String,
    items: Vec<String>,
}

impl PageProfile {
    pub fn canonicalize(&self, name_hint: &str) -> Option<&'static str> {
        let normalized = normalize_text(name_hint);
        let words: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        self.vocabulary
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| words.contains(k)))
            .map(|(_, canonical)| *canonical)
    }

    fn skeleton_tier(&self, name: &str) -> Option<&SkeletonTier> {
        self.skeleton.iter().find(|t| t.name == name)
    }

    fn record(&self, tiers: Vec<PricingTier>) -> ToolRecord {
        ToolRecord {
            tool_id: self.tool_id.to_string(),
            tiers,
            last_verified: Utc::now(),
            source_url: self.source_url.to_string(),
            description: Some(self.description.to_string()),
            website: Some(self.website.to_string()),
            logo_url: Some(self.logo_url.to_string()),
        }
    }

    /// Run discovery, canonicalization, de-duplication and ordering.
    pub fn extract(&self, markup: &str) -> Option<ToolRecord> {
        let document = Html::parse_document(markup);
        let sections = self.discover(&document);

        if sections.is_empty() {
            let page_text = normalize_text(&element_text(&document.root_element()));
            let recognized = self.brand.iter().any(|b| page_text.contains(b));
            if !recognized {
                tracing::debug!(tool = self.tool_id, "markup does not look like a pricing page");
                return None;
            }
            tracing::warn!(
                tool = self.tool_id,
                "no tier sections found, using built-in tier skeleton"
            );
            let tiers = self.skeleton.iter().map(SkeletonTier::to_tier).collect();
            return Some(self.record(normalize_tiers(tiers)));
        }

        let tiers: Vec<PricingTier> = sections
            .iter()
            .filter_map(|section| self.build_tier(section))
            .collect();
        let tiers = normalize_tiers(tiers);
        if tiers.is_empty() {
            tracing::warn!(
                tool = self.tool_id,
                sections = sections.len(),
                "no discovered section could be mapped to a tier"
            );
            return None;
        }
        Some(self.record(tiers))
    }

    fn discover(&self, document: &Html) -> Vec<Section> {
        let from_cards = self.card_sections(document);
        if !from_cards.is_empty() {
            return from_cards;
        }
        self.heading_sections(document)
    }

    fn card_sections(&self, document: &Html) -> Vec<Section> {
        if self.containers.is_empty() {
            return Vec::new();
        }
        let Some(cards) = parse_selector(&self.containers.join(", ")) else {
            return Vec::new();
        };
        let (Some(name_sel), Some(price_sel)) =
            (parse_selector(CARD_NAME_SELECTOR), parse_selector(CARD_PRICE_SELECTOR))
        else {
            return Vec::new();
        };

        let matched: Vec<ElementRef> = document.select(&cards).collect();
        // Wrappers that contain other cards are layout, not tiers.
        let innermost = matched.iter().filter(|outer| {
            !matched
                .iter()
                .any(|inner| inner.id() != outer.id() && inner.ancestors().any(|a| a.id() == outer.id()))
        });

        innermost
            .filter_map(|card| {
                let name_hint = card
                    .select(&name_sel)
                    .map(|el| normalize_text(&element_text(&el)))
                    .find(|t| !t.is_empty())?;
                let text = element_text(card);
                let price_text = card
                    .select(&price_sel)
                    .map(|el| element_text(&el))
                    .find(|t| t.contains('$'))
                    .unwrap_or_else(|| text.clone());
                Some(Section {
                    name_hint,
                    price_text,
                    items: items(card),
                    text,
                })
            })
            .collect()
    }

    fn heading_sections(&self, document: &Html) -> Vec<Section> {
        let Some(headings) = parse_selector(HEADING_SELECTOR) else {
            return Vec::new();
        };
        document
            .select(&headings)
            .filter(|heading| self.is_tier_heading(heading))
            .map(|heading| {
                let root = self.section_root(heading, &headings);
                let text = element_text(&root);
                Section {
                    name_hint: normalize_text(&element_text(&heading)),
                    price_text: text.clone(),
                    items: items(&root),
                    text,
                }
            })
            .collect()
    }

    fn is_tier_heading(&self, heading: &ElementRef) -> bool {
        normalize_text(&element_text(heading))
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| self.heading_keywords.contains(&w))
    }

    /// Nearest ancestor of a heading (within [`HEADING_CLIMB`] levels) whose
    /// text carries a price, without reaching into a sibling tier.
    fn section_root<'a>(&self, heading: ElementRef<'a>, headings: &Selector) -> ElementRef<'a> {
        let mut current = heading;
        for _ in 0..HEADING_CLIMB {
            if element_text(&current).contains('$') {
                break;
            }
            let Some(parent) = current.parent().and_then(ElementRef::wrap) else {
                break;
            };
            let tier_headings = parent
                .select(headings)
                .filter(|h| self.is_tier_heading(h))
                .count();
            if tier_headings > 1 {
                break;
            }
            current = parent;
        }
        current
    }

    fn build_tier(&self, section: &Section) -> Option<PricingTier> {
        let Some(name) = self.canonicalize(&section.name_hint) else {
            tracing::debug!(tool = self.tool_id, hint = %section.name_hint, "discarding section");
            return None;
        };
        let skeleton = self.skeleton_tier(name);

        let mut models: Vec<PricingModel> = Vec::new();
        let mut features: Vec<String> = Vec::new();
        for item in &section.items {
            let parsed = parse_model_line(item);
            if parsed.is_empty() {
                features.push(item.clone());
                continue;
            }
            for model in parsed {
                let key = model.name.to_lowercase();
                if !models.iter().any(|m| m.name.to_lowercase() == key) {
                    models.push(model);
                }
            }
        }

        let pricing = SectionPricing::read(&section.price_text, &section.text);
        let (price_month, annual_discount_percentage) = match (pricing.monthly, skeleton) {
            (Some(monthly), _) => (
                monthly,
                pricing
                    .annual_total
                    .and_then(|total| annual_discount(monthly, total)),
            ),
            (None, Some(sk)) => {
                let fallback = sk.to_tier();
                (fallback.price_month, fallback.annual_discount_percentage)
            }
            (None, None) => return None,
        };

        if models.is_empty() {
            models = skeleton.map(SkeletonTier::models).unwrap_or_default();
        }
        let features = if features.is_empty() {
            skeleton.and_then(SkeletonTier::features)
        } else {
            Some(features)
        };

        Some(PricingTier {
            name: name.to_string(),
            price_month,
            models,
            annual_discount_percentage,
            features,
        })
    }
}

/// Monthly price and yearly billing total read from a section.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SectionPricing {
    pub monthly: Option<f64>,
    pub annual_total: Option<f64>,
}

impl SectionPricing {
    /// `price_text` is the part of the section most likely to hold the
    /// headline price; `full_text` is searched for annual billing terms.
    pub fn read(price_text: &str, full_text: &str) -> Self {
        let headline = price_mentions(price_text);
        let all = price_mentions(full_text);

        let is_monthly =
            |p: &BillingPeriod| matches!(p, BillingPeriod::Month | BillingPeriod::Unspecified);
        let monthly = headline
            .iter()
            .chain(all.iter())
            .find(|(_, period)| is_monthly(period))
            .or_else(|| {
                all.iter()
                    .find(|(_, period)| *period == BillingPeriod::BilledAnnually)
            })
            .map(|(amount, _)| *amount);

        let annual_total = all.iter().find_map(|(amount, period)| match period {
            BillingPeriod::Year => Some(*amount),
            BillingPeriod::BilledAnnually => Some(amount * 12.0),
            _ => None,
        });

        // A monthly figure that is itself the annual-billing rate has no
        // separate monthly price to compare against.
        let annual_total = match (monthly, annual_total) {
            (Some(m), Some(total)) if (m * 12.0 - total).abs() < 0.005 => None,
            (_, total) => total,
        };

        Self {
            monthly,
            annual_total,
        }
    }
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::debug!(selector = css, error = %e, "invalid selector");
            None
        }
    }
}

fn element_text(el: &ElementRef) -> String {
    let joined = el.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn items(el: &ElementRef) -> Vec<String> {
    let Some(sel) = parse_selector(ITEM_SELECTOR) else {
        return Vec::new();
    };
    el.select(&sel)
        .map(|item| element_text(&item))
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_is_case_insensitive() {
        let registry = ExtractorRegistry::with_defaults();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("github copilot"));
        assert!(registry.contains("CURSOR"));
        assert!(!registry.contains("Tabnine"));
        assert_eq!(registry.get("cursor").unwrap().tool_id(), "Cursor");
    }

    #[test]
    fn pricing_monthly_and_yearly_total() {
        let p = SectionPricing::read("$20/month", "$20/month or $192/year");
        assert_eq!(p.monthly, Some(20.0));
        assert_eq!(p.annual_total, Some(192.0));
    }

    #[test]
    fn pricing_prefers_month_to_month_over_billed_annually() {
        let p = SectionPricing::read(
            "$16/mo billed annually",
            "$16/mo billed annually or $20 month-to-month",
        );
        assert_eq!(p.monthly, Some(20.0));
        assert_eq!(p.annual_total, Some(192.0));
    }

    #[test]
    fn pricing_undetermined_without_amount() {
        let p = SectionPricing::read("Contact sales", "Contact sales for a quote");
        assert_eq!(p, SectionPricing::default());
    }

    #[test]
    fn pricing_only_annual_rate_has_no_discount() {
        let p = SectionPricing::read("$12/mo billed annually", "$12/mo billed annually");
        assert_eq!(p.monthly, Some(12.0));
        assert_eq!(p.annual_total, None);
    }

    #[test]
    fn innermost_cards_win_over_wrappers() {
        let html = r#"
            <div class="plans">
              <div class="plan"><h3>Pro</h3><span class="price">$20/month</span></div>
              <div class="plan"><h3>Business</h3><span class="price">$40/month</span></div>
            </div>"#;
        let record = cursor::CursorExtractor.extract(html).unwrap();
        let prices: Vec<f64> = record.tiers.iter().map(|t| t.price_month).collect();
        assert_eq!(prices, vec![20.0, 40.0]);
    }
}
