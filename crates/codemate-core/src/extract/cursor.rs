use super::{Extractor, PageProfile, SkeletonTier};
use crate::tool::ToolRecord;

static PROFILE: PageProfile = PageProfile {
    tool_id: "Cursor",
    source_url: "https://cursor.sh/pricing",
    description: "The AI-first Code Editor.",
    website: "https://cursor.sh/",
    logo_url: "/logos/cursor.png",
    brand: &["cursor"],
    containers: &[
        "div[class*=\"pricing-card\"]",
        "div[class*=\"plan\"]",
        "section[class*=\"tier\"]",
    ],
    heading_keywords: &["hobby", "free", "basic", "pro", "business", "enterprise", "teams"],
    vocabulary: &[
        (&["basic", "free", "hobby"], "Basic/Free"),
        (&["pro"], "Pro"),
        (&["business", "enterprise", "teams"], "Business"),
    ],
    skeleton: &[
        SkeletonTier {
            name: "Basic/Free",
            price_month: 0.0,
            annual_total: None,
            models: &[
                ("GPT-3.5 Turbo (slow)", Some(50)),
                ("Claude 3 Sonnet (slow)", Some(10)),
            ],
            features: &[
                "Basic AI chat",
                "Slower model responses",
                "Limited usage of fast models",
            ],
        },
        SkeletonTier {
            name: "Pro",
            price_month: 20.0,
            annual_total: Some(192.0),
            models: &[("GPT-4o (fast)", Some(500)), ("Claude 3 Opus (fast)", Some(100))],
            features: &[
                "Faster AI responses",
                "Access to GPT-4o and Claude 3 Opus",
                "More monthly requests",
            ],
        },
        SkeletonTier {
            name: "Business",
            price_month: 40.0,
            annual_total: None,
            models: &[
                ("GPT-4o (fast, higher limits)", None),
                ("Claude 3 Opus (fast, higher limits)", None),
            ],
            features: &[
                "All Pro features",
                "Team management",
                "Centralized billing",
                "Priority support",
            ],
        },
    ],
};

/// Extractor for Cursor's pricing page.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorExtractor;

impl Extractor for CursorExtractor {
    fn tool_id(&self) -> &'static str {
        PROFILE.tool_id
    }

    fn source_url(&self) -> &'static str {
        PROFILE.source_url
    }

    fn extract(&self, markup: &str) -> Option<ToolRecord> {
        PROFILE.extract(markup)
    }
}
