use super::{Extractor, PageProfile, SkeletonTier};
use crate::tool::ToolRecord;

const CODEX: &[(&str, Option<u64>)] = &[("GitHub Codex (GPT-3 based)", None)];

static PROFILE: PageProfile = PageProfile {
    tool_id: "GitHub Copilot",
    source_url: "https://github.com/features/copilot#pricing",
    description: "AI pair programmer from GitHub and OpenAI.",
    website: "https://github.com/features/copilot",
    logo_url: "/logos/github-copilot.png",
    brand: &["copilot"],
    // GitHub renders plans as cards with hashed class names; the stable part
    // is the "pricing" prefix.
    containers: &[
        "div[class*=\"pricing-card\"]",
        "div[class*=\"PricingCard\"]",
        "section[class*=\"plan\"]",
    ],
    heading_keywords: &["individual", "personal", "pro", "business", "enterprise"],
    vocabulary: &[
        (&["individual", "personal", "pro"], "Individual"),
        (&["business"], "Business"),
        (&["enterprise"], "Enterprise"),
    ],
    skeleton: &[
        SkeletonTier {
            name: "Individual",
            price_month: 10.0,
            annual_total: Some(100.0),
            models: CODEX,
            features: &[
                "AI code suggestions (autocompletion)",
                "Chat in IDE (e.g., VS Code, JetBrains)",
                "CLI assistance (GitHub Copilot CLI)",
                "Blocks public code matches",
                "Code referencing (experimental)",
            ],
        },
        SkeletonTier {
            name: "Business",
            price_month: 19.0,
            annual_total: None,
            models: CODEX,
            features: &[
                "All Individual features",
                "Organization-wide policy management",
                "IP indemnity",
                "Content exclusion (prevents suggestions matching public code)",
                "Audit logs (via GitHub Enterprise Cloud)",
            ],
        },
        SkeletonTier {
            name: "Enterprise",
            price_month: 39.0,
            annual_total: None,
            models: &[("GitHub Codex (customizable, fine-tunable)", None)],
            features: &[
                "All Business features",
                "Fine-tuned models on your codebase (optional, may have extra costs)",
                "Advanced security and compliance (e.g., SAML SSO)",
                "Personalized code suggestions based on org's codebase",
                "Dedicated support options",
            ],
        },
    ],
};

/// Extractor for GitHub Copilot's pricing page.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopilotExtractor;

impl Extractor for CopilotExtractor {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn names(record: &ToolRecord) -> Vec<&str> {
        record.tiers.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn headings_with_nearby_prices() {
        let html = r#"
            <html><body>
              <div><h3>Copilot Individual</h3><p>$10 per month</p><p>or $100 per year</p>
                <ul><li>Code completions</li><li>Chat in IDE</li></ul></div>
              <div><h3>Copilot Business</h3><p>$19 per user / month</p></div>
              <div><h3>Copilot Enterprise</h3><p>$39 per user / month</p></div>
            </body></html>"#;
        let record = CopilotExtractor.extract(html).expect("tiers");
        assert_eq!(names(&record), vec!["Individual", "Business", "Enterprise"]);

        let individual = &record.tiers[0];
        assert_eq!(individual.price_month, 10.0);
        assert_eq!(individual.annual_discount_percentage, Some(16.67));
        assert_eq!(
            individual.features.as_deref(),
            Some(&["Code completions".to_string(), "Chat in IDE".to_string()][..])
        );
        // No model lines on the page: skeleton models are used.
        assert_eq!(individual.models[0].name, "GitHub Codex (GPT-3 based)");

        assert_eq!(record.tiers[1].price_month, 19.0);
        assert_eq!(record.tiers[2].price_month, 39.0);
        assert_eq!(record.source_url, "https://github.com/features/copilot#pricing");
    }

    #[test]
    fn missing_price_falls_back_to_known_tier_price() {
        let html = r#"
            <div><h2>Copilot Enterprise</h2><p>Contact sales</p></div>
            <div><h2>Copilot Business</h2><p>$21 per user / month</p></div>"#;
        let record = CopilotExtractor.extract(html).unwrap();
        assert_eq!(names(&record), vec!["Business", "Enterprise"]);
        assert_eq!(record.tier("Business").unwrap().price_month, 21.0);
        assert_eq!(record.tier("Enterprise").unwrap().price_month, 39.0);
    }

    #[test]
    fn branded_page_without_sections_uses_skeleton() {
        let html = "<html><body><p>GitHub Copilot is loading...</p></body></html>";
        let record = CopilotExtractor.extract(html).unwrap();
        assert_eq!(names(&record), vec!["Individual", "Business", "Enterprise"]);
        assert_eq!(record.tiers[0].annual_discount_percentage, Some(16.67));
    }

    #[test]
    fn unrelated_markup_yields_none() {
        let html = "<html><body><h1>Rate limited</h1><p>Try again later.</p></body></html>";
        assert!(CopilotExtractor.extract(html).is_none());
    }

    #[test]
    fn sections_that_cannot_be_canonicalized_yield_none() {
        let html = r#"<section class="plan-grid"><h3>Education</h3><p>$0</p></section>"#;
        assert!(CopilotExtractor.extract(html).is_none());
    }
}
