use once_cell::sync::Lazy;
use regex::Regex;

use crate::tool::PricingModel;

static PRICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(\d+(?:\.\d+)?)").unwrap());

// "<count> [fast|slow] <model family>", e.g. "500 fast GPT-4o requests".
static MODEL_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d+)\s+(?:(fast|slow)\s+)?(gpt-?4[o\w-]*|claude[\w\s.-]*?(?:opus|sonnet)|gpt-?3\.5(?:-turbo)?)",
    )
    .unwrap()
});

static CLAUDE_VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:[.-]\d+)?").unwrap());

/// How many characters after an amount are inspected for its billing period.
const PERIOD_WINDOW: usize = 40;

/// Collapse runs of whitespace and lower-case.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Billing period a price amount is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingPeriod {
    Month,
    Year,
    /// A per-month figure that only applies when paying yearly.
    BilledAnnually,
    Unspecified,
}

/// Every `$<number>` amount in `text`, tagged with the period named in the
/// words that follow it.
pub fn price_mentions(text: &str) -> Vec<(f64, BillingPeriod)> {
    PRICE_RE
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let amount: f64 = c.get(1)?.as_str().parse().ok()?;
            let tail: String = text[whole.end()..]
                .chars()
                .take_while(|ch| *ch != '$')
                .take(PERIOD_WINDOW)
                .collect();
            Some((amount, billing_period(&tail.to_lowercase())))
        })
        .collect()
}

fn billing_period(tail: &str) -> BillingPeriod {
    if ["billed annually", "billed yearly", "paid annually", "paid yearly"]
        .iter()
        .any(|p| tail.contains(p))
    {
        return BillingPeriod::BilledAnnually;
    }
    let unit = tail
        .trim_start()
        .trim_start_matches('/')
        .trim_start_matches("per ")
        .trim_start_matches("a ");
    let word: String = unit
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect();
    match word.as_str() {
        "year" | "years" | "yearly" | "yr" | "y" | "annual" | "annually" => BillingPeriod::Year,
        "month" | "months" | "monthly" | "mo" => BillingPeriod::Month,
        _ if tail.contains("month") => BillingPeriod::Month,
        _ if ["/year", "per year", "a year", "/yr"].iter().any(|p| tail.contains(p)) => {
            BillingPeriod::Year
        }
        _ => BillingPeriod::Unspecified,
    }
}

/// Models named in a feature line together with an adjacent request count.
///
/// Names are normalized to a display form; a speed qualifier is kept as a
/// suffix, e.g. `"GPT-4o (fast)"`.
pub fn parse_model_line(line: &str) -> Vec<PricingModel> {
    MODEL_LINE_RE
        .captures_iter(line)
        .filter_map(|c| {
            let requests: u64 = c.get(1)?.as_str().parse().ok()?;
            let family = display_family(c.get(3)?.as_str());
            let name = match c.get(2) {
                Some(speed) => format!("{family} ({})", speed.as_str().to_lowercase()),
                None => family,
            };
            Some(PricingModel::with_requests(name, requests))
        })
        .collect()
}

fn display_family(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.starts_with("claude") {
        let family = if lower.contains("opus") { "Opus" } else { "Sonnet" };
        // "claude-3-5-sonnet" and "claude 3.5 sonnet" are the same model.
        let version = CLAUDE_VERSION_RE
            .find(&lower)
            .map(|m| m.as_str().replace('-', "."))
            .unwrap_or_else(|| "3".to_string());
        return format!("Claude {version} {family}");
    }

    let rest = lower.trim_start_matches("gpt").trim_start_matches('-');
    if rest.starts_with("3.5") {
        return "GPT-3.5 Turbo".to_string();
    }
    let mut tokens = rest.split(|c| c == '-' || c == '_').filter(|t| !t.is_empty());
    let base = tokens.next().unwrap_or("4");
    let variants: Vec<String> = tokens.map(title_case).collect();
    if variants.is_empty() {
        format!("GPT-{base}")
    } else {
        format!("GPT-{base} {}", variants.join(" "))
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_lowercases() {
        assert_eq!(normalize_text("  Copilot\n\tBusiness  "), "copilot business");
    }

    #[test]
    fn amounts_keep_document_order() {
        let amounts: Vec<f64> = price_mentions("was $25, now $19 per user, or $9.99/mo")
            .into_iter()
            .map(|(a, _)| a)
            .collect();
        assert_eq!(amounts, vec![25.0, 19.0, 9.99]);
        assert!(price_mentions("Custom pricing").is_empty());
    }

    #[test]
    fn periods_are_tagged() {
        let mentions = price_mentions("$20/month, $192 per year, $16/mo billed annually, $5");
        let periods: Vec<BillingPeriod> = mentions.iter().map(|(_, p)| *p).collect();
        assert_eq!(
            periods,
            vec![
                BillingPeriod::Month,
                BillingPeriod::Year,
                BillingPeriod::BilledAnnually,
                BillingPeriod::Unspecified,
            ]
        );
    }

    #[test]
    fn model_line_with_speed() {
        let models = parse_model_line("500 fast GPT-4o requests per month");
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "GPT-4o (fast)");
        assert_eq!(models[0].included_requests, Some(500));
    }

    #[test]
    fn model_line_claude_variants() {
        let opus = parse_model_line("100 Claude 3 Opus uses");
        assert_eq!(opus[0].name, "Claude 3 Opus");
        assert_eq!(opus[0].included_requests, Some(100));

        let sonnet = parse_model_line("10 slow claude-3.5-sonnet requests");
        assert_eq!(sonnet[0].name, "Claude 3.5 Sonnet (slow)");
    }

    #[test]
    fn model_versions_and_variants_stay_distinct() {
        let models = parse_model_line("100 claude-3-5-sonnet and 50 Claude 3 Sonnet uses");
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Claude 3.5 Sonnet", "Claude 3 Sonnet"]);

        let models = parse_model_line("500 gpt-4-turbo and 200 gpt-4o-mini and 10 GPT-4 requests");
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["GPT-4 Turbo", "GPT-4o Mini", "GPT-4"]);
    }

    #[test]
    fn model_line_gpt35() {
        let models = parse_model_line("50 slow gpt-3.5-turbo requests");
        assert_eq!(models[0].name, "GPT-3.5 Turbo (slow)");
        assert_eq!(models[0].included_requests, Some(50));
    }

    #[test]
    fn model_line_several_matches() {
        let models = parse_model_line("500 fast GPT-4 and 100 Claude Opus uses");
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["GPT-4 (fast)", "Claude 3 Opus"]);
    }

    #[test]
    fn plain_feature_is_not_a_model_line() {
        assert!(parse_model_line("Unlimited completions").is_empty());
        assert!(parse_model_line("Access to GPT-4o").is_empty());
    }
}
