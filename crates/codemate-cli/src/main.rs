use clap::{Parser, Subcommand};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use codemate_core::{
    boundary::parse_tool_list,
    resolve_many, CodemateError, PricingModel, PricingTier, Resolved, Resolver, Settings, Source,
};
use tracing_subscriber::EnvFilter;

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_hint() -> Style   { Style::new().color256(243) }         // soft gray
fn s_hot() -> Style    { Style::new().color256(114) }         // green
fn s_warm() -> Style   { Style::new().color256(214) }         // amber
fn s_err() -> Style    { Style::new().color256(167) }         // red
fn s_price() -> Style  { Style::new().color256(109) }         // teal
fn s_bold() -> Style   { Style::new().bold() }
fn s_label() -> Style  { Style::new().color256(146) }         // muted lavender

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

fn source_str(source: Source) -> String {
    match source {
        Source::Live           => format!("{}", s_hot().apply_to("\u{25cf} live")),
        Source::StaleCache     => format!("{}", s_warm().apply_to("\u{25d0} cached")),
        Source::StaticFallback => format!("{}", s_dim().apply_to("\u{25cb} catalog")),
    }
}

fn fmt_price(v: f64) -> String {
    if v == 0.0 {
        "free".to_string()
    } else if v.fract() == 0.0 {
        format!("${v:.0}")
    } else {
        format!("${v:.2}")
    }
}

fn fmt_discount(pct: Option<f64>) -> String {
    match pct {
        Some(p) => format!("-{p}%"),
        None => "\u{2500}".to_string(),
    }
}

fn fmt_model(m: &PricingModel) -> String {
    match m.included_requests {
        Some(n) => format!("{} \u{00d7}{n}", m.name),
        None => m.name.clone(),
    }
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "codemate",
    about = "Compare pricing tiers, models and features of AI coding assistants",
    version,
    after_help = "examples:\n  \
        codemate cursor\n  \
        codemate \"github copilot\" --json\n  \
        codemate compare cursor,tabnine\n  \
        codemate tools\n  \
        codemate                                 (list known tools)"
)]
struct Cli {
    query: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long, short, global = true)]
    json: bool,

    /// Show per-tier features and resolution logs.
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Side-by-side pricing for one or two tools.
    Compare {
        /// Comma-separated tool names, e.g. cursor,tabnine
        tools: String,
    },
    /// List tools with known pricing.
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load()?;
    let resolver = Resolver::from_settings(&settings)?;

    match cli.command {
        Some(Commands::Compare { ref tools }) => cmd_compare(&resolver, tools, &cli).await?,
        Some(Commands::Tools) => cmd_tools(&resolver, &cli)?,
        None => match cli.query {
            Some(ref query) => cmd_tool(&resolver, query, &cli).await?,
            None => cmd_tools(&resolver, &cli)?,
        },
    }
    Ok(())
}

fn print_error(e: &CodemateError) {
    eprintln!("{}", s_err().apply_to(format!("error: {e}")));
}

// ── Commands ─────────────────────────────────────────────────────────

async fn cmd_tool(resolver: &Resolver, query: &str, opts: &Cli) -> anyhow::Result<()> {
    let term = Term::stderr();
    let interactive = term.is_term() && !opts.json;
    if interactive {
        term.write_line(&format!("{}", s_dim().apply_to("fetching pricing...")))?;
    }
    let outcome = resolver.resolve(query).await;
    if interactive {
        term.clear_last_lines(1)?;
    }

    let resolved = match outcome {
        Ok(r) => r,
        Err(e) => {
            print_error(&e);
            if matches!(e, CodemateError::NotFound(_)) {
                eprintln!();
                eprintln!("{}", s_dim().apply_to("  Known tools: codemate tools"));
            }
            std::process::exit(1);
        }
    };

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&resolved.record)?);
        return Ok(());
    }
    print_tool(&resolved, opts.verbose);
    Ok(())
}

async fn cmd_compare(resolver: &Resolver, raw: &str, opts: &Cli) -> anyhow::Result<()> {
    let names = match parse_tool_list(raw) {
        Ok(n) => n,
        Err(e) => {
            print_error(&e);
            std::process::exit(2);
        }
    };

    let comparison = match resolve_many(resolver, &names).await {
        Ok(c) => c,
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    };

    if opts.json {
        let records: Vec<_> = comparison.found.iter().map(|r| &r.record).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for (name, e) in &comparison.missing {
        eprintln!("{}", s_warm().apply_to(format!("warning: skipped {name}: {e}")));
    }

    println!();
    println!("  {}", s_header().apply_to("summary"));
    println!("  {}", sep(56));
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("  Tool").fg(Color::AnsiValue(243)),
        Cell::new("Tiers").fg(Color::AnsiValue(243)),
        Cell::new("Free").fg(Color::AnsiValue(243)),
        Cell::new("From").fg(Color::AnsiValue(243)),
        Cell::new("Source").fg(Color::AnsiValue(243)),
    ]);
    for r in &comparison.found {
        let from = r
            .record
            .cheapest_paid()
            .map(|t| format!("{}/mo", fmt_price(t.price_month)))
            .unwrap_or_else(|| "\u{2500}".to_string());
        table.add_row(vec![
            Cell::new(format!("  {}", r.record.tool_id)).fg(Color::AnsiValue(252)),
            Cell::new(r.record.tiers.len()),
            Cell::new(if r.record.has_free_tier() { "yes" } else { "no" }),
            Cell::new(from).fg(Color::AnsiValue(109)),
            Cell::new(source_str(r.source)),
        ]);
    }
    println!("{table}");

    for r in &comparison.found {
        print_tool(r, opts.verbose);
    }
    Ok(())
}

fn cmd_tools(resolver: &Resolver, opts: &Cli) -> anyhow::Result<()> {
    let catalog = resolver.catalog();
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&catalog.tool_ids())?);
        return Ok(());
    }

    println!();
    println!("  {}", s_header().apply_to("tools"));
    println!("  {}", sep(56));
    for record in catalog.tools() {
        let live = if resolver.is_scraped(&record.tool_id) {
            s_hot().apply_to(format!("{:<8}", "live")).to_string()
        } else {
            s_hint().apply_to(format!("{:<8}", "catalog")).to_string()
        };
        println!(
            "  {} {} {}",
            s_bold().apply_to(format!("{:<22}", record.tool_id)),
            live,
            s_dim().apply_to(record.description.as_deref().unwrap_or(""))
        );
    }
    println!();
    println!("{}", s_hint().apply_to("  codemate <tool> for details"));
    Ok(())
}

// ── Rendering ────────────────────────────────────────────────────────

fn print_tool(resolved: &Resolved, verbose: bool) {
    let record = &resolved.record;

    println!();
    println!(
        "{}  {}",
        s_bold().apply_to(&record.tool_id),
        source_str(resolved.source)
    );
    if let Some(ref desc) = record.description {
        println!("  {}", s_dim().apply_to(desc));
    }
    println!("  {}", sep(56));

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("  Tier").fg(Color::AnsiValue(243)),
        Cell::new("$/mo").fg(Color::AnsiValue(243)),
        Cell::new("Annual").fg(Color::AnsiValue(243)),
        Cell::new("Models").fg(Color::AnsiValue(243)),
    ]);
    for tier in &record.tiers {
        let models: Vec<String> = tier.models.iter().map(fmt_model).collect();
        table.add_row(vec![
            Cell::new(format!("  {}", tier.name)).fg(Color::AnsiValue(252)),
            Cell::new(fmt_price(tier.price_month)).fg(Color::AnsiValue(109)),
            Cell::new(fmt_discount(tier.annual_discount_percentage)).fg(Color::AnsiValue(114)),
            Cell::new(models.join("\n")),
        ]);
    }
    println!("{table}");

    if verbose {
        for tier in &record.tiers {
            print_features(tier);
        }
    }

    let age = chrono::Utc::now() - record.last_verified;
    println!();
    println!(
        "  {}  {}",
        s_hint().apply_to(&record.source_url),
        s_hint().apply_to(format!("verified {}d ago", age.num_days().max(0)))
    );
}

fn print_features(tier: &PricingTier) {
    let Some(ref features) = tier.features else {
        return;
    };
    if features.is_empty() {
        return;
    }
    println!();
    println!(
        "  {}  {}",
        s_label().apply_to(&tier.name),
        s_price().apply_to(fmt_price(tier.price_month))
    );
    let last = features.len() - 1;
    for (i, f) in features.iter().enumerate() {
        let branch = if i == last { "\u{2514}\u{2500}" } else { "\u{251c}\u{2500}" };
        println!("  {} {}", s_tree().apply_to(branch), f);
    }
}
