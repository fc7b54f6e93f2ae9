//! cofund CLI: bundling and co-funding analysis over a JSON grant file
//!
//! The grant file is a JSON array of grant records. Logs go to stderr and are
//! controlled through `RUST_LOG`.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use cofund::{AnalysisConfig, BundlingResult, CoFundingOptions, CoFundingResult, GrantAnalyzer, JsonGrantStore};
use comfy_table::{ContentArrangement, Table};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cofund", version, about = "Multi-foundation grant and co-funding analysis")]
struct Cli {
    /// YAML analysis configuration
    #[arg(long, global = true, env = "COFUND_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Args)]
struct Selection {
    /// JSON file of grant records
    #[arg(long)]
    grants: PathBuf,

    /// Foundation id (repeatable)
    #[arg(short = 'f', long = "foundation", required = true, num_args = 1..)]
    foundations: Vec<String>,

    /// Tax year (repeatable)
    #[arg(short = 'y', long = "year", required = true, num_args = 1..)]
    years: Vec<i32>,

    /// Minimum distinct funders for a bundled grantee
    #[arg(long)]
    min_foundations: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect recipients funded by several foundations
    Bundling {
        #[command(flatten)]
        selection: Selection,
    },
    /// Build the co-funding network and recommend foundations
    Cofunding {
        #[command(flatten)]
        selection: Selection,

        /// Minimum combined similarity for a network edge
        #[arg(long)]
        threshold: Option<f64>,

        /// Maximum number of recommendations
        #[arg(long)]
        max_recommendations: Option<usize>,

        /// Foundation already working with the requester (repeatable)
        #[arg(long, num_args = 1..)]
        known: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Commands::Bundling { selection } => {
            let bundling = run_bundling(&selection, config).await?.1;
            print_bundling(&bundling, &cli.format)
        }
        Commands::Cofunding {
            selection,
            threshold,
            max_recommendations,
            known,
        } => {
            let (analyzer, bundling) = run_bundling(&selection, config).await?;
            let mut options = CoFundingOptions::from_config(analyzer.config());
            if let Some(t) = threshold {
                options.similarity_threshold = t;
            }
            if let Some(n) = max_recommendations {
                options.max_recommendations = n;
            }
            options.known_foundations = known;
            let cofunding = analyzer.analyze_cofunding_with(&bundling, &options)?;
            print_cofunding(&cofunding, &cli.format)
        }
    }
}

async fn run_bundling(
    selection: &Selection,
    config: AnalysisConfig,
) -> anyhow::Result<(GrantAnalyzer<JsonGrantStore>, BundlingResult)> {
    let store = JsonGrantStore::open(&selection.grants)
        .with_context(|| format!("reading grants from {}", selection.grants.display()))?;
    info!("Loaded {} grant records", store.record_count());

    let min_foundations = selection.min_foundations.unwrap_or(config.min_foundations);
    let analyzer = GrantAnalyzer::with_config(Arc::new(store), config)?;
    let bundling = analyzer
        .analyze_bundling(&selection.foundations, &selection.years, min_foundations)
        .await?;
    Ok((analyzer, bundling))
}

fn print_bundling(result: &BundlingResult, format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if !result.excluded_foundations.is_empty() {
        println!("Excluded foundations: {}", result.excluded_foundations.join(", "));
    }

    let mut grantees = new_table(&["Recipient", "Funders", "Total", "Years", "Stability", "Keywords"]);
    for g in &result.bundled_grantees {
        grantees.add_row(vec![
            g.recipient.display_name.clone(),
            g.funder_count.to_string(),
            format!("{:.2}", g.total_funding),
            format!("{}-{}", g.first_year, g.last_year),
            format!("{:?}", g.stability),
            g.common_purpose_keywords.join(", "),
        ]);
    }
    println!("{}", grantees);
    println!(
        "{} bundled of {} grantees across {} foundations",
        result.bundled_grantees.len(),
        result.total_grantees,
        result.total_foundations_analyzed
    );

    if !result.overlaps.is_empty() {
        let mut overlaps = new_table(&["Foundation A", "Foundation B", "Shared", "Jaccard"]);
        for o in &result.overlaps {
            overlaps.add_row(vec![
                o.foundation_a_name.clone(),
                o.foundation_b_name.clone(),
                o.shared_count.to_string(),
                format!("{:.3}", o.jaccard_similarity),
            ]);
        }
        println!("{}", overlaps);
    }

    if !result.thematic_clusters.is_empty() {
        let mut themes = new_table(&["Theme", "Grantees", "Total", "Foundations"]);
        for c in &result.thematic_clusters {
            themes.add_row(vec![
                c.theme.clone(),
                c.grantee_count.to_string(),
                format!("{:.2}", c.total_funding),
                c.foundations.join(", "),
            ]);
        }
        println!("{}", themes);
    }

    let stats = &result.statistics;
    println!(
        "Grants: {}  Funding: {:.2}  Completeness: {:.2}  EIN confidence: {:.2}  ({} ms)",
        stats.total_grants_analyzed,
        stats.total_funding,
        stats.data_quality.completeness,
        stats.data_quality.ein_match_confidence,
        result.processing_time_ms
    );
    Ok(())
}

fn print_cofunding(result: &CoFundingResult, format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let stats = &result.network_stats;
    println!(
        "Network: {} nodes, {} edges, density {:.3}, {} component(s), modularity {:.3}",
        stats.node_count, stats.edge_count, stats.density, stats.component_count, stats.modularity
    );

    if !result.peer_groups.is_empty() {
        let mut groups = new_table(&["Group", "Foundations", "Density", "Avg similarity", "Bridges"]);
        for g in &result.peer_groups {
            groups.add_row(vec![
                g.group_id.to_string(),
                g.foundations.join(", "),
                format!("{:.3}", g.cluster_density),
                format!("{:.3}", g.average_similarity),
                g.bridge_foundations.join(", "),
            ]);
        }
        println!("{}", groups);
    }

    if result.recommendations.is_empty() {
        println!("(no recommendations)");
        return Ok(());
    }
    let mut recs = new_table(&["Foundation", "Type", "Priority", "Confidence", "Evidence"]);
    for r in &result.recommendations {
        recs.add_row(vec![
            format!("{} ({})", r.foundation_name, r.foundation_id),
            format!("{:?}", r.recommendation_type),
            format!("{:?}", r.priority),
            format!("{:.2}", r.confidence),
            r.evidence.join("; "),
        ]);
    }
    println!("{}", recs);
    Ok(())
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.iter().copied());
    table
}
