//! Sumi-Sweep main entry point
//!
//! This is the command-line interface for the Sumi-Sweep site sweeper.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use sumi_sweep::config::{load_config_with_hash, Config};
use sumi_sweep::crawler::{run_sweep, CrawlOutcome, StopSignal, SweepOptions};
use sumi_sweep::output::print_summary;
use sumi_sweep::plan::prepare_plan;
use sumi_sweep::render::{FixtureRenderer, HttpRenderer, Renderer};
use sumi_sweep::ConfigError;
use tracing_subscriber::EnvFilter;

/// No page could be fetched
const EXIT_EXHAUSTED: u8 = 2;
/// The configuration failed to load or validate
const EXIT_CONFIG: u8 = 3;

/// Sumi-Sweep: a plan-driven site sweeper
///
/// Sumi-Sweep discovers the pages of a single site for full-site capture. It can
/// probe the site's category/product structure into a reusable plan, then crawls
/// breadth-first under page, depth and per-category quota limits.
#[derive(Parser, Debug)]
#[command(name = "sumi-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A plan-driven site sweeper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Continue a stopped run from its checkpoint
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Ignore any checkpoint and rebuild the site plan
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "plan_only")]
    dry_run: bool,

    /// Run structure detection, persist and print the plan, then exit
    #[arg(long, conflicts_with = "dry_run")]
    plan_only: bool,

    /// Serve pages from a JSON site fixture instead of live HTTP
    #[arg(long, value_name = "FILE")]
    fixture: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            if e.chain().any(|cause| cause.is::<ConfigError>()) {
                ExitCode::from(EXIT_CONFIG)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("invalid configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(ExitCode::SUCCESS);
    }

    match &cli.fixture {
        Some(path) => {
            let renderer = FixtureRenderer::from_json_file(path)
                .with_context(|| format!("failed to load fixture {}", path.display()))?;
            tracing::info!("Serving pages from fixture {}", path.display());
            dispatch(&cli, config, config_hash, renderer).await
        }
        None => {
            let renderer = HttpRenderer::new(config.user_agent.clone(), &config.timing)
                .context("failed to build HTTP renderer")?;
            dispatch(&cli, config, config_hash, renderer).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_sweep=info,warn"),
            1 => EnvFilter::new("sumi_sweep=debug,info"),
            2 => EnvFilter::new("sumi_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn dispatch<R: Renderer>(
    cli: &Cli,
    config: Config,
    config_hash: String,
    renderer: R,
) -> anyhow::Result<ExitCode> {
    if cli.plan_only {
        handle_plan_only(&config, &renderer, cli.fresh).await?;
        Ok(ExitCode::SUCCESS)
    } else {
        let options = SweepOptions {
            fresh: cli.fresh,
            resume: cli.resume,
            config_hash: Some(config_hash),
        };
        handle_sweep(config, renderer, options).await
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Deterministic: {}", config.crawler.deterministic);
    println!("  Stop file: {}", config.stop_file().display());

    println!("\nScope:");
    println!("  Same host only: {}", config.scope.same_host_only);
    println!("  Include subdomains: {}", config.scope.include_subdomains);
    println!("  Allow patterns: {}", config.scope.allow.len());
    println!("  Deny patterns: {}", config.scope.deny.len());
    match &config.scope.keep_query_params {
        _ if config.scope.strip_query => println!("  Query: stripped"),
        Some(keep) => println!("  Query: keep {:?}", keep),
        None => println!("  Query: kept"),
    }

    println!("\nStructure Detection:");
    if config.structure.enabled {
        println!(
            "  Probe up to {} categories, {} products each, {} in total",
            config.structure.probe_category_limit,
            config.structure.products_per_category,
            config.structure.global_product_cap
        );
        println!("  Profiles: {}", config.profiles_dir().display());
    } else {
        println!("  Disabled (plain BFS)");
    }

    println!("\nProxy Pool ({}):", config.proxy.pool.len());
    for entry in &config.proxy.pool {
        println!("  - {}", entry.server);
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Output: {}", config.crawl_dir().display());

    println!("\nStart URLs ({}):", config.crawler.start_urls.len());
    for url in &config.crawler.start_urls {
        println!("  * {}", url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --plan-only mode: detects structure and prints the plan
async fn handle_plan_only<R: Renderer>(
    config: &Config,
    renderer: &R,
    force_rebuild: bool,
) -> anyhow::Result<()> {
    let plan = prepare_plan(config, renderer, force_rebuild)
        .await
        .context("structure detection failed")?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

/// Handles the main sweep operation
async fn handle_sweep<R: Renderer>(
    config: Config,
    renderer: R,
    options: SweepOptions,
) -> anyhow::Result<ExitCode> {
    if options.fresh {
        tracing::info!("Starting fresh sweep (ignoring previous state)");
    } else if options.resume || config.crawler.resume {
        tracing::info!("Starting sweep (will resume from checkpoint if present)");
    }

    let stop = StopSignal::with_sentinel(config.stop_file());
    let interrupt = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            interrupt.raise();
        }
    });

    let report = run_sweep(config, renderer, &options, stop)
        .await
        .context("sweep failed")?;
    print_summary(&report);

    Ok(match report.outcome {
        CrawlOutcome::Exhausted => ExitCode::from(EXIT_EXHAUSTED),
        CrawlOutcome::Done | CrawlOutcome::Stopped => ExitCode::SUCCESS,
    })
}
