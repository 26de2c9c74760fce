use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use gallery_api::{EmptyState, Session, ShowcaseView, View};
use gallery_core::config::DEFAULT_MANIFEST;
use gallery_core::{Action, GalleryConfig, SortDirection, SortKey};
use gallery_store::{FsFetcher, Source};
use serde::Serialize;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "galleryctl", version, about = "Query a project gallery catalog")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Directory that data locations resolve against
    #[arg(long = "data-dir", env = "GALLERY_DATA_DIR", global = true, default_value = ".")]
    data_dir: PathBuf,

    /// Manifest listing the data files, relative to the data dir
    #[arg(long = "manifest", env = "GALLERY_MANIFEST", global = true, default_value = DEFAULT_MANIFEST)]
    manifest: String,

    /// Load this data file directly instead of the manifest (repeatable)
    #[arg(long = "data", global = true, action = ArgAction::Append)]
    data: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Filter, sort and page through the catalog
    Ls {
        /// Start from a URL query string, e.g. "platform=linux&category=vision"
        #[arg(long = "query")]
        query: Option<String>,
        #[arg(long = "platform")]
        platform: Option<String>,
        /// Required tag (repeatable; all must match)
        #[arg(long = "tag", action = ArgAction::Append)]
        tags: Vec<String>,
        /// Free text over name, description, author, language, platforms and tags
        #[arg(long = "search")]
        search: Option<String>,
        /// name | stars | author | lastUpdated
        #[arg(long = "sort", value_parser = SortKey::from_str)]
        sort: Option<SortKey>,
        /// asc | desc
        #[arg(long = "direction", value_parser = SortDirection::from_str)]
        direction: Option<SortDirection>,
        #[arg(long = "page")]
        page: Option<usize>,
        #[arg(long = "page-size")]
        page_size: Option<usize>,
        /// Print record counts after each filter stage
        #[arg(long = "explain", action = ArgAction::SetTrue)]
        explain: bool,
    },
    /// Platforms and ranked tags with counts
    Facets {
        /// List every tag instead of the top N
        #[arg(long = "all", action = ArgAction::SetTrue)]
        all: bool,
    },
    /// Show the featured project and rotate through the showcase set
    Showcase {
        /// Stop after this many rotations (default: until Ctrl-C)
        #[arg(long = "ticks")]
        ticks: Option<u64>,
        #[arg(long = "rotate-ms")]
        rotate_ms: Option<u64>,
    },
}

fn init_tracing() {
    let env = std::env::var("GALLERY_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("GALLERY_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid GALLERY_METRICS_ADDR; expected host:port");
        }
    }
}

fn sources(cli: &Cli) -> Vec<Source> {
    if cli.data.is_empty() {
        vec![Source::Manifest(cli.manifest.clone())]
    } else {
        cli.data.iter().cloned().map(Source::Data).collect()
    }
}

/// Env config with per-command flag overrides on top.
fn config_for(cmd: &Commands) -> GalleryConfig {
    let mut cfg = GalleryConfig::from_env();
    match cmd {
        Commands::Ls { page_size: Some(n), .. } if *n > 0 => cfg.page_size = *n,
        Commands::Showcase { rotate_ms: Some(ms), .. } if *ms > 0 => cfg.rotate_ms = *ms,
        _ => {}
    }
    cfg
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    let fetcher = Arc::new(FsFetcher::new(&cli.data_dir));
    let mut session = Session::new(fetcher, sources(&cli), config_for(&cli.command));
    match session.load().await {
        Ok(out) => {
            for f in &out.failures {
                warn!(location = %f.location, error = %f.error, "data file skipped");
            }
            info!(records = out.records, files = out.files, failed = out.failures.len(), "catalog ready");
        }
        Err(e) => {
            // Keep going with the empty catalog; the view reports it as no data.
            error!(error = %e, "catalog load failed");
            if cli.output == Output::Human { eprintln!("load error: {}", e); }
        }
    }

    match cli.command {
        Commands::Ls { query, platform, tags, search, sort, direction, page, page_size: _, explain } => {
            if let Some(qs) = query { session.apply_query_string(&qs); }
            if let Some(p) = platform {
                if session.state().platform.as_deref() != Some(p.trim().to_lowercase().as_str()) {
                    session.dispatch(Action::TogglePlatform(p));
                }
            }
            for t in tags {
                if !session.state().tags.contains(&t.trim().to_lowercase()) { session.dispatch(Action::ToggleTag(t)); }
            }
            if let Some(s) = search { session.dispatch(Action::SetSearch(s)); }
            if let Some(k) = sort { session.dispatch(Action::SetSort(k)); }
            if let Some(d) = direction { session.dispatch(Action::SetDirection(d)); }
            let view = match page {
                Some(n) => session.dispatch(Action::SetPage(n)),
                None => session.view(),
            };
            let dbg = explain.then(|| {
                let catalog = session.store().current();
                gallery_search::evaluate_with_debug(&catalog.projects, session.state(), session.config().page_size).1
            });
            match cli.output {
                Output::Human => {
                    print_view(&view);
                    if let Some(d) = dbg {
                        eprintln!("debug: total={} after_platform={} after_tags={} after_search={}", d.total, d.after_platform, d.after_tags, d.after_search);
                    }
                    eprintln!("query: ?{}", session.query_string());
                }
                Output::Json => {
                    #[derive(Serialize)]
                    struct Explain<'a> { view: &'a View, query: String, debug: Option<gallery_search::QueryDebugInfo> }
                    println!("{}", serde_json::to_string_pretty(&Explain { view: &view, query: session.query_string(), debug: dbg })?);
                }
            }
        }
        Commands::Facets { all } => {
            if all { session.expand_tags(); }
            let window = session.tag_window();
            match cli.output {
                Output::Human => {
                    println!("PLATFORMS");
                    for f in &session.facets().platforms { println!("  {:<24} {}", f.value, f.count); }
                    println!("TAGS ({} of {})", window.visible().len(), window.total());
                    for f in window.visible() { println!("  {:<24} {}", f.value, f.count); }
                    if window.needs_expander() { println!("  … {} more (--all)", window.hidden()); }
                }
                Output::Json => {
                    #[derive(Serialize)]
                    struct Out<'a> { platforms: &'a [gallery_core::Facet], tags: &'a [gallery_core::Facet], hidden: usize }
                    let out = Out { platforms: &session.facets().platforms, tags: window.visible(), hidden: window.hidden() };
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
            }
        }
        Commands::Showcase { ticks, rotate_ms: _ } => {
            let Some(first) = session.showcase_current() else {
                if cli.output == Output::Human { println!("no showcase projects"); }
                return Ok(());
            };
            print_showcase(cli.output, &first)?;
            if ticks == Some(0) || !session.start_rotation() { return Ok(()); }
            info!(period_ms = session.config().rotate_ms, "rotating showcase");
            let mut shown = 0u64;
            loop {
                tokio::select! {
                    next = session.next_showcase() => {
                        let Some(v) = next else { break };
                        print_showcase(cli.output, &v)?;
                        shown += 1;
                        if ticks.map(|t| shown >= t).unwrap_or(false) { break; }
                    }
                    _ = signal::ctrl_c() => {
                        info!("interrupted");
                        break;
                    }
                }
            }
            session.stop_rotation();
        }
    }
    Ok(())
}

fn print_view(view: &View) {
    match view.empty {
        Some(EmptyState::NoData) => { println!("no projects loaded"); return; }
        Some(EmptyState::NoMatches) => { println!("no projects match the current filters"); return; }
        None => {}
    }
    println!("{:<32} {:>6}  {:<10}  {}", "NAME", "STARS", "UPDATED", "AUTHOR");
    for p in &view.projects {
        let stars = p.stars.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        let updated = p.last_updated.as_deref().map(|d| d.get(..10).unwrap_or(d)).unwrap_or("-");
        println!("{:<32} {:>6}  {:<10}  {}", p.name, stars, updated, p.author.as_deref().unwrap_or("-"));
    }
    let pg = &view.pagination;
    if view.projects.is_empty() {
        println!("page {} is past the end ({} pages)", pg.page, pg.page_count);
    }
    if pg.is_visible() {
        println!("page {}/{} · {} matches", pg.page, pg.page_count, pg.total_matches);
    } else {
        println!("{} matches", pg.total_matches);
    }
}

fn print_showcase(output: Output, v: &ShowcaseView) -> Result<()> {
    match output {
        Output::Human => {
            println!("[{}/{}] {}", v.index + 1, v.count, v.project.name);
            if !v.project.description.is_empty() { println!("  {}", v.project.description); }
            if !v.project.link.is_empty() { println!("  {}", v.project.link); }
        }
        Output::Json => println!("{}", serde_json::to_string(v)?),
    }
    Ok(())
}
