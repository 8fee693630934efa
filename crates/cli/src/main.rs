//! Prism CLI — initializes, searches, and watches a project's index with no
//! server process in front of `prism-core`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use prism_core::config::PrismConfig;
use prism_core::coordinator::Coordinator;

#[derive(Parser)]
#[command(name = "prismd", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or load and reconcile) the index for a project
    Init {
        /// Project root (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Search the index for a keyword or phrase
    Search {
        /// Search query
        query: String,

        /// Project root (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Maximum number of results
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Re-walk the project and apply only what changed
    Reindex {
        /// Project root (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Print the indexed lines of a single file
    Context {
        /// File path, relative to the project root
        path: String,

        /// Project root (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Print index size, term count, and cache statistics
    Stats {
        /// Project root (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Initialize, then watch the project for changes until interrupted
    Watch {
        /// Project root (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

fn resolve_root(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| std::env::current_dir().expect("could not determine current directory"))
        .canonicalize()
        .expect("project root not found")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("prism=warn".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { root } => {
            let coordinator = Coordinator::new(PrismConfig::new(resolve_root(root)));
            match coordinator.init() {
                Ok(summary) => print_summary(cli.json, &summary),
                Err(e) => fail(&e),
            }
        }
        Commands::Search { query, root, limit } => {
            let coordinator = Coordinator::new(PrismConfig::new(resolve_root(root)));
            if let Err(e) = coordinator.init() {
                fail(&e);
            }
            match coordinator.engine().search(&query, limit) {
                Ok(results) => print_results(cli.json, &query, &results),
                Err(e) => fail(&e),
            }
        }
        Commands::Reindex { root } => {
            let coordinator = Coordinator::new(PrismConfig::new(resolve_root(root)));
            if let Err(e) = coordinator.init() {
                fail(&e);
            }
            match coordinator.reindex() {
                Ok(summary) => print_summary(cli.json, &summary),
                Err(e) => fail(&e),
            }
        }
        Commands::Context { path, root } => {
            let coordinator = Coordinator::new(PrismConfig::new(resolve_root(root)));
            if let Err(e) = coordinator.init() {
                fail(&e);
            }
            match coordinator.get_file_context(&path) {
                Ok(lines) => {
                    if cli.json {
                        let items: Vec<_> = lines
                            .iter()
                            .map(|l| serde_json::json!({"line": l.line_number, "text": l.text}))
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&items).unwrap());
                    } else {
                        for line in &lines {
                            println!("{:>5} | {}", line.line_number, line.text);
                        }
                    }
                }
                Err(e) => fail(&e),
            }
        }
        Commands::Stats { root } => {
            let coordinator = Coordinator::new(PrismConfig::new(resolve_root(root)));
            if let Err(e) = coordinator.init() {
                fail(&e);
            }
            let stats = coordinator.stats();
            if cli.json {
                let output = serde_json::json!({
                    "files": stats.file_count,
                    "chunks": stats.chunk_count,
                    "terms": stats.term_count,
                    "postings": stats.posting_count,
                    "cache": {
                        "hits": stats.cache.hits,
                        "misses": stats.cache.misses,
                        "len": stats.cache.len,
                        "capacity": stats.cache.capacity,
                    },
                });
                println!("{}", serde_json::to_string_pretty(&output).unwrap());
            } else {
                println!("Files:     {}", stats.file_count);
                println!("Chunks:    {}", stats.chunk_count);
                println!("Terms:     {}", stats.term_count);
                println!("Postings:  {}", stats.posting_count);
                println!("Cache:     {}/{} (hits {}, misses {})", stats.cache.len, stats.cache.capacity, stats.cache.hits, stats.cache.misses);
            }
        }
        Commands::Watch { root } => {
            let coordinator = Arc::new(Coordinator::new(PrismConfig::new(resolve_root(root))));
            if let Err(e) = coordinator.init() {
                fail(&e);
            }
            if let Err(e) = coordinator.start_watcher() {
                fail(&e);
            }
            tracing::info!("watching for changes, press ctrl-c to stop");
            loop {
                std::thread::sleep(std::time::Duration::from_secs(3600));
            }
        }
    }
}

fn print_summary(json: bool, summary: &prism_core::ReindexSummary) {
    if json {
        let output = serde_json::json!({
            "added": summary.added,
            "modified": summary.modified,
            "deleted": summary.deleted,
            "unchanged": summary.unchanged,
            "files": summary.file_count,
            "skipped": summary.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    } else {
        println!(
            "+{} ~{} -{} ={}  ({} files indexed, {} skipped)",
            summary.added, summary.modified, summary.deleted, summary.unchanged, summary.file_count, summary.skipped
        );
    }
}

fn print_results(json: bool, query: &str, results: &[prism_core::SearchResult]) {
    if json {
        println!("{}", serde_json::to_string_pretty(results).unwrap());
        return;
    }
    if results.is_empty() {
        eprintln!("No results for '{query}'");
        std::process::exit(1);
    }
    for r in results {
        println!("{}:{}: {}  ({:.2}, {})", r.path, r.line_number, r.text, r.score, r.language);
    }
    eprintln!("\n{} results", results.len());
}

fn fail(e: &prism_core::PrismError) -> ! {
    eprintln!("error: {e}");
    std::process::exit(1);
}
