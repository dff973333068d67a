//! newsdb CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use newsdb::{
    commands::{
        cmd_classes, cmd_correct, cmd_countries, cmd_init, cmd_load, cmd_search, print_correction,
        print_load_stats, print_response,
    },
    config::Config,
    error::Result,
    moderate::CorrectionRequest,
    query::PageQuery,
    search::SearchIndex,
    store::PageStore,
    taxonomy::{Lang, Taxonomy},
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "newsdb")]
#[command(version, about = "COVID-19 news aggregation data layer", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize newsdb configuration and taxonomy template
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Replay pending page ingestions and the correction audit log
    Load {
        /// Page NDJSON file (defaults from config)
        #[arg(long)]
        pages: Option<PathBuf>,

        /// Correction audit log (defaults from config)
        #[arg(long)]
        corrections: Option<PathBuf>,
    },

    /// Apply a moderator correction to one page
    Correct {
        /// Page url
        url: String,

        /// Corrected displayed country (internal code)
        #[arg(long)]
        country: String,

        /// Corrected topic list (external codes)
        #[arg(long, num_args = 1..)]
        topics: Vec<String>,

        /// Mark the page as pandemic-related
        #[arg(long)]
        covid: bool,

        /// Mark the page as useful
        #[arg(long)]
        useful: bool,

        /// Mark the page as rumor-related
        #[arg(long)]
        rumor: bool,

        /// Free-text moderator note
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Pages sliced by topic
    Classes {
        /// External topic code ('search' delegates to full-text search)
        #[arg(long)]
        topic: Option<String>,

        /// External country code
        #[arg(long)]
        country: Option<String>,

        #[arg(long, default_value = "0")]
        start: u64,

        #[arg(long, default_value = "10")]
        limit: i64,

        #[arg(long, value_enum, default_value = "ja")]
        lang: Lang,

        /// Free-text query (used with --topic search)
        #[arg(long)]
        query: Option<String>,
    },

    /// Pages sliced by country
    Countries {
        /// External country code
        #[arg(long)]
        country: Option<String>,

        /// External topic code
        #[arg(long)]
        topic: Option<String>,

        #[arg(long, default_value = "0")]
        start: u64,

        #[arg(long, default_value = "10")]
        limit: i64,

        #[arg(long, value_enum, default_value = "ja")]
        lang: Lang,
    },

    /// Full-text search across indexed pages
    Search {
        /// The search query
        query: String,

        /// External country code
        #[arg(long)]
        country: Option<String>,

        #[arg(long, default_value = "0")]
        start: u64,

        #[arg(long, default_value = "10")]
        limit: i64,

        #[arg(long, value_enum, default_value = "ja")]
        lang: Lang,
    },

    /// Show stored page count
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Init does not need existing config
    if let Commands::Init { force } = cli.command {
        let base_dir = cli.config.as_deref().and_then(|p| p.parent()).map(PathBuf::from);
        cmd_init(base_dir, force).await?;
        println!("✓ newsdb initialized successfully");
        println!("\nNext steps:");
        println!("  1. Fill in the taxonomy tables (taxonomy.json)");
        println!("  2. Point [files] in config.toml at the pipeline output");
        println!("  3. Run: newsdb load");
        return Ok(());
    }

    // Completions do not need config or connections
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "newsdb", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let taxonomy = Taxonomy::load(&config.taxonomy_file())?;
    let store = PageStore::connect(&config.mongo).await?;
    let index = SearchIndex::connect(&config.search)?;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Load { pages, corrections } => {
            let stats = cmd_load(
                &config,
                &taxonomy,
                &store,
                pages.as_deref(),
                corrections.as_deref(),
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_load_stats(&stats);
            }
        }

        Commands::Correct {
            url,
            country,
            topics,
            covid,
            useful,
            rumor,
            notes,
        } => {
            let request = CorrectionRequest {
                url,
                is_about_covid_19: covid,
                is_useful: useful,
                is_about_false_rumor: rumor,
                country,
                topics,
                notes,
            };

            let record = cmd_correct(&config, &taxonomy, &store, &request).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_correction(&record);
            }
        }

        Commands::Classes {
            topic,
            country,
            start,
            limit,
            lang,
            query,
        } => {
            let params = PageQuery {
                topic,
                country,
                start,
                limit,
                lang,
                query,
            };
            let response = cmd_classes(&config, &taxonomy, &store, &index, &params).await?;
            print_response(&response)?;
        }

        Commands::Countries {
            country,
            topic,
            start,
            limit,
            lang,
        } => {
            let params = PageQuery {
                topic,
                country,
                start,
                limit,
                lang,
                query: None,
            };
            let response = cmd_countries(&config, &taxonomy, &store, &params).await?;
            print_response(&response)?;
        }

        Commands::Search {
            query,
            country,
            start,
            limit,
            lang,
        } => {
            let params = PageQuery {
                topic: None,
                country,
                start,
                limit,
                lang,
                query: Some(query),
            };
            let response = cmd_search(&config, &taxonomy, &store, &index, &params).await?;
            print_response(&response)?;
        }

        Commands::Status => {
            let count = store.count().await?;
            if cli.json {
                println!("{}", serde_json::json!({ "pages": count }));
            } else {
                println!("Pages stored: {}", count);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_config_path);

    if !config_path.exists() {
        eprintln!(
            "Config file not found: {}\nRun 'newsdb init' first.",
            config_path.display()
        );
        std::process::exit(1);
    }

    Config::load(&config_path)
}
