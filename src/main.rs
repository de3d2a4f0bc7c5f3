use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use lindy_score::fetch::{current_year, Pipeline};
use lindy_score::scoring::{InvalidRecordPolicy, ScoreError};
use lindy_score::source::{FetchOptions, Source, DEFAULT_SOURCE};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_SOURCE: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_DATA: i32 = 5;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Ranked, human-readable table
    Table,
    /// Tab-separated graft type and score
    Tsv,
    /// JSON object mapping graft type to score
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print Lindy scores ranked by score (default if no subcommand)
    Scores {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the graft data table as loaded
    Data,
    /// Serve JSON scores and an HTML dashboard over HTTP
    Serve {
        /// Address to listen on (defaults to 127.0.0.1:8080)
        #[arg(long)]
        bind: Option<String>,

        /// Open the dashboard in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "lindy-score")]
#[command(about = "Lindy scores for ACL graft choices", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/lindy-score/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Graft table source: fixture, gs://bucket/object, URL, or file path
    #[arg(short, long, global = true)]
    source: Option<String>,

    /// Year to measure graft age against (defaults to the current year)
    #[arg(long, global = true)]
    as_of: Option<i32>,

    /// Exclude records with invalid values instead of failing
    #[arg(long, global = true)]
    skip_invalid: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_logging(verbose: bool, default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { default_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,lindy_score={}", level))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Data problems and source problems get different exit codes
fn exit_code_for(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<ScoreError>().is_some() {
        EXIT_DATA
    } else {
        EXIT_SOURCE
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Scores {
        format: OutputFormat::Table,
        output: None,
    });
    let start_time = Instant::now();

    let default_level = if matches!(command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    init_logging(cli.verbose, default_level);

    let config_path = cli.config.map(PathBuf::from);

    // Init runs before loading, since the existing config may be broken
    if let Commands::Init { force } = command {
        let path = match config_path.map(Ok).unwrap_or_else(lindy_score::config::get_config_path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(EXIT_CONFIG);
            }
        };
        let config = lindy_score::config::default_config();
        if let Err(e) = lindy_score::config::write_config(&path, &config, force) {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        println!("Wrote config to {}", path.display());
        std::process::exit(EXIT_SUCCESS);
    }

    // Load config
    let config = match lindy_score::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = lindy_score::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let source_str = cli
        .source
        .or_else(|| config.source.clone())
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    let source: Source = match source_str.parse() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid source: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let fetch = match FetchOptions::from_config(config.fetch.as_ref()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let scoring = config.scoring.clone().unwrap_or_default();
    let policy = if cli.skip_invalid {
        InvalidRecordPolicy::Skip
    } else {
        scoring.invalid_records.unwrap_or_default()
    };
    let pinned_year = cli.as_of.or(scoring.as_of_year);

    tracing::debug!(source = %source, ?policy, ?pinned_year, "Resolved settings");

    let pipeline = Pipeline {
        source,
        fetch,
        policy,
    };

    // Route based on subcommand
    match command {
        Commands::Scores { format, output } => {
            let as_of_year = pinned_year.unwrap_or_else(current_year);
            let scored = match pipeline.fetch_and_score(as_of_year).await {
                Ok(Some(s)) => s,
                Ok(None) => {
                    println!("No graft data available.");
                    std::process::exit(EXIT_SUCCESS);
                }
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    std::process::exit(exit_code_for(&e));
                }
            };

            let result = &scored.report.result;
            let use_colors = output.is_none() && lindy_score::output::should_use_colors();

            if cli.verbose && format == OutputFormat::Table {
                for entry in result.ranked() {
                    println!("{}", lindy_score::output::format_breakdown(entry, use_colors));
                    println!();
                }
            }

            let rendered = match format {
                OutputFormat::Table => lindy_score::output::format_scored_table(result, use_colors),
                OutputFormat::Tsv => lindy_score::output::format_tsv(result),
                OutputFormat::Json => match lindy_score::output::format_json(result) {
                    Ok(json) => json,
                    Err(e) => {
                        eprintln!("Failed to serialize scores: {}", e);
                        std::process::exit(EXIT_FAILURE);
                    }
                },
            };

            match output {
                Some(path) => {
                    if let Err(e) = lindy_score::output::write_output(&path, &rendered) {
                        eprintln!("Error: {:#}", e);
                        std::process::exit(EXIT_FAILURE);
                    }
                    eprintln!("Wrote {} scores to {}", result.len(), path.display());
                }
                None => println!("{}", rendered),
            }

            if !scored.report.skipped.is_empty() {
                eprintln!("Skipped {} invalid record(s)", scored.report.skipped.len());
            }

            if cli.verbose {
                eprintln!();
                eprintln!(
                    "Total: {} grafts as of {} in {:?}",
                    result.len(),
                    as_of_year,
                    start_time.elapsed()
                );
            }
        }
        Commands::Data => {
            let table = match lindy_score::source::load_table(&pipeline.source, &pipeline.fetch).await
            {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    std::process::exit(EXIT_SOURCE);
                }
            };
            let use_colors = lindy_score::output::should_use_colors();
            println!("{}", lindy_score::output::format_data_table(&table, use_colors));
        }
        Commands::Serve { bind, open } => {
            let bind = bind
                .or_else(|| config.server.as_ref().and_then(|s| s.bind.clone()))
                .unwrap_or_else(|| lindy_score::config::DEFAULT_BIND.to_string());
            let addr: std::net::SocketAddr = match bind.parse() {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("Invalid bind address '{}': {}", bind, e);
                    std::process::exit(EXIT_CONFIG);
                }
            };

            let listener = match lindy_score::server::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    std::process::exit(EXIT_FAILURE);
                }
            };

            if open {
                let local = listener.local_addr().unwrap_or(addr);
                if let Err(e) = lindy_score::browser::open_dashboard(local) {
                    eprintln!("Failed to open browser: {:#}", e);
                }
            }

            let state = lindy_score::server::AppState::new(pipeline, pinned_year);
            if let Err(e) = lindy_score::server::run(listener, state).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(EXIT_FAILURE);
            }
        }
        Commands::Init { .. } => unreachable!("init handled before config load"),
    }

    std::process::exit(EXIT_SUCCESS);
}
