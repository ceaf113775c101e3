use anyhow::{Context, Result};
use book_resolver::config::{find_config_file, load_config, Config};
use book_resolver::models::{BookRecord, SearchHints};
use book_resolver::sources::{Provider, ProviderCapabilities};
use book_resolver::ui::{print_record_card, print_search_header, print_status, ProgressSpinner, Status};
use book_resolver::utils::{record_table, records_table, ProgressSink};
use book_resolver::{BookResolver, ProviderRegistry};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Book Resolver - Look up and search book metadata across public catalogs
#[derive(Parser, Debug)]
#[command(name = "book-resolver")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Look up and search book metadata across public catalogs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-provider timeout in seconds during a cascade
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve one ISBN through every provider tier
    #[command(alias = "l")]
    Lookup {
        /// ISBN-10 or ISBN-13 (hyphens and spaces allowed)
        isbn: String,

        /// Only ask the two fast providers
        #[arg(long)]
        fast: bool,
    },

    /// Search by title, author or identifier
    #[command(alias = "s")]
    Search {
        /// Free-text query, e.g. "Sapiens by Yuval Noah Harari" or 'pub:"Penguin" Dune'
        query: String,

        /// Restrict to a publisher
        #[arg(long)]
        publisher: Option<String>,

        /// Restrict to a subject
        #[arg(long)]
        subject: Option<String>,

        /// Restrict to a place of publication
        #[arg(long)]
        place: Option<String>,

        /// Restrict to a publication year
        #[arg(long)]
        year: Option<String>,

        /// Restrict to a language code
        #[arg(long)]
        language: Option<String>,
    },

    /// List cascade providers
    Providers,

    /// Print the effective configuration as TOML
    Config,
}

impl Commands {
    fn hints(&self) -> Option<SearchHints> {
        let Commands::Search {
            publisher,
            subject,
            place,
            year,
            language,
            ..
        } = self
        else {
            return None;
        };
        let hints = SearchHints {
            publisher: publisher.clone(),
            subject: subject.clone(),
            place: place.clone(),
            year: year.clone(),
            language: language.clone(),
        };
        (!hints.is_empty()).then_some(hints)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    if let Some(secs) = cli.timeout {
        config.resolver.provider_timeout_secs = secs;
    }

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let resolver = BookResolver::from_config(&config).context("Failed to build resolver")?;
    let format = cli.output.resolve();

    match &cli.command {
        Commands::Lookup { isbn, fast } => {
            let spinner = spinner(&cli, &format!("Resolving {}", isbn));
            let record = if *fast {
                resolver.lookup_fast(isbn).await
            } else {
                resolver
                    .resolve_by_identifier(isbn, Some(&spinner as &dyn ProgressSink))
                    .await
            };
            spinner.clear();

            match record {
                Some(record) => output_record(&record, format)?,
                None => {
                    print_status(Status::Error, &format!("No provider has data for {}", isbn));
                    std::process::exit(1);
                }
            }
        }

        Commands::Search { query, .. } => {
            let hints = cli.command.hints();
            let spinner = spinner(&cli, &format!("Searching for \"{}\"", query));
            let started = Instant::now();
            let records = resolver
                .search_multiple(query, Some(&spinner as &dyn ProgressSink), hints.as_ref())
                .await;
            spinner.clear();

            if format == OutputFormat::Table && !cli.quiet {
                print_search_header(query, records.len(), started.elapsed());
            }
            output_records(&records, format)?;
        }

        Commands::Providers => output_providers(resolver.registry(), format)?,

        Commands::Config => {
            let masked = mask_api_keys(config);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&masked)?),
                _ => print!("{}", masked.to_toml()?),
            }
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => config.logging.level.as_str(),
        (false, 1) => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("book_resolver={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn spinner(cli: &Cli, msg: &str) -> ProgressSpinner {
    if !cli.quiet && std::io::stderr().is_terminal() {
        ProgressSpinner::new(msg)
    } else {
        ProgressSpinner::hidden()
    }
}

fn mask_api_keys(mut config: Config) -> Config {
    for key in [&mut config.api_keys.google_books, &mut config.api_keys.isbndb] {
        if let Some(value) = key.as_mut() {
            *value = mask(value);
        }
    }
    config
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}****", visible)
}

fn output_record(record: &BookRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Plain => print_plain(record),
        _ => {
            print_record_card(record);
            println!("{}", record_table(record));
        }
    }
    Ok(())
}

fn output_records(records: &[BookRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Plain => records.iter().for_each(print_plain),
        _ if records.is_empty() => print_status(Status::Warning, "No books found"),
        _ => println!("{}", records_table(records)),
    }
    Ok(())
}

fn print_plain(record: &BookRecord) {
    println!(
        "{} - {} ({})",
        record.title.as_deref().unwrap_or("(untitled)"),
        record.author.as_deref().unwrap_or("unknown author"),
        record.source.as_deref().unwrap_or("unknown")
    );
    if let Some(isbn) = record.isbn() {
        println!("  ISBN: {}", isbn);
    }
    if let Some(publisher) = &record.publisher {
        println!("  Publisher: {}", publisher);
    }
    if let Some(date) = &record.published_date {
        println!("  Published: {}", date);
    }
    println!();
}

fn output_providers(registry: &ProviderRegistry, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let providers: Vec<_> = registry
                .all()
                .map(|entry| {
                    serde_json::json!({
                        "id": entry.descriptor.id,
                        "name": entry.descriptor.name,
                        "tier": entry.descriptor.priority_tier,
                        "capabilities": capability_names(entry.provider.capabilities()),
                        "configured": entry.provider.is_configured(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&providers)?);
        }
        OutputFormat::Plain => {
            for entry in registry.all() {
                println!(
                    "{} - {} (tier {})",
                    entry.descriptor.id, entry.descriptor.name, entry.descriptor.priority_tier
                );
            }
        }
        _ => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Tier", "Id", "Name", "Capabilities", "Configured"]);

            for entry in registry.all() {
                let configured = if entry.provider.is_configured() { "yes" } else { "no" };
                table.add_row(vec![
                    Cell::new(entry.descriptor.priority_tier),
                    Cell::new(&entry.descriptor.id).add_attribute(Attribute::Bold),
                    Cell::new(&entry.descriptor.name),
                    Cell::new(capability_names(entry.provider.capabilities()).join(", ")),
                    Cell::new(configured),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn capability_names(capabilities: ProviderCapabilities) -> Vec<String> {
    capabilities
        .iter_names()
        .map(|(name, _)| name.to_lowercase())
        .collect()
}
