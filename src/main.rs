//! EasySearch command-line entry point
//!
//! Runs one aggregation and prints the result as JSON.

use anyhow::{bail, Context, Result};
use easysearch::{config, Aggregator, SearchQuery};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    query: SearchQuery,
    words: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        return Ok(());
    };

    let settings = config::load(args.config).context("loading settings")?;

    let default_level = if settings.general.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting EasySearch v{}", easysearch::VERSION);

    let aggregator = Aggregator::from_settings(settings).context("building HTTP client")?;
    let query = SearchQuery {
        text: args.words.join(" "),
        ..args.query
    };

    let result = aggregator.search(&query).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Parse command-line arguments; `None` means usage or version was printed
fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let mut args = Args::default();

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("easysearch {}", easysearch::VERSION);
                return Ok(None);
            }
            "-c" | "--config" => {
                let path = argv.next().context("--config needs a file")?;
                args.config = Some(PathBuf::from(path));
            }
            "-n" | "--limit" => {
                let limit = argv.next().context("--limit needs a number")?;
                let limit: usize = limit.parse().context("--limit needs a number")?;
                args.query.limit = Some(limit);
            }
            "--enable" | "--disable" => {
                let name = argv.next().with_context(|| format!("{arg} needs a provider name"))?;
                args.query.overrides.insert(name, arg == "--enable");
            }
            flag if flag.starts_with('-') && flag.len() > 1 => bail!("unknown option {flag}"),
            _ => args.words.push(arg),
        }
    }

    if args.words.is_empty() {
        print_usage();
        return Ok(None);
    }
    Ok(Some(args))
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
EasySearch v{}
Aggregates results from several search engines into one ranked list

USAGE:
    easysearch [OPTIONS] <QUERY>...

OPTIONS:
    -c, --config <FILE>     Path to configuration file
    -n, --limit <N>         Return at most N results
        --enable <NAME>     Query this provider even if disabled
        --disable <NAME>    Skip this provider
    -h, --help              Print help information
    -V, --version           Print version information

ENVIRONMENT VARIABLES:
    EASYSEARCH_SETTINGS_PATH    Path to settings.yml
    EASYSEARCH__<SECTION>__<KEY> Override a setting, e.g. EASYSEARCH__SEARCH__GLOBAL_TIMEOUT=3
    RUST_LOG                    Log filter (logs go to stderr)
"#,
        easysearch::VERSION
    );
}
