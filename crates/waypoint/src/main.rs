//! waypoint CLI
//!
//! Command-line tool for inspecting a route manifest: the resolved route
//! order, which route a path dispatches to, and reverse URLs.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use waypoint::encoding::unquote;
use waypoint::{RouteManifest, UrlArgs};

/// Inspect and exercise a waypoint route manifest.
#[derive(Parser)]
#[command(name = "waypoint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Route manifest (JSON).
    #[arg(short, long, env = "WAYPOINT_MANIFEST", default_value = "routes.json")]
    manifest: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print routes in dispatch order.
    Routes,

    /// Show which route a path dispatches to.
    Match {
        /// Request path, percent-encoded or not.
        path: String,
    },

    /// Build the URL of a named route.
    Url {
        /// Route name.
        name: String,

        /// Positional values, bound to the route's variables in order.
        args: Vec<String>,

        /// Named value as NAME=VALUE; VALUE may be JSON.
        #[arg(long = "var", value_parser = parse_pair)]
        vars: Vec<(String, String)>,

        /// Query string parameter as KEY=VALUE.
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,

        /// Fragment to append.
        #[arg(long)]
        anchor: Option<String>,

        /// Build an absolute URL.
        #[arg(long)]
        absolute: bool,

        /// Base for absolute URLs, overriding the manifest.
        #[arg(long)]
        url_base: Option<String>,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))
}

/// Reads a command-line value as JSON, falling back to a plain string.
fn parse_value(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let manifest = RouteManifest::from_path(&cli.manifest)
        .with_context(|| format!("loading {}", cli.manifest.display()))?;
    debug!(routes = manifest.routes.len(), "loaded manifest");
    let table = manifest.into_route_set()?.compile()?;

    match cli.command {
        Commands::Routes => {
            println!("\nRoutes in dispatch order:");
            println!("{:-<60}", "");
            for (position, route) in table.routes().iter().enumerate() {
                println!(
                    " {:>3}  {:<24} {}",
                    position + 1,
                    route.name(),
                    route.pattern
                );
            }
            println!();
        }

        Commands::Match { path } => {
            let path = unquote(&path);
            match table.dispatch(&(), &path)? {
                Some(found) => {
                    println!("{} -> {}", found.route.name(), found.route.handler);
                    let mut params: Vec<_> = found.params.iter().collect();
                    params.sort_unstable();
                    for (name, value) in params {
                        println!("  {name} = {value}");
                    }
                }
                None => bail!("no route matched {path}"),
            }
        }

        Commands::Url {
            name,
            args,
            vars,
            query,
            anchor,
            absolute,
            url_base,
        } => {
            let mut url_args = UrlArgs::new();
            for arg in &args {
                url_args = url_args.arg(parse_value(arg));
            }
            for (key, value) in &vars {
                url_args = url_args.var(key.as_str(), parse_value(value));
            }
            for (key, value) in query {
                url_args = url_args.query(key, value);
            }
            if let Some(anchor) = anchor {
                url_args = url_args.anchor(anchor);
            }
            if let Some(base) = url_base {
                url_args = url_args.url_base(base);
            }
            if absolute {
                url_args = url_args.absolute();
            }
            println!("{}", table.url_for(&name, &url_args)?);
        }
    }

    Ok(())
}
