#![forbid(unsafe_code)]

//! Replay a recorded canvas interaction and print one JSON line per engine
//! update.
//!
//! ```sh
//! GESSO_LOG=gesso=debug gesso-replay scenario.json --policy policy.toml
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use gesso_harness::{ReplayError, ReplayScenario, replay};
use gesso_runtime::PolicyConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "gesso-replay",
    about = "Replay a recorded canvas interaction through the strategy engine",
    version
)]
struct Args {
    /// Scenario JSON file.
    scenario: PathBuf,

    /// Policy file (TOML, or JSON with a .json extension). Overrides the
    /// scenario's own policy.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Print the committed document's child order and properties after the
    /// last update.
    #[arg(long)]
    print_document: bool,
}

fn main() {
    init_tracing();
    if let Err(error) = run(Args::parse()) {
        eprintln!("{error}");
        std::process::exit(error.exit_code());
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GESSO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_policy(path: &PathBuf) -> Result<PolicyConfig, ReplayError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let policy = if is_json {
        PolicyConfig::from_json_file(path)?
    } else {
        PolicyConfig::from_toml_file(path)?
    };
    Ok(policy)
}

fn run(args: Args) -> Result<(), ReplayError> {
    let scenario = ReplayScenario::from_json_file(&args.scenario)?;
    let policy = args.policy.as_ref().map(load_policy).transpose()?;
    let outcome = replay(&scenario, policy.as_ref())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for update in &outcome.updates {
        let line = serde_json::to_string(update)?;
        writeln!(out, "{line}").map_err(ReplayError::Output)?;
    }

    if args.print_document {
        let order: serde_json::Map<String, serde_json::Value> = outcome
            .document
            .committed()
            .child_lists()
            .map(|(parent, children)| {
                let children = children
                    .iter()
                    .map(|child| serde_json::Value::String(child.to_string()))
                    .collect();
                (parent.to_string(), serde_json::Value::Array(children))
            })
            .collect();
        let line = serde_json::json!({
            "document": {
                "selection": outcome.document.selection(),
                "children": order,
            }
        });
        writeln!(out, "{line}").map_err(ReplayError::Output)?;
    }
    Ok(())
}
