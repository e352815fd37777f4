use anyhow::{Context, Result};
use clap::Parser;
use prisk::config::Config;
use prisk::indexer::python;
use prisk::model::ModuleLookup;
use prisk::pipeline::{AnalysisReport, Analyzer};
use prisk::source::{ChangeSource, GitWorkTree, JsonChangeSet, JsonInput, load_lookup};
use prisk::{cli, util};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn run_analysis(source: &dyn ChangeSource, opts: &cli::AnalyzeOpts) -> Result<()> {
    let mut config = Config::load(opts.config.as_deref())?;
    opts.apply(&mut config);
    let lookup = match opts.context.as_deref() {
        Some(path) => load_lookup(path)?,
        None => ModuleLookup::new(),
    };
    let analyzer = Analyzer::new(config)?.with_lookup(lookup);
    let changes = source
        .load()
        .with_context(|| format!("load {} change set", source.name()))?;
    let report = analyzer.analyze(&changes);
    print_json(&report, opts.pretty)
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Analyze {
            repo,
            base,
            history,
            opts,
        } => run_analysis(
            &GitWorkTree::new(repo, base).with_history_depth(history),
            &opts,
        ),
        cli::Command::AnalyzeJson { input, opts } => {
            run_analysis(&JsonChangeSet::new(JsonInput::from_arg(input)), &opts)
        }
        cli::Command::Imports { path } => {
            let source = util::read_to_string(&path)?;
            let imports = python::extract_imports(&source);
            print_json(
                &json!({ "path": path.display().to_string(), "imports": imports }),
                true,
            )
        }
        cli::Command::Schema { config } => {
            let schema = if config {
                schemars::schema_for!(Config)
            } else {
                schemars::schema_for!(AnalysisReport)
            };
            print_json(&schema, true)
        }
    }
}
