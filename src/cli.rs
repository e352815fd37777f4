use crate::config::Config;
use crate::source::DEFAULT_HISTORY_DEPTH;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "prisk",
    version,
    about = "Change impact, risk and test advice for Python change sets",
    after_help = r#"Examples:
  prisk analyze --repo . --base origin/main
  prisk analyze --repo . --base HEAD~3 --transitive --depth 2 --pretty
  prisk analyze --repo . --context context.json --history 10
  prisk analyze-json --input pr.json
  cat pr.json | prisk analyze-json
  prisk imports src/billing/pay.py
  prisk schema --config
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze working tree changes against a git base revision.
    Analyze {
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        /// Revision to diff against.
        #[arg(long, default_value = "HEAD")]
        base: String,
        /// Recent commits to report per changed file (0 disables).
        #[arg(long, default_value_t = DEFAULT_HISTORY_DEPTH)]
        history: usize,
        #[command(flatten)]
        opts: AnalyzeOpts,
    },
    /// Analyze a JSON change set: {"changed": [...], "files": {...}}.
    AnalyzeJson {
        /// JSON file to read; stdin when omitted or `-`.
        #[arg(long, value_name = "PATH")]
        input: Option<PathBuf>,
        #[command(flatten)]
        opts: AnalyzeOpts,
    },
    /// Print the imports extracted from one Python file.
    Imports { path: PathBuf },
    /// Print the JSON schema of the analysis report.
    Schema {
        /// Print the configuration file schema instead.
        #[arg(long)]
        config: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct AnalyzeOpts {
    /// YAML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// JSON module lookup with related modules and coverage levels.
    #[arg(long, value_name = "PATH")]
    pub context: Option<PathBuf>,
    /// Include modules that import the changed files.
    #[arg(long)]
    pub transitive: bool,
    /// Maximum import hops for --transitive.
    #[arg(long)]
    pub depth: Option<usize>,
    /// Let test modules count as dependents.
    #[arg(long)]
    pub include_tests: bool,
    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,
}

impl AnalyzeOpts {
    /// Command-line flags win over file and environment settings.
    pub fn apply(&self, config: &mut Config) {
        if self.transitive {
            config.impact.transitive = true;
        }
        if let Some(depth) = self.depth {
            config.impact.max_depth = depth;
        }
        if self.include_tests {
            config.impact.include_tests = true;
        }
    }
}
