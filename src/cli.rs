//! CLI argument parsing (spec §6), the teacher's `clap` derive idiom
//! (`vtcode-core/src/cli/args.rs`) trimmed to a single flat `Cli` struct —
//! spec.md names no subcommands, so none are added.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "agentkit",
    version,
    about = "Terminal-driven AI coding assistant runtime"
)]
pub struct Cli {
    /// Prompt to run non-interactively. Omit to start an interactive
    /// session that reads prompts from stdin.
    #[arg(short, long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Emit NDJSON events to stdout instead of human-readable text.
    #[arg(long)]
    pub json: bool,

    /// Auto-accept every permission request instead of prompting
    /// interactively. Only meaningful with `--prompt`/`--json` (headless
    /// runs never suspend either way).
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Maximum number of LLM turns before the orchestrator aborts the
    /// prompt with an error event. Unset means unbounded.
    #[arg(long, value_name = "N")]
    pub max_turns: Option<usize>,

    /// Path to a TOML config file. Defaults to none (environment
    /// variables and built-in defaults only).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Workspace root that file and shell tools operate relative to.
    /// Defaults to the current directory.
    #[arg(long, value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// Load the most recent persisted session as the initial transcript.
    /// Session persistence is an external collaborator this crate only
    /// defines the seam for (spec §6); passing this flag without a
    /// session store configured is an error.
    #[arg(long)]
    pub resume: bool,
}
