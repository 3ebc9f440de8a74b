//! Thin binary entry point that delegates to modular bootstrap helpers
//! and front-end drivers, mirroring the teacher's `src/main.rs` +
//! `src/main_helpers.rs` split.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use agentkit_core::event::event_channel;
use agentkit_core::fs::RealFileSystem;
use agentkit_core::{Orchestrator, PermissionEngine};
use agentkit_llm::AnthropicProvider;

mod cli;
mod config;
mod driver;
mod main_helpers;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args = Cli::parse();
    main_helpers::initialize_tracing()?;

    if args.resume {
        anyhow::bail!(
            "--resume requires a session store, which this runtime does not implement \
             (session persistence is an external collaborator; see SPEC_FULL.md §6)"
        );
    }

    if let Some(workspace) = args.workspace.as_deref() {
        std::env::set_current_dir(workspace).with_context(|| {
            format!("failed to set workspace root to {}", workspace.display())
        })?;
    }

    let config = Config::load(args.config.as_deref())?;
    let api_key = config.api_key()?;

    let fs = Arc::new(RealFileSystem);
    let permission_engine = Arc::new(PermissionEngine::new(fs.clone()));
    permission_engine
        .load_from_file(&config.permissions_file)
        .await
        .context("failed to load permission rules")?;

    let shell_timeout = std::time::Duration::from_secs(config.shell_timeout_secs);
    let tool_runner = Arc::new(agentkit_tools::standard_tool_runner(fs, shell_timeout));
    let llm = Arc::new(AnthropicProvider::with_model(api_key, config.model.clone()));

    let (tx, mut rx) = event_channel();
    let mut orchestrator = Orchestrator::new(permission_engine.clone(), tool_runner, llm, tx);
    orchestrator.set_max_turns(args.max_turns.or(config.max_turns));

    let exit_result = if let Some(prompt) = args.prompt.as_deref() {
        orchestrator.set_headless_mode(args.yes);
        driver::run_headless(&mut orchestrator, &mut rx, prompt, args.json).await
    } else {
        run_interactive_session(&mut orchestrator, &mut rx).await
    };

    permission_engine
        .save_to_file(&config.permissions_file)
        .await
        .context("failed to save permission rules")?;

    exit_result
}

/// Reads prompts from stdin line by line until EOF, driving each one
/// through `driver::run_interactive` before prompting for the next.
async fn run_interactive_session(
    orchestrator: &mut Orchestrator,
    rx: &mut agentkit_core::event::EventReceiver,
) -> Result<()> {
    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush().ok();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read prompt from stdin")?;
        let prompt = line.trim();
        if prompt.is_empty() {
            print!("> ");
            io::stdout().flush().ok();
            continue;
        }
        if matches!(prompt, "exit" | "quit") {
            break;
        }

        driver::run_interactive(orchestrator, rx, prompt).await;

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
