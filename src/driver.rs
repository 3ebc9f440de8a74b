//! Front-end drivers over the `Orchestrator`'s event stream (spec §6):
//! a headless NDJSON driver and a minimal line-oriented interactive
//! driver. Neither renders a terminal UI — that remains the out-of-scope
//! collaborator named in spec.md §1.

use agentkit_core::event::EventReceiver;
use agentkit_core::{Decision, Event, Orchestrator};
use anyhow::Result;
use dialoguer::Confirm;

/// Prints one event either as an NDJSON line (`--json`) or as a short
/// human-readable summary.
fn emit(event: &Event, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::error!(%err, "failed to serialize event"),
        }
        return;
    }

    match event {
        Event::Plan { content } => println!("• {content}"),
        Event::RunTool { content } => println!("▸ {content}"),
        Event::Observation { content } => println!("{content}"),
        Event::Final { content } => println!("\n{content}"),
        Event::PermissionRequest { content, .. } => println!("? {content}"),
        Event::Error { content } => eprintln!("error: {content}"),
    }
}

fn drain_and_emit(rx: &mut EventReceiver, json: bool) -> Vec<Event> {
    let events = rx.drain_ready();
    for event in &events {
        emit(event, json);
    }
    events
}

/// Runs a single prompt to completion with no interactive suspension:
/// headless mode auto-accepts or auto-denies every permission request
/// (the orchestrator itself never suspends in this mode).
pub async fn run_headless(
    orchestrator: &mut Orchestrator,
    rx: &mut EventReceiver,
    prompt: &str,
    json: bool,
) -> Result<()> {
    let outcome = orchestrator.process_prompt(prompt).await;
    drain_and_emit(rx, json);
    outcome.map_err(Into::into)
}

/// Runs a single prompt interactively, prompting with `dialoguer::Confirm`
/// whenever the orchestrator suspends on a permission request, then
/// resuming until the prompt reaches a terminal event.
///
/// Errors from the orchestrator are already emitted as `error` events
/// (drained and printed below) and return the session to ready state
/// rather than aborting the whole interactive session (spec §7
/// "user-visible failure behavior").
pub async fn run_interactive(orchestrator: &mut Orchestrator, rx: &mut EventReceiver, prompt: &str) {
    if orchestrator.process_prompt(prompt).await.is_err() {
        drain_and_emit(rx, false);
        return;
    }
    let mut events = drain_and_emit(rx, false);

    loop {
        if !orchestrator.has_pending_tool_call() {
            return;
        }

        let Some(Event::PermissionRequest { data, .. }) = events
            .iter()
            .rev()
            .find(|e| matches!(e, Event::PermissionRequest { .. }))
        else {
            return;
        };

        let prompt_text = format!("Allow '{}' to run ({})?", data.tool, data.description);
        let allow = Confirm::new()
            .with_prompt(prompt_text)
            .default(false)
            .interact()
            .unwrap_or(false);

        if allow {
            orchestrator.grant_permission(
                &data.tool,
                &action_for(&data.tool),
                &data.parameters,
                Decision::AllowOnce,
            );
            if orchestrator.retry_pending_tool().await.is_err() {
                drain_and_emit(rx, false);
                return;
            }
        } else {
            orchestrator
                .deny_permission(&data.tool, &action_for(&data.tool), &data.parameters, Decision::Deny)
                .await;
        }

        events = drain_and_emit(rx, false);
    }
}

/// Mirrors `orchestrator::permission_action`, which is private to that
/// module; the driver only needs it to echo the same action string back
/// into `grant_permission`/`deny_permission`.
fn action_for(tool: &str) -> String {
    match tool {
        "cli" => "execute",
        "write_file" => "write",
        "edit_file" => "edit",
        _ => "execute",
    }
    .to_string()
}
