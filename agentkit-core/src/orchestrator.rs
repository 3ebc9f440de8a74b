//! The conversation driver (spec §4.1). Owns the transcript and the single
//! pending-tool-call slot; alternates LLM calls and tool batches; emits
//! events at every observable step.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::OrchestratorError;
use crate::event::{Event, EventSender, PermissionRequestData};
use crate::llm::LLMProvider;
use crate::permission::{Decision, PermissionEngine};
use crate::tools::ToolRunner;
use crate::types::{Message, Role, ToolCall, ToolResult};
use crate::value::Value;

const PLAN_CONTENT: &str = "Thinking about your request...";

/// Explicit state machine named in spec §9, rather than inferring state
/// solely from the presence/absence of the pending slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Ready,
    AwaitingLlm,
    AwaitingTool,
    AwaitingPermission,
    Done,
}

/// How unresolved permission requests are handled. Interactive mode
/// suspends; headless mode never suspends, auto-granting or auto-denying
/// per `auto_accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecutionMode {
    Interactive,
    Headless { auto_accept: bool },
}

/// Tools that are auto-allowed without consulting the permission engine.
/// Everything else — including unknown tool names — requires a check
/// (spec §4.1.1 point 1).
fn is_read_only(tool: &str) -> bool {
    matches!(tool, "read_file")
}

/// The permission-rule "action" associated with each known tool. Unknown
/// tools default to "execute" for display purposes; they still require
/// permission per `is_read_only`.
fn permission_action(tool: &str) -> &'static str {
    match tool {
        "cli" => "execute",
        "write_file" => "write",
        "edit_file" => "edit",
        _ => "execute",
    }
}

fn describe_call(call: &ToolCall) -> String {
    format!("Invoke tool '{}'", call.name)
}

fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

enum BatchOutcome {
    /// The batch was cut short by an interactive permission request; the
    /// caller must return control to the front-end.
    Suspended,
    /// All calls in the batch ran to completion (allowed, denied, or
    /// errored); carries the concatenated tool-result text to fold into the
    /// transcript.
    Completed(String),
}

pub struct Orchestrator {
    transcript: Vec<Message>,
    state: OrchestratorState,
    pending: Option<ToolCall>,
    mode: ExecutionMode,
    max_turns: Option<usize>,
    turns_taken: usize,
    permission_engine: Arc<PermissionEngine>,
    tool_runner: Arc<ToolRunner>,
    llm: Arc<dyn LLMProvider>,
    events: EventSender,
}

impl Orchestrator {
    pub fn new(
        permission_engine: Arc<PermissionEngine>,
        tool_runner: Arc<ToolRunner>,
        llm: Arc<dyn LLMProvider>,
        events: EventSender,
    ) -> Self {
        Self {
            transcript: Vec::new(),
            state: OrchestratorState::Ready,
            pending: None,
            mode: ExecutionMode::Interactive,
            max_turns: None,
            turns_taken: 0,
            permission_engine,
            tool_runner,
            llm,
            events,
        }
    }

    pub fn set_max_turns(&mut self, max_turns: Option<usize>) {
        self.max_turns = max_turns;
    }

    /// Switches permission handling: when a rule is absent, auto-grant
    /// (`AllowOnce`) if `auto_accept` else auto-deny (`Deny`), continuing
    /// the loop either way — the orchestrator never suspends in this mode
    /// (spec §4.1).
    pub fn set_headless_mode(&mut self, auto_accept: bool) {
        self.mode = ExecutionMode::Headless { auto_accept };
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn has_pending_tool_call(&self) -> bool {
        self.pending.is_some()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Appends a user message and drives the turn loop to completion (or to
    /// a suspension point in interactive mode). No implicit filtering: even
    /// an empty prompt still appends a message and attempts one LLM call.
    pub async fn process_prompt(&mut self, prompt: &str) -> Result<(), OrchestratorError> {
        self.transcript
            .push(Message::new(Role::User, prompt, now_ts()));
        self.state = OrchestratorState::AwaitingLlm;
        self.run_loop(true).await
    }

    /// Forwarded to the permission engine (spec §4.1 public contract).
    pub fn grant_permission(&self, tool: &str, action: &str, params: &Value, decision: Decision) {
        self.permission_engine
            .grant_permission(tool, action, params, decision);
    }

    /// Forwarded to the permission engine. Denying with a Deny-class
    /// decision also clears any pending tool call and emits a `final` event
    /// announcing the cancellation (spec §4.1).
    pub async fn deny_permission(
        &mut self,
        tool: &str,
        action: &str,
        params: &Value,
        decision: Decision,
    ) {
        self.permission_engine
            .deny_permission(tool, action, params, decision);

        let is_deny_class = matches!(decision, Decision::Deny | Decision::AlwaysDeny);
        if is_deny_class && self.pending.take().is_some() {
            self.state = OrchestratorState::Done;
            self.events
                .send(Event::Final {
                    content: "Permission denied. Tool execution cancelled.".to_string(),
                })
                .await;
        }
    }

    /// Re-executes the blocked call after permission was granted; consumes
    /// the pending slot; performs one additional LLM turn with the tool
    /// result and emits a `final` event (spec §4.1).
    pub async fn retry_pending_tool(&mut self) -> Result<(), OrchestratorError> {
        let Some(call) = self.pending.take() else {
            return Ok(());
        };
        self.state = OrchestratorState::AwaitingTool;

        let text = self.execute_single_call(call).await;
        self.transcript
            .push(Message::new(Role::ToolResult, text, now_ts()));

        // This resumes the conversation directly rather than starting a
        // fresh turn-loop iteration, so no `plan` event precedes it (spec
        // §8 scenario 4: "run_tool, observation, final" with no leading
        // `plan`). Any further turns this may trigger do emit `plan`.
        self.run_loop(false).await
    }

    /// Drives turn-loop iterations until a terminal condition is reached.
    /// `emit_plan_first` controls only the very first iteration (see
    /// `retry_pending_tool`); every subsequent iteration always emits
    /// `plan` per spec §4.1 step 1.
    async fn run_loop(&mut self, emit_plan_first: bool) -> Result<(), OrchestratorError> {
        let mut emit_plan = emit_plan_first;
        loop {
            if emit_plan {
                self.events
                    .send(Event::Plan {
                        content: PLAN_CONTENT.to_string(),
                    })
                    .await;
            }
            emit_plan = true;

            if let Some(max_turns) = self.max_turns {
                if self.turns_taken >= max_turns {
                    self.state = OrchestratorState::Done;
                    self.events
                        .send(Event::Error {
                            content: "turn limit reached".to_string(),
                        })
                        .await;
                    return Err(OrchestratorError::Cancelled);
                }
            }
            self.turns_taken += 1;

            self.state = OrchestratorState::AwaitingLlm;
            let tool_names = self.tool_runner.names();
            let response = match self.llm.chat(&self.transcript, &tool_names).await {
                Ok(response) => response,
                Err(err) => {
                    self.state = OrchestratorState::Done;
                    self.events
                        .send(Event::Error {
                            content: err.to_string(),
                        })
                        .await;
                    return Err(OrchestratorError::LlmTransport(err.to_string()));
                }
            };

            // Assistants often include narration alongside tool calls;
            // append the content before executing tools even when
            // `tool_calls` is non-empty (spec §9 open question (b)).
            self.transcript.push(Message::new(
                Role::Assistant,
                response.content.clone(),
                now_ts(),
            ));

            if !response.tool_calls.is_empty() {
                self.state = OrchestratorState::AwaitingTool;
                match self.run_tool_batch(response.tool_calls).await {
                    BatchOutcome::Suspended => return Ok(()),
                    BatchOutcome::Completed(tool_text) => {
                        self.transcript
                            .push(Message::new(Role::ToolResult, tool_text, now_ts()));
                        continue;
                    }
                }
            }

            if response.finished {
                self.state = OrchestratorState::Done;
                self.events
                    .send(Event::Final {
                        content: response.content,
                    })
                    .await;
                return Ok(());
            }

            // No tool calls and not finished: an invalid LLM response.
            self.state = OrchestratorState::Done;
            self.events
                .send(Event::Error {
                    content: "malformed llm response: finished=false with no tool calls"
                        .to_string(),
                })
                .await;
            return Err(OrchestratorError::MalformedResponse);
        }
    }

    /// Executes each tool call in order; sequential, not parallel, so
    /// dependency semantics hold and permission requests short-circuit
    /// cleanly (spec §4.1.1).
    async fn run_tool_batch(&mut self, calls: Vec<ToolCall>) -> BatchOutcome {
        let mut outputs = Vec::new();

        for call in calls {
            let params = call.params();
            let action = permission_action(&call.name);

            let allowed = if is_read_only(&call.name) {
                true
            } else {
                self.permission_engine
                    .check_permission(&call.name, action, &params)
            };

            if !allowed {
                self.events
                    .send(Event::PermissionRequest {
                        content: describe_call(&call),
                        data: PermissionRequestData {
                            tool: call.name.clone(),
                            description: describe_call(&call),
                            parameters: params.clone(),
                        },
                    })
                    .await;

                match self.mode {
                    ExecutionMode::Interactive => {
                        self.pending = Some(call);
                        self.state = OrchestratorState::AwaitingPermission;
                        return BatchOutcome::Suspended;
                    }
                    ExecutionMode::Headless { auto_accept: true } => {
                        self.permission_engine.grant_permission(
                            &call.name,
                            action,
                            &params,
                            Decision::AllowOnce,
                        );
                        let text = self.execute_single_call(call).await;
                        outputs.push(text);
                    }
                    ExecutionMode::Headless { auto_accept: false } => {
                        self.permission_engine.deny_permission(
                            &call.name,
                            action,
                            &params,
                            Decision::Deny,
                        );
                        let text = format!("Permission denied: {}", call.name);
                        self.events
                            .send(Event::Observation {
                                content: text.clone(),
                            })
                            .await;
                        outputs.push(text);
                    }
                }
                continue;
            }

            let text = self.execute_single_call(call).await;
            outputs.push(text);
        }

        BatchOutcome::Completed(outputs.join("\n"))
    }

    /// Runs one already-authorized tool call, emitting `run_tool` and then
    /// either `observation` (tool-level outcome) or `error` (transport
    /// failure). Returns the text to fold into the transcript either way —
    /// tool failures are not fatal to the batch (spec §4.1.1 point 4).
    async fn execute_single_call(&self, call: ToolCall) -> String {
        self.events
            .send(Event::RunTool {
                content: format!("Running {}", call.name),
            })
            .await;

        let params = call.params();
        match self.tool_runner.run(&call.name, &params).await {
            Ok(result) => {
                let text = result.as_transcript_text().to_string();
                self.events
                    .send(Event::Observation {
                        content: text.clone(),
                    })
                    .await;
                text
            }
            Err(err) => {
                let text = err.to_string();
                self.events
                    .send(Event::Error {
                        content: text.clone(),
                    })
                    .await;
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::event_channel;
    use crate::fs::MemoryFileSystem;
    use crate::llm::{ChatResponse, LLMError};
    use crate::tools::testing::{FailingHandler, FixedHandler};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct ScriptedProvider {
        responses: Mutex<Vec<Result<ChatResponse, String>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<ChatResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(Ok).rev().collect()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _available_tools: &[String],
        ) -> Result<ChatResponse, LLMError> {
            match self.responses.lock().unwrap().pop() {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(LLMError::Transport(message)),
                None => panic!("scripted provider exhausted"),
            }
        }
    }

    fn finished(content: &str) -> ChatResponse {
        ChatResponse {
            content: content.to_string(),
            tool_calls: vec![],
            finished: true,
        }
    }

    fn tool_call(name: &str, content: &str) -> ChatResponse {
        ChatResponse {
            content: content.to_string(),
            tool_calls: vec![ToolCall::new("call-1", name)],
            finished: false,
        }
    }

    fn empty_params() -> Value {
        Value::object([])
    }

    async fn drain(rx: &mut crate::event::EventReceiver) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(Some(event)) =
            tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await
        {
            events.push(event);
        }
        events
    }

    fn event_kind(event: &Event) -> &'static str {
        match event {
            Event::Plan { .. } => "plan",
            Event::RunTool { .. } => "run_tool",
            Event::Observation { .. } => "observation",
            Event::Final { .. } => "final",
            Event::PermissionRequest { .. } => "permission_request",
            Event::Error { .. } => "error",
        }
    }

    #[tokio::test]
    async fn simple_greeting_no_tools() {
        let (tx, mut rx) = event_channel();
        let provider = Arc::new(ScriptedProvider::new(vec![finished("Hi!")]));
        let engine = Arc::new(PermissionEngine::new(Arc::new(MemoryFileSystem::default())));
        let runner = Arc::new(ToolRunner::new());
        let mut orchestrator = Orchestrator::new(engine, runner, provider, tx);

        orchestrator.process_prompt("hello").await.expect("ok");

        let events = drain(&mut rx).await;
        let kinds: Vec<_> = events.iter().map(event_kind).collect();
        assert_eq!(kinds, vec!["plan", "final"]);
    }

    #[tokio::test]
    async fn pre_granted_tool_runs_without_suspending() {
        let (tx, mut rx) = event_channel();
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("cli", "Let me check."),
            finished("Done."),
        ]));
        let engine = Arc::new(PermissionEngine::new(Arc::new(MemoryFileSystem::default())));
        engine.grant_permission(
            "cli",
            "execute",
            &empty_params(),
            Decision::AlwaysAllow,
        );
        let mut runner = ToolRunner::new();
        runner.register("cli", Arc::new(FixedHandler(ToolResult::ok("total 0"))));
        let mut orchestrator = Orchestrator::new(engine, Arc::new(runner), provider, tx);

        orchestrator.process_prompt("list files").await.expect("ok");

        let events = drain(&mut rx).await;
        let kinds: Vec<_> = events.iter().map(event_kind).collect();
        assert_eq!(kinds, vec!["plan", "run_tool", "observation", "plan", "final"]);
    }

    #[tokio::test]
    async fn interactive_denial_cancels_and_clears_pending() {
        let (tx, mut rx) = event_channel();
        let provider = Arc::new(ScriptedProvider::new(vec![tool_call("cli", "ok")]));
        let engine = Arc::new(PermissionEngine::new(Arc::new(MemoryFileSystem::default())));
        let mut runner = ToolRunner::new();
        runner.register("cli", Arc::new(FixedHandler(ToolResult::ok("x"))));
        let mut orchestrator = Orchestrator::new(engine, Arc::new(runner), provider, tx);

        orchestrator.process_prompt("list files").await.expect("ok");
        assert!(orchestrator.has_pending_tool_call());

        let events = drain(&mut rx).await;
        assert_eq!(
            events.iter().map(event_kind).collect::<Vec<_>>(),
            vec!["plan", "permission_request"]
        );

        orchestrator
            .deny_permission("cli", "execute", &empty_params(), Decision::Deny)
            .await;
        assert!(!orchestrator.has_pending_tool_call());

        let events = drain(&mut rx).await;
        match events.as_slice() {
            [Event::Final { content }] => {
                assert_eq!(content, "Permission denied. Tool execution cancelled.")
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn interactive_grant_then_retry_consumes_allow_once() {
        let (tx, mut rx) = event_channel();
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("cli", "ok"),
            finished("Done."),
        ]));
        let engine = Arc::new(PermissionEngine::new(Arc::new(MemoryFileSystem::default())));
        let mut runner = ToolRunner::new();
        runner.register("cli", Arc::new(FixedHandler(ToolResult::ok("total 0"))));
        let mut orchestrator =
            Orchestrator::new(engine.clone(), Arc::new(runner), provider, tx);

        orchestrator.process_prompt("list files").await.expect("ok");
        drain(&mut rx).await;

        orchestrator.grant_permission("cli", "execute", &empty_params(), Decision::AllowOnce);
        orchestrator.retry_pending_tool().await.expect("ok");

        let events = drain(&mut rx).await;
        assert_eq!(
            events.iter().map(event_kind).collect::<Vec<_>>(),
            vec!["run_tool", "observation", "final"]
        );
        assert!(!orchestrator.has_pending_tool_call());
        assert!(!engine.check_permission("cli", "execute", &empty_params()));
    }

    #[tokio::test]
    async fn headless_auto_accept_does_not_suspend() {
        let (tx, mut rx) = event_channel();
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("cli", "ok"),
            finished("Done."),
        ]));
        let engine = Arc::new(PermissionEngine::new(Arc::new(MemoryFileSystem::default())));
        let mut runner = ToolRunner::new();
        runner.register("cli", Arc::new(FixedHandler(ToolResult::ok("total 0"))));
        let mut orchestrator = Orchestrator::new(engine, Arc::new(runner), provider, tx);
        orchestrator.set_headless_mode(true);

        orchestrator.process_prompt("list files").await.expect("ok");
        assert!(!orchestrator.has_pending_tool_call());

        let events = drain(&mut rx).await;
        assert_eq!(
            events.iter().map(event_kind).collect::<Vec<_>>(),
            vec!["plan", "permission_request", "run_tool", "observation", "plan", "final"]
        );
    }

    #[tokio::test]
    async fn headless_auto_deny_folds_denial_text_and_continues() {
        let (tx, mut rx) = event_channel();
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("cli", "ok"),
            finished("Done."),
        ]));
        let engine = Arc::new(PermissionEngine::new(Arc::new(MemoryFileSystem::default())));
        let runner = Arc::new(ToolRunner::new());
        let mut orchestrator = Orchestrator::new(engine, runner, provider, tx);
        orchestrator.set_headless_mode(false);

        orchestrator.process_prompt("list files").await.expect("ok");

        let events = drain(&mut rx).await;
        assert_eq!(
            events.iter().map(event_kind).collect::<Vec<_>>(),
            vec!["plan", "permission_request", "observation", "plan", "final"]
        );
    }

    #[tokio::test]
    async fn tool_transport_failure_is_not_fatal_to_batch() {
        let (tx, mut rx) = event_channel();
        let provider = Arc::new(ScriptedProvider::new(vec![
            ChatResponse {
                content: "running two tools".into(),
                tool_calls: vec![ToolCall::new("a", "cli"), ToolCall::new("b", "read_file")],
                finished: false,
            },
            finished("Done."),
        ]));
        let engine = Arc::new(PermissionEngine::new(Arc::new(MemoryFileSystem::default())));
        engine.grant_permission("cli", "execute", &empty_params(), Decision::AlwaysAllow);
        let mut runner = ToolRunner::new();
        runner.register("cli", Arc::new(FailingHandler("could not spawn".into())));
        runner.register("read_file", Arc::new(FixedHandler(ToolResult::ok("contents"))));
        let mut orchestrator = Orchestrator::new(engine, Arc::new(runner), provider, tx);

        orchestrator.process_prompt("do stuff").await.expect("ok");

        let events = drain(&mut rx).await;
        assert_eq!(
            events.iter().map(event_kind).collect::<Vec<_>>(),
            vec!["plan", "run_tool", "error", "run_tool", "observation", "plan", "final"]
        );
    }

    #[tokio::test]
    async fn empty_tool_calls_with_finished_false_is_malformed() {
        let (tx, mut rx) = event_channel();
        let provider = Arc::new(ScriptedProvider::new(vec![ChatResponse {
            content: String::new(),
            tool_calls: vec![],
            finished: false,
        }]));
        let engine = Arc::new(PermissionEngine::new(Arc::new(MemoryFileSystem::default())));
        let runner = Arc::new(ToolRunner::new());
        let mut orchestrator = Orchestrator::new(engine, runner, provider, tx);

        let result = orchestrator.process_prompt("hello").await;
        assert!(result.is_err());

        let events = drain(&mut rx).await;
        assert_eq!(
            events.iter().map(event_kind).collect::<Vec<_>>(),
            vec!["plan", "error"]
        );
    }

    #[tokio::test]
    async fn empty_prompt_still_attempts_one_llm_call() {
        let (tx, mut rx) = event_channel();
        let provider = Arc::new(ScriptedProvider::new(vec![finished("ok")]));
        let engine = Arc::new(PermissionEngine::new(Arc::new(MemoryFileSystem::default())));
        let runner = Arc::new(ToolRunner::new());
        let mut orchestrator = Orchestrator::new(engine, runner, provider, tx);

        orchestrator.process_prompt("").await.expect("ok");
        assert_eq!(orchestrator.transcript()[0].content, "");
        drain(&mut rx).await;
    }
}
