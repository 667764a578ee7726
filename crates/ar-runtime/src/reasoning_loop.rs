//! The tool-driven reasoning loop (spec.md §4.6; ground truth:
//! `internal/agents/exec/{execute,toolCall}.go`): iterative
//! send → dispatch tool calls → observe, with dedup, confirmation,
//! cancellation, iteration caps, and fallback summarisation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ar_core::{Event, Message, Skill};
use ar_providers::Agent;
use ar_tools::{Executor, ToolContext};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::prompts::{system_prompt_with_skill, system_prompt_without_skill, FALLBACK_TEXT, ITERATION_CAP_NUDGE};

/// Reasoning-loop iteration caps (spec.md §4.6).
pub const MAX_TOOL_ITERATIONS: usize = 32;
pub const MAX_SKILL_ITERATIONS: usize = 32;

/// Consecutive empty-`choices` responses tolerated before the fallback text
/// is emitted (spec.md §4.6 step 2).
const MAX_EMPTY_CHOICES: usize = 3;

/// Everything [`execute`] needs beyond the agent and user input: the
/// resolved work directory, the config root under which sessions/apis/etc.
/// live, the allow-listed shell commands, and the tool runtime's shared
/// HTTP client / page renderer / cache directory.
pub struct ExecuteContext<'a> {
    pub work_dir: PathBuf,
    pub config_root: PathBuf,
    pub allowed_commands: Vec<String>,
    pub http_client: &'a reqwest::Client,
    pub page_renderer: &'a dyn ar_tools::PageRenderer,
    pub cancellation: CancellationToken,
}

/// Drive one full turn of the reasoning loop for `user_input` against
/// `agent`, optionally scoped by `skill` (spec.md §4.6).
///
/// Emits [`Event`]s on `events` throughout; returns once a `Done` event has
/// been sent (or an unrecoverable error occurs, in which case `Done` is
/// never sent and the caller should surface the error).
pub async fn execute(
    agent: &dyn Agent,
    ctx: &ExecuteContext<'_>,
    skill: Option<&Skill>,
    user_input: &str,
    events: &mpsc::Sender<Event>,
    allow_all: bool,
) -> Result<(), RuntimeError> {
    let skill = skill.filter(|s| s.is_effective());

    let work_path_str = ctx.work_dir.display().to_string();
    let system_prompt = match skill {
        Some(s) => system_prompt_with_skill(&work_path_str, &s.folder_path, &s.content),
        None => system_prompt_without_skill(&work_path_str),
    };

    let now = chrono::Utc::now();
    let mut session = ar_session::open_or_create(&ctx.config_root, system_prompt, user_input, now.timestamp())?;

    let gitignore = std::fs::read_to_string(ctx.work_dir.join(".gitignore")).ok();
    let api_docs = load_api_toolbox(&ctx.config_root, &ctx.work_dir);
    let executor = Executor::new(
        ctx.work_dir.clone(),
        session.id.clone(),
        ctx.allowed_commands.clone(),
        gitignore.as_deref(),
    )
    .with_api_toolbox(api_docs);

    let tool_schemas = ar_tools::tool_schemas(&executor);
    let cache_dir = ar_config::paths::browser_cache_dir(&ctx.config_root);

    let limit = if skill.is_some() { MAX_SKILL_ITERATIONS } else { MAX_TOOL_ITERATIONS };
    let mut already_call: HashMap<String, String> = HashMap::new();
    let mut empty_count = 0usize;

    for _ in 0..limit {
        if ctx.cancellation.is_cancelled() {
            return Ok(());
        }

        let resp = tokio::select! {
            resp = agent.send(&session.messages, Some(&tool_schemas)) => resp?,
            _ = ctx.cancellation.cancelled() => return Ok(()),
        };

        let Some(choice) = resp.first_choice() else {
            empty_count += 1;
            if empty_count >= MAX_EMPTY_CHOICES {
                emit_fallback_and_done(events).await;
                return Ok(());
            }
            continue;
        };
        empty_count = 0;

        if choice.message.has_tool_calls() {
            let tool_ctx = ToolContext {
                executor: &executor,
                http_client: ctx.http_client,
                page_renderer: ctx.page_renderer,
                cache_dir: &cache_dir,
                config_root: &ctx.config_root,
                now_unix: chrono::Utc::now().timestamp(),
            };

            session.messages.push(choice.message.clone());
            for tool_call in &choice.message.tool_calls {
                if ctx.cancellation.is_cancelled() {
                    return Ok(());
                }
                dispatch_tool_call(&tool_ctx, tool_call, &mut session, events, allow_all, &mut already_call).await;
            }
            continue;
        }

        let text = choice.message.content.clone().unwrap_or_default();
        let text = if text.is_empty() { FALLBACK_TEXT.to_string() } else { text };
        let (summary, displayed) = ar_session::extract_summary(&text);
        if let Some(summary) = summary {
            let session_dir = ar_config::paths::session_dir(&ctx.config_root, &session.id);
            let _ = ar_session::write_summary(&session_dir, &summary);
        }

        let _ = events.send(Event::Text(displayed.clone())).await;

        let now_unix = chrono::Utc::now().timestamp();
        ar_session::write_turn(&ctx.config_root, &mut session, &displayed, now_unix)?;
        ar_session::write_tool_log(&ctx.config_root, &session, chrono::Utc::now())?;

        let _ = events.send(Event::Done).await;
        return Ok(());
    }

    // Iteration cap fallthrough (spec.md §4.6): one more request, without
    // tools, nudging the model to summarise what it already found.
    let mut nudged = session.messages.clone();
    nudged.push(Message::user(ITERATION_CAP_NUDGE));

    match agent.send(&nudged, None).await {
        Ok(resp) => {
            let text = resp.first_choice().and_then(|c| c.message.content.clone()).unwrap_or_default();
            if text.is_empty() {
                emit_fallback_and_done(events).await;
            } else {
                let (summary, displayed) = ar_session::extract_summary(&text);
                if let Some(summary) = summary {
                    let session_dir = ar_config::paths::session_dir(&ctx.config_root, &session.id);
                    let _ = ar_session::write_summary(&session_dir, &summary);
                }
                let _ = events.send(Event::Text(displayed.clone())).await;

                let now_unix = chrono::Utc::now().timestamp();
                ar_session::write_turn(&ctx.config_root, &mut session, &displayed, now_unix)?;
                ar_session::write_tool_log(&ctx.config_root, &session, chrono::Utc::now())?;

                let _ = events.send(Event::Done).await;
            }
        }
        Err(_) => emit_fallback_and_done(events).await,
    }

    Ok(())
}

async fn emit_fallback_and_done(events: &mpsc::Sender<Event>) {
    let _ = events.send(Event::Text(FALLBACK_TEXT.to_string())).await;
    let _ = events.send(Event::Done).await;
}

/// Dispatch one structured tool call (spec.md §4.6 step 4; ground truth:
/// `toolCall.go`): dedup by `name|arguments`, confirm unless `allow_all`,
/// execute, fold any error into `"no data"`, cache, and append the
/// tool-role message (spec.md §7: tool errors are tool results, never
/// `Err`).
async fn dispatch_tool_call(
    tool_ctx: &ToolContext<'_>,
    tool_call: &ar_core::ToolCall,
    session: &mut ar_session::Session,
    events: &mpsc::Sender<Event>,
    allow_all: bool,
    already_call: &mut HashMap<String, String>,
) {
    let name = tool_call.normalised_name().to_string();
    let args = tool_call.function.arguments.clone();
    let id = tool_call.id.clone();
    let hash = tool_call.dedup_key();

    if let Some(cached) = already_call.get(&hash) {
        session.messages.push(Message::tool_result(id.clone(), cached.clone()));
        return;
    }

    let _ = events.send(Event::ToolCall { name: name.clone(), args: args.clone(), id: id.clone() }).await;

    if !allow_all {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = events
            .send(Event::ToolConfirm { name: name.clone(), args: args.clone(), id: id.clone(), reply: reply_tx })
            .await;
        let proceed = reply_rx.await.unwrap_or(false);
        if !proceed {
            let _ = events.send(Event::ToolSkipped { name: name.clone(), id: id.clone() }).await;
            let skipped = Message::tool_result(id.clone(), "Skipped by user");
            session.tools.push(skipped.clone());
            session.messages.push(skipped);
            return;
        }
    }

    let result = ar_tools::execute(tool_ctx, &name, &args)
        .await
        .unwrap_or_else(|_| "no data".to_string());

    let content = format!("[{name}] {result}");
    already_call.insert(hash, content.clone());

    let _ = events.send(Event::ToolResult { name: name.clone(), id: id.clone(), result }).await;
    let tool_message = Message::tool_result(id, content);
    session.tools.push(tool_message.clone());
    session.messages.push(tool_message);
}

fn load_api_toolbox(config_root: &Path, work_dir: &Path) -> Vec<ar_tools::api_adapter::ApiDocument> {
    let mut docs = ar_tools::api_adapter::load_api_documents(&ar_config::paths::apis_dir(config_root));
    let workdir_root = ar_config::paths::workdir_config_dir(work_dir);
    docs.extend(ar_tools::api_adapter::load_api_documents(&ar_config::paths::apis_dir(&workdir_root)));
    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use ar_core::{ChatChoice, ChatOutput, ToolCall, ToolCallFunction};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct NoopRenderer;
    #[async_trait]
    impl ar_tools::PageRenderer for NoopRenderer {
        async fn render(&self, _url: &str) -> Result<(String, String), ar_tools::ToolError> {
            Ok(("t".into(), "<p>x</p>".into()))
        }
    }

    /// Scripted agent: replays a fixed sequence of responses, one per call;
    /// repeats the final one once exhausted.
    struct ScriptedAgent {
        responses: Vec<ChatOutput>,
        call_count: AtomicUsize,
        calls: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl Agent for ScriptedAgent {
        async fn send(
            &self,
            messages: &[Message],
            _tools: Option<&[serde_json::Value]>,
        ) -> Result<ChatOutput, ar_providers::ProviderError> {
            self.calls.lock().unwrap().push(messages.to_vec());
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            let idx = idx.min(self.responses.len() - 1);
            Ok(self.responses[idx].clone())
        }
    }

    fn text_response(text: &str) -> ChatOutput {
        ChatOutput {
            choices: vec![ChatChoice { message: Message::assistant(text), finish_reason: None }],
            error: None,
        }
    }

    fn tool_call_response(name: &str, args: &str, id: &str) -> ChatOutput {
        let mut message = Message::assistant("");
        message.content = None;
        message.tool_calls = vec![ToolCall {
            id: id.to_string(),
            kind: "function".to_string(),
            function: ToolCallFunction { name: name.to_string(), arguments: args.to_string() },
        }];
        ChatOutput {
            choices: vec![ChatChoice { message, finish_reason: None }],
            error: None,
        }
    }

    #[tokio::test]
    async fn terminal_text_response_emits_text_then_done() {
        let dir = tempdir().unwrap();
        let config_root = dir.path().join("config");
        let work_dir = dir.path().join("work");
        std::fs::create_dir_all(&work_dir).unwrap();

        let agent = ScriptedAgent {
            responses: vec![text_response("hello")],
            call_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        };
        let client = reqwest::Client::new();
        let renderer = NoopRenderer;
        let ctx = ExecuteContext {
            work_dir: work_dir.clone(),
            config_root: config_root.clone(),
            allowed_commands: vec![],
            http_client: &client,
            page_renderer: &renderer,
            cancellation: CancellationToken::new(),
        };
        let (tx, mut rx) = mpsc::channel(16);

        execute(&agent, &ctx, None, "hi", &tx, true).await.unwrap();
        drop(tx);

        let mut received = Vec::new();
        while let Some(e) = rx.recv().await {
            received.push(e);
        }
        assert!(matches!(&received[0], Event::Text(t) if t == "hello"));
        assert!(matches!(received[1], Event::Done));
    }

    #[tokio::test]
    async fn duplicate_tool_calls_are_deduped_p4() {
        let dir = tempdir().unwrap();
        let config_root = dir.path().join("config");
        let work_dir = dir.path().join("work");
        std::fs::create_dir_all(&work_dir).unwrap();
        std::fs::write(work_dir.join("a.txt"), "contents").unwrap();

        let mut two_calls = Message::assistant("");
        two_calls.content = None;
        two_calls.tool_calls = vec![
            ToolCall {
                id: "call_1".into(),
                kind: "function".into(),
                function: ToolCallFunction { name: "read_file".into(), arguments: r#"{"path":"a.txt"}"#.into() },
            },
            ToolCall {
                id: "call_2".into(),
                kind: "function".into(),
                function: ToolCallFunction { name: "read_file".into(), arguments: r#"{"path":"a.txt"}"#.into() },
            },
        ];
        let first_resp = ChatOutput {
            choices: vec![ChatChoice { message: two_calls, finish_reason: None }],
            error: None,
        };

        let agent = ScriptedAgent {
            responses: vec![first_resp, text_response("done")],
            call_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        };
        let client = reqwest::Client::new();
        let renderer = NoopRenderer;
        let ctx = ExecuteContext {
            work_dir: work_dir.clone(),
            config_root: config_root.clone(),
            allowed_commands: vec![],
            http_client: &client,
            page_renderer: &renderer,
            cancellation: CancellationToken::new(),
        };
        let (tx, mut rx) = mpsc::channel(16);

        execute(&agent, &ctx, None, "read a.txt twice", &tx, true).await.unwrap();
        drop(tx);

        let mut tool_results = Vec::new();
        while let Some(e) = rx.recv().await {
            if let Event::ToolResult { result, .. } = e {
                tool_results.push(result);
            }
        }
        // Only the first (non-cached) call produces a ToolResult event.
        assert_eq!(tool_results.len(), 1);
        assert!(tool_results[0].contains("contents"));
    }

    #[tokio::test]
    async fn user_skip_short_circuits_tool_execution() {
        let dir = tempdir().unwrap();
        let config_root = dir.path().join("config");
        let work_dir = dir.path().join("work");
        std::fs::create_dir_all(&work_dir).unwrap();

        let agent = ScriptedAgent {
            responses: vec![tool_call_response("read_file", r#"{"path":"missing.txt"}"#, "call_1"), text_response("ok")],
            call_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        };
        let client = reqwest::Client::new();
        let renderer = NoopRenderer;
        let ctx = ExecuteContext {
            work_dir: work_dir.clone(),
            config_root: config_root.clone(),
            allowed_commands: vec![],
            http_client: &client,
            page_renderer: &renderer,
            cancellation: CancellationToken::new(),
        };
        let (tx, mut rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            execute(&agent, &ctx, None, "read a file", &tx, false).await.unwrap();
        });

        let mut saw_confirm = false;
        while let Some(event) = rx.recv().await {
            if let Event::ToolConfirm { reply, .. } = event {
                saw_confirm = true;
                reply.send(false).unwrap();
            }
        }
        assert!(saw_confirm);
        handle.await.unwrap();
    }
}
