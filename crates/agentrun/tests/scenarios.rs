//! End-to-end scenarios for the reasoning loop, driven against a scripted
//! `Agent` rather than a real provider (spec.md §8's six concrete
//! scenarios; ground truth: teacher's `tests/e2e.rs` convention of
//! redirecting config state into a temp directory).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ar_core::{ChatChoice, ChatOutput, Event, Message, ToolCall, ToolCallFunction};
use ar_runtime::{execute, ExecuteContext};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct NoopRenderer;

#[async_trait]
impl ar_tools::PageRenderer for NoopRenderer {
    async fn render(&self, _url: &str) -> Result<(String, String), ar_tools::ToolError> {
        Ok(("title".into(), "<p>body</p>".into()))
    }
}

struct ScriptedAgent {
    responses: Vec<ChatOutput>,
    call_count: AtomicUsize,
    seen_messages: Mutex<Vec<Vec<Message>>>,
}

#[async_trait]
impl ar_providers::Agent for ScriptedAgent {
    async fn send(
        &self,
        messages: &[Message],
        _tools: Option<&[serde_json::Value]>,
    ) -> Result<ChatOutput, ar_providers::ProviderError> {
        self.seen_messages.lock().unwrap().push(messages.to_vec());
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        let idx = idx.min(self.responses.len().saturating_sub(1));
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
    ChatOutput { choices: vec![ChatChoice { message, finish_reason: None }], error: None }
}

fn exec_ctx(config_root: std::path::PathBuf, work_dir: std::path::PathBuf) -> ExecuteContext<'static> {
    // Leaked on purpose: tests are short-lived processes and this keeps the
    // borrow checker out of the way of constructing a context that holds
    // references into locals created here.
    let client: &'static reqwest::Client = Box::leak(Box::new(reqwest::Client::new()));
    let renderer: &'static NoopRenderer = Box::leak(Box::new(NoopRenderer));
    ExecuteContext {
        work_dir,
        config_root,
        allowed_commands: ar_tools::DEFAULT_ALLOWED_COMMANDS.iter().map(|s| s.to_string()).collect(),
        http_client: client,
        page_renderer: renderer,
        cancellation: CancellationToken::new(),
    }
}

async fn drain_text(rx: &mut mpsc::Receiver<Event>) -> Vec<String> {
    let mut texts = Vec::new();
    while let Some(event) = rx.recv().await {
        if let Event::Text(t) = event {
            texts.push(t);
        }
    }
    texts
}

#[tokio::test]
async fn first_run_mints_session_and_persists_history() {
    let dir = tempfile::tempdir().unwrap();
    let config_root = dir.path().join("config");
    let work_dir = dir.path().join("work");
    std::fs::create_dir_all(&work_dir).unwrap();

    let agent = ScriptedAgent {
        responses: vec![text_response("first answer")],
        call_count: AtomicUsize::new(0),
        seen_messages: Mutex::new(Vec::new()),
    };
    let ctx = exec_ctx(config_root.clone(), work_dir);
    let (tx, mut rx) = mpsc::channel(16);

    execute(&agent, &ctx, None, "hello", &tx, true).await.unwrap();
    drop(tx);
    let texts = drain_text(&mut rx).await;
    assert_eq!(texts, vec!["first answer".to_string()]);

    let registry = ar_config::registry::read(&config_root).unwrap().unwrap();
    assert!(!registry.session_id.is_empty());

    let session_dir = ar_config::paths::session_dir(&config_root, &registry.session_id);
    let history: Vec<Message> =
        serde_json::from_str(&std::fs::read_to_string(session_dir.join("history.json")).unwrap()).unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn resume_compacts_to_last_four_history_entries() {
    let dir = tempfile::tempdir().unwrap();
    let config_root = dir.path().join("config");
    let work_dir = dir.path().join("work");
    std::fs::create_dir_all(&work_dir).unwrap();

    for i in 0..3 {
        let agent = ScriptedAgent {
            responses: vec![text_response(&format!("answer {i}"))],
            call_count: AtomicUsize::new(0),
            seen_messages: Mutex::new(Vec::new()),
        };
        let ctx = exec_ctx(config_root.clone(), work_dir.clone());
        let (tx, mut rx) = mpsc::channel(16);
        execute(&agent, &ctx, None, &format!("question {i}"), &tx, true).await.unwrap();
        drop(tx);
        drain_text(&mut rx).await;
    }

    let registry = ar_config::registry::read(&config_root).unwrap().unwrap();
    let session_dir = ar_config::paths::session_dir(&config_root, &registry.session_id);
    let history: Vec<Message> =
        serde_json::from_str(&std::fs::read_to_string(session_dir.join("history.json")).unwrap()).unwrap();
    assert_eq!(history.len(), 3);

    let agent = ScriptedAgent {
        responses: vec![text_response("final answer")],
        call_count: AtomicUsize::new(0),
        seen_messages: Mutex::new(Vec::new()),
    };
    let ctx = exec_ctx(config_root.clone(), work_dir);
    let (tx, mut rx) = mpsc::channel(16);
    execute(&agent, &ctx, None, "question 3", &tx, true).await.unwrap();
    drop(tx);
    drain_text(&mut rx).await;

    let seen = agent.seen_messages.lock().unwrap();
    let first_call = &seen[0];
    // system + up to 4 prior history entries + new user turn.
    assert!(first_call.len() <= 6);
}

#[tokio::test]
async fn iteration_cap_triggers_nudged_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config_root = dir.path().join("config");
    let work_dir = dir.path().join("work");
    std::fs::create_dir_all(&work_dir).unwrap();
    std::fs::write(work_dir.join("a.txt"), "x").unwrap();

    // Always return a (unique, undeduped) tool call so the loop never
    // terminates on its own and must fall through the iteration cap.
    let mut responses: Vec<ChatOutput> = (0..ar_runtime::MAX_TOOL_ITERATIONS)
        .map(|i| tool_call_response("read_file", &format!("{{\"path\":\"a.txt\",\"n\":{i}}}"), &format!("call_{i}")))
        .collect();
    responses.push(text_response("summary after nudge"));

    let agent = ScriptedAgent {
        responses,
        call_count: AtomicUsize::new(0),
        seen_messages: Mutex::new(Vec::new()),
    };
    let ctx = exec_ctx(config_root, work_dir);
    let (tx, mut rx) = mpsc::channel(64);

    execute(&agent, &ctx, None, "keep reading", &tx, true).await.unwrap();
    drop(tx);
    let texts = drain_text(&mut rx).await;
    assert_eq!(texts, vec!["summary after nudge".to_string()]);
}
