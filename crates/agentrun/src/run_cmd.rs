//! `agentrun run` — build the runtime's collaborators and drive one
//! request through [`ar_runtime::run`] (spec.md §4.1, §6).

use std::path::PathBuf;

use anyhow::{Context, Result};
use ar_core::Event;
use ar_tools::HeadlessChromePageRenderer;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub async fn handle_run(
    skill_name: Option<String>,
    input: String,
    allow: bool,
    config_root: PathBuf,
    work_dir: PathBuf,
) -> Result<i32> {
    let cwd_config_root = ar_config::paths::workdir_config_dir(&work_dir);
    let candidates = vec![config_root.clone(), cwd_config_root.clone()];
    let (entries, default_model) = ar_config::resolve_agent_registry(&candidates);
    if entries.is_empty() {
        eprintln!("no agents configured; run `agentrun add` first");
        return Ok(1);
    }

    let registry = ar_runtime::AgentRegistry::build(&config_root, &entries, default_model.as_deref())
        .await
        .context("constructing agent registry")?;

    let home = directories::UserDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let roots = ar_skills::default_roots(&work_dir, &home);
    let skills = ar_skills::scan(&roots);

    let http_client = reqwest::Client::new();
    let renderer = HeadlessChromePageRenderer;
    let cancellation = CancellationToken::new();

    let run_ctx = ar_runtime::RunContext {
        registry: &registry,
        skills: &skills,
        entries: &entries,
        work_dir: work_dir.clone(),
        config_root: config_root.clone(),
        allowed_commands: ar_tools::DEFAULT_ALLOWED_COMMANDS.iter().map(|s| s.to_string()).collect(),
        http_client: &http_client,
        page_renderer: &renderer,
        cancellation: cancellation.clone(),
    };

    let (tx, mut rx) = mpsc::channel(16);
    let drive = ar_runtime::run(&run_ctx, skill_name.as_deref(), &input, &tx, allow);

    let drain = async {
        let mut exit_code = 0;
        while let Some(event) = rx.recv().await {
            match event {
                Event::Text(text) => println!("{text}"),
                Event::ToolCall { name, args, .. } => {
                    eprintln!("-> calling {name}({args})");
                }
                Event::ToolConfirm { name, args, reply, .. } => {
                    let proceed = confirm(&name, &args);
                    let _ = reply.send(proceed);
                }
                Event::ToolResult { name, result, .. } => {
                    eprintln!("<- {name}: {result}");
                }
                Event::ToolSkipped { name, .. } => {
                    eprintln!("-- {name} skipped by user");
                }
                Event::Error(message) => {
                    eprintln!("error: {message}");
                    exit_code = 1;
                }
                Event::Done => break,
            }
        }
        exit_code
    };

    let (result, exit_code) = tokio::join!(drive, drain);
    result?;
    Ok(exit_code)
}

fn confirm(name: &str, args: &str) -> bool {
    use std::io::Write;
    eprint!("run tool {name}({args})? [y/N] ");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}
