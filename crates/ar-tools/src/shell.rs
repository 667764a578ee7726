//! Allow-listed shell executor with trash-on-delete (spec.md §4.2.1, P7;
//! ground truth: `internal/tools/tools.go`'s `runCommand`/`moveToTrash`).

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use chrono::Local;
use tokio::process::Command;

use crate::error::ToolError;
use crate::executor::Executor;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

pub async fn run_command(executor: &Executor, command: &str) -> Result<String, ToolError> {
    let command = command.trim();
    if command.is_empty() {
        return Err(ToolError::Message("command is empty".into()));
    }

    let has_shell_ops = command.contains(['|', '>', '<', '&']);

    let first_token = command
        .split_whitespace()
        .next()
        .ok_or_else(|| ToolError::Message("command is empty".into()))?;
    let binary = PathBuf::from(first_token)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| first_token.to_string());

    if !executor.is_command_allowed(&binary) {
        return Err(ToolError::CommandNotAllowed(binary));
    }

    if !has_shell_ops && binary == "rm" {
        let args: Vec<&str> = command.split_whitespace().skip(1).collect();
        return move_to_trash(executor, &args).await;
    }

    let mut cmd = if has_shell_ops {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    } else {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let mut c = Command::new(parts[0]);
        c.args(&parts[1..]);
        c
    };
    cmd.current_dir(executor.work_path());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let output = tokio::time::timeout(COMMAND_TIMEOUT, cmd.output())
        .await
        .map_err(|_| ToolError::Message("command timed out after 300s".into()))??;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Ok(format!(
            "{combined}\nError: exit status {}",
            output.status.code().unwrap_or(-1)
        ));
    }
    Ok(combined)
}

/// Moves each non-flag argument into `./.Trash/` instead of deleting it
/// (P7). Collisions are resolved with a `<stem>_<timestamp><ext>` rename;
/// the original is never overwritten or removed.
async fn move_to_trash(executor: &Executor, args: &[&str]) -> Result<String, ToolError> {
    let trash_path = executor.work_path().join(".Trash");
    tokio::fs::create_dir_all(&trash_path).await?;

    let mut moved = Vec::new();
    for arg in args {
        if arg.starts_with('-') {
            continue;
        }
        let src = executor.work_path().join(arg);
        let name = PathBuf::from(arg)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| (*arg).to_string());
        let mut dst = trash_path.join(&name);

        if tokio::fs::metadata(&dst).await.is_ok() {
            let stem = PathBuf::from(&name)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| name.clone());
            let ext = PathBuf::from(&name)
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            let ts = Local::now().format("%Y%m%d_%H%M%S");
            dst = trash_path.join(format!("{stem}_{ts}{ext}"));
        }

        if tokio::fs::rename(&src, &dst).await.is_ok() {
            moved.push((*arg).to_string());
        }
    }

    Ok(format!("Successfully moved to .Trash: {}", moved.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn executor_at(dir: &std::path::Path) -> Executor {
        Executor::new(
            dir.to_path_buf(),
            "s".to_string(),
            vec!["rm".to_string(), "echo".to_string()],
            None,
        )
    }

    #[tokio::test]
    async fn rejects_disallowed_command() {
        let dir = tempdir().unwrap();
        let exec = executor_at(dir.path());
        assert!(run_command(&exec, "curl http://example.com").await.is_err());
    }

    #[tokio::test]
    async fn rejects_empty_command() {
        let dir = tempdir().unwrap();
        let exec = executor_at(dir.path());
        assert!(run_command(&exec, "   ").await.is_err());
    }

    #[tokio::test]
    async fn p7_rm_moves_to_trash_instead_of_deleting() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), b"hello").unwrap();
        let exec = executor_at(dir.path());

        run_command(&exec, "rm README.md").await.unwrap();

        assert!(!dir.path().join("README.md").exists());
        let trashed = dir.path().join(".Trash").join("README.md");
        assert_eq!(std::fs::read(&trashed).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn p7_second_rm_of_same_name_is_timestamp_renamed_not_overwritten() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"first").unwrap();
        let exec = executor_at(dir.path());
        run_command(&exec, "rm a.txt").await.unwrap();

        std::fs::write(dir.path().join("a.txt"), b"second").unwrap();
        run_command(&exec, "rm a.txt").await.unwrap();

        let first = std::fs::read(dir.path().join(".Trash").join("a.txt")).unwrap();
        assert_eq!(first, b"first");

        let renamed = std::fs::read_dir(dir.path().join(".Trash"))
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| {
                let n = e.file_name().to_string_lossy().to_string();
                n.starts_with("a_") && n.ends_with(".txt")
            });
        assert!(renamed);
    }

    #[tokio::test]
    async fn run_command_merges_stdout_and_stderr_on_failure() {
        let dir = tempdir().unwrap();
        let exec = Executor::new(
            dir.path().to_path_buf(),
            "s".to_string(),
            vec!["sh".to_string()],
            None,
        );
        let out = run_command(&exec, "sh -c 'echo out; echo err 1>&2; exit 1'")
            .await
            .unwrap();
        assert!(out.contains("out"));
        assert!(out.contains("err"));
        assert!(out.contains("Error:"));
    }
}
