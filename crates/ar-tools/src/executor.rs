//! Per-invocation tool environment (spec.md §3 "Executor"; ground truth:
//! `internal/tools/{executor.go,types/executor.go}`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ar_ignore::PathGuard;

use crate::api_adapter::ApiDocument;

/// Commands allowed through the shell runner when a caller does not supply
/// its own list (ground truth: the teacher embeds `commands.json` at build
/// time; that asset was not retrieved, so a conservative read-only/common
/// set is used here instead — see DESIGN.md).
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &[
    "ls", "cat", "pwd", "echo", "grep", "find", "head", "tail", "wc", "git", "rm", "mkdir",
    "cp", "mv", "diff", "sort", "uniq", "sed", "awk",
];

/// `work_path`, `session_id`, `allowed_commands`, ignore rules (via
/// [`PathGuard`]), and the static + dynamic tool list (spec.md §3).
pub struct Executor {
    pub guard: PathGuard,
    pub session_id: String,
    pub allowed_commands: HashSet<String>,
    pub api_toolbox: Vec<ApiDocument>,
}

impl Executor {
    pub fn new(
        work_path: PathBuf,
        session_id: String,
        allowed_commands: Vec<String>,
        gitignore_contents: Option<&str>,
    ) -> Self {
        Self {
            guard: PathGuard::new(work_path, gitignore_contents),
            session_id,
            allowed_commands: allowed_commands.into_iter().collect(),
            api_toolbox: Vec::new(),
        }
    }

    pub fn with_api_toolbox(mut self, api_toolbox: Vec<ApiDocument>) -> Self {
        self.api_toolbox = api_toolbox;
        self
    }

    pub fn work_path(&self) -> &Path {
        self.guard.work_path()
    }

    pub fn is_command_allowed(&self, binary: &str) -> bool {
        self.allowed_commands.contains(binary)
    }
}
