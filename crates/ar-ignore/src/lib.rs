//! Path guard & gitignore-style ignore resolver (spec.md §4.1).
//!
//! Every file tool resolves its path through [`PathGuard::resolve`] before
//! touching the filesystem, and checks [`PathGuard::is_excluded`] before any
//! read/write/list/glob/grep operation proceeds.

use std::path::{Path, PathBuf};

/// Built-in ignore set merged ahead of the workdir's `.gitignore`
/// (SPEC_FULL.md §4.1).
pub const DEFAULT_RULES: &[&str] = &[
    ".git",
    ".Trash",
    "node_modules",
    "target",
    ".DS_Store",
    "*.pyc",
    "__pycache__",
];

/// A single gitignore-style rule: a shell-glob `file` pattern plus a
/// `negate` flag (leading `!`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    pub file: String,
    pub negate: bool,
}

/// Parse a `.gitignore`-style rule file (spec.md §4.1).
///
/// Strips a UTF-8 BOM if present. Each non-empty, non-`#` line becomes a
/// rule; leading `!` sets `negate`; leading/trailing `/` is trimmed after
/// the negate flag is captured; lines that become empty after trimming are
/// discarded.
pub fn parse_rule_file(contents: &str) -> Vec<IgnoreRule> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    let mut rules = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (negate, rest) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let file = rest.trim_matches('/').to_string();
        if file.is_empty() {
            continue;
        }
        rules.push(IgnoreRule { file, negate });
    }
    rules
}

fn default_rule_set() -> Vec<IgnoreRule> {
    DEFAULT_RULES
        .iter()
        .map(|f| IgnoreRule {
            file: f.to_string(),
            negate: false,
        })
        .collect()
}

/// Resolves relative paths against a work directory and enforces the
/// ordered ignore-rule list.
#[derive(Debug, Clone)]
pub struct PathGuard {
    work_path: PathBuf,
    rules: Vec<IgnoreRule>,
}

impl PathGuard {
    /// Build a guard from the work directory's `.gitignore` contents (if
    /// any), with the built-in default rules merged in ahead of it.
    pub fn new(work_path: impl Into<PathBuf>, gitignore_contents: Option<&str>) -> Self {
        let mut rules = default_rule_set();
        if let Some(contents) = gitignore_contents {
            rules.extend(parse_rule_file(contents));
        }
        Self {
            work_path: work_path.into(),
            rules,
        }
    }

    pub fn with_rules(work_path: impl Into<PathBuf>, rules: Vec<IgnoreRule>) -> Self {
        Self {
            work_path: work_path.into(),
            rules,
        }
    }

    pub fn work_path(&self) -> &Path {
        &self.work_path
    }

    /// Resolve a user-supplied path against the work directory. Absolute
    /// paths pass through unchanged; relative paths are joined.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.work_path.join(p)
        }
    }

    /// Relative-path string (forward-slash separated) used for rule
    /// matching, computed against the work directory when possible.
    fn candidate_string(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.work_path).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }

    /// Last-matching-rule-wins exclusion check (spec.md §4.1, P1/P2).
    pub fn is_excluded(&self, path: &Path) -> bool {
        let candidate = self.candidate_string(path);
        let basename = Path::new(&candidate)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let wrapped = format!("/{}/", candidate.trim_matches('/'));

        let mut verdict: Option<bool> = None;
        for rule in &self.rules {
            let matches_basename = glob::Pattern::new(&rule.file)
                .map(|pat| pat.matches(&basename))
                .unwrap_or(false);
            let contains_component = wrapped.contains(&format!("/{}/", rule.file));
            let has_prefix = candidate.starts_with(&format!("{}/", rule.file));

            if matches_basename || contains_component || has_prefix {
                verdict = Some(!rule.negate);
            }
        }
        verdict.unwrap_or(false)
    }

    /// Convenience: accessible iff not excluded (spec.md §3 invariant).
    pub fn is_accessible(&self, path: &Path) -> bool {
        !self.is_excluded(path)
    }
}
