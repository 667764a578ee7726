//! File-oriented built-in tools (spec.md §4.2; ground truth:
//! `internal/tools/file/{readFile,writeFile,patchEdit,listFiles,globFiles,search,searchHistory}.go`).

use std::path::Path;

use regex::Regex;

use crate::error::ToolError;
use crate::executor::Executor;

const BINARY_EXTENSIONS: &[&str] = &["exe", "bin", "so", "dylib", "dll", "o", "a"];

pub fn read_file(executor: &Executor, path: &str) -> Result<String, ToolError> {
    let full = executor.guard.resolve(path);
    if executor.guard.is_excluded(&full) {
        return Err(ToolError::PathExcluded(path.to_string()));
    }
    std::fs::read_to_string(&full).map_err(|e| ToolError::Message(format!("failed to read file ({path}): {e}")))
}

pub fn write_file(executor: &Executor, path: &str, content: &str) -> Result<String, ToolError> {
    if content.is_empty() {
        return Err(ToolError::Message("content is required".into()));
    }
    let full = executor.guard.resolve(path);
    if executor.guard.is_excluded(&full) {
        return Err(ToolError::PathExcluded(path.to_string()));
    }
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&full, content)?;
    Ok(format!("Successfully wrote file: {path}"))
}

pub fn patch_edit(
    executor: &Executor,
    path: &str,
    old_string: &str,
    new_string: &str,
) -> Result<String, ToolError> {
    let full = executor.guard.resolve(path);
    if executor.guard.is_excluded(&full) {
        return Err(ToolError::PathExcluded(path.to_string()));
    }
    let content = std::fs::read_to_string(&full)
        .map_err(|e| ToolError::Message(format!("failed to read file ({path}): {e}")))?;
    let Some(idx) = content.find(old_string) else {
        return Err(ToolError::Message(format!("old_string not found in file: {path}")));
    };
    let mut new_content = String::with_capacity(content.len());
    new_content.push_str(&content[..idx]);
    new_content.push_str(new_string);
    new_content.push_str(&content[idx + old_string.len()..]);
    std::fs::write(&full, new_content)?;
    Ok(format!("Successfully patched: {path}"))
}

pub fn list_files(executor: &Executor, path: &str, recursive: bool) -> Result<String, ToolError> {
    let full = executor.guard.resolve(path);
    let mut out = String::new();

    if recursive {
        walk_dir(executor, &full, &full, &mut out)?;
    } else {
        let mut entries: Vec<_> = std::fs::read_dir(&full)
            .map_err(|e| ToolError::Message(format!("failed to read directory ({path}): {e}")))?
            .filter_map(|e| e.ok())
            .collect();
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let entry_path = entry.path();
            if executor.guard.is_excluded(&entry_path) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_dir() {
                out.push_str(&name);
                out.push_str("/\n");
            } else {
                out.push_str(&name);
                out.push('\n');
            }
        }
    }
    Ok(out)
}

fn walk_dir(executor: &Executor, root: &Path, dir: &Path, out: &mut String) -> Result<(), ToolError> {
    let mut entries: Vec<_> = match std::fs::read_dir(dir) {
        Ok(iter) => iter.filter_map(|e| e.ok()).collect(),
        Err(_) => return Ok(()),
    };
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let p = entry.path();
        if executor.guard.is_excluded(&p) {
            continue;
        }
        let is_dir = p.is_dir();
        let name = entry.file_name().to_string_lossy().to_string();
        if is_dir && name.starts_with('.') {
            continue;
        }
        let rel = p.strip_prefix(root).unwrap_or(&p).to_string_lossy().replace('\\', "/");
        if is_dir {
            out.push_str(&rel);
            out.push_str("/\n");
            walk_dir(executor, root, &p, out)?;
        } else {
            out.push_str(&rel);
            out.push('\n');
        }
    }
    Ok(())
}

/// Bespoke glob matcher: `/`-split pattern, `**` matches zero-or-more path
/// components, other segments use shell-glob semantics (spec.md §4.2, P8;
/// ground truth: `internal/tools/file/glob.go`).
pub fn glob_files(executor: &Executor, pattern: &str) -> Result<String, ToolError> {
    let patterns: Vec<&str> = pattern.split('/').collect();
    let mut files = Vec::new();
    collect_files(executor, executor.work_path(), executor.work_path(), &mut files)?;

    let mut matches: Vec<String> = files
        .into_iter()
        .filter(|f| {
            let parts: Vec<&str> = f.split('/').collect();
            matches_glob(&patterns, &parts)
        })
        .collect();
    matches.sort();

    if matches.is_empty() {
        return Ok(format!("No files found: {pattern}"));
    }
    let mut out = String::new();
    for m in matches {
        out.push_str(&m);
        out.push('\n');
    }
    Ok(out)
}

fn collect_files(
    executor: &Executor,
    root: &Path,
    dir: &Path,
    out: &mut Vec<String>,
) -> Result<(), ToolError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(iter) => iter,
        Err(_) => return Ok(()),
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let p = entry.path();
        if executor.guard.is_excluded(&p) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if p.is_dir() {
            if name.starts_with('.') {
                continue;
            }
            collect_files(executor, root, &p, out)?;
        } else {
            let rel = p.strip_prefix(root).unwrap_or(&p).to_string_lossy().replace('\\', "/");
            out.push(rel);
        }
    }
    Ok(())
}

fn matches_glob(patterns: &[&str], parts: &[&str]) -> bool {
    match patterns.first() {
        None => parts.is_empty(),
        Some(&"**") => {
            let rest = &patterns[1..];
            (0..=parts.len()).any(|i| matches_glob(rest, &parts[i..]))
        }
        Some(pat) => {
            if parts.is_empty() {
                return false;
            }
            match glob::Pattern::new(pat) {
                Ok(compiled) if compiled.matches(parts[0]) => matches_glob(&patterns[1..], &parts[1..]),
                _ => false,
            }
        }
    }
}

pub fn search_content(
    executor: &Executor,
    pattern: &str,
    file_pattern: &str,
) -> Result<String, ToolError> {
    let re = Regex::new(pattern).map_err(|e| ToolError::Message(format!("failed to compile regex pattern ({pattern}): {e}")))?;
    let mut files = Vec::new();
    collect_files(executor, executor.work_path(), executor.work_path(), &mut files)?;

    let mut out = String::new();
    for rel in files {
        let basename = Path::new(&rel)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if basename.starts_with('.') {
            continue;
        }
        if let Some(ext) = Path::new(&rel).extension().and_then(|e| e.to_str()) {
            if BINARY_EXTENSIONS.contains(&ext) {
                continue;
            }
        }
        if !file_pattern.is_empty() {
            let Ok(pat) = glob::Pattern::new(file_pattern) else { continue };
            if !pat.matches(&basename) {
                continue;
            }
        }

        let full = executor.work_path().join(&rel);
        let Ok(contents) = std::fs::read_to_string(&full) else { continue };
        for (line_no, line) in contents.lines().enumerate() {
            if re.is_match(line) {
                out.push_str(&format!("{}:{}: {}\n", rel, line_no + 1, line.trim()));
            }
        }
    }

    if out.is_empty() {
        return Ok(format!("No files found: {pattern}"));
    }
    Ok(out)
}

/// `ts:<unix>\n` prefix windows used by `search_history`'s `time_range` filter.
fn time_range_cutoff(time_range: &str, now: i64) -> Option<i64> {
    let seconds = match time_range {
        "1d" => 86_400,
        "7d" => 7 * 86_400,
        "1m" => 30 * 86_400,
        "1y" => 365 * 86_400,
        _ => return None,
    };
    Some(now - seconds)
}

fn entry_timestamp(content: &str) -> Option<i64> {
    content.strip_prefix("ts:").and_then(|rest| {
        let (ts, _) = rest.split_once('\n')?;
        ts.parse().ok()
    })
}

/// Case-insensitive substring search over the current session's
/// `history.json`, excluding the last 4 entries (already in context),
/// newest-first, capped at 10 matches (spec.md §4.2).
pub fn search_history(
    config_root: &Path,
    session_id: &str,
    keyword: &str,
    time_range: &str,
    now_unix: i64,
) -> Result<String, ToolError> {
    if keyword.is_empty() {
        return Err(ToolError::Message("keyword is required".into()));
    }
    let history_path = ar_config::paths::session_dir(config_root, session_id).join("history.json");
    let contents = match std::fs::read_to_string(&history_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok("No history found for current session".to_string());
        }
        Err(e) => return Err(ToolError::Io(e)),
    };
    let entries: Vec<ar_core::Message> = serde_json::from_str(&contents)?;
    let tail_start = entries.len().saturating_sub(4);
    let searchable = &entries[..tail_start];

    let lower_keyword = keyword.to_lowercase();
    let cutoff = time_range_cutoff(time_range, now_unix);

    let mut matches = Vec::new();
    for entry in searchable.iter().rev() {
        let Some(content) = entry.content.as_deref() else { continue };
        if !content.to_lowercase().contains(&lower_keyword) {
            continue;
        }
        if let Some(cutoff) = cutoff {
            match entry_timestamp(content) {
                Some(ts) if ts >= cutoff => {}
                _ => continue,
            }
        }
        matches.push((entry.role.as_str(), content));
        if matches.len() >= 10 {
            break;
        }
    }

    if matches.is_empty() {
        return Ok(format!("No matches found for keyword: {keyword}"));
    }
    let mut out = String::new();
    for (role, content) in matches {
        out.push_str(&format!("[{role}] {content}\n"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn executor_at(dir: &Path) -> Executor {
        Executor::new(dir.to_path_buf(), "s".to_string(), Vec::new(), None)
    }

    #[test]
    fn read_write_roundtrip() {
        let dir = tempdir().unwrap();
        let exec = executor_at(dir.path());
        write_file(&exec, "a.txt", "hello").unwrap();
        assert_eq!(read_file(&exec, "a.txt").unwrap(), "hello");
    }

    #[test]
    fn write_rejects_empty_content() {
        let dir = tempdir().unwrap();
        let exec = executor_at(dir.path());
        assert!(write_file(&exec, "a.txt", "").is_err());
    }

    #[test]
    fn patch_edit_replaces_first_occurrence() {
        let dir = tempdir().unwrap();
        let exec = executor_at(dir.path());
        write_file(&exec, "a.txt", "foo bar foo").unwrap();
        patch_edit(&exec, "a.txt", "foo", "baz").unwrap();
        assert_eq!(read_file(&exec, "a.txt").unwrap(), "baz bar foo");
    }

    #[test]
    fn patch_edit_errors_when_not_found() {
        let dir = tempdir().unwrap();
        let exec = executor_at(dir.path());
        write_file(&exec, "a.txt", "foo").unwrap();
        assert!(patch_edit(&exec, "a.txt", "missing", "x").is_err());
    }

    #[test]
    fn list_files_non_recursive_suffixes_dirs() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("f.txt"), "x").unwrap();
        let exec = executor_at(dir.path());
        let out = list_files(&exec, ".", false).unwrap();
        assert!(out.contains("sub/"));
        assert!(out.contains("f.txt"));
    }

    #[test]
    fn list_files_recursive_skips_hidden_dirs() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".hidden")).unwrap();
        std::fs::write(dir.path().join(".hidden").join("x.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("visible")).unwrap();
        std::fs::write(dir.path().join("visible").join("y.txt"), "y").unwrap();
        let exec = executor_at(dir.path());
        let out = list_files(&exec, ".", true).unwrap();
        assert!(!out.contains("hidden"));
        assert!(out.contains("visible/y.txt"));
    }

    #[test]
    fn p8_glob_roundtrip() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src").join("main.rs"), "x").unwrap();
        std::fs::write(dir.path().join("README.md"), "x").unwrap();
        let exec = executor_at(dir.path());
        let out = glob_files(&exec, "**/*.rs").unwrap();
        assert!(out.contains("src/main.rs"));
        assert!(!out.contains("README.md"));
    }

    #[test]
    fn search_content_emits_relpath_line_and_text() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello\nworld needle\n").unwrap();
        let exec = executor_at(dir.path());
        let out = search_content(&exec, "needle", "").unwrap();
        assert_eq!(out.trim(), "a.txt:2: world needle");
    }

    #[test]
    fn search_content_skips_binary_extensions() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), "needle").unwrap();
        let exec = executor_at(dir.path());
        let out = search_content(&exec, "needle", "").unwrap();
        assert!(out.starts_with("No files found"));
    }

    #[test]
    fn search_history_excludes_last_four_and_caps_at_ten() {
        let dir = tempdir().unwrap();
        let session_id = ar_config::registry::ensure_session_id(dir.path()).unwrap();
        let session_dir = ar_config::paths::session_dir(dir.path(), &session_id);
        std::fs::create_dir_all(&session_dir).unwrap();
        let entries: Vec<ar_core::Message> = (0..20)
            .map(|i| ar_core::Message::user(format!("ts:{i}\nneedle number {i}")))
            .collect();
        std::fs::write(session_dir.join("history.json"), serde_json::to_string(&entries).unwrap()).unwrap();

        let out = search_history(dir.path(), &session_id, "needle", "", 0).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 10);
        // newest-first among the searchable (non-tail) entries: indices 0..16
        assert!(lines[0].contains("number 15"));
        assert!(!out.contains("number 16"));
        assert!(!out.contains("number 19"));
    }

    #[test]
    fn search_history_missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let out = search_history(dir.path(), "nonexistent", "x", "", 0).unwrap();
        assert_eq!(out, "No history found for current session");
    }
}
