//! Concurrent skill scanner (spec.md §4.4, §5; ground truth:
//! `internal/skill/scanner.go`).
//!
//! Each root is scanned on its own thread; results funnel through a bounded
//! channel into a collector. Name collisions are then resolved
//! deterministically by iterating roots in their *declared* order and
//! keeping the first-seen name — the Open Question resolution recorded in
//! SPEC_FULL.md §9 (the raw fan-out order is not root order, so collection
//! alone cannot implement "first root wins").

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use ar_core::Skill;

use crate::parser::parse_skill_file;

/// Default search roots, in priority order (spec.md §4.4).
pub fn default_roots(cwd: &Path, home: &Path) -> Vec<PathBuf> {
    vec![
        cwd.join(".claude").join("skills"),
        cwd.join(".skills"),
        home.join(".claude").join("skills"),
        home.join(".opencode").join("skills"),
        home.join(".openai").join("skills"),
        home.join(".codex").join("skills"),
        PathBuf::from("/mnt/skills/public"),
        PathBuf::from("/mnt/skills/user"),
        PathBuf::from("/mnt/skills/examples"),
    ]
}

/// Resolved skill registry: by-name and by-absolute-path maps, plus the
/// root list used to build it.
#[derive(Debug, Default)]
pub struct SkillList {
    pub by_name: HashMap<String, Skill>,
    pub by_path: HashMap<PathBuf, Skill>,
    pub roots: Vec<PathBuf>,
}

impl SkillList {
    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.by_name.get(name)
    }
}

/// Scan a single root directory for `<root>/<skill_dir>/SKILL.md` entries.
/// A root that does not exist is skipped silently — not an error
/// (SPEC_FULL.md §4.1). Hidden directories (leading `.`) are skipped before
/// even checking for `SKILL.md`.
fn scan_root(root: &Path) -> Vec<Skill> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let skill_md = entry.path().join("SKILL.md");
        if !skill_md.is_file() {
            continue;
        }
        match parse_skill_file(&skill_md) {
            Ok(skill) => found.push(skill),
            Err(e) => {
                tracing::warn!(path = %skill_md.display(), error = %e, "failed to parse skill");
            }
        }
    }
    found
}

/// Scan all `roots` concurrently (one thread per root) and resolve name
/// collisions deterministically in root-declaration order.
pub fn scan(roots: &[PathBuf]) -> SkillList {
    let (tx, rx) = mpsc::sync_channel::<(usize, Skill)>(100);

    std::thread::scope(|scope| {
        for (idx, root) in roots.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                for skill in scan_root(root) {
                    let _ = tx.send((idx, skill));
                }
            });
        }
        drop(tx);

        let mut collected: Vec<(usize, Skill)> = rx.iter().collect();
        collected.sort_by_key(|(idx, _)| *idx);

        let mut list = SkillList {
            roots: roots.to_vec(),
            ..Default::default()
        };
        for (_, skill) in collected {
            if list.by_name.contains_key(&skill.name) {
                continue;
            }
            list.by_path.insert(skill.absolute_path.clone(), skill.clone());
            list.by_name.insert(skill.name.clone(), skill);
        }
        list
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_skill(root: &Path, folder: &str, name: &str, description: &str) {
        let dir = root.join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: {description}\n---\nbody"),
        )
        .unwrap();
    }

    #[test]
    fn missing_root_is_skipped_not_an_error() {
        let missing = PathBuf::from("/nonexistent/definitely/not/here");
        let list = scan(&[missing]);
        assert!(list.by_name.is_empty());
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let dir = tempdir().unwrap();
        write_skill(dir.path(), ".hidden", "hidden-skill", "");
        let list = scan(&[dir.path().to_path_buf()]);
        assert!(list.by_name.is_empty());
    }

    #[test]
    fn first_root_wins_on_name_collision() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        write_skill(first.path(), "a", "dup", "from-first");
        write_skill(second.path(), "b", "dup", "from-second");

        let list = scan(&[first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(list.by_name["dup"].description, "from-first");
    }

    #[test]
    fn names_unique_across_multiple_roots() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        write_skill(first.path(), "a", "skill-a", "");
        write_skill(second.path(), "b", "skill-b", "");

        let list = scan(&[first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(list.by_name.len(), 2);
    }
}
