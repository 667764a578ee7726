//! `SKILL.md` frontmatter parsing (spec.md §4.4; ground truth:
//! `internal/skill/parser.go`).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ar_core::Skill;
use regex::Regex;
use sha2::{Digest, Sha256};

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^---\n(.*?)\n---\n?(.*)$").unwrap())
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^name:\s*(.+)$").unwrap())
}

fn description_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^description:\s*(.+)$").unwrap())
}

/// Split frontmatter from body. `None` if no `---\n...\n---` block opens
/// the file — a missing header is not an error, just means "no frontmatter".
fn extract_header(content: &str) -> Option<(String, String)> {
    let caps = header_regex().captures(content)?;
    let frontmatter = caps.get(1)?.as_str().trim().to_string();
    let body = caps.get(2)?.as_str().trim().to_string();
    Some((frontmatter, body))
}

/// Parse one `SKILL.md` file at `path` into a [`Skill`].
///
/// A file that exists but fails to parse its frontmatter still yields a
/// `Skill` with `name = basename(folder)` and `description = ""` — only an
/// unreadable file is a hard error (SPEC_FULL.md §4.4).
pub fn parse_skill_file(path: &Path) -> std::io::Result<Skill> {
    let absolute_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let content = std::fs::read_to_string(path)?;

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let content_hash = format!("{:x}", hasher.finalize());

    let folder_path: PathBuf = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let default_name = folder_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let Some((frontmatter, body)) = extract_header(&content) else {
        return Ok(Skill {
            name: default_name,
            description: String::new(),
            content: content.clone(),
            body: content,
            absolute_path,
            folder_path,
            content_hash,
        });
    };

    let name = name_regex()
        .captures(&frontmatter)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or(default_name);
    let description = description_regex()
        .captures(&frontmatter)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    Ok(Skill {
        name,
        description,
        content,
        body,
        absolute_path,
        folder_path,
        content_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_skill(dir: &Path, folder: &str, body: &str) -> PathBuf {
        let folder_path = dir.join(folder);
        std::fs::create_dir_all(&folder_path).unwrap();
        let path = folder_path.join("SKILL.md");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn parses_frontmatter_name_and_description() {
        let dir = tempdir().unwrap();
        let path = write_skill(
            dir.path(),
            "changelog-generate",
            "---\nname: changelog-generate\ndescription: Generate a changelog.\n---\nBody text.",
        );
        let skill = parse_skill_file(&path).unwrap();
        assert_eq!(skill.name, "changelog-generate");
        assert_eq!(skill.description, "Generate a changelog.");
        assert_eq!(skill.body, "Body text.");
    }

    #[test]
    fn falls_back_to_folder_name_without_frontmatter() {
        let dir = tempdir().unwrap();
        let path = write_skill(dir.path(), "plain-skill", "Just a body, no header.");
        let skill = parse_skill_file(&path).unwrap();
        assert_eq!(skill.name, "plain-skill");
        assert_eq!(skill.description, "");
        assert_eq!(skill.body, skill.content);
    }

    #[test]
    fn malformed_header_still_yields_a_skill() {
        let dir = tempdir().unwrap();
        let path = write_skill(dir.path(), "broken-header", "---\nname: broken\nno closing fence");
        let skill = parse_skill_file(&path).unwrap();
        assert_eq!(skill.name, "broken-header");
    }

    #[test]
    fn content_hash_is_stable_sha256() {
        let dir = tempdir().unwrap();
        let path = write_skill(dir.path(), "hashed", "same content");
        let a = parse_skill_file(&path).unwrap();
        let b = parse_skill_file(&path).unwrap();
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 64);
    }
}
