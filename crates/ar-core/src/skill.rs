use std::path::PathBuf;

/// Prompt bundle discovered on disk (spec.md §3, §4.4).
///
/// Immutable once created by a scan pass; lifetime = scanner lifetime.
#[derive(Debug, Clone)]
pub struct Skill {
    pub name: String,
    pub description: String,
    /// Full file body, including the frontmatter block if present.
    pub content: String,
    /// Body with the frontmatter block stripped.
    pub body: String,
    pub absolute_path: PathBuf,
    pub folder_path: PathBuf,
    pub content_hash: String,
}

impl Skill {
    /// Treat an empty-content skill as "no skill" per spec.md §4.6.
    pub fn is_effective(&self) -> bool {
        !self.content.is_empty()
    }
}
