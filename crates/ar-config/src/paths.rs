use std::path::{Path, PathBuf};

/// XDG application name under which the user-level config root is resolved
/// (spec.md §6: `<user_home>/.config/go-agent-skills/`).
pub const APP_NAME: &str = "go-agent-skills";

/// User-level config root, created lazily by callers (spec.md §4.5).
pub fn user_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Workdir-level config root (`<workdir>/.config/go-agent-skills/`), the
/// second root consulted for `apis/*.json` (spec.md §4.5, §6).
pub fn workdir_config_dir(work_path: &Path) -> PathBuf {
    work_path.join(".config").join(APP_NAME)
}

pub fn config_json_path(config_root: &Path) -> PathBuf {
    config_root.join("config.json")
}

pub fn config_lock_path(config_root: &Path) -> PathBuf {
    config_root.join("config.json.lock")
}

pub fn copilot_token_path(config_root: &Path) -> PathBuf {
    config_root.join("copilot_token.json")
}

pub fn secrets_path(config_root: &Path) -> PathBuf {
    config_root.join(".secrets")
}

pub fn apis_dir(config_root: &Path) -> PathBuf {
    config_root.join("apis")
}

pub fn sessions_dir(config_root: &Path) -> PathBuf {
    config_root.join("sessions")
}

pub fn session_dir(config_root: &Path, session_id: &str) -> PathBuf {
    sessions_dir(config_root).join(session_id)
}

pub fn browser_cache_dir(config_root: &Path) -> PathBuf {
    config_root.join("tools").join("browser").join("cached")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workdir_config_dir_nests_under_dotconfig() {
        let work = Path::new("/tmp/project");
        assert_eq!(
            workdir_config_dir(work),
            PathBuf::from("/tmp/project/.config/go-agent-skills")
        );
    }

    #[test]
    fn session_dir_nests_under_sessions() {
        let root = Path::new("/home/user/.config/go-agent-skills");
        assert_eq!(
            session_dir(root, "abc-123"),
            PathBuf::from("/home/user/.config/go-agent-skills/sessions/abc-123")
        );
    }
}
