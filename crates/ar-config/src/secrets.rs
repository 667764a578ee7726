//! Fallback `.secrets` credential store (spec.md §6: "one KEY=VALUE per
//! line, mode 0600") and the resolution order layered over it: keychain
//! (external collaborator, out of scope here) then environment variable,
//! then this file (spec.md §6: env vars are "read only if keychain lookup
//! returns empty").

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::paths::secrets_path;

/// Where a resolved credential value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    EnvVar,
    SecretsFile,
}

/// Parse `KEY=VALUE` lines, ignoring blank lines and `#`-comments.
pub fn parse_secrets(contents: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

fn read_secrets_file(config_root: &Path) -> HashMap<String, String> {
    fs::read_to_string(secrets_path(config_root))
        .map(|s| parse_secrets(&s))
        .unwrap_or_default()
}

/// Resolve `env_var`'s value: environment first, `.secrets` fallback.
/// Returns `None` if neither source has a non-empty value.
pub fn resolve_credential(config_root: &Path, env_var: &str) -> Option<(CredentialSource, String)> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Some((CredentialSource::EnvVar, value));
        }
    }
    read_secrets_file(config_root)
        .get(env_var)
        .filter(|v| !v.is_empty())
        .map(|v| (CredentialSource::SecretsFile, v.clone()))
}

/// Write `.secrets` with mode 0600 (spec.md §6).
pub fn write_secrets(config_root: &Path, entries: &HashMap<String, String>) -> std::io::Result<()> {
    fs::create_dir_all(config_root)?;
    let path = secrets_path(config_root);
    let mut body = String::new();
    for (k, v) in entries {
        body.push_str(k);
        body.push('=');
        body.push_str(v);
        body.push('\n');
    }
    fs::write(&path, body)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_key_value_lines() {
        let map = parse_secrets("# comment\nANTHROPIC_API_KEY=sk-abc\n\nOPENAI_API_KEY=sk-def\n");
        assert_eq!(map.get("ANTHROPIC_API_KEY").unwrap(), "sk-abc");
        assert_eq!(map.get("OPENAI_API_KEY").unwrap(), "sk-def");
    }

    #[test]
    fn env_var_takes_precedence_over_secrets_file() {
        let dir = tempdir().unwrap();
        let mut entries = HashMap::new();
        entries.insert("AR_TEST_KEY".to_string(), "from-file".to_string());
        write_secrets(dir.path(), &entries).unwrap();

        std::env::set_var("AR_TEST_KEY", "from-env");
        let (source, value) = resolve_credential(dir.path(), "AR_TEST_KEY").unwrap();
        std::env::remove_var("AR_TEST_KEY");

        assert_eq!(source, CredentialSource::EnvVar);
        assert_eq!(value, "from-env");
    }

    #[test]
    fn falls_back_to_secrets_file_when_env_absent() {
        let dir = tempdir().unwrap();
        let mut entries = HashMap::new();
        entries.insert("AR_TEST_KEY_2".to_string(), "from-file".to_string());
        write_secrets(dir.path(), &entries).unwrap();

        std::env::remove_var("AR_TEST_KEY_2");
        let (source, value) = resolve_credential(dir.path(), "AR_TEST_KEY_2").unwrap();
        assert_eq!(source, CredentialSource::SecretsFile);
        assert_eq!(value, "from-file");
    }

    #[test]
    fn missing_everywhere_is_none() {
        let dir = tempdir().unwrap();
        std::env::remove_var("AR_TEST_KEY_MISSING");
        assert!(resolve_credential(dir.path(), "AR_TEST_KEY_MISSING").is_none());
    }
}
