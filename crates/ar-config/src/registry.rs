//! `config.json`: the per-user session index *and* the agent registry
//! (`models` / `default_model`), read/written under [`crate::ConfigLock`]
//! (spec.md §3 invariants, §4.5, §4.7; ground truth:
//! `internal/agents/exec/{getSession,selectAgent}.go`).

use std::fs;
use std::path::{Path, PathBuf};

use ar_core::AgentEntry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::paths::config_json_path;

/// Typed view of `config.json`. Unknown keys are preserved in `extra` so a
/// session-id merge never clobbers fields this binary doesn't know about
/// (spec.md §4.5: "mint a new UUIDv4, merge it into the JSON preserving
/// other keys, rewrite").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub models: Vec<AgentEntry>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read `config.json` at `config_root`, if present.
///
/// `Ok(None)` means the file does not exist (a legitimate "first run"
/// state); a present-but-unparseable file is `Err(ConfigError::Corrupt)` —
/// spec.md §7: "do not guess intent; do not overwrite".
pub fn read(config_root: &Path) -> Result<Option<RegistryFile>, ConfigError> {
    let path = config_json_path(config_root);
    match fs::read_to_string(&path) {
        Ok(contents) => {
            let file: RegistryFile = serde_json::from_str(&contents)
                .map_err(|e| ConfigError::Corrupt(format!("{}: {e}", path.display())))?;
            Ok(Some(file))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::Io(e)),
    }
}

pub fn write(config_root: &Path, file: &RegistryFile) -> Result<(), ConfigError> {
    fs::create_dir_all(config_root)?;
    let path = config_json_path(config_root);
    let body = serde_json::to_vec_pretty(file)?;
    fs::write(path, body)?;
    Ok(())
}

/// Resolve or mint the session id in `config.json`, **assuming the caller
/// already holds the exclusive [`crate::ConfigLock`] on `config_root`**.
///
/// Per the Open Question resolution in SPEC_FULL.md §9: the lock is the
/// sole guard; creation uses a plain truncate-or-create write, not
/// `O_CREAT|O_EXCL` (the race that flag guarded against is already
/// prevented by the held flock).
pub fn ensure_session_id(config_root: &Path) -> Result<String, ConfigError> {
    match read(config_root)? {
        Some(file) if !file.session_id.trim().is_empty() => Ok(file.session_id.trim().to_string()),
        Some(mut file) => {
            let id = mint_uuidv4();
            file.session_id = id.clone();
            write(config_root, &file)?;
            Ok(id)
        }
        None => {
            let id = mint_uuidv4();
            let file = RegistryFile {
                session_id: id.clone(),
                ..Default::default()
            };
            write(config_root, &file)?;
            Ok(id)
        }
    }
}

/// Mint a UUIDv4 in the canonical hyphenated form (spec.md §4.5).
pub fn mint_uuidv4() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Agent-registry resolution for the agent selector (spec.md §4.7; ground
/// truth: `selectAgent.go`'s `GetAgentEntries`): scan `config_root`
/// candidates in order, return the first whose `config.json` parses with a
/// non-empty `models` list. Unreadable/empty roots are skipped silently —
/// never an error.
///
/// Entries come back in **declaration order** — the order a human wrote them
/// in `models` — alongside the configured `default_model` name, if any. The
/// selector prompt (spec.md §4.7; [`crate::registry`] callers via
/// `ar_runtime::select_agent`) must see this same declaration order, never a
/// reordering; only the fallback path (`AgentRegistry::build`) swaps the
/// default into index 0, and it does so over its own constructed agents, not
/// this list (SPEC_FULL.md §9's Open Question resolution).
pub fn resolve_agent_registry(config_root_candidates: &[PathBuf]) -> (Vec<AgentEntry>, Option<String>) {
    for root in config_root_candidates {
        let Ok(Some(file)) = read(root) else {
            continue;
        };
        if file.models.is_empty() {
            continue;
        }
        return (file.models, file.default_model);
    }
    (Vec::new(), None)
}
