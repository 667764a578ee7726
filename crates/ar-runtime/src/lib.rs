//! Wires the provider, session, skill, and tool crates into the
//! tool-driven reasoning loop and request orchestrator (spec.md §4.1,
//! §4.6-4.7; ground truth: `internal/agents/exec/*.go`).

mod error;
mod prompts;
mod reasoning_loop;
mod run;
mod selector;

pub use error::RuntimeError;
pub use reasoning_loop::{execute, ExecuteContext, MAX_SKILL_ITERATIONS, MAX_TOOL_ITERATIONS};
pub use run::{run, AgentRegistry, RunContext};
pub use selector::{select_agent, select_skill};
