use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgentError;

/// Binary spawned for every model call.
const CLAUDE_BIN: &str = "claude";

/// Model and timeout for one Claude CLI role.
#[derive(Debug, Clone)]
pub struct ClaudeCliConfig {
    pub model: String,
    pub timeout: Duration,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(90),
        }
    }
}

fn claude_args<'a>(system_prompt: &'a str, user_prompt: &'a str, model: &'a str) -> [&'a str; 8] {
    [
        "-p",
        user_prompt,
        "--system-prompt",
        system_prompt,
        "--model",
        model,
        "--output-format",
        "text",
    ]
}

/// Run one non-interactive Claude CLI completion and return its stdout.
///
/// Spawn failures, non-zero exits, empty output and timeouts are all errors;
/// callers decide how each degrades.
pub async fn invoke_claude(
    system_prompt: &str,
    user_prompt: &str,
    config: &ClaudeCliConfig,
) -> Result<String, AgentError> {
    let started = Instant::now();
    debug!(model = %config.model, prompt_chars = user_prompt.len(), "Invoking claude CLI");

    let output = tokio::time::timeout(
        config.timeout,
        Command::new(CLAUDE_BIN)
            .args(claude_args(system_prompt, user_prompt, &config.model))
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| AgentError::Timeout(config.timeout.as_secs()))?
    .map_err(|e| AgentError::Cli(format!("Failed to spawn {CLAUDE_BIN}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(model = %config.model, status = %output.status, stderr = %stderr, "Claude CLI failed");
        return Err(AgentError::Cli(format!(
            "{CLAUDE_BIN} exited {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        return Err(AgentError::Cli("Claude returned empty response".to_string()));
    }

    debug!(
        model = %config.model,
        elapsed_ms = started.elapsed().as_millis() as u64,
        reply_chars = stdout.len(),
        "Claude CLI replied"
    );
    Ok(stdout)
}

/// Check if the `claude` CLI is available on the system.
pub async fn check_cli_available() -> bool {
    match Command::new(CLAUDE_BIN).arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
