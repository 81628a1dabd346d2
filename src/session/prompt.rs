//! Interactive password prompting.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Source of passwords for interactive login.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Asks for `username`'s password; `None` when the user gives up.
    async fn password(&self, username: &str) -> Option<String>;
}

/// Prompts on stderr and reads one line from stdin.
///
/// An empty line or end of input ends prompting.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn password(&self, username: &str) -> Option<String> {
        let mut stderr = tokio::io::stderr();
        let prompt = format!("Enter password for {username}: ");
        stderr.write_all(prompt.as_bytes()).await.ok()?;
        stderr.flush().await.ok()?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .ok()?;
        let password = line.trim_end_matches(['\r', '\n']);
        if read == 0 || password.is_empty() {
            return None;
        }
        Some(password.to_string())
    }
}
