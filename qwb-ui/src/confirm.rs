//! Confirmation port
//!
//! The orchestrator asks yes/no questions through [`Confirm`] instead of
//! opening a dialog itself.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Always gives the same answer (`--yes` / `--no`, tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirm for FixedAnswer {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Asks on the terminal; anything but "y"/"yes" is a no
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut stdout = tokio::io::stdout();
        if let Err(e) = stdout.write_all(format!("{prompt} [y/N] ").as_bytes()).await {
            warn!("Failed to write prompt: {}", e);
            return false;
        }
        let _ = stdout.flush().await;

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(_) => is_yes(&line),
            Err(e) => {
                warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
