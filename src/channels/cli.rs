//! CLI channel: stdin/stdout chat loop for local testing.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::ChannelError;
use crate::intake::{ConversationState, IntakeEngine, LeadRecord, quick_actions};

/// Runs a single chat session against the terminal.
///
/// `/quit` exits, `/lead` prints the collected lead record, `/reset` starts over.
pub struct CliChannel {
    engine: Arc<IntakeEngine>,
}

impl CliChannel {
    pub fn new(engine: Arc<IntakeEngine>) -> Self {
        Self { engine }
    }

    pub fn name(&self) -> &str {
        "cli"
    }

    /// Chat over the process's stdin and stdout until `/quit` or EOF.
    pub async fn run(&self) -> Result<ConversationState, ChannelError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run_with(stdin, stdout).await
    }

    /// Chat over arbitrary streams. Returns the final conversation state.
    pub async fn run_with<R, W>(
        &self,
        reader: R,
        mut writer: W,
    ) -> Result<ConversationState, ChannelError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut state = ConversationState::new();
        let mut lines = reader.lines();

        write_block(&mut writer, &self.engine.greeting()).await?;
        write_hints(&mut writer, &state).await?;

        loop {
            writer.write_all(b"> ").await?;
            writer.flush().await?;

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    return Err(ChannelError::Disconnected {
                        name: self.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line {
                "/quit" | "/exit" => break,
                "/lead" => {
                    let text = match LeadRecord::try_from(&state.fields) {
                        Ok(lead) => serde_json::to_string_pretty(&lead)
                            .unwrap_or_else(|e| format!("Could not render lead: {e}")),
                        Err(e) => format!("Lead incomplete: {e}"),
                    };
                    write_block(&mut writer, &text).await?;
                }
                "/reset" => {
                    self.engine.reset(&mut state);
                    write_block(&mut writer, &self.engine.greeting()).await?;
                    write_hints(&mut writer, &state).await?;
                }
                utterance => {
                    let outcome = self.engine.process_turn(&mut state, utterance).await;
                    write_block(&mut writer, &outcome.reply).await?;
                    if outcome.step_changed {
                        write_hints(&mut writer, &state).await?;
                    }
                }
            }
        }

        writer.flush().await?;
        Ok(state)
    }
}

async fn write_block<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> std::io::Result<()> {
    writer.write_all(format!("\n{}\n\n", text).as_bytes()).await
}

async fn write_hints<W: AsyncWrite + Unpin>(
    writer: &mut W,
    state: &ConversationState,
) -> std::io::Result<()> {
    let hints: Vec<String> = quick_actions(state.step)
        .iter()
        .map(|a| format!("{} {}", a.icon, a.label))
        .collect();
    writer
        .write_all(format!("   Try: {}\n", hints.join(" | ")).as_bytes())
        .await
}
