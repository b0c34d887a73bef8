// console/listener.rs

use super::Console;
use super::command_handler::handle_command;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Reads console lines until EOF or /exit and hands each one to the
/// command handler.
pub async fn run(console: &mut Console) {
    console.reply("Type /help for the command list.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/exit" || line == "/quit" {
            break;
        }
        handle_command(line, console).await;
    }
    info!("Console session ended.");
}
