use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use tokio::io::{AsyncBufReadExt, BufReader};

use shellbook_bridge::app::{Flow, ShellbookApp};
use shellbook_bridge::config::Config;
use shellbook_bridge::render::print_lines;
use shellbook_core::{DirectoryContext, Session, ShellExecutor};
use shellbook_neural::{AssistBackend, ChatClient, UnavailableAssist};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("=== Shellbook Starting ===");

    let assist: Arc<dyn AssistBackend> = match config.api_key() {
        Some(key) => {
            tracing::info!("Using model {} at {}", config.model, config.base_url);
            Arc::new(
                ChatClient::new(&config.base_url, &config.model, key)
                    .with_scrubbing(config.scrub_prompts),
            )
        }
        None => {
            tracing::warn!("{} is not set; AI features are disabled", config.api_key_env);
            Arc::new(UnavailableAssist::new(config.api_key_env.clone()))
        }
    };

    let directory = Arc::new(
        DirectoryContext::from_process().context("Failed to read the working directory")?,
    );
    let (session, events) = Session::new(directory, Arc::new(ShellExecutor::new()), assist);
    let mut app = ShellbookApp::new(session, events);

    println!("{}", "Shellbook: describe a task, or !help for commands.".cyan());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(&app.prompt());

        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let flow = app.handle_line(&line).await;
                    print_lines(&app.take_output());
                    if flow == Flow::Exit {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("stdin: {}", e);
                    break;
                }
            },
            Some(_) = app.next_completion() => {
                println!();
                print_lines(&app.take_output());
            }
        }
    }

    tracing::info!("Shellbook exiting");
    Ok(())
}

fn print_prompt(prompt: &str) {
    print!("{} {} ", prompt.green().bold(), "❯".dark_grey());
    let _ = std::io::stdout().flush();
}
