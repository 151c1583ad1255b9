use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{ChatSession, HttpAnswerService, Key, Phase, RequestController};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

use commands::Command;
use config::{load_settings, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the IT help desk assistant")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Treat replies without an `answer` field as failures.
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)
        .with_context(|| format!("failed to load settings from {}", args.config.display()))?;
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.request_timeout_secs = timeout_secs;
    }
    if args.strict {
        settings.strict_decoding = true;
    }

    let service_config = settings.service_config()?;
    info!(
        base_url = %service_config.base_url,
        strict = service_config.strict_decoding,
        "help desk client starting"
    );
    let service =
        HttpAnswerService::new(service_config).context("failed to build answer service")?;
    let controller =
        RequestController::new(Arc::new(service)).with_timeout(settings.request_timeout());
    let mut session = ChatSession::new(controller);

    let stdin = BufReader::new(tokio::io::stdin());
    run(&mut session, stdin, &mut std::io::stdout()).await
}

/// Drives the session from `input` lines until EOF or `/quit`, then drains pending replies.
async fn run<R, W>(session: &mut ChatSession, input: R, stdout: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut len_rx = session.subscribe_len();
    let mut shown = 0;

    render::greeting(stdout)?;
    stdout.flush()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match Command::parse(&line) {
                    Command::Say(text) => {
                        session.set_draft(text);
                        session.handle_key(Key::Enter);
                    }
                    Command::Press(action) => {
                        if session.press(action).is_none() {
                            writeln!(stdout, "{action} is coming soon.")?;
                        }
                    }
                    Command::Ask(endpoint, question) => {
                        session.ask(endpoint, &question);
                    }
                    Command::Menu => {
                        if session.state().phase() == Phase::Greeting {
                            render::greeting(stdout)?;
                        } else {
                            render::menu(stdout)?;
                        }
                    }
                    Command::Quit => break,
                    Command::Unknown(raw) => {
                        warn!(command = %raw, "unknown command");
                        writeln!(stdout, "Unknown command: {raw}")?;
                    }
                }
            }
            Some(_) = session.next_reply(), if session.state().is_pending() => {}
        }

        if len_rx.has_changed().unwrap_or(false) {
            len_rx.borrow_and_update();
            shown = render::new_messages(stdout, session.state(), shown)?;
        }
        stdout.flush()?;
    }

    if session.state().is_pending() {
        info!("waiting for outstanding replies");
        session.settle_all().await;
        render::new_messages(stdout, session.state(), shown)?;
        stdout.flush()?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
