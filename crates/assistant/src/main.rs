//! Chat with the GIAIC Assistant in the terminal.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use giaic_assistant::core::{TurnEvent, TurnStream};
use giaic_assistant::{AGENT_NAME, AssistantBuilder, AssistantConfig};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match AssistantConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("loaded config: {config:?}");

    let assistant = match AssistantBuilder::with_config(&config).build() {
        Ok(assistant) => assistant,
        Err(err) => {
            eprintln!("failed to set up the assistant: {err}");
            return;
        }
    };
    let session_id = assistant.start_session();

    let template = ProgressStyle::with_template("{spinner} {wide_msg}");
    let progress_style = match template {
        Ok(style) => style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        Err(err) => {
            error!("invalid progress template: {err}");
            ProgressStyle::default_spinner()
        }
    };

    println!(
        "{}🤖 {}",
        BAR_CHAR.bright_cyan(),
        assistant.welcome_message().bright_white()
    );

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let stream = match assistant.send_message(&session_id, line) {
            Ok(stream) => stream,
            Err(err) => {
                error!("cannot send message: {err}");
                break;
            }
        };
        print_answer(stream, &progress_style).await;
    }

    assistant.end_session(&session_id).ok();
}

/// Prints the answer as it streams in, with a spinner until the first
/// fragment arrives.
async fn print_answer(mut stream: TurnStream, progress_style: &ProgressStyle) {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(progress_style.clone());
    progress_bar.set_message(format!("🤔 {AGENT_NAME} is thinking..."));

    let mut started = false;
    loop {
        let event = select! {
            event = stream.next_event() => event,
            _ = sleep(Duration::from_millis(100)), if !started => {
                progress_bar.inc(1);
                continue;
            }
        };

        // Finish the spinner before printing anything else.
        if !progress_bar.is_finished() {
            progress_bar.finish_and_clear();
        }

        match event {
            Some(TurnEvent::Fragment(fragment)) => {
                if !started {
                    print!("{}🤖 ", BAR_CHAR.bright_cyan());
                    started = true;
                }
                print!("{}", fragment.bright_white());
                std::io::stdout().flush().ok();
            }
            Some(TurnEvent::Done) => {
                if !started {
                    print!("{}🤖 ", BAR_CHAR.bright_cyan());
                }
                println!();
                break;
            }
            Some(TurnEvent::Failed(message)) => {
                if started {
                    println!();
                }
                println!("{}{}", BAR_CHAR.bright_yellow(), message.yellow());
                break;
            }
            None => break,
        }
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
