//! A terminal chat window that demonstrates how to use `parley` as a library.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use parley::core::{SubmitError, Turn, TurnStatus};
use parley::render::terminal::render_turn;
use parley::{ChatWidgetBuilder, GeminiConfigBuilder, GeminiTransport};
use parley_model::Role;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum WidgetEvent {
    Idle,
    Transcript(Vec<Turn>),
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(api_key) = env::var("GEMINI_API_KEY") else {
        eprintln!("GEMINI_API_KEY environment variable is not set");
        return;
    };

    let mut config_builder = GeminiConfigBuilder::with_api_key(api_key)
        .with_system_instruction(include_str!("./system_prompt.md"));
    if let Ok(model) = env::var("GEMINI_MODEL") {
        config_builder = config_builder.with_model(model);
    }
    if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
        config_builder = config_builder.with_base_url(base_url);
    }
    let request_timeout = match env::var("PARLEY_TIMEOUT_SECS") {
        Ok(secs) => match secs.parse() {
            Ok(secs) => Duration::from_secs(secs),
            Err(err) => {
                eprintln!("PARLEY_TIMEOUT_SECS is not a number: {err}");
                return;
            }
        },
        Err(_) => Duration::from_secs(30),
    };
    let transport = GeminiTransport::new(
        config_builder.with_timeout(request_timeout).build(),
    );

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let widget = ChatWidgetBuilder::with_transport(transport)
        .with_request_timeout(request_timeout)
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(WidgetEvent::Idle).ok();
            }
        })
        .on_transcript({
            let event_tx = event_tx.clone();
            move |turns| {
                event_tx.send(WidgetEvent::Transcript(turns.to_vec())).ok();
            }
        })
        .build();

    let template = ProgressStyle::with_template("{spinner} {wide_msg}");
    let progress_style = match template {
        Ok(style) => style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        Err(err) => {
            error!("invalid progress template: {err}");
            ProgressStyle::default_spinner()
        }
    };

    println!("{}", "Health Care ChatBot".bright_magenta().bold());

    let mut input = BufReader::new(io::stdin()).lines();

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut input).await else {
            break;
        };
        match widget.send_message(&line) {
            Ok(()) => {}
            Err(SubmitError::Invalid(_)) => continue,
            Err(err) => {
                error!("cannot send the message: {err}");
                break;
            }
        }

        let mut progress_bar = None;

        loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🤔 Thinking...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            match event {
                WidgetEvent::Transcript(turns) => {
                    let Some(last) = turns.last() else {
                        continue;
                    };
                    if last.role() != Role::Assistant || last.is_pending() {
                        continue;
                    }

                    // Finish the progress bar before printing anything else.
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    let bar = if last.status() == TurnStatus::Failed {
                        BAR_CHAR.bright_red().to_string()
                    } else {
                        BAR_CHAR.bright_cyan().to_string()
                    };
                    println!("{bar}🤖 {}", render_turn(last));
                }
                WidgetEvent::Idle => {
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    break;
                }
            }
        }
    }
}

/// Reads the next line of input, without its line terminator.
///
/// Returns `None` at EOF, or when the input cannot be read anymore.
async fn read_line<R>(input: &mut Lines<R>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match input.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
