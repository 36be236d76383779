use std::future::poll_fn;
use std::io::{self, Write};
use std::pin::pin;
use std::process;
use std::sync::mpsc;
use std::task::Poll;
use std::thread;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use owo_colors::{OwoColorize, Stream};
use tour_assistant::commands::chat::{self, ChatArgs};
use tour_assistant::commands::config::{self, ConfigArgs};
use tour_assistant::logging;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("TOUR_GIT_SHA"),
    ", built ",
    env!("TOUR_BUILD_TS"),
    ")"
);

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  tour-assistant\n  tour-assistant --model gpt-4o --temperature 0.2\n  tour-assistant --profile trip\n  tour-assistant config check --profile trip\n  tour-assistant completion bash > ~/.local/share/bash-completion/completions/tour-assistant\n\nIn the chat: /reset clears the conversation, /exit or /quit leaves.";

#[derive(Debug, Parser)]
#[command(
    name = "tour-assistant",
    about = "Travel-planning chat with live weather lookups",
    version,
    long_version = LONG_VERSION,
    args_conflicts_with_subcommands = true,
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(flatten)]
    chat: ChatArgs,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Start an interactive chat (default)")]
    Chat(ChatArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let name = "tour-assistant";
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, name, &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, name, &mut io::stdout()),
    }
}

/// Ctrl-C ends the session with a notice and a zero exit status. The chat
/// loop itself is blocking, so the signal is awaited on a separate thread.
///
/// Returns once the OS handler is in place (or known to be unavailable).
fn install_interrupt_handler() {
    let (ready_tx, ready_rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::warn!(error = %err, "interrupt handler unavailable");
                return;
            }
        };
        let interrupted = runtime.block_on(async {
            let mut ctrl_c = pin!(tokio::signal::ctrl_c());
            // The first poll registers the handler.
            let first = poll_fn(|cx| Poll::Ready(ctrl_c.as_mut().poll(cx))).await;
            let _ = ready_tx.send(());
            match first {
                Poll::Ready(result) => result,
                Poll::Pending => ctrl_c.await,
            }
        });
        match interrupted {
            Ok(()) => {
                let mut stdout = io::stdout();
                let _ = writeln!(stdout, "\nSession cancelled by user.");
                let _ = stdout.flush();
                process::exit(0);
            }
            Err(err) => tracing::warn!(error = %err, "interrupt handler unavailable"),
        }
    });
    let _ = ready_rx.recv();
}

fn main() {
    dotenvy::dotenv().ok();
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            install_interrupt_handler();
            chat::run(cli.chat)
        }
        Some(Commands::Chat(args)) => {
            install_interrupt_handler();
            chat::run(args)
        }
        Some(Commands::Config(args)) => config::run(args),
        Some(Commands::Completion { shell }) => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!(
            "{}",
            err.if_supports_color(Stream::Stderr, |text| text.red())
        );
        process::exit(1);
    }
}
