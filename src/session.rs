//! Interactive tool-augmented chat loop.
//!
//! One user line becomes one turn: the transcript goes to the model, any tool
//! calls in the reply are dispatched and answered, and the model is asked
//! again until it produces a narrative reply (or the round limit is hit).

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::Settings;
use crate::rchain::ai::{AIMessage, MessageContent};
use crate::rchain::provider::{ChatModel, ProviderError};
use crate::rchain::transcript::{Transcript, TranscriptError};
use crate::toolbox::ToolExecutor;

pub const PROMPT: &str = "You> ";
pub const BANNER: &str = "Tour Assistant chat ready. Type '/reset' to clear or '/exit' to quit.";
pub const FAREWELL: &str = "Bon voyage!";
pub const RESET_NOTICE: &str = "Conversation reset.";
pub const EOF_NOTICE: &str = "EOF received. Bye!";
pub const NO_NARRATIVE: &str = "Assistant returned no narrative.";
pub const ROUND_LIMIT_NOTICE: &str = "Tool round limit reached; returning control.";
const DIVIDER_WIDTH: usize = 60;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// `/exit` or `/quit`.
    Exit,
    /// Input stream closed.
    EndOfInput,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Exit,
    Reset,
    Chat(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let text = line.trim();
    if text.is_empty() {
        return Command::Empty;
    }
    match text.to_lowercase().as_str() {
        "/exit" | "/quit" => Command::Exit,
        "/reset" => Command::Reset,
        _ => Command::Chat(text),
    }
}

enum TurnOutcome {
    Answered,
    RoundLimit,
    Failed(ProviderError),
}

/// Prints `text` framed by divider lines.
pub fn print_response(out: &mut impl Write, text: &str) -> io::Result<()> {
    let divider = "-".repeat(DIVIDER_WIDTH);
    writeln!(out, "{divider}")?;
    writeln!(out, "{}", text.trim())?;
    writeln!(out, "{divider}")
}

pub struct Session<'a, M, T> {
    model: &'a M,
    tools: &'a T,
    transcript: Transcript,
    max_tool_rounds: usize,
}

impl<'a, M: ChatModel, T: ToolExecutor> Session<'a, M, T> {
    pub fn new(model: &'a M, tools: &'a T, settings: &Settings) -> Self {
        Self {
            model,
            tools,
            transcript: Transcript::new(settings.system_prompt.clone()),
            max_tool_rounds: settings.max_tool_rounds,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Reads lines from `input` until an exit command or end of input.
    pub fn run(
        &mut self,
        mut input: impl BufRead,
        mut out: impl Write,
    ) -> Result<SessionEnd, SessionError> {
        writeln!(out, "{BANNER}")?;
        let mut line = String::new();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out, "\n{EOF_NOTICE}")?;
                return Ok(SessionEnd::EndOfInput);
            }

            if let Some(end) = self.handle_line(&line, &mut out)? {
                return Ok(end);
            }
        }
    }

    /// Handles one line of user input. Returns `Some` when the session
    /// should end.
    pub fn handle_line(
        &mut self,
        line: &str,
        out: &mut impl Write,
    ) -> Result<Option<SessionEnd>, SessionError> {
        match parse_command(line) {
            Command::Empty => Ok(None),
            Command::Exit => {
                writeln!(out, "{FAREWELL}")?;
                Ok(Some(SessionEnd::Exit))
            }
            Command::Reset => {
                self.transcript.reset();
                writeln!(out, "{RESET_NOTICE}")?;
                Ok(None)
            }
            Command::Chat(text) => {
                let checkpoint = self.transcript.len();
                self.transcript.push_user(text);
                match self.complete_turn(out)? {
                    TurnOutcome::Answered => {}
                    TurnOutcome::RoundLimit => {
                        warn!(limit = self.max_tool_rounds, "tool round limit reached");
                        writeln!(out, "{ROUND_LIMIT_NOTICE}")?;
                    }
                    TurnOutcome::Failed(err) => {
                        error!(error = %err, "completion failed; discarding turn");
                        self.transcript.rollback(checkpoint);
                        writeln!(out, "Assistant request failed: {err}")?;
                    }
                }
                Ok(None)
            }
        }
    }

    fn complete_turn(&mut self, out: &mut impl Write) -> Result<TurnOutcome, SessionError> {
        let mut rounds = 0;
        loop {
            let reply = match self
                .model
                .complete(self.transcript.messages(), self.tools.definitions())
            {
                Ok(reply) => reply,
                Err(err) => return Ok(TurnOutcome::Failed(err)),
            };

            if !reply.requests_tools() {
                let text = reply.content.text();
                let shown = if text.trim().is_empty() {
                    NO_NARRATIVE
                } else {
                    text.as_str()
                };
                print_response(out, shown)?;
                self.transcript.push_assistant_text(text);
                return Ok(TurnOutcome::Answered);
            }

            if rounds == self.max_tool_rounds {
                return Ok(TurnOutcome::RoundLimit);
            }
            rounds += 1;
            self.dispatch(reply)?;
        }
    }

    fn dispatch(&mut self, reply: AIMessage) -> Result<(), SessionError> {
        let content = match &reply.content {
            MessageContent::Absent => None,
            other => Some(other.text()),
        };
        let calls = reply.tool_calls;
        self.transcript.push_tool_request(content, calls.clone());

        for call in &calls {
            debug!(id = call.id(), tool = call.name(), "dispatching tool call");
            let result = self.tools.execute(call);
            self.transcript
                .push_tool_result(call.id(), result.to_string())?;
        }
        Ok(())
    }
}
