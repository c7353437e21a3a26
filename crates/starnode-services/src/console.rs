//! Console: turns user commands into queue entries and status reads.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use starnode_core::{wire, Command, CommandError, Packet, PacketError, WireError};

use crate::context::SharedContext;
use crate::status;

pub const PROMPT: &str = "\nStar-node command: ";

/// What the console loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Disconnect,
}

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to read log {path}: {source}")]
    LogRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to encode packet: {0}")]
    Packet(#[from] PacketError),

    #[error("packet cannot be sent in one datagram: {0}")]
    Oversized(#[from] WireError),

    #[error("console output failed: {0}")]
    Io(#[from] io::Error),
}

pub struct Console {
    ctx: SharedContext,
    log_path: PathBuf,
}

impl Console {
    pub fn new(ctx: SharedContext, log_path: PathBuf) -> Self {
        Self { ctx, log_path }
    }

    /// Read commands until `disconnect` or end of input, then request shutdown.
    ///
    /// Command errors, including lines that are not valid UTF-8, are logged
    /// and the loop carries on. Only a failure to read input or write output
    /// ends it early.
    pub fn run(&self, mut input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        let mut line = Vec::new();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                tracing::info!("console input closed");
                break;
            }

            let outcome = match std::str::from_utf8(&line) {
                Ok(text) => self.handle_line(text, out),
                Err(_) => Err(ConsoleError::Command(CommandError::Unrecognized {
                    input: String::from_utf8_lossy(&line).trim_end().to_string(),
                })),
            };

            match outcome {
                Ok(Flow::Continue) => {}
                Ok(Flow::Disconnect) => {
                    tracing::info!("Node disconnected.");
                    break;
                }
                Err(ConsoleError::Io(e)) => {
                    self.ctx.request_shutdown();
                    return Err(e);
                }
                Err(e) => tracing::error!("{e}"),
            }
        }
        self.ctx.request_shutdown();
        Ok(())
    }

    pub fn handle_line(&self, line: &str, out: &mut impl Write) -> Result<Flow, ConsoleError> {
        let command = Command::parse(line)?;
        self.execute(command, out)
    }

    pub fn execute(&self, command: Command, out: &mut impl Write) -> Result<Flow, ConsoleError> {
        match command {
            Command::SendMessage(message) => {
                self.enqueue(&Packet::message(message.as_str()))?;
                tracing::info!("Added packet with message {message:?} to send queue.");
            }
            Command::SendFile(path) => {
                let packet = Packet::read_file(&path).map_err(|source| ConsoleError::FileRead {
                    path: path.clone(),
                    source,
                })?;
                self.enqueue(&packet)?;
                tracing::info!(
                    "Added packet with file {:?} to send queue.",
                    path.display().to_string()
                );
            }
            Command::ShowStatus => {
                status::render(&self.ctx, out)?;
                tracing::debug!("Printed status.");
            }
            Command::ShowLog => {
                let contents =
                    std::fs::read_to_string(&self.log_path).map_err(|source| {
                        ConsoleError::LogRead {
                            path: self.log_path.clone(),
                            source,
                        }
                    })?;
                writeln!(out, "--BEGIN LOG--")?;
                writeln!(out, "{}", contents.trim())?;
                writeln!(out, "--END LOG--")?;
                tracing::debug!("Printed log.");
            }
            Command::Disconnect => return Ok(Flow::Disconnect),
        }
        Ok(Flow::Continue)
    }

    /// Queue a packet for the transmitter, refusing one no datagram can carry.
    fn enqueue(&self, packet: &Packet) -> Result<(), ConsoleError> {
        let raw = packet.to_json_string()?;
        wire::check_data_fits(&self.ctx.key(), self.ctx.name(), &raw)?;
        self.ctx.send_queue().push(raw);
        Ok(())
    }
}
