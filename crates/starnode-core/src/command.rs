//! Console command grammar.
//!
//! Commands are case-sensitive, one per line:
//!
//! ```text
//! send "<message>"
//! send <filename>.<ext>
//! show-status
//! show-log
//! disconnect
//! ```

use std::path::PathBuf;

/// Shown to the user whenever a line does not parse.
pub const USAGE: &str =
    "send \"<message>\", send <filename>, show-status, disconnect, or show-log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SendMessage(String),
    SendFile(PathBuf),
    ShowStatus,
    ShowLog,
    Disconnect,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim_end_matches(['\r', '\n']);
        match line {
            "show-status" => return Ok(Command::ShowStatus),
            "show-log" => return Ok(Command::ShowLog),
            "disconnect" => return Ok(Command::Disconnect),
            _ => {}
        }

        let unrecognized = || CommandError::Unrecognized {
            input: line.to_string(),
        };

        let arg = line.strip_prefix("send ").ok_or_else(unrecognized)?;

        if arg.starts_with('"') {
            // Text between the first quote and the next one; the line must
            // also end on a quote.
            let body = &arg[1..];
            if !arg.ends_with('"') || arg.len() < 3 {
                return Err(unrecognized());
            }
            let end = body.find('"').ok_or_else(unrecognized)?;
            return Ok(Command::SendMessage(body[..end].to_string()));
        }

        if !is_file_name(arg) {
            return Err(unrecognized());
        }
        Ok(Command::SendFile(PathBuf::from(arg)))
    }
}

/// A filename needs a non-empty stem and a lowercase alphabetic extension.
fn is_file_name(arg: &str) -> bool {
    match arg.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty() && !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_lowercase())
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command {input:?}. Please use one of the following commands: {}", USAGE)]
    Unrecognized { input: String },
}
