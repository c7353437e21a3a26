//! Application packets carried through the send queue and `data` frames.
//!
//! Two kinds: MSG (inline text) and FILE (filename plus content). Queues only
//! ever hold the serialized JSON string; the workers decode at the edges.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Message,
    File,
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketKind::Message => f.write_str("MSG"),
            PacketKind::File => f.write_str("FILE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Packet {
    #[serde(rename = "MSG")]
    Message { message: String },

    #[serde(rename = "FILE")]
    File {
        filename: String,
        /// Hex-encoded file content.
        content: String,
        /// BLAKE3 of the raw content, hex.
        checksum: String,
    },
}

impl Packet {
    pub fn message(text: impl Into<String>) -> Self {
        Packet::Message {
            message: text.into(),
        }
    }

    pub fn file(filename: impl Into<String>, bytes: &[u8]) -> Self {
        Packet::File {
            filename: filename.into(),
            content: hex::encode(bytes),
            checksum: blake3::hash(bytes).to_hex().to_string(),
        }
    }

    /// Build a FILE packet from a file on disk. The packet keeps only the
    /// final path component as its filename.
    pub fn read_file(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::file(filename, &bytes))
    }

    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Message { .. } => PacketKind::Message,
            Packet::File { .. } => PacketKind::File,
        }
    }

    /// Decode and verify FILE content.
    pub fn file_bytes(&self) -> Result<Vec<u8>, PacketError> {
        match self {
            Packet::File {
                content, checksum, ..
            } => {
                let bytes = hex::decode(content)?;
                let actual = blake3::hash(&bytes).to_hex().to_string();
                if &actual != checksum {
                    return Err(PacketError::ChecksumMismatch {
                        expected: checksum.clone(),
                        actual,
                    });
                }
                Ok(bytes)
            }
            Packet::Message { .. } => Err(PacketError::NotAFile),
        }
    }

    pub fn to_json_string(&self) -> Result<String, PacketError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, PacketError> {
        Ok(serde_json::from_str(s)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("malformed packet: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file content is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("file checksum mismatch (expected {expected}, got {actual})")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("packet carries no file")]
    NotAFile,
}
