//! Transcript artifacts written for an external consumer.
//!
//! Product output, unaffected by `RUST_LOG`: `transcript.jsonl` grows one
//! line per message as the session runs, and `meta.json` is written once at
//! termination.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::state::Message;

/// Summary written next to the transcript at session end.
#[derive(Debug, Clone, Serialize)]
pub struct SessionMeta {
    /// Completed passes.
    pub iterations: u32,
    /// Total messages in the transcript, controller notices included.
    pub message_count: usize,
    /// "complete", "cancelled", or the terminal error kind.
    pub result: String,
    pub duration_ms: u64,
}

/// Artifact paths for one session directory.
#[derive(Debug, Clone)]
pub struct SessionLog {
    dir: PathBuf,
    transcript_path: PathBuf,
    meta_path: PathBuf,
}

impl SessionLog {
    /// Create the artifact directory (and parents) if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create session dir {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            transcript_path: dir.join("transcript.jsonl"),
            meta_path: dir.join("meta.json"),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one message as a JSONL line.
    pub fn append(&self, message: &Message) -> Result<()> {
        let mut line = serde_json::to_string(message).context("serialize message")?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.transcript_path)
            .with_context(|| format!("open {}", self.transcript_path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append {}", self.transcript_path.display()))?;
        Ok(())
    }

    /// Write the final session summary.
    pub fn write_meta(&self, meta: &SessionMeta) -> Result<()> {
        let mut buf = serde_json::to_string_pretty(meta).context("serialize meta")?;
        buf.push('\n');
        fs::write(&self.meta_path, buf)
            .with_context(|| format!("write {}", self.meta_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Role;

    #[test]
    fn appends_messages_as_jsonl_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = SessionLog::create(&temp.path().join("session")).expect("create");

        log.append(&Message::new(Role::Parser, "first")).expect("append");
        log.append(&Message::new(Role::Detector, "second")).expect("append");

        let contents =
            fs::read_to_string(temp.path().join("session/transcript.jsonl")).expect("read");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"parser\""));
        assert!(lines[1].contains("\"second\""));
    }

    #[test]
    fn writes_meta_summary() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = SessionLog::create(temp.path()).expect("create");

        log.write_meta(&SessionMeta {
            iterations: 2,
            message_count: 12,
            result: "complete".to_string(),
            duration_ms: 1234,
        })
        .expect("meta");

        let contents = fs::read_to_string(temp.path().join("meta.json")).expect("read");
        assert!(contents.contains("\"iterations\": 2"));
        assert!(contents.contains("\"result\": \"complete\""));
    }
}
