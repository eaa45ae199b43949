//! Immediate-append NDJSON sink.
//!
//! Every `append` synchronously serializes one `{timestamp, type, data}`
//! record, writes it with a trailing newline and flushes before returning.
//! The durability window is a single event.

use super::{EventSink, SinkError};
use crate::event::Event;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct NdjsonSink {
    path: PathBuf,
    file: File,
}

impl NdjsonSink {
    /// Open (or create) the append target.
    pub fn create(path: PathBuf) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }
}

impl EventSink for NdjsonSink {
    fn append(&mut self, event: &Event) -> Result<(), SinkError> {
        let line = event.to_json_line()?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.file.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.file.flush()?;
        Ok(())
    }

    fn target_path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn event(raw_type: &str, fields: serde_json::Value) -> Event {
        Event::from_parts(
            "2024-05-01T20:00:00.000000+08:00".to_string(),
            raw_type,
            fields,
        )
    }

    #[test]
    fn test_append_writes_one_record_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live_messages_test.json");
        let mut sink = NdjsonSink::create(path.clone()).unwrap();

        sink.append(&event("message", json!({"user_id": "u1", "content": "你好"})))
            .unwrap();
        sink.append(&event("gift", json!({"giver_id": "g1", "combo_count": 2})))
            .unwrap();
        sink.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first = Event::from_json_line(lines[0]).unwrap();
        assert_eq!(first.kind().as_str(), "message");
        let second = Event::from_json_line(lines[1]).unwrap();
        assert_eq!(second.kind().as_str(), "gift");
    }

    #[test]
    fn test_append_survives_reopening() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live_messages_test.json");

        {
            let mut sink = NdjsonSink::create(path.clone()).unwrap();
            sink.append(&event("enter", json!({"user_id": "u1"}))).unwrap();
        }
        {
            let mut sink = NdjsonSink::create(path.clone()).unwrap();
            sink.append(&event("follow", json!({"user_id": "u1"}))).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
