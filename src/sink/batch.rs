//! バッファ付きバッチシンク（CSV / XLSX）
//!
//! `append` はバッファに積むだけで、しきい値（既定10件）到達か `close`
//! でフラッシュする。フラッシュは差分ではなく蓄積バッファ全体を
//! 一時ファイルへ書き出してリネームするため、ターゲットは常に
//! その時点までの全イベントを含む自己完結なスナップショットになる。
//! クラッシュ時は未フラッシュ分（最大 しきい値-1 件）だけが失われる。

use super::{escape_csv_field, EventSink, SinkError};
use crate::event::Event;
use crate::sink::row::{EventRow, COLUMNS};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::debug;

/// フラッシュしきい値の既定値（未フラッシュ件数）
pub const DEFAULT_FLUSH_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchFormat {
    Csv,
    Xlsx,
}

#[derive(Debug)]
pub struct BatchSink {
    path: PathBuf,
    format: BatchFormat,
    buffer: Vec<EventRow>,
    pending: usize,
    threshold: usize,
}

impl BatchSink {
    pub fn csv(path: PathBuf) -> Self {
        Self::new(path, BatchFormat::Csv)
    }

    pub fn xlsx(path: PathBuf) -> Self {
        Self::new(path, BatchFormat::Xlsx)
    }

    fn new(path: PathBuf, format: BatchFormat) -> Self {
        Self {
            path,
            format,
            buffer: Vec::new(),
            pending: 0,
            threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }

    /// フラッシュしきい値を変更する
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn write_all(&self) -> Result<(), SinkError> {
        // 書き込み途中のファイルを読まれないよう、一時ファイル経由で置き換える
        let tmp = self.path.with_file_name(format!(
            "{}.tmp",
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "live_messages".to_string())
        ));

        match self.format {
            BatchFormat::Csv => std::fs::write(&tmp, self.render_csv())?,
            BatchFormat::Xlsx => std::fs::write(&tmp, self.render_xlsx()?)?,
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn render_csv(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(COLUMNS.join(",").as_bytes());
        out.push(b'\n');
        for row in &self.buffer {
            let line: Vec<String> = row
                .values()
                .iter()
                .map(|cell| escape_csv_field(cell))
                .collect();
            out.extend_from_slice(line.join(",").as_bytes());
            out.push(b'\n');
        }
        out
    }

    fn render_xlsx(&self) -> Result<Vec<u8>, SinkError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet().set_name("Events")?;

        let header_format = Format::new().set_bold();
        for (col, header) in COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (row_idx, row) in self.buffer.iter().enumerate() {
            for (col, cell) in row.values().iter().enumerate() {
                worksheet.write_string((row_idx + 1) as u32, col as u16, *cell)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

impl EventSink for BatchSink {
    fn append(&mut self, event: &Event) -> Result<(), SinkError> {
        self.buffer.push(EventRow::from_event(event));
        self.pending += 1;
        if self.pending >= self.threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// 蓄積バッファ全体を書き出す。新規イベントがなければ内容は前回と
    /// バイト単位で一致する（冪等）。
    fn flush(&mut self) -> Result<(), SinkError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.write_all()?;
        debug!(
            "flushed {} buffered events to {}",
            self.buffer.len(),
            self.path.display()
        );
        self.pending = 0;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.flush()
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

    fn event(n: u64) -> Event {
        Event::from_parts(
            "2024-05-01T20:00:00.000000+08:00".to_string(),
            "message",
            json!({"user_id": format!("u{n}"), "content": format!("msg {n}")}),
        )
    }

    #[test]
    fn test_no_file_before_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live_messages_test.csv");
        let mut sink = BatchSink::csv(path.clone());

        for n in 0..9 {
            sink.append(&event(n)).unwrap();
        }
        assert!(!path.exists());
        assert_eq!(sink.buffered_len(), 9);
    }

    #[test]
    fn test_threshold_triggers_full_rewrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live_messages_test.csv");
        let mut sink = BatchSink::csv(path.clone());

        for n in 0..10 {
            sink.append(&event(n)).unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        // header + 10 rows, complete snapshot
        assert_eq!(content.lines().count(), 11);
        assert!(content.starts_with("timestamp,message_type,"));

        // the next flush cycle rewrites the whole accumulated buffer
        for n in 10..20 {
            sink.append(&event(n)).unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 21);
    }

    #[test]
    fn test_close_flushes_partial_buffer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live_messages_test.csv");
        let mut sink = BatchSink::csv(path.clone());

        for n in 0..3 {
            sink.append(&event(n)).unwrap();
        }
        sink.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_flush_is_idempotent_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live_messages_test.csv");
        let mut sink = BatchSink::csv(path.clone());

        for n in 0..5 {
            sink.append(&event(n)).unwrap();
        }
        sink.flush().unwrap();
        let first = std::fs::read(&path).unwrap();
        sink.flush().unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flush_with_empty_buffer_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live_messages_test.csv");
        let mut sink = BatchSink::csv(path.clone());
        sink.flush().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_csv_cells_are_escaped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live_messages_test.csv");
        let mut sink = BatchSink::csv(path.clone()).with_threshold(1);

        sink.append(&Event::from_parts(
            "2024-05-01T20:00:00.000000+08:00".to_string(),
            "message",
            json!({"user_id": "u1", "content": "hello, \"world\""}),
        ))
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"hello, \"\"world\"\"\""));
    }

    #[test]
    fn test_xlsx_target_is_written_on_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live_messages_test.xlsx");
        let mut sink = BatchSink::xlsx(path.clone());

        sink.append(&event(1)).unwrap();
        sink.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[0..2], b"PK");
    }
}
