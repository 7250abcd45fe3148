//! NDJSON sink for outbound notices produced during replay.
//!
//! Each row is serialized straight into the buffered writer, no intermediate
//! `String`.

use serde::Serialize;
use std::io::{self, BufWriter, Write};
use warden_gate::{Notice, NoticeStyle};

/// One outbound notice, tagged with the input line that caused it.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyRow<'a> {
    pub line: usize,
    pub chat_id: Option<i64>,
    pub actor: Option<i64>,
    pub style: NoticeStyle,
    pub text: &'a str,
}

pub struct JsonStreamSink<W: Write> {
    writer: BufWriter<W>,
    rows_written: usize,
}

impl JsonStreamSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonStreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(64 * 1024, writer),
            rows_written: 0,
        }
    }

    pub fn write_row(&mut self, row: &ReplyRow<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, row).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Writes every notice sent in response to input `line`.
    pub fn write_notices(
        &mut self,
        line: usize,
        chat_id: Option<i64>,
        actor: Option<i64>,
        notices: &[Notice],
    ) -> io::Result<()> {
        for notice in notices {
            self.write_row(&ReplyRow {
                line,
                chat_id,
                actor,
                style: notice.style,
                text: &notice.text,
            })?;
        }
        Ok(())
    }

    /// Flush and return how many rows were written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}
