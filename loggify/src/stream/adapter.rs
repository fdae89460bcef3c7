use std::io;
use std::sync::Arc;

use log::Level;
use parking_lot::Mutex;

use crate::processing::line_buffer::LineBuffer;
use crate::storage::file_sink::LogSink;
use crate::traits::output_stream::OutputStream;

/// Redirects one stream direction into a `LogSink` at a fixed level.
///
/// Writes are reassembled into complete lines; each line becomes one
/// record with its newline stripped. The unterminated tail is held until a
/// later write completes it or `flush` forces it out. A line the sink
/// rejects stays queued and goes out ahead of newer lines on the next
/// write or flush. Writes can optionally
/// be mirrored to the original stream, which also answers `isatty` and
/// `fileno`.
///
/// One mutex covers mirroring, buffering and record emission, so lines
/// written from different threads stay whole.
pub struct StreamAdapter {
    original: Arc<dyn OutputStream>,
    sink: Arc<LogSink>,
    level: Level,
    mirror: bool,
    lines: Mutex<LineBuffer>,
}

impl StreamAdapter {
    pub fn new(original: Arc<dyn OutputStream>, sink: Arc<LogSink>, level: Level) -> Self {
        Self {
            original,
            sink,
            level,
            mirror: true,
            lines: Mutex::new(LineBuffer::new()),
        }
    }

    /// Set the mirroring used by `OutputStream::write_str` (default: on).
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Write `data`, echoing it verbatim to the original stream when `mirror` is set.
    pub fn write(&self, data: &str, mirror: bool) -> io::Result<()> {
        let mut lines = self.lines.lock();
        if mirror {
            self.original.write_str(data)?;
        }
        lines.push(data);
        self.emit_ready(&mut lines)
    }

    /// Log the unterminated tail without touching the original stream.
    pub fn drain_pending(&self) -> io::Result<()> {
        let mut lines = self.lines.lock();
        lines.finish_line();
        self.emit_ready(&mut lines)
    }

    fn emit_ready(&self, lines: &mut LineBuffer) -> io::Result<()> {
        while let Some(line) = lines.next_line() {
            if let Err(e) = self.sink.log(self.level, &line) {
                lines.requeue(line);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Text held since the last completed line.
    pub fn pending(&self) -> String {
        self.lines.lock().pending().to_string()
    }

    /// Records logged through this adapter, forced tails included.
    pub fn records(&self) -> u64 {
        self.lines.lock().completed()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn sink(&self) -> &Arc<LogSink> {
        &self.sink
    }

    pub fn original(&self) -> &Arc<dyn OutputStream> {
        &self.original
    }
}

impl OutputStream for StreamAdapter {
    fn write_str(&self, data: &str) -> io::Result<()> {
        self.write(data, self.mirror)
    }

    // Byte input is decoded and logged but never mirrored.
    fn write_bytes(&self, data: &[u8]) -> io::Result<()> {
        let text = std::str::from_utf8(data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.write(text, false)
    }

    fn flush(&self) -> io::Result<()> {
        let mut lines = self.lines.lock();
        self.original.flush()?;
        lines.finish_line();
        self.emit_ready(&mut lines)
    }

    fn isatty(&self) -> bool {
        self.original.isatty()
    }

    fn fileno(&self) -> io::Result<i32> {
        self.original.fileno()
    }
}

impl std::fmt::Debug for StreamAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamAdapter")
            .field("sink", &self.sink.name())
            .field("level", &self.level)
            .field("mirror", &self.mirror)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::format::LineFormat;
    use crate::test_support::MemoryStream;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::thread;

    struct Fixture {
        _dir: tempfile::TempDir,
        path: PathBuf,
        original: Arc<MemoryStream>,
        adapter: StreamAdapter,
    }

    fn fixture_with(original: MemoryStream) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.log");
        let format = LineFormat::parse("{levelname}:{message}", "%H").unwrap();
        let sink = Arc::new(LogSink::open("STDOUT", Level::Info, &path, format).unwrap());
        let original = Arc::new(original);
        let adapter = StreamAdapter::new(original.clone(), sink, Level::Info);
        Fixture {
            _dir: dir,
            path,
            original,
            adapter,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MemoryStream::new())
    }

    fn logged(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|l| l.strip_prefix("INFO:").unwrap_or(l).to_string())
            .collect()
    }

    #[test]
    fn partial_writes_become_whole_records() {
        let fx = fixture();
        for chunk in ["ab", "c\nde", "f\n"] {
            fx.adapter.write_str(chunk).unwrap();
        }

        assert_eq!(logged(&fx.path), vec!["abc", "def"]);
        assert_eq!(fx.adapter.pending(), "");
        assert_eq!(fx.original.contents(), "abc\ndef\n");
    }

    #[test]
    fn flush_forces_out_partial_line() {
        let fx = fixture();
        fx.adapter.write_str("partial").unwrap();
        assert!(logged(&fx.path).is_empty());

        fx.adapter.flush().unwrap();
        assert_eq!(logged(&fx.path), vec!["partial"]);
        assert_eq!(fx.adapter.pending(), "");
        assert_eq!(fx.original.flushes(), 1);

        // nothing pending: flush delegates but logs nothing
        fx.adapter.flush().unwrap();
        assert_eq!(logged(&fx.path).len(), 1);
        assert_eq!(fx.original.flushes(), 2);
    }

    #[test]
    fn mirroring_off_logs_the_same_records() {
        let mirrored = fixture();
        let silent = fixture();
        for chunk in ["x\ny", "z\n", "tail"] {
            mirrored.adapter.write(chunk, true).unwrap();
            silent.adapter.write(chunk, false).unwrap();
        }
        mirrored.adapter.flush().unwrap();
        silent.adapter.flush().unwrap();

        assert_eq!(silent.original.contents(), "");
        assert_eq!(mirrored.original.contents(), "x\nyz\ntail");
        assert_eq!(logged(&silent.path), logged(&mirrored.path));
        assert_eq!(logged(&silent.path), vec!["x", "yz", "tail"]);
    }

    #[test]
    fn adapter_level_mirror_setting_applies_to_write_str() {
        let mut fx = fixture();
        fx.adapter = StreamAdapter::new(fx.original.clone(), fx.adapter.sink().clone(), Level::Info).with_mirror(false);
        fx.adapter.write_str("quiet\n").unwrap();

        assert_eq!(fx.original.contents(), "");
        assert_eq!(logged(&fx.path), vec!["quiet"]);
    }

    #[test]
    fn byte_writes_are_logged_without_mirroring() {
        let fx = fixture();
        fx.adapter.write_bytes("bytes ok\n".as_bytes()).unwrap();

        assert_eq!(fx.original.contents(), "");
        assert_eq!(logged(&fx.path), vec!["bytes ok"]);

        let err = fx.adapter.write_bytes(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn capability_probes_delegate_to_original() {
        let fx = fixture_with(MemoryStream::terminal(7));
        for _ in 0..3 {
            assert!(fx.adapter.isatty());
            assert_eq!(fx.adapter.fileno().unwrap(), 7);
            fx.adapter.write_str("noise\npart").unwrap();
            fx.adapter.flush().unwrap();
        }

        let plain = fixture();
        assert!(!plain.adapter.isatty());
        assert_eq!(plain.adapter.fileno().unwrap_err().kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn original_stream_failures_propagate() {
        let fx = fixture_with(MemoryStream::broken());

        assert_eq!(fx.adapter.write_str("lost\n").unwrap_err().kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(fx.adapter.flush().unwrap_err().kind(), io::ErrorKind::BrokenPipe);
        assert!(fx.adapter.fileno().is_err());

        // without mirroring the original is never touched on write
        fx.adapter.write("kept\n", false).unwrap();
        assert_eq!(logged(&fx.path), vec!["kept"]);
    }

    #[test]
    fn drain_pending_logs_tail_when_original_flush_fails() {
        let fx = fixture_with(MemoryStream::broken());
        fx.adapter.write("tail", false).unwrap();

        assert_eq!(fx.adapter.flush().unwrap_err().kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(fx.adapter.pending(), "tail");

        fx.adapter.drain_pending().unwrap();
        assert_eq!(fx.adapter.pending(), "");
        assert_eq!(logged(&fx.path), vec!["tail"]);
        assert_eq!(fx.adapter.records(), 1);

        // nothing left: a second drain logs nothing
        fx.adapter.drain_pending().unwrap();
        assert_eq!(logged(&fx.path).len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn rejected_lines_stay_queued() {
        let format = LineFormat::parse("{message}", "%H").unwrap();
        let sink = Arc::new(LogSink::open("STDOUT", Level::Info, "/dev/full", format).unwrap());
        let adapter = StreamAdapter::new(Arc::new(MemoryStream::new()), sink, Level::Info);

        let err = adapter.write("one\ntwo\nthree\n", false).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(28)); // ENOSPC
        assert_eq!(adapter.records(), 0);
        assert_eq!(adapter.lines.lock().ready(), 3);

        // a later write retries the backlog first and keeps it intact
        assert!(adapter.write("four\n", false).is_err());
        let mut lines = adapter.lines.lock();
        assert_eq!(lines.ready(), 4);
        assert_eq!(lines.next_line().as_deref(), Some("one"));
    }

    #[test]
    fn concurrent_writers_keep_lines_whole() {
        let fx = fixture();
        let adapter = Arc::new(fx.adapter);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let adapter = Arc::clone(&adapter);
                thread::spawn(move || {
                    for i in 0..50 {
                        adapter.write(&format!("thread {} line {}\n", t, i), false).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = logged(&fx.path);
        assert_eq!(lines.len(), 200);
        assert!(lines.iter().all(|l| l.starts_with("thread ") && l.contains(" line ")));
        assert_eq!(adapter.records(), 200);
    }
}
