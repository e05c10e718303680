//! Rotating file sink
//!
//! Lines are formatted on the calling thread and handed to a background
//! writer thread over a channel, so `emit` never waits on disk. The writer
//! batches writes, flushing whenever the channel drains, and rotates the file
//! once it would grow past the configured size.

use super::{Sink, format_line};
use crate::core::types::{Metadata, Severity};
use anyhow::{Context, Result};
use chrono::Local;
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Rotate once the active file would exceed 25 MiB
pub const DEFAULT_MAX_BYTES: u64 = 25 * 1024 * 1024;
/// Keep this many rotated files besides the active one
pub const DEFAULT_MAX_FILES: usize = 5;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how a [`FileSink`] writes
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    pub path: PathBuf,
    pub max_bytes: u64,
    pub max_files: usize,
}

impl FileSinkConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileSinkConfig {
            path: path.as_ref().to_path_buf(),
            max_bytes: DEFAULT_MAX_BYTES,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }
}

/// Commands for the writer thread
#[derive(Debug)]
enum WriterCommand {
    /// Append one formatted line
    Line(String),
    /// Flush everything written so far and signal completion
    Flush(Sender<()>),
}

/// Appends formatted lines to a size-rotated file
pub struct FileSink {
    path: PathBuf,
    sender: Option<Sender<WriterCommand>>,
    writer: Option<JoinHandle<()>>,
}

impl FileSink {
    /// Open (or create) the log file and start the writer thread
    ///
    /// # Errors
    /// Returns an error if:
    /// - The directory containing the log file could not be created
    /// - The log file could not be opened for appending
    /// - The writer thread could not be spawned
    pub fn new(config: FileSinkConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent()
            && parent.to_string_lossy() != ""
            && !parent.exists()
        {
            fs::create_dir_all(parent).context("Failed to create log directory")?;
        }

        let writer = RollingWriter::open(&config).context("Failed to open log file")?;
        let (tx, rx) = unbounded::<WriterCommand>();

        let handle = thread::Builder::new()
            .name("logbind-file-writer".into())
            .spawn(move || writer_thread(writer, rx))
            .context("Failed to spawn log writer thread")?;

        Ok(FileSink {
            path: config.path,
            sender: Some(tx),
            writer: Some(handle),
        })
    }

    /// Open a sink with the default rotation limits
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(FileSinkConfig::new(path))
    }

    /// Path of the active log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn emit(&self, severity: Severity, message: &str, metadata: &Metadata) {
        let line = format_line(&Local::now(), severity, message, metadata);
        if let Some(sender) = &self.sender
            && let Err(e) = sender.send(WriterCommand::Line(line))
        {
            eprintln!("Failed to send log line: {e:?}");
        }
    }

    /// Block until the writer thread has flushed everything sent so far
    fn flush(&self) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("File sink is closed"))?;

        let (done_tx, done_rx) = bounded(1);
        sender
            .send(WriterCommand::Flush(done_tx))
            .context("Log writer thread has stopped")?;

        match done_rx.recv_timeout(FLUSH_TIMEOUT) {
            Ok(()) => Ok(()),
            Err(_) => Err(anyhow::anyhow!("Flush operation timed out")),
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Closing the channel makes the writer flush and exit
        drop(self.sender.take());
        if let Some(handle) = self.writer.take()
            && handle.join().is_err()
        {
            eprintln!("Warning: log writer thread panicked");
        }
    }
}

/// The writer thread's view of the log file
struct RollingWriter {
    path: PathBuf,
    max_bytes: u64,
    max_files: usize,
    file: BufWriter<File>,
    size: u64,
    // Set when the active path could not be reopened after a rotation
    detached: bool,
}

impl RollingWriter {
    fn open(config: &FileSinkConfig) -> io::Result<Self> {
        let file = open_append(&config.path)?;
        let size = file.metadata()?.len();
        Ok(RollingWriter {
            path: config.path.clone(),
            max_bytes: config.max_bytes,
            max_files: config.max_files,
            file: BufWriter::new(file),
            size,
            detached: false,
        })
    }

    /// Write one line, rotating first if it would overflow the active file
    ///
    /// A failed rotation is reported, but the line is still written.
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = line.len() as u64 + 1;
        let rotated = if self.detached {
            self.reopen()
        } else if self.size > 0 && self.size + len > self.max_bytes {
            self.rotate()
        } else {
            Ok(())
        };
        writeln!(self.file, "{line}")?;
        self.size += len;
        rotated
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    /// Shift `log.N-1 -> log.N .. log -> log.1` and start a fresh file
    ///
    /// The size count restarts even when shifting fails, so a broken rotation
    /// is retried only after another `max_bytes` have been written.
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let shifted = self.shift_files();
        self.size = 0;
        self.reopen()?;
        shifted
    }

    fn shift_files(&self) -> io::Result<()> {
        if self.max_files == 0 {
            return fs::remove_file(&self.path);
        }
        let oldest = numbered(&self.path, self.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for i in (1..self.max_files).rev() {
            let from = numbered(&self.path, i);
            if from.exists() {
                fs::rename(&from, numbered(&self.path, i + 1))?;
            }
        }
        fs::rename(&self.path, numbered(&self.path, 1))
    }

    /// Point the writer at the active path again
    ///
    /// On failure the old file stays in use and the next write retries.
    fn reopen(&mut self) -> io::Result<()> {
        match open_append(&self.path) {
            Ok(file) => {
                self.file = BufWriter::new(file);
                self.detached = false;
                Ok(())
            }
            Err(e) => {
                self.detached = true;
                Err(e)
            }
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// `app.log` -> `app.log.3`
fn numbered(path: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn writer_thread(mut writer: RollingWriter, rx: Receiver<WriterCommand>) {
    while let Ok(cmd) = rx.recv() {
        match cmd {
            WriterCommand::Line(line) => {
                if let Err(e) = writer.write_line(&line) {
                    eprintln!("Log writer error: {e:?}");
                }
                // Batch while more lines are queued
                if rx.is_empty()
                    && let Err(e) = writer.flush()
                {
                    eprintln!("Log flush error: {e:?}");
                }
            }
            WriterCommand::Flush(done) => {
                if let Err(e) = writer.flush() {
                    eprintln!("Log flush error: {e:?}");
                }
                let _ = done.send(());
            }
        }
    }

    // Channel closed - perform final flush before thread exits
    if let Err(e) = writer.flush() {
        eprintln!("Log final flush error: {e:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn meta() -> Metadata {
        Metadata {
            pid: 7,
            module_name: Some("disk".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_basic_file_logging() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("nested").join("app.log");

        let sink = FileSink::open(&log_path).unwrap();
        sink.emit(Severity::Debug, "first", &meta());
        sink.emit(Severity::Error, "second", &meta());
        sink.flush().unwrap();

        let contents = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("DEBUG 7:disk first"));
        assert!(lines[1].ends_with("ERROR 7:disk second"));
    }

    #[test]
    fn test_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("append.log");
        fs::write(&log_path, "earlier\n").unwrap();

        let sink = FileSink::open(&log_path).unwrap();
        sink.emit(Severity::Warn, "later", &meta());
        sink.flush().unwrap();

        let contents = fs::read_to_string(&log_path).unwrap();
        assert!(contents.starts_with("earlier\n"));
        assert!(contents.trim_end().ends_with("later"));
    }

    #[test]
    fn test_rotation_keeps_limited_files() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("rot.log");

        let config = FileSinkConfig::new(&log_path).max_bytes(100).max_files(2);
        let sink = FileSink::new(config).unwrap();
        for i in 0..20 {
            sink.emit(Severity::Debug, &format!("line number {i}"), &meta());
        }
        sink.flush().unwrap();

        assert!(log_path.exists());
        assert!(numbered(&log_path, 1).exists());
        assert!(numbered(&log_path, 2).exists());
        assert!(!numbered(&log_path, 3).exists());

        for path in [log_path.clone(), numbered(&log_path, 1)] {
            let size = fs::metadata(&path).unwrap().len();
            assert!(size <= 100, "{path:?} is {size} bytes");
        }

        // Newest line lives in the active file
        let active = fs::read_to_string(&log_path).unwrap();
        assert!(active.contains("line number 19"));
    }

    #[test]
    fn test_failed_rotation_keeps_writing() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("stuck.log");
        // A directory where the rotated file should go makes the shift fail
        fs::create_dir(numbered(&log_path, 1)).unwrap();

        let config = FileSinkConfig::new(&log_path).max_bytes(20).max_files(1);
        let mut writer = RollingWriter::open(&config).unwrap();
        writer.write_line("0123456789abcdef").unwrap();

        assert!(writer.write_line("second line").is_err());
        assert_eq!(writer.size, 12);
        assert!(!writer.detached);

        // Fits under the restarted count, so no rotation is attempted
        writer.write_line("x").unwrap();
        writer.flush().unwrap();

        let contents = fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents, "0123456789abcdef\nsecond line\nx\n");
        assert!(numbered(&log_path, 1).is_dir());
    }

    #[test]
    fn test_rotation_without_backups_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("single.log");

        let config = FileSinkConfig::new(&log_path).max_bytes(10).max_files(0);
        let mut writer = RollingWriter::open(&config).unwrap();
        writer.write_line("old line").unwrap();
        writer.write_line("new line").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "new line\n");
        assert!(!numbered(&log_path, 1).exists());
    }

    #[test]
    fn test_drop_flushes() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("drop.log");

        {
            let sink = FileSink::open(&log_path).unwrap();
            sink.emit(Severity::Warn, "bye", &meta());
        }

        let contents = fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("bye"));
    }

    #[test]
    fn test_numbered_path() {
        assert_eq!(
            numbered(Path::new("/tmp/app.log"), 3),
            PathBuf::from("/tmp/app.log.3")
        );
    }
}
