//! Size-capped appending file writer.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use crate::logger::config::FileConfig;

/// File writer that rolls `app.log` over to `app.log.1 .. app.log.N` once
/// it reaches `max_size` bytes. Falls back to stderr if the file becomes
/// unwritable.
#[derive(Clone)]
pub struct SizeCappedFileWriter {
    state: Arc<Mutex<WriterState>>,
    path: PathBuf,
    max_size: u64,
    max_files: usize,
}

struct WriterState {
    file: BufWriter<File>,
    current_size: u64,
    fallback_mode: bool,
}

impl SizeCappedFileWriter {
    pub fn new(config: &FileConfig) -> anyhow::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_log_file(&config.path, config.append)?;
        let current_size = if config.append {
            fs::metadata(&config.path).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            state: Arc::new(Mutex::new(WriterState {
                file,
                current_size,
                fallback_mode: false,
            })),
            path: config.path.clone(),
            max_size: config.max_size,
            max_files: config.max_files,
        })
    }

    fn rolled_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    /// Shift `path.N-1 -> path.N`, ..., `path -> path.1`, dropping the oldest.
    fn roll_over(&self) -> io::Result<()> {
        let oldest = self.rolled_path(self.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.max_files).rev() {
            let from = self.rolled_path(index);
            if from.exists() {
                fs::rename(&from, self.rolled_path(index + 1))?;
            }
        }
        if self.path.exists() {
            fs::rename(&self.path, self.rolled_path(1))?;
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SizeCappedFileWriter {
    type Writer = SizeCappedWriterGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SizeCappedWriterGuard { writer: self }
    }
}

/// Per-event handle returned by `make_writer`.
pub struct SizeCappedWriterGuard<'a> {
    writer: &'a SizeCappedFileWriter,
}

impl Write for SizeCappedWriterGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .writer
            .state
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire writer lock"))?;

        if state.fallback_mode {
            return io::stderr().write(buf);
        }

        if state.current_size > 0 && state.current_size + buf.len() as u64 > self.writer.max_size {
            let rolled = state
                .file
                .flush()
                .and_then(|_| self.writer.roll_over())
                .and_then(|_| open_log_file(&self.writer.path, false));
            match rolled {
                Ok(file) => {
                    state.file = file;
                    state.current_size = 0;
                }
                Err(e) => return fall_back(&mut state, buf, e),
            }
        }

        match state.file.write(buf) {
            Ok(written) => {
                state.current_size += written as u64;
                Ok(written)
            }
            Err(e) => fall_back(&mut state, buf, e),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .writer
            .state
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire writer lock"))?;

        if state.fallback_mode {
            return io::stderr().flush();
        }
        state.file.flush()
    }
}

impl Drop for SizeCappedWriterGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.writer.state.lock() {
            let _ = state.file.flush();
        }
    }
}

fn fall_back(state: &mut WriterState, buf: &[u8], error: io::Error) -> io::Result<usize> {
    state.fallback_mode = true;
    eprintln!("[Logger] File write failed, falling back to stderr: {}", error);
    io::stderr().write(buf)
}

fn open_log_file(path: &Path, append: bool) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;

    Ok(BufWriter::new(file))
}
