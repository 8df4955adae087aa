//! Incremental reader for the daemon's current-session log.
//!
//! The daemon writes free text. Lines are classified by literal substring
//! markers rather than parsed, so new daemon versions that reword
//! unrelated output keep working.
//!
//! Reads never wait for more data: a drain returns what is in the file now
//! and the caller decides when to poll again.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

/// Severity column the daemon prints on error lines.
pub const ERROR_SEVERITY_MARKER: &str = " ERROR  ";

/// Prefix of errors reported while generating or importing a wallet.
pub const ERROR_PREFIX_MARKER: &str = "error: ";

/// Printed once a new wallet has been generated.
pub const WALLET_GENERATED_MARKER: &str = "New wallet is generated. Address:";

/// Printed once a wallet has been imported from keys.
pub const WALLET_IMPORTED_MARKER: &str = "New wallet added";

// ============================================================================
// Classification
// ============================================================================

/// What a log line means to the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Normal,
    /// The daemon's error text, marker stripped
    Error(String),
    Success,
}

/// A line read from the log with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine {
    pub text: String,
    pub class: LineClass,
}

/// Patterns that mark error and success lines.
///
/// Error patterns are tried in order and the first match wins. Error
/// classification takes precedence over success on the same line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerSet {
    errors: &'static [&'static str],
    successes: &'static [&'static str],
}

impl MarkerSet {
    /// Markers checked while a wallet is being opened.
    pub const fn startup() -> Self {
        Self {
            errors: &[ERROR_SEVERITY_MARKER],
            successes: &[],
        }
    }

    /// Markers checked while a wallet is being generated or imported.
    pub const fn creation() -> Self {
        Self {
            errors: &[ERROR_SEVERITY_MARKER, ERROR_PREFIX_MARKER],
            successes: &[WALLET_GENERATED_MARKER, WALLET_IMPORTED_MARKER],
        }
    }

    /// Classifies a single line (without its newline).
    pub fn classify(&self, line: &str) -> LineClass {
        for pattern in self.errors {
            if line.contains(pattern) {
                // Message is whatever follows the last occurrence
                let message = line.rsplit(pattern).next().unwrap_or(line);
                return LineClass::Error(message.trim_end().to_string());
            }
        }

        if self.successes.iter().any(|pattern| line.contains(pattern)) {
            return LineClass::Success;
        }

        LineClass::Normal
    }
}

// ============================================================================
// Log Tail
// ============================================================================

/// Reader that remembers how far into the log it has consumed.
pub struct LogTail {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    /// Byte offset just past the last complete line returned
    offset: u64,
}

impl LogTail {
    /// Creates a tail positioned at the start of `path`.
    ///
    /// The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: None,
            offset: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every complete line from the current position to end of file.
    ///
    /// A trailing line without its newline is left for the next drain.
    /// A log file that does not exist yet drains as empty.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than the file being absent.
    pub fn drain(&mut self, markers: &MarkerSet) -> io::Result<Vec<ScannedLine>> {
        if self.reader.is_none() {
            match File::open(&self.path) {
                Ok(file) => self.reader = Some(BufReader::new(file)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    trace!(path = %self.path.display(), "Log file not created yet");
                    return Ok(Vec::new());
                }
                Err(e) => return Err(e),
            }
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(Vec::new());
        };

        let mut lines = Vec::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }

            if buf.last() != Some(&b'\n') {
                // Partial line: rewind so the next drain sees it whole
                reader.seek(SeekFrom::Start(self.offset))?;
                break;
            }

            self.offset += read as u64;

            let text = String::from_utf8_lossy(&buf)
                .trim_end_matches(&['\n', '\r'][..])
                .to_string();
            let class = markers.classify(&text);
            lines.push(ScannedLine { text, class });
        }

        if !lines.is_empty() {
            debug!(
                path = %self.path.display(),
                lines = lines.len(),
                offset = self.offset,
                "Drained daemon log"
            );
        }

        Ok(lines)
    }
}

// ============================================================================
// Tests
// ============================================================================
