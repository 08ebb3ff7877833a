//! Directive files: an append-only record of compiled specializations.
//!
//! One directive per line:
//!
//! ```text
//! # warmed at load time
//! specialize Main::Showcase::g(Int)
//! specialize Main::Showcase::h(String)
//! ```
//!
//! Blank lines and `#` comments are ignored. A file can be replayed to
//! re-trigger every recorded compilation.
//!
//! ## Concurrency
//!
//! Every [`DirectiveStore`] for the same path shares one process-wide lock.
//! Under that lock a writer also takes an exclusive advisory lock on the file
//! itself, reads whatever was appended since it last looked, re-checks for the
//! record, and then appends the full line with a single `write_all` on a file
//! opened with `O_APPEND`. The file lock keeps writers in other processes
//! from recording the same specialization twice.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use lazy_static::lazy_static;
use rustc_hash::{FxHashMap, FxHashSet};
use speculator_core::{
    Compilation, Compiler, ConfigurationError, DirectiveError, Specialization, TypeHash,
};
use tracing::{debug, trace, warn};

/// Keyword starting every directive line.
pub const DIRECTIVE_KEYWORD: &str = "specialize";

lazy_static! {
    static ref PATH_LOCKS: Mutex<FxHashMap<PathBuf, Arc<Mutex<()>>>> =
        Mutex::new(FxHashMap::default());
}

fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let mut locks = PATH_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks.entry(key).or_default().clone()
}

/// Render `specialization` as a directive line, without the newline.
pub fn format_directive(specialization: &Specialization) -> String {
    format!("{DIRECTIVE_KEYWORD} {specialization}")
}

/// Parse one line. `Ok(None)` for blank lines and comments.
pub fn parse_directive(line_number: usize, line: &str) -> Result<Option<Specialization>, DirectiveError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    line.strip_prefix(DIRECTIVE_KEYWORD)
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .and_then(Specialization::parse)
        .map(Some)
        .ok_or_else(|| DirectiveError::Malformed {
            line: line_number,
            text: line.to_string(),
        })
}

/// Read every directive in `path`, in file order.
///
/// Lines that do not parse, such as a fragment left by an interrupted
/// writer, are skipped with a warning. Use [`parse_directive`] to reject
/// them instead.
pub fn read(path: impl AsRef<Path>) -> Result<Vec<Specialization>, DirectiveError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let mut directives = Vec::new();
    for (index, line) in text.lines().enumerate() {
        match parse_directive(index + 1, line) {
            Ok(Some(specialization)) => directives.push(specialization),
            Ok(None) => {}
            Err(err) => warn!(path = %path.display(), error = %err, "skipping directive"),
        }
    }
    Ok(directives)
}

/// Counts from [`replay`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub compiled: usize,
    pub specialized: usize,
    pub warned: usize,
    /// Lines that were not directives, e.g. a line torn by a crashed writer.
    pub malformed: usize,
}

/// Compile every directive in `path` that is not already specialized.
///
/// Replaying the same file twice compiles nothing the second time.
pub fn replay<C>(path: impl AsRef<Path>, compiler: &C) -> Result<ReplaySummary, DirectiveError>
where
    C: Compiler + ?Sized,
{
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let mut summary = ReplaySummary::default();
    let mut seen = FxHashSet::default();

    for (index, line) in text.lines().enumerate() {
        let specialization = match parse_directive(index + 1, line) {
            Ok(Some(specialization)) => specialization,
            Ok(None) => continue,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping directive");
                summary.malformed += 1;
                continue;
            }
        };
        if !seen.insert(specialization.type_hash()) || compiler.is_specialized(&specialization) {
            summary.specialized += 1;
            continue;
        }
        match compiler.compile(&specialization) {
            Ok(Compilation::Clean) => summary.compiled += 1,
            Ok(Compilation::Diagnostic(message)) => {
                warn!(directive = %specialization, diagnostic = %message, "replay warned");
                summary.warned += 1;
            }
            Err(err) => {
                warn!(directive = %specialization, error = %err, "replay failed");
                summary.warned += 1;
            }
        }
    }

    debug!(path = %path.display(), ?summary, "replayed directives");
    Ok(summary)
}

/// Exclusive advisory lock on a directive file, released on drop.
struct FileLock(File);

impl FileLock {
    fn acquire(file: &File) -> io::Result<Self> {
        let handle = file.try_clone()?;
        handle.lock()?;
        Ok(Self(handle))
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = self.0.unlock() {
            debug!(error = %err, "failed to unlock directive file");
        }
    }
}

struct StoreState {
    file: File,
    /// Bytes of the file already parsed. Always at a line boundary.
    offset: u64,
    known: FxHashSet<TypeHash>,
}

impl StoreState {
    /// Parse complete lines appended since the last look.
    ///
    /// Returns true if the file ends in an unterminated line.
    fn refresh(&mut self, path: &Path) -> io::Result<bool> {
        self.file.seek(SeekFrom::Start(self.offset))?;
        let mut tail = Vec::new();
        self.file.read_to_end(&mut tail)?;

        let complete = tail.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        for line in String::from_utf8_lossy(&tail[..complete]).lines() {
            match parse_directive(0, line) {
                Ok(Some(specialization)) => {
                    self.known.insert(specialization.type_hash());
                }
                Ok(None) => {}
                Err(_) => trace!(path = %path.display(), line, "ignoring malformed directive"),
            }
        }
        self.offset += complete as u64;
        Ok(complete < tail.len())
    }
}

/// Append-only directive file shared between runs and threads.
pub struct DirectiveStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    state: Mutex<StoreState>,
}

impl DirectiveStore {
    /// Open `path`, creating it if missing, and load its records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref().to_path_buf();
        let unwritable = |source| ConfigurationError::UnwritablePath {
            path: path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)
            .map_err(unwritable)?;

        let mut state = StoreState {
            file,
            offset: 0,
            known: FxHashSet::default(),
        };
        state.refresh(&path).map_err(unwritable)?;
        debug!(path = %path.display(), records = state.known.len(), "opened directive store");

        Ok(Self {
            lock: path_lock(&path),
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `specialization` has been recorded, by this or any other writer.
    pub fn contains(&self, specialization: &Specialization) -> Result<bool, DirectiveError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.refresh(&self.path)?;
        Ok(state.known.contains(&specialization.type_hash()))
    }

    /// Number of distinct records seen so far.
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `specialization` unless it is already recorded.
    ///
    /// Returns whether a line was written.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn record(&self, specialization: &Specialization) -> Result<bool, DirectiveError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let _exclusive = FileLock::acquire(&state.file)?;

        let torn = state.refresh(&self.path)?;
        let hash = specialization.type_hash();
        if state.known.contains(&hash) {
            return Ok(false);
        }

        let mut line = String::new();
        if torn {
            line.push('\n');
        }
        line.push_str(&format_directive(specialization));
        line.push('\n');
        state.file.write_all(line.as_bytes())?;
        state.file.flush()?;
        state.known.insert(hash);

        trace!(path = %self.path.display(), directive = %specialization, "recorded directive");
        Ok(true)
    }
}

impl std::fmt::Debug for DirectiveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
