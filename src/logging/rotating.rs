use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing_subscriber::fmt::MakeWriter;

pub const DEFAULT_MAX_BYTES: u64 = 1_000_000;

pub const DEFAULT_BACKUP_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size a file may reach before it is rotated. `0` disables rotation.
    pub max_bytes: u64,

    /// Number of rotated files kept next to the live one.
    pub backup_count: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
        }
    }
}

/// Append-only log file bounded by a [`RotationPolicy`].
///
/// Backups are named by suffixing the path with `.1`, `.2`, ..., `.1` being
/// the most recent one. A write that would push the live file past
/// `max_bytes` first shifts every backup up by one, discarding the oldest,
/// and starts a fresh file. A single record larger than `max_bytes` is still
/// written whole, into an empty file.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,

    policy: RotationPolicy,

    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    file: File,

    len: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path,
            policy,
            state: Mutex::new(State { file, len }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;

        let len = record.len() as u64;
        if self.policy.max_bytes > 0 && state.len > 0 && state.len + len > self.policy.max_bytes {
            state.file.flush()?;
            self.shift_backups()?;
            state.file = File::create(&self.path)?;
            state.len = 0;
        }

        state.file.write_all(record)?;
        state.len += len;

        Ok(())
    }

    fn shift_backups(&self) -> io::Result<()> {
        if self.policy.backup_count == 0 {
            return Ok(());
        }

        for index in (1..self.policy.backup_count).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                rename_over(&from, &self.backup_path(index + 1))?;
            }
        }

        rename_over(&self.path, &self.backup_path(1))
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn rename_over(from: &Path, to: &Path) -> io::Result<()> {
    match fs::remove_file(to) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    fs::rename(from, to)
}

impl Write for &RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .file
            .flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = &'a RotatingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}
