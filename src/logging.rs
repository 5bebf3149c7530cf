//! Log file setup.
//!
//! Logs go to `notechat.log` in the platform data directory. The previous
//! three logs are kept as `notechat.log.1` to `.3`.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const LOG_FILE_NAME: &str = "notechat.log";

/// Number of rotated logs kept next to the current one.
const KEEP_LOGS: u32 = 3;

const DEFAULT_FILTER: &str = "notechat=info,warn";

const LOG_FORMAT_ENV: &str = "NOTECHAT_LOG_FORMAT";

/// Platform data directory of the assistant.
///
/// - macOS: `~/Library/Application Support/notechat/`
/// - Windows: `{FOLDERID_RoamingAppData}\notechat\`
/// - Linux: `$XDG_DATA_HOME/notechat/` (fallback `~/.local/share/notechat/`)
///
/// Falls back to `~/.notechat/` when none of the above resolves.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("notechat");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".notechat")
}

/// Install the global tracing subscriber writing to `log_dir` (defaults to
/// [`data_dir`]). Returns the path of the active log file.
///
/// `RUST_LOG` overrides the default filter. Setting `NOTECHAT_LOG_FORMAT=json`
/// switches to one JSON object per line.
pub fn init_tracing(log_dir: Option<&Path>) -> io::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = log_dir.map(Path::to_path_buf).unwrap_or_else(data_dir);
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join(LOG_FILE_NAME);
    rotate_log_file(&log_path, KEEP_LOGS);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(FlushingWriter::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false);

    let installed = if json_requested() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| io::Error::other(format!("tracing already initialized: {e}")))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "=== notechat starting ==="
    );

    Ok(log_path)
}

fn json_requested() -> bool {
    std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Rotate log files: `notechat.log` → `notechat.log.1` → … → `.{keep}`.
///
/// The oldest file beyond `keep` is deleted. Missing files in the chain are
/// skipped.
pub fn rotate_log_file(base_path: &Path, keep: u32) {
    let oldest = format!("{}.{keep}", base_path.display());
    let _ = std::fs::remove_file(&oldest);

    for i in (1..keep).rev() {
        let from = format!("{}.{i}", base_path.display());
        let to = format!("{}.{}", base_path.display(), i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    if base_path.exists() {
        let to = format!("{}.1", base_path.display());
        let _ = std::fs::rename(base_path, &to);
    }
}

/// File writer that flushes after every write, so log lines survive a crash.
#[derive(Clone)]
struct FlushingWriter {
    file: Arc<Mutex<File>>,
}

impl FlushingWriter {
    fn new(file: File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

impl Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| io::Error::other(format!("lock poisoned: {e}")))?;
        let n = f.write(buf)?;
        f.flush()?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| io::Error::other(format!("lock poisoned: {e}")))?;
        f.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_log_file_shifts_and_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join(LOG_FILE_NAME);
        std::fs::write(&base, "current").unwrap();
        std::fs::write(dir.path().join("notechat.log.1"), "one").unwrap();
        std::fs::write(dir.path().join("notechat.log.2"), "two").unwrap();
        std::fs::write(dir.path().join("notechat.log.3"), "three").unwrap();

        rotate_log_file(&base, 3);

        assert!(!base.exists());
        let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("notechat.log.1"), "current");
        assert_eq!(read("notechat.log.2"), "one");
        assert_eq!(read("notechat.log.3"), "two");
    }

    #[test]
    fn test_rotate_log_file_with_no_logs() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join(LOG_FILE_NAME);
        rotate_log_file(&base, 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_flushing_writer_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let file = File::create(&path).unwrap();
        let mut writer = FlushingWriter::new(file);

        writer.write_all(b"line one\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line one\n");
    }
}
