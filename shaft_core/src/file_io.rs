//! # File I/O Module
//!
//! Project files are `.lss` JSON documents. Writes go through a temp file
//! and a rename so an interrupted save never leaves a truncated project, and
//! a `.lss.lock` sidecar tells other users on a shared drive who has the
//! file open.
//!
//! The same JSON helpers read single design decks (a bare
//! `LowSpeedShaftInput`) and write result reports.
//!
//! ## Example
//!
//! ```rust,no_run
//! use shaft_core::file_io::{save_project, load_project, FileLock};
//! use shaft_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::new("Engineer", "WT-001", "NREL 5MW");
//! let path = Path::new("drivetrain.lss");
//!
//! let lock = FileLock::acquire(path, "engineer@company.com").unwrap();
//! save_project(&project, path).unwrap();
//! drop(lock);
//!
//! let reloaded = load_project(path).unwrap();
//! assert_eq!(reloaded.meta.job_id, "WT-001");
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::project::{Project, SCHEMA_VERSION};

/// Project file extension
pub const PROJECT_EXTENSION: &str = "lss";

/// Locks older than this are taken over regardless of the holder
const STALE_LOCK_HOURS: i64 = 24;

/// Contents of a `.lss.lock` sidecar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Holder process is gone (same machine) or the lock has aged out.
    fn is_stale(&self) -> bool {
        let same_machine = hostname().is_some_and(|ours| ours == self.machine);
        if same_machine && !process_alive(self.pid) {
            return true;
        }
        (Utc::now() - self.locked_at).num_hours() > STALE_LOCK_HOURS
    }

    fn holder(&self) -> String {
        format!("{} ({})", self.user_id, self.machine)
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    fs::metadata(format!("/proc/{}", pid)).is_ok()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    use std::process::Command;
    match Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
    {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()),
        Err(_) => true,
    }
}

#[cfg(not(any(unix, windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive hold on a project file, released on drop.
///
/// Combines an OS lock (fs2) on the sidecar with the sidecar's JSON contents,
/// which name the holder for anyone who finds the file busy.
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire the lock for `path`.
    ///
    /// A live lock held by someone else gives [`CalcError::FileLocked`]; a
    /// stale one is taken over.
    ///
    /// ```rust,no_run
    /// use shaft_core::file_io::FileLock;
    /// use std::path::Path;
    ///
    /// let lock = FileLock::acquire(Path::new("drivetrain.lss"), "user@email.com")?;
    /// drop(lock);
    /// # Ok::<(), shaft_core::errors::CalcError>(())
    /// ```
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);

        if let Some(existing) = FileLock::check(path) {
            return Err(CalcError::file_locked(
                path.display().to_string(),
                existing.holder(),
                existing.locked_at.to_rfc3339(),
            ));
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| io_error("create lock", &lock_path, e))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let info = LockInfo::new(user_id);
        lock_file
            .write_all(to_json(&info)?.as_bytes())
            .map_err(|e| io_error("write lock", &lock_path, e))?;
        lock_file
            .sync_all()
            .map_err(|e| io_error("sync lock", &lock_path, e))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "project lock acquired");

        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Current live lock on `path`, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if !lock_path.exists() {
            return None;
        }
        read_json::<LockInfo>(&lock_path)
            .ok()
            .filter(|info| !info.is_stale())
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `drivetrain.lss` -> `drivetrain.lss.lock`
fn lock_path_for(project_path: &Path) -> PathBuf {
    let extension = project_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    project_path.with_extension(extension)
}

fn io_error(operation: &str, path: &Path, e: std::io::Error) -> CalcError {
    CalcError::file_error(operation, path.display().to_string(), e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> CalcResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| CalcError::SerializationError {
        reason: e.to_string(),
    })
}

/// Parse any JSON document from disk.
///
/// Used for design decks (`LowSpeedShaftInput`), constant files and lock
/// sidecars as well as projects.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CalcResult<T> {
    let contents = fs::read_to_string(path).map_err(|e| io_error("read", path, e))?;
    serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// Serialize `value` and replace `path` atomically.
///
/// The JSON goes to `<path>.tmp`, is synced, then renamed over `path`.
pub fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> CalcResult<()> {
    let json = to_json(value)?;

    let tmp_extension = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    let tmp_path = path.with_extension(tmp_extension);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| io_error("create temp file", &tmp_path, e))?;
    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| io_error("write temp file", &tmp_path, e))?;
    tmp_file
        .sync_all()
        .map_err(|e| io_error("sync temp file", &tmp_path, e))?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        io_error("rename to final", path, e)
    })
}

/// Save a project atomically.
///
/// ```rust,no_run
/// use shaft_core::file_io::save_project;
/// use shaft_core::project::Project;
/// use std::path::Path;
///
/// let project = Project::new("Engineer", "WT-001", "NREL 5MW");
/// save_project(&project, Path::new("drivetrain.lss"))?;
/// # Ok::<(), shaft_core::errors::CalcError>(())
/// ```
pub fn save_project(project: &Project, path: &Path) -> CalcResult<()> {
    write_json_atomic(project, path)?;
    tracing::info!(path = %path.display(), items = project.item_count(), "project saved");
    Ok(())
}

/// Load a project and check its schema version.
///
/// # Errors
///
/// * [`CalcError::FileError`] - the file cannot be read
/// * [`CalcError::SerializationError`] - the JSON is not a project
/// * [`CalcError::VersionMismatch`] - written by an incompatible schema
pub fn load_project(path: &Path) -> CalcResult<Project> {
    let project: Project = read_json(path)?;
    validate_version(&project.meta.version)?;
    tracing::debug!(path = %path.display(), items = project.item_count(), "project loaded");
    Ok(project)
}

/// Load a project along with any live lock another user holds on it.
pub fn load_project_with_lock_check(path: &Path) -> CalcResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    Ok((project, FileLock::check(path)))
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().ok());
    let major = parts.next()??;
    let minor = parts.next().flatten().unwrap_or(0);
    Some((major, minor))
}

/// Same major version; while in 0.x, files from a newer minor are refused.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let (file_major, file_minor) = parse_version(file_version).ok_or_else(mismatch)?;
    let (major, minor) = parse_version(SCHEMA_VERSION).ok_or_else(mismatch)?;

    if file_major != major || (major == 0 && file_minor > minor) {
        return Err(mismatch());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::low_speed_shaft::{FatigueMode, LowSpeedShaftInput};
    use crate::calculations::static_sizing::SupportTopology;
    use crate::calculations::CalculationItem;
    use std::env::temp_dir;

    fn temp_project_path(name: &str) -> PathBuf {
        temp_dir().join(format!("shaft_test_{}_{}.lss", name, std::process::id()))
    }

    #[test]
    fn test_lock_path_generation() {
        let lock_path = lock_path_for(Path::new("/path/to/drivetrain.lss"));
        assert_eq!(lock_path, Path::new("/path/to/drivetrain.lss.lock"));
        assert_eq!(lock_path_for(Path::new("bare")), Path::new("bare.lock"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_project_path("roundtrip");

        let mut project = Project::new("Test Engineer", "WT-001", "NREL 5MW");
        let input = LowSpeedShaftInput::reference_5mw(SupportTopology::FourPoint, FatigueMode::Off);
        let id = project.add_item(CalculationItem::LowSpeedShaft(input.clone()));
        save_project(&project, &path).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.meta.engineer, "Test Engineer");
        assert_eq!(loaded.meta.turbine, "NREL 5MW");
        match loaded.get_item(&id) {
            Some(CalculationItem::LowSpeedShaft(stored)) => assert_eq!(stored, &input),
            None => panic!("item lost in roundtrip"),
        }

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let path = temp_project_path("atomic");
        save_project(&Project::new("Test", "WT", "Test"), &path).unwrap();

        assert!(!path.with_extension("lss.tmp").exists());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_read_json_reports_bad_input() {
        let path = temp_dir().join(format!("shaft_test_deck_{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();

        let err = read_json::<LowSpeedShaftInput>(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");

        let _ = fs::remove_file(&path);
        let missing = read_json::<LowSpeedShaftInput>(&path).unwrap_err();
        assert_eq!(missing.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let path = temp_project_path("lock");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "test@example.com").unwrap();
        assert_eq!(lock.info.user_id, "test@example.com");
        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        drop(lock);
        assert!(!lock_path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_stale_lock_is_ignored() {
        let mut info = LockInfo::new("someone@example.com");
        info.locked_at = Utc::now() - chrono::Duration::hours(STALE_LOCK_HOURS + 1);
        assert!(info.is_stale());
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());

        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_load_with_lock_check() {
        let path = temp_project_path("lock_check");
        save_project(&Project::new("Test", "WT-7", "Test"), &path).unwrap();

        let (loaded, lock_info) = load_project_with_lock_check(&path).unwrap();
        assert_eq!(loaded.meta.job_id, "WT-7");
        assert!(lock_info.is_none());

        let _ = fs::remove_file(&path);
    }
}
