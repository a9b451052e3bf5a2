//! Home directory resolution for `server.home_dir`.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeDirError {
    #[error("cannot determine the user's home directory")]
    NoHome,
    #[error("failed to create home directory {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read current directory: {0}")]
    Cwd(#[source] std::io::Error),
}

/// Resolve the application home directory to an absolute path.
///
/// - `Some("~/x")` expands against the user's home.
/// - `Some("relative")` is joined with the current directory.
/// - `None` falls back to `<platform dir>/<default_subdir>`: `%APPDATA%` on
///   Windows, `$HOME` elsewhere.
///
/// With `create`, the directory (and parents) is created.
pub fn resolve_home_dir(
    explicit: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let path = match explicit {
        Some(raw) => expand(raw.trim())?,
        None => platform_base()?.join(default_subdir),
    };

    if create {
        std::fs::create_dir_all(&path).map_err(|source| HomeDirError::Create {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
    }
    Ok(path)
}

fn expand(raw: &str) -> Result<PathBuf, HomeDirError> {
    let path = if raw == "~" {
        user_home()?
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        user_home()?.join(rest)
    } else {
        PathBuf::from(raw)
    };

    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir().map_err(HomeDirError::Cwd)?.join(path))
    }
}

fn user_home() -> Result<PathBuf, HomeDirError> {
    dirs::home_dir().ok_or(HomeDirError::NoHome)
}

#[cfg(target_os = "windows")]
fn platform_base() -> Result<PathBuf, HomeDirError> {
    dirs::data_dir().ok_or(HomeDirError::NoHome)
}

#[cfg(not(target_os = "windows"))]
fn platform_base() -> Result<PathBuf, HomeDirError> {
    user_home()
}

/// Join `p` onto `base` unless it is already absolute.
pub fn absolutize(p: &Path, base: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn explicit_absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("a").join("b");
        let got = resolve_home_dir(Some(target.to_string_lossy().to_string()), ".x", true).unwrap();
        assert_eq!(got, target);
        assert!(target.is_dir());
    }

    #[test]
    fn relative_path_is_made_absolute() {
        let got = resolve_home_dir(Some("some/rel".into()), ".x", false).unwrap();
        assert!(got.is_absolute());
        assert!(got.ends_with("some/rel"));
    }

    #[test]
    fn tilde_expands_to_user_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let got = resolve_home_dir(Some("~/.students_tilde".into()), ".x", false).unwrap();
        assert_eq!(got, home.join(".students_tilde"));
    }

    #[cfg(unix)]
    #[test]
    fn absolutize_joins_only_relative_paths() {
        let base = Path::new("/srv/students");
        assert_eq!(
            absolutize(Path::new("db/x.db"), base),
            PathBuf::from("/srv/students/db/x.db")
        );
        assert_eq!(
            absolutize(Path::new("/tmp/x.db"), base),
            PathBuf::from("/tmp/x.db")
        );
    }
}
