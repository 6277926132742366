//! Config file discovery for the layered store.
//!
//! Each [`SearchPath`] resolves to one directory, checked for
//! `{dir}/{file_name}`. Found files are returned in priority-ascending order
//! (last = highest) so the store can deep-merge them in sequence. Missing
//! files are skipped; only real I/O errors are reported.

use std::path::{Path, PathBuf};

use crate::error::BindError;
use crate::types::SearchPath;

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Read a config file, returning `None` if it does not exist.
pub fn read_config_file(path: &Path) -> Result<Option<String>, BindError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BindError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Load every `{dir}/{file_name}` that exists along `search_paths`.
pub fn load_config_files(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
) -> Result<Vec<(PathBuf, String)>, BindError> {
    let mut found = Vec::new();
    for dir in search_paths
        .iter()
        .filter_map(|sp| resolve_search_path(sp, app_name))
    {
        let path = dir.join(file_name);
        if let Some(content) = read_config_file(&path)? {
            found.push((path, content));
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_resolves_to_itself() {
        let p = PathBuf::from("/etc/myapp");
        assert_eq!(
            resolve_search_path(&SearchPath::Path(p.clone()), "myapp"),
            Some(p)
        );
    }

    #[test]
    fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_config_file(&dir.path().join("nope.toml")).unwrap().is_none());
    }

    #[test]
    fn directory_as_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_config_file(dir.path()),
            Err(BindError::IoError { .. })
        ));
    }

    #[test]
    fn loads_found_files_in_order() {
        let low = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        fs::write(low.path().join("app.toml"), "port = 1\n").unwrap();
        fs::write(high.path().join("app.toml"), "port = 2\n").unwrap();

        let files = load_config_files(
            &[
                SearchPath::Path(low.path().to_path_buf()),
                SearchPath::Path(empty.path().to_path_buf()),
                SearchPath::Path(high.path().to_path_buf()),
            ],
            "app.toml",
            "app",
        )
        .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].1, "port = 1\n");
        assert_eq!(files[1].1, "port = 2\n");
    }
}
