use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};

/// Test if `path` is a regular file we are allowed to execute
pub fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

/// Search `search_path` (a `PATH` style, colon separated list) for an
/// executable called `name`.
///
/// Names containing a slash are checked as given.
pub fn find_executable(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    if name.contains('/') {
        let path = PathBuf::from(name);
        return if is_executable(&path) { Some(path) } else { None };
    }

    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}
