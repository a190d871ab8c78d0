//! Mapping between filesystem paths and archive entry names.
use std::path::{Component, Path, PathBuf};

use crate::Error;

/// Name under which `path`, found while walking `root`, is stored in an
/// archive.
///
/// The result is relative to `root` and holds only normal components;
/// volume prefixes, root and `.` components are dropped. `root` itself maps
/// to the empty path. This never consults the filesystem or the current
/// directory.
pub fn archive_path(path: &Path, root: &Path) -> Result<PathBuf, Error> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| Error::StripPrefix {
            prefix: root.to_path_buf(),
            path: path.to_path_buf(),
        })?;

    let mut name = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::InvalidPathComponent {
                    path: path.to_path_buf(),
                    component: PathBuf::from(".."),
                });
            }
            Component::Normal(part) => name.push(part),
        }
    }
    Ok(name)
}

/// Name of the single entry produced when the pack root is not a directory.
pub fn root_file_name(root: &Path) -> Result<PathBuf, Error> {
    root.file_name()
        .map(PathBuf::from)
        .ok_or_else(|| Error::InvalidPathComponent {
            path: root.to_path_buf(),
            component: root.to_path_buf(),
        })
}
