//! Depth-first, pre-order directory traversal with sorted siblings.
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::vec;

use crate::{wrap_io_err, Error};

#[derive(Debug)]
pub struct WalkEntry {
    path: PathBuf,
    metadata: Metadata,
    depth: usize,
}

impl WalkEntry {
    /// Path on disk, `root` joined with the names leading to this node
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Metadata of the node itself; symlinks below the root are not followed
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// 0 for the root
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Iterator over a filesystem tree.
///
/// The root is yielded first, then every directory is followed by its
/// children, siblings ordered by file name. Pending directory listings are
/// kept on an explicit stack, so the walk is lazy and can only be consumed
/// once. After an error the iterator is exhausted.
#[derive(Debug)]
pub struct Walk {
    root: Option<PathBuf>,
    stack: Vec<vec::IntoIter<WalkEntry>>,
}

impl Walk {
    pub fn new(root: impl AsRef<Path>) -> Walk {
        Walk {
            root: Some(root.as_ref().to_path_buf()),
            stack: Vec::new(),
        }
    }

    fn visit(&mut self, entry: WalkEntry) -> Result<WalkEntry, Error> {
        if entry.metadata.is_dir() {
            self.stack.push(read_sorted(&entry.path, entry.depth + 1)?);
        }
        Ok(entry)
    }
}

impl Iterator for Walk {
    type Item = Result<WalkEntry, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = if let Some(root) = self.root.take() {
            // The root may be a symlink to the tree that should be packed
            match fs::metadata(&root) {
                Ok(metadata) => WalkEntry {
                    path: root,
                    metadata,
                    depth: 0,
                },
                Err(source) => {
                    return Some(Err(Error::Io {
                        source,
                        path: Some(root),
                        context: "Reading metadata",
                    }))
                }
            }
        } else {
            loop {
                let top = self.stack.last_mut()?;
                match top.next() {
                    Some(entry) => break entry,
                    None => {
                        self.stack.pop();
                    }
                }
            }
        };

        let visited = self.visit(next);
        if visited.is_err() {
            self.stack.clear();
        }
        Some(visited)
    }
}

fn read_sorted(dir: &Path, depth: usize) -> Result<vec::IntoIter<WalkEntry>, Error> {
    let mut entries = Vec::new();
    for entry_res in fs::read_dir(dir).map_err(wrap_io_err!(dir, "Reading directory"))? {
        let entry = entry_res.map_err(wrap_io_err!(dir, "Reading directory entry"))?;
        let path = entry.path();
        let metadata = entry
            .metadata()
            .map_err(wrap_io_err!(path, "Reading metadata"))?;
        entries.push(WalkEntry {
            path,
            metadata,
            depth,
        });
    }

    // Sort each folder's entries by the file name
    entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(entries.into_iter())
}
