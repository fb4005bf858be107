//! [`FileSystem`] backed by a directory on the host.

use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::fmt::DisplayFmt;
use crate::topic::FileSystem;
use crate::{Error, Result};

/// Writes uploaded files below a root directory.
///
/// Upload paths are absolute in the device's namespace (`/img/a.bmp`); they are resolved
/// relative to `root`. Parent directories must already exist, as on a device file system.
#[derive(Clone, Debug)]
pub struct StdFileSystem {
    root: PathBuf,
}

impl StdFileSystem {
    /// Store files below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory files are stored below.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for a device path.
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl FileSystem for StdFileSystem {
    fn write_file(&mut self, path: &str, contents: &[u8]) -> Result<()> {
        let host_path = self.resolve(path);
        let mut file = File::create(&host_path).map_err(|err| {
            debug!(
                "Couldn't create {}: {}",
                DisplayFmt(&host_path.display()),
                DisplayFmt(&err)
            );
            Error::FileCreate
        })?;
        file.write_all(contents).map_err(|err| {
            debug!(
                "Couldn't write {}: {}",
                DisplayFmt(&host_path.display()),
                DisplayFmt(&err)
            );
            Error::FileWrite
        })
    }
}
