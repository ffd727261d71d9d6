//! Per-workspace lock around the web server process
//!
//! The lock file `<workspace>/.artdeck/lock_gui_web.txt` contains `running`
//! while a web server child is alive. The owning process also holds an
//! exclusive advisory lock on the file, so a file left behind by a crashed
//! process is recognised as stale and replaced.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use artdeck_core::prelude::*;

/// Directory of console files inside a workspace
pub const CONSOLE_DIR: &str = ".artdeck";

pub const LOCK_FILE_NAME: &str = "lock_gui_web.txt";

const LOCK_CONTENT: &str = "running";

/// Path of the lock file of a workspace
pub fn lock_path(workspace: &Path) -> PathBuf {
    workspace.join(CONSOLE_DIR).join(LOCK_FILE_NAME)
}

/// Held lock; removes the lock file on drop
#[derive(Debug)]
pub struct WorkspaceLock {
    path: PathBuf,
    file: Option<File>,
}

impl WorkspaceLock {
    /// Acquire the lock of `workspace`.
    ///
    /// Fails with [`Error::WorkspaceLocked`] if another live process holds it.
    pub fn acquire(workspace: &Path) -> Result<Self> {
        let path = lock_path(workspace);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(Error::WorkspaceLocked {
                path: workspace.to_path_buf(),
            });
        }

        let mut previous = String::new();
        file.read_to_string(&mut previous)?;
        if previous.trim() == LOCK_CONTENT {
            warn!("Replacing stale lock file {:?}", path);
        }

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(LOCK_CONTENT.as_bytes())?;
        file.flush()?;

        debug!("Acquired workspace lock {:?}", path);
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Whether a live process holds the lock of `workspace`
    pub fn is_held(workspace: &Path) -> bool {
        let path = lock_path(workspace);
        let Ok(file) = OpenOptions::new().read(true).write(true).open(&path) else {
            return false;
        };
        match file.try_lock_exclusive() {
            Ok(()) => {
                let _ = FileExt::unlock(&file);
                false
            }
            Err(_) => true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock and remove the lock file
    pub fn release(mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        let _ = FileExt::unlock(&file);
        drop(file);
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        debug!("Released workspace lock {:?}", self.path);
        Ok(())
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner() {
            warn!("Failed to remove lock file {:?}: {}", self.path, e);
        }
    }
}
