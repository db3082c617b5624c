//! Canned biometric sample store.
//!
//! Samples live under `<root>/<profile>/<file>`, where `<profile>` is the
//! active profile id, or a 4-digit zero-padded seed name when the service
//! runs the Automatic profile. A missing file or directory is not an error;
//! the corresponding slot simply stays uncaptured.

use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::debug;

use sbi_core::SbiResult;

/// Reads canned sample files for the active profile.
#[derive(Clone, Debug)]
pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read one sample. `Ok(None)` when the profile directory or the file
    /// does not exist; other I/O failures propagate.
    pub fn read_sample(&self, profile: &str, file_name: &str) -> SbiResult<Option<Vec<u8>>> {
        let path = self.root.join(profile).join(file_name);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "sample file not present");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Derive a 4-digit zero-padded seed name from a configured range. The
/// Automatic profile uses this to pick which sample set to serve.
pub fn seed_name(range: u32) -> String {
    let upper = range.max(1);
    let value = rand::thread_rng().gen_range(1..=upper);
    format!("{value:04}")
}
