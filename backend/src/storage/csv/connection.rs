//! CsvConnection manages the data directory and file paths for the CSV
//! storage backend.
use anyhow::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory, creating the
    /// directory if it does not exist.
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory {}", base_path.display());
        }
        Ok(Self {
            base_directory: base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Full path for one of the store's CSV files.
    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(file_name)
    }

    /// Temp sibling used for atomic rewrites: repositories write the full
    /// file here, then rename over the original so readers never observe
    /// a half-written file.
    pub fn temp_path(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(format!("{}.tmp", file_name))
    }
}
