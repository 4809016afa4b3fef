//! # Library Manager Module
//!
//! ## Purpose
//! Provides centralized management of the flat-text library file paths used by
//! buf: the chemical library (one chemical per line) and the recipe library
//! (one recipe per line). This module eliminates hardcoded file paths in the
//! command modules and lets a user point the tool at a different pair of
//! library files.
//!
//! ## Architecture
//! - **LibraryConfig**: Serializable configuration structure
//! - **LibraryManager**: Core manager with path validation and persistence
//! - **Global Access**: Thread-safe singleton with closure accessors
//! - **Configuration File**: JSON-based persistent storage (library_config.json)
//!
//! ## Configuration Format
//! ```json
//! {
//!   "chemical_library": "chemicals.txt",
//!   "recipe_library": "recipes.txt"
//! }
//! ```

use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Configuration structure for the library file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub chemical_library: String,
    pub recipe_library: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            chemical_library: "chemicals.txt".to_string(),
            recipe_library: "recipes.txt".to_string(),
        }
    }
}

/// Loads, saves and updates the library path configuration.
///
/// Holds the current configuration together with the path of the config file
/// it persists to.
#[derive(Debug, Clone)]
pub struct LibraryManager {
    config: LibraryConfig,
    config_file: String,
}

impl LibraryManager {
    /// Creates a manager backed by "library_config.json" in the working
    /// directory. A missing or unparseable config file falls back to defaults.
    pub fn new() -> Self {
        Self::with_config_file("library_config.json")
    }

    /// Creates a manager backed by a custom configuration file, mainly for
    /// tests.
    pub fn with_config_file(config_file: &str) -> Self {
        let config = Self::load_config(config_file).unwrap_or_default();

        Self {
            config,
            config_file: config_file.to_string(),
        }
    }

    fn load_config(config_file: &str) -> Result<LibraryConfig, Box<dyn std::error::Error>> {
        if Path::new(config_file).exists() {
            let content = fs::read_to_string(config_file)?;
            let config: LibraryConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(LibraryConfig::default())
        }
    }

    /// Saves the current configuration to the config file. Does nothing during
    /// tests so test runs never touch a real config file.
    pub fn save_config(&self) -> Result<(), Box<dyn std::error::Error>> {
        #[cfg(test)]
        {
            return Ok(());
        }

        #[cfg(not(test))]
        {
            let content = serde_json::to_string_pretty(&self.config)?;
            fs::write(&self.config_file, content)?;
            Ok(())
        }
    }

    pub fn chemical_library_path(&self) -> &str {
        &self.config.chemical_library
    }

    pub fn recipe_library_path(&self) -> &str {
        &self.config.recipe_library
    }

    /// Points the manager at a different chemical library file. The file must
    /// already exist; the change is persisted immediately.
    pub fn set_chemical_library(&mut self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        if Path::new(path).exists() {
            self.config.chemical_library = path.to_string();
            self.save_config()?;
            Ok(())
        } else {
            Err(format!("File does not exist: {}", path).into())
        }
    }

    /// Points the manager at a different recipe library file. The file must
    /// already exist; the change is persisted immediately.
    pub fn set_recipe_library(&mut self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        if Path::new(path).exists() {
            self.config.recipe_library = path.to_string();
            self.save_config()?;
            Ok(())
        } else {
            Err(format!("File does not exist: {}", path).into())
        }
    }

    /// Creates empty library files for any configured path that does not exist
    /// yet, so a fresh install starts with empty libraries instead of I/O
    /// errors.
    pub fn ensure_library_files(&self) -> std::io::Result<()> {
        for path in [&self.config.chemical_library, &self.config.recipe_library] {
            if !Path::new(path).exists() {
                OpenOptions::new().create(true).append(true).open(path)?;
                info!("Created empty library file '{}'", path);
            }
        }
        Ok(())
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.config = LibraryConfig::default();
        self.save_config()?;
        Ok(())
    }

    pub fn get_config(&self) -> &LibraryConfig {
        &self.config
    }
}

impl Default for LibraryManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Global singleton instance of LibraryManager.
static GLOBAL_LIBRARY_MANAGER: OnceLock<Mutex<LibraryManager>> = OnceLock::new();

fn get_library_manager() -> std::sync::MutexGuard<'static, LibraryManager> {
    GLOBAL_LIBRARY_MANAGER
        .get_or_init(|| Mutex::new(LibraryManager::new()))
        .lock()
        .unwrap()
}

/// Executes a closure with read-only access to the global LibraryManager.
pub fn with_library_manager<F, R>(f: F) -> R
where
    F: FnOnce(&LibraryManager) -> R,
{
    let manager = get_library_manager();
    f(&manager)
}

/// Executes a closure with mutable access to the global LibraryManager.
pub fn with_library_manager_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut LibraryManager) -> R,
{
    let mut manager = get_library_manager();
    f(&mut manager)
}
