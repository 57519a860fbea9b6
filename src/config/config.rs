use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::data::query_state::{DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_OPTIONS};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub table: TableConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows per page when a table opens
    pub default_page_size: usize,

    /// Choices offered by the rows-per-page control
    pub page_size_options: Vec<usize>,

    /// Shown when there are no rows to display
    pub empty_message: String,

    /// Shown in place of the body while the host is fetching
    pub loading_message: String,

    /// Show the search box
    pub searchable: bool,

    /// Show selection checkboxes
    pub selectable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Text for null cells
    pub null_display: String,

    /// chrono format string for date cells
    pub date_format: String,

    /// Show row numbers in terminal output
    pub show_row_numbers: bool,

    /// Use Unicode glyphs for sort and selection markers
    pub use_glyphs: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            empty_message: "No data found".to_string(),
            loading_message: "Loading...".to_string(),
            searchable: true,
            selectable: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            null_display: String::new(),
            date_format: "%d/%m/%Y".to_string(),
            show_row_numbers: false,
            use_glyphs: true,
        }
    }
}

impl Config {
    /// Load config from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            info!(target: "config", "Created default config at {:?}", config_path);
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load and validate a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        config.validate()?;
        debug!(target: "config", "Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Page sizes must be positive and the default must be one of them
    pub fn validate(&self) -> Result<()> {
        let table = &self.table;
        if table.page_size_options.is_empty() {
            return Err(anyhow!("table.page_size_options must not be empty"));
        }
        if table.page_size_options.contains(&0) {
            return Err(anyhow!("table.page_size_options must not contain 0"));
        }
        if !table.page_size_options.contains(&table.default_page_size) {
            return Err(anyhow!(
                "table.default_page_size {} is not in page_size_options {:?}",
                table.default_page_size,
                table.page_size_options
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("queryable-table").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Queryable Table Configuration File
# Location: ~/.config/queryable-table/config.toml (Linux)
#           %APPDATA%\queryable-table\config.toml (Windows)

[table]
# Rows per page when a table opens (must be one of page_size_options)
default_page_size = 10

# Choices offered by the rows-per-page control
page_size_options = [5, 10, 25, 50]

# Message shown when no rows match
empty_message = "No data found"

# Message shown while the host is loading data
loading_message = "Loading..."

# Show the search box
searchable = true

# Show selection checkboxes
selectable = false

[display]
# Text shown for empty (null) cells
null_display = ""

# Date format (chrono syntax)
date_format = "%d/%m/%Y"

# Show row numbers in terminal output
show_row_numbers = false

# Use Unicode glyphs for sort and selection markers
# Set to false for ASCII-only output
use_glyphs = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.table.default_page_size, 10);
        assert!(config.table.searchable);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_commented_default_parses_to_default() {
        let parsed: Config = toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("[table]\nselectable = true\n").unwrap();
        assert!(parsed.table.selectable);
        assert_eq!(parsed.table.page_size_options, vec![5, 10, 25, 50]);
        assert!(parsed.display.use_glyphs);
    }

    #[test]
    fn test_validate_rejects_bad_default() {
        let mut config = Config::default();
        config.table.default_page_size = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.display.null_display = "-".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.display.null_display, "-");
    }
}
