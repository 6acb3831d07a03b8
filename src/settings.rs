use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::placement::{GridLayout, GridPosition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub spreadsheet_id: Option<String>,
    /// Numeric id of the tab inside the spreadsheet (`gid` in the sheet URL)
    pub sheet_id: u32,
    pub access_token_file: Option<String>,
    pub thumbnail_size: u32,
    pub grid_width: u32,
    pub grid_start_row: u32,
    pub grid_start_col: u32,
    pub cell_size: u32,
    pub single_cell_row: u32,
    pub single_cell_col: u32,
    pub request_timeout_secs: u64,
    pub drive_api_base: String,
    pub upload_api_base: String,
    pub thumbnail_base: String,
    pub sheets_api_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            sheet_id: 0,
            access_token_file: None,
            thumbnail_size: THUMBNAIL_SIZE,
            grid_width: GRID_WIDTH,
            grid_start_row: GRID_START_ROW,
            grid_start_col: GRID_START_COL,
            cell_size: CELL_SIZE_PX,
            single_cell_row: SINGLE_CELL_ROW,
            single_cell_col: SINGLE_CELL_COL,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            drive_api_base: DRIVE_API_BASE.to_string(),
            upload_api_base: UPLOAD_API_BASE.to_string(),
            thumbnail_base: THUMBNAIL_BASE.to_string(),
            sheets_api_base: SHEETS_API_BASE.to_string(),
        }
    }
}

fn set_parsed<T: FromStr>(config_map: &HashMap<String, String>, key: &str, target: &mut T) {
    if let Some(value) = config_map.get(key) {
        match value.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!("⚠️  Ignoring invalid value for {}: {}", key, value),
        }
    }
}

/// Sheet coordinates are 1-based; 0 keeps the current value
fn set_coordinate(config_map: &HashMap<String, String>, key: &str, target: &mut u32) {
    let previous = *target;
    set_parsed(config_map, key, target);
    if *target == 0 {
        tracing::warn!("⚠️  Ignoring {} = 0, rows and columns start at 1", key);
        *target = previous;
    }
}

fn set_string(config_map: &HashMap<String, String>, key: &str, target: &mut String) {
    if let Some(value) = config_map.get(key) {
        *target = value.clone();
    }
}

impl Settings {
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Parses `key = value` lines; `#` starts a comment, unknown keys are ignored
    pub fn parse(content: &str) -> Self {
        let mut settings = Settings::default();
        let mut config_map = HashMap::new();

        for line in content.lines() {
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config_map.insert(
                    key.trim().to_string(),
                    value.trim().trim_matches('"').to_string(),
                );
            }
        }

        if let Some(id) = config_map.get("spreadsheet_id").filter(|v| !v.is_empty()) {
            settings.spreadsheet_id = Some(id.clone());
        }
        if let Some(path) = config_map.get("access_token_file").filter(|v| !v.is_empty()) {
            settings.access_token_file = Some(path.clone());
        }
        set_parsed(&config_map, "sheet_id", &mut settings.sheet_id);
        set_parsed(&config_map, "thumbnail_size", &mut settings.thumbnail_size);
        set_parsed(&config_map, "grid_width", &mut settings.grid_width);
        set_coordinate(&config_map, "grid_start_row", &mut settings.grid_start_row);
        set_coordinate(&config_map, "grid_start_col", &mut settings.grid_start_col);
        set_parsed(&config_map, "cell_size", &mut settings.cell_size);
        set_coordinate(&config_map, "single_cell_row", &mut settings.single_cell_row);
        set_coordinate(&config_map, "single_cell_col", &mut settings.single_cell_col);
        set_parsed(&config_map, "request_timeout_secs", &mut settings.request_timeout_secs);
        set_string(&config_map, "drive_api_base", &mut settings.drive_api_base);
        set_string(&config_map, "upload_api_base", &mut settings.upload_api_base);
        set_string(&config_map, "thumbnail_base", &mut settings.thumbnail_base);
        set_string(&config_map, "sheets_api_base", &mut settings.sheets_api_base);

        // A zero-width grid would divide by zero when computing positions
        if settings.grid_width == 0 {
            settings.grid_width = GRID_WIDTH;
        }

        settings
    }

    pub fn render(&self) -> String {
        let mut content = String::new();
        content.push_str("# HeicSheet Configuration File\n");

        if let Some(ref id) = self.spreadsheet_id {
            content.push_str(&format!("spreadsheet_id = \"{}\"\n", id));
        }
        content.push_str(&format!("sheet_id = {}\n", self.sheet_id));
        if let Some(ref path) = self.access_token_file {
            content.push_str(&format!("access_token_file = \"{}\"\n", path));
        }
        content.push_str(&format!("thumbnail_size = {}\n", self.thumbnail_size));
        content.push_str(&format!("grid_width = {}\n", self.grid_width));
        content.push_str(&format!("grid_start_row = {}\n", self.grid_start_row));
        content.push_str(&format!("grid_start_col = {}\n", self.grid_start_col));
        content.push_str(&format!("cell_size = {}\n", self.cell_size));
        content.push_str(&format!("single_cell_row = {}\n", self.single_cell_row));
        content.push_str(&format!("single_cell_col = {}\n", self.single_cell_col));
        content.push_str(&format!("request_timeout_secs = {}\n", self.request_timeout_secs));
        content.push_str(&format!("drive_api_base = \"{}\"\n", self.drive_api_base));
        content.push_str(&format!("upload_api_base = \"{}\"\n", self.upload_api_base));
        content.push_str(&format!("thumbnail_base = \"{}\"\n", self.thumbnail_base));
        content.push_str(&format!("sheets_api_base = \"{}\"\n", self.sheets_api_base));
        content
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Creating config directory")?;
        }
        std::fs::write(config_path, self.render()).context("Failed to write to config file")?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        crate::utils::config_file_path()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Layout of the batch grid
    pub fn grid_layout(&self) -> GridLayout {
        GridLayout {
            start: GridPosition::new(self.grid_start_row, self.grid_start_col),
            width: self.grid_width,
            cell_size: self.cell_size,
        }
    }

    pub fn single_cell(&self) -> GridPosition {
        GridPosition::new(self.single_cell_row, self.single_cell_col)
    }
}
