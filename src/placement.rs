use anyhow::Result;
use std::fmt;
use tracing::{info, warn};

use crate::constants::{IMAGE_FIT_MODE, PUBLIC_VIEW_URL};
use crate::converter::ConvertedFile;
use crate::sheets::SpreadsheetSurface;
use crate::storage::StorageBackend;
use crate::utils::column_letters;

/// 1-based sheet coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub row: u32,
    pub col: u32,
}

impl GridPosition {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub start: GridPosition,
    pub width: u32,
    /// Row height and column width of every grid cell, in px
    pub cell_size: u32,
}

impl GridLayout {
    pub fn position(&self, index: usize) -> GridPosition {
        grid_position(index, self.width, self.start)
    }

    /// Rows needed for `count` images
    pub fn rows_for(&self, count: usize) -> u32 {
        (count as u32).div_ceil(self.width)
    }
}

pub fn grid_position(index: usize, width: u32, start: GridPosition) -> GridPosition {
    let index = index as u32;
    GridPosition {
        row: start.row + index / width,
        col: start.col + index % width,
    }
}

pub fn public_view_url(file_id: &str) -> String {
    format!("{}{}", PUBLIC_VIEW_URL, file_id)
}

/// `IMAGE()` formula showing the file fitted to its cell
pub fn image_formula(file_id: &str) -> String {
    format!("=IMAGE(\"{}\", {})", public_view_url(file_id), IMAGE_FIT_MODE)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementReport {
    pub placed: Vec<(String, GridPosition)>,
    pub skipped: Vec<(String, String)>,
}

/// Writes one image into a single cell, replacing what was there
pub async fn place_single(
    sheet: &dyn SpreadsheetSurface,
    anchor: GridPosition,
    file: &ConvertedFile,
    cell_size: u32,
) -> Result<()> {
    sheet.clear_cell(anchor).await?;
    sheet.set_row_height(anchor.row, cell_size).await?;
    sheet.set_column_width(anchor.col, cell_size).await?;
    sheet.set_formula(anchor, &image_formula(&file.id)).await?;
    info!("🖼️  Placed {} at {}", file.name, anchor);
    Ok(())
}

async fn place_one(
    storage: &dyn StorageBackend,
    sheet: &dyn SpreadsheetSurface,
    file: &ConvertedFile,
    position: GridPosition,
) -> Result<()> {
    // IMAGE() fetches anonymously, so the link has to be public first
    storage.share_with_link(&file.id).await?;
    sheet.set_formula(position, &image_formula(&file.id)).await
}

/// Lays the files out on the grid in order.
/// Every fault is logged and the run carries on; a failed resize only leaves
/// the sheet's own size, a failed share or write skips that file.
pub async fn place_grid(
    storage: &dyn StorageBackend,
    sheet: &dyn SpreadsheetSurface,
    files: &[ConvertedFile],
    layout: &GridLayout,
) -> PlacementReport {
    let mut report = PlacementReport::default();
    if files.is_empty() {
        return report;
    }

    let rows = layout.rows_for(files.len());
    for r in 0..rows {
        let row = layout.start.row + r;
        if let Err(e) = sheet.set_row_height(row, layout.cell_size).await {
            warn!("⚠️  Could not resize row {}: {:#}", row, e);
        }
    }
    for c in 0..layout.width {
        let col = layout.start.col + c;
        if let Err(e) = sheet.set_column_width(col, layout.cell_size).await {
            warn!("⚠️  Could not resize column {}: {:#}", column_letters(col), e);
        }
    }

    for (index, file) in files.iter().enumerate() {
        let position = layout.position(index);
        match place_one(storage, sheet, file, position).await {
            Ok(()) => {
                info!("🖼️  Placed {} at {}", file.name, position);
                report.placed.push((file.name.clone(), position));
            }
            Err(e) => {
                warn!("⚠️  Skipping {} at {}: {:#}", file.name, position, e);
                report.skipped.push((file.name.clone(), format!("{:#}", e)));
            }
        }
    }

    report
}
