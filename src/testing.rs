//! In-memory stand-ins for the drive and the sheet.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use crate::constants::FOLDER_MIME_TYPE;
use crate::folder_ref::{resolve_folder_reference, FolderReference};
use crate::placement::GridPosition;
use crate::prompts::Prompter;
use crate::sheets::SpreadsheetSurface;
use crate::storage::{StorageBackend, StoredFile, Thumbnail};

pub fn file(id: &str, name: &str, mime_type: &str) -> StoredFile {
    StoredFile {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        trashed: false,
    }
}

fn tiny_jpeg() -> Vec<u8> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 80)
        .encode(&[200u8; 2 * 2 * 3], 2, 2, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

#[derive(Default)]
struct DriveState {
    folders: HashMap<String, String>,
    files: Vec<(String, StoredFile)>,
    contents: HashMap<String, Vec<u8>>,
    next_id: usize,
    thumbnail_requests: Vec<(String, u32)>,
    shared: Vec<String>,
    trashed: Vec<String>,
    fail_thumbnail: HashSet<String>,
    fail_share: HashSet<String>,
    fail_trash: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryDrive {
    state: Mutex<DriveState>,
}

impl MemoryDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_folder(&self, name: &str) -> FolderReference {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("folder{:0>24}", state.next_id);
        state.folders.insert(id.clone(), name.to_string());
        resolve_folder_reference(&id).unwrap()
    }

    pub fn add_file(&self, folder: &FolderReference, file: StoredFile) {
        let mut state = self.state.lock().unwrap();
        state.files.push((folder.as_str().to_string(), file));
    }

    pub fn fail_thumbnail(&self, file_id: &str) {
        self.state.lock().unwrap().fail_thumbnail.insert(file_id.to_string());
    }

    pub fn fail_share(&self, file_id: &str) {
        self.state.lock().unwrap().fail_share.insert(file_id.to_string());
    }

    pub fn fail_trash(&self, file_id: &str) {
        self.state.lock().unwrap().fail_trash.insert(file_id.to_string());
    }

    pub fn file(&self, id: &str) -> Option<StoredFile> {
        let state = self.state.lock().unwrap();
        state.files.iter().find(|(_, f)| f.id == id).map(|(_, f)| f.clone())
    }

    pub fn content(&self, id: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().contents.get(id).cloned()
    }

    /// Names of every entry in the folder, trashed ones included
    pub fn children_names(&self, folder: &FolderReference) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .iter()
            .filter(|(parent, _)| parent == folder.as_str())
            .map(|(_, f)| f.name.clone())
            .collect()
    }

    pub fn thumbnail_requests(&self) -> Vec<(String, u32)> {
        self.state.lock().unwrap().thumbnail_requests.clone()
    }

    pub fn shared(&self) -> Vec<String> {
        self.state.lock().unwrap().shared.clone()
    }

    pub fn trashed(&self) -> Vec<String> {
        self.state.lock().unwrap().trashed.clone()
    }
}

#[async_trait]
impl StorageBackend for MemoryDrive {
    async fn get_folder(&self, folder: &FolderReference) -> Result<StoredFile> {
        let state = self.state.lock().unwrap();
        let name = state
            .folders
            .get(folder.as_str())
            .ok_or_else(|| anyhow!("File not found: {}", folder))?;
        Ok(StoredFile {
            id: folder.as_str().to_string(),
            name: name.clone(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            trashed: false,
        })
    }

    async fn list_children(&self, folder: &FolderReference) -> Result<Vec<StoredFile>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .files
            .iter()
            .filter(|(parent, _)| parent == folder.as_str())
            .map(|(_, f)| f.clone())
            .collect())
    }

    async fn fetch_thumbnail(&self, file_id: &str, size: u32) -> Result<Thumbnail> {
        let mut state = self.state.lock().unwrap();
        state.thumbnail_requests.push((file_id.to_string(), size));
        if state.fail_thumbnail.contains(file_id) {
            bail!("thumbnail unavailable for {}", file_id);
        }
        Ok(Thumbnail {
            bytes: tiny_jpeg(),
            content_type: Some("image/jpeg".to_string()),
        })
    }

    async fn create_file(
        &self,
        folder: &FolderReference,
        name: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Result<StoredFile> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let created = StoredFile {
            id: format!("new-{}", state.next_id),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            trashed: false,
        };
        state.contents.insert(created.id.clone(), content);
        state
            .files
            .push((folder.as_str().to_string(), created.clone()));
        Ok(created)
    }

    async fn share_with_link(&self, file_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_share.contains(file_id) {
            bail!("sharing disabled for {}", file_id);
        }
        state.shared.push(file_id.to_string());
        Ok(())
    }

    async fn trash_file(&self, file_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_trash.contains(file_id) {
            bail!("cannot trash {}", file_id);
        }
        let entry = state
            .files
            .iter_mut()
            .find(|(_, f)| f.id == file_id)
            .ok_or_else(|| anyhow!("File not found: {}", file_id))?;
        entry.1.trashed = true;
        state.trashed.push(file_id.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOp {
    Clear(GridPosition),
    Formula(GridPosition, String),
    RowHeight(u32, u32),
    ColumnWidth(u32, u32),
}

#[derive(Default)]
pub struct MemorySheet {
    ops: Mutex<Vec<SheetOp>>,
    fail_formula: Mutex<HashSet<(u32, u32)>>,
    fail_resize: Mutex<bool>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_formula_at(&self, cell: GridPosition) {
        self.fail_formula.lock().unwrap().insert((cell.row, cell.col));
    }

    /// Every row height and column width change fails from now on
    pub fn fail_resizing(&self) {
        *self.fail_resize.lock().unwrap() = true;
    }

    pub fn ops(&self) -> Vec<SheetOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Last formula successfully written to the cell
    pub fn formula_at(&self, cell: GridPosition) -> Option<String> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|op| match op {
                SheetOp::Formula(pos, f) if *pos == cell => Some(f.clone()),
                _ => None,
            })
    }

    /// Cells holding a formula, in write order
    pub fn formula_cells(&self) -> Vec<GridPosition> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                SheetOp::Formula(pos, _) => Some(*pos),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SpreadsheetSurface for MemorySheet {
    async fn clear_cell(&self, cell: GridPosition) -> Result<()> {
        self.ops.lock().unwrap().push(SheetOp::Clear(cell));
        Ok(())
    }

    async fn set_formula(&self, cell: GridPosition, formula: &str) -> Result<()> {
        if self.fail_formula.lock().unwrap().contains(&(cell.row, cell.col)) {
            bail!("protected range at {}", cell);
        }
        self.ops
            .lock()
            .unwrap()
            .push(SheetOp::Formula(cell, formula.to_string()));
        Ok(())
    }

    async fn set_row_height(&self, row: u32, px: u32) -> Result<()> {
        if *self.fail_resize.lock().unwrap() {
            bail!("rows locked");
        }
        self.ops.lock().unwrap().push(SheetOp::RowHeight(row, px));
        Ok(())
    }

    async fn set_column_width(&self, col: u32, px: u32) -> Result<()> {
        if *self.fail_resize.lock().unwrap() {
            bail!("columns locked");
        }
        self.ops.lock().unwrap().push(SheetOp::ColumnWidth(col, px));
        Ok(())
    }
}

/// Prompter that replays canned answers and records every dialog
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Option<String>>>,
    confirm_answer: bool,
    confirmations: Mutex<usize>,
    alerts: Mutex<Vec<(String, String)>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Option<String>>, confirm_answer: bool) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            confirm_answer,
            confirmations: Mutex::new(0),
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn confirmations(&self) -> usize {
        *self.confirmations.lock().unwrap()
    }

    pub fn alerts(&self) -> Vec<(String, String)> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&self, _title: &str, _message: &str) -> Option<String> {
        self.answers.lock().unwrap().pop_front().flatten()
    }

    fn confirm(&self, _title: &str, _message: &str) -> bool {
        *self.confirmations.lock().unwrap() += 1;
        self.confirm_answer
    }

    fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}
