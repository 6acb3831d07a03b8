use std::time::Instant;
use tracing::{info, warn};

use crate::converter::{convert_file, ConversionResult, ConvertedFile};
use crate::error::{AppError, AppResult};
use crate::folder_ref::{resolve_folder_reference, FolderReference};
use crate::lister::{list_heic_files, sort_by_name_natural};
use crate::placement::{place_grid, place_single, GridPosition};
use crate::settings::Settings;
use crate::sheets::SpreadsheetSurface;
use crate::storage::{StorageBackend, StoredFile};

/// Backends and settings for one invocation
pub struct Workflow<'a> {
    pub storage: &'a dyn StorageBackend,
    pub sheet: &'a dyn SpreadsheetSurface,
    pub settings: &'a Settings,
}

/// HEIC files found in a folder, in the order they will be offered or processed
#[derive(Debug, Clone)]
pub struct Candidates {
    pub folder: FolderReference,
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleOutcome {
    pub original_name: String,
    pub new_name: String,
    pub cell: GridPosition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub trashed_count: usize,
    pub placed_count: usize,
    /// (original name, error) for every file that failed to convert
    pub failures: Vec<(String, String)>,
    /// (converted name, error) for every file that could not be placed
    pub skipped_placements: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Converted {} of {} files ({} failed).\nPlaced {} images in the sheet; {} originals moved to trash.",
            self.success_count, self.total, self.fail_count, self.placed_count, self.trashed_count
        );
        for (name, error) in &self.failures {
            msg.push_str(&format!("\n  ✗ {}: {}", name, error));
        }
        for (name, error) in &self.skipped_placements {
            msg.push_str(&format!("\n  ⚠ {} not placed: {}", name, error));
        }
        msg
    }
}

impl<'a> Workflow<'a> {
    pub fn new(
        storage: &'a dyn StorageBackend,
        sheet: &'a dyn SpreadsheetSurface,
        settings: &'a Settings,
    ) -> Self {
        Self {
            storage,
            sheet,
            settings,
        }
    }

    /// Resolves the folder input and lists its HEIC files in backend order.
    /// An empty folder is `NotFound`.
    pub async fn candidates(&self, folder_input: &str) -> AppResult<Candidates> {
        let folder = resolve_folder_reference(folder_input)?;
        let files = list_heic_files(self.storage, &folder).await.map_err(|e| {
            AppError::NotFound(format!("Folder {} is not accessible: {:#}", folder, e))
        })?;

        if files.is_empty() {
            return Err(AppError::NotFound(
                "No HEIC/HEIF files found in this folder.".to_string(),
            ));
        }
        Ok(Candidates { folder, files })
    }

    /// Converts the `index`-th (1-based) candidate and shows it in the single target cell
    pub async fn convert_selected(
        &self,
        candidates: &Candidates,
        index: usize,
    ) -> AppResult<SingleOutcome> {
        let count = candidates.files.len();
        let file = index
            .checked_sub(1)
            .and_then(|i| candidates.files.get(i))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Invalid selection {}: choose a number between 1 and {}.",
                    index, count
                ))
            })?;

        info!("🔄 Converting {}", file.name);
        let result = convert_file(
            self.storage,
            file,
            &candidates.folder,
            self.settings.thumbnail_size,
        )
        .await;

        let (original_name, new_name, new_file_id) = match result {
            ConversionResult::Converted {
                original_name,
                new_name,
                new_file_id,
                ..
            } => (original_name, new_name, new_file_id),
            ConversionResult::Failed {
                original_name,
                error,
            } => {
                return Err(AppError::ConversionFault {
                    name: original_name,
                    message: error,
                })
            }
        };

        let converted = ConvertedFile {
            id: new_file_id,
            name: new_name.clone(),
        };
        let cell = self.settings.single_cell();
        place_single(self.sheet, cell, &converted, self.settings.cell_size)
            .await
            .map_err(|e| AppError::PlacementFault {
                name: new_name.clone(),
                message: format!("{:#}", e),
            })?;

        Ok(SingleOutcome {
            original_name,
            new_name,
            cell,
        })
    }

    /// Single-file mode with explicit inputs
    pub async fn convert_single(&self, folder_input: &str, index: usize) -> AppResult<SingleOutcome> {
        let candidates = self.candidates(folder_input).await?;
        self.convert_selected(&candidates, index).await
    }

    /// Batch mode: every candidate in natural name order.
    ///
    /// Each original is trashed right after its own conversion succeeds, so an
    /// interrupted run leaves earlier files converted and later ones untouched.
    /// `confirm` sees the sorted list and may cancel before anything changes.
    pub async fn convert_all<F>(&self, folder_input: &str, confirm: F) -> AppResult<BatchSummary>
    where
        F: FnOnce(&[StoredFile]) -> bool,
    {
        let mut candidates = self.candidates(folder_input).await?;
        sort_by_name_natural(&mut candidates.files);

        if !confirm(&candidates.files) {
            return Err(AppError::Cancelled);
        }

        let start_time = Instant::now();
        let total = candidates.files.len();
        info!("📊 Converting {} files...", total);

        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };
        let mut converted = Vec::new();

        for (i, file) in candidates.files.iter().enumerate() {
            info!("🔄 [{}/{}] {}", i + 1, total, file.name);
            let result = convert_file(
                self.storage,
                file,
                &candidates.folder,
                self.settings.thumbnail_size,
            )
            .await;

            match result {
                ConversionResult::Converted {
                    original_id,
                    new_name,
                    new_file_id,
                    ..
                } => {
                    summary.success_count += 1;
                    match self.storage.trash_file(&original_id).await {
                        Ok(()) => summary.trashed_count += 1,
                        Err(e) => warn!("⚠️  Could not trash {}: {:#}", file.name, e),
                    }
                    converted.push(ConvertedFile {
                        id: new_file_id,
                        name: new_name,
                    });
                }
                ConversionResult::Failed {
                    original_name,
                    error,
                } => {
                    summary.fail_count += 1;
                    summary.failures.push((original_name, error));
                }
            }
        }

        let layout = self.settings.grid_layout();
        let report = place_grid(self.storage, self.sheet, &converted, &layout).await;
        summary.placed_count = report.placed.len();
        summary.skipped_placements = report.skipped;

        let elapsed = start_time.elapsed().as_secs_f64();
        info!("\n📊 Batch statistics:");
        info!("   🔍 HEIC files found: {}", summary.total);
        info!("   ✅ Converted: {}", summary.success_count);
        info!("   ❌ Failed: {}", summary.fail_count);
        info!("   🗑️  Originals trashed: {}", summary.trashed_count);
        info!("   🖼️  Placed in sheet: {}", summary.placed_count);
        info!("   ⏱️  Time: {:.2} s", elapsed);

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HEIC_MIME_TYPE;
    use crate::placement::image_formula;
    use crate::testing::{file, MemoryDrive, MemorySheet};

    fn seeded_drive() -> (MemoryDrive, FolderReference) {
        let drive = MemoryDrive::new();
        let folder = drive.add_folder("Trip");
        drive.add_file(&folder, file("h2", "img2.heic", HEIC_MIME_TYPE));
        drive.add_file(&folder, file("j1", "cover.jpg", "image/jpeg"));
        drive.add_file(&folder, file("h10", "img10.HEIC", HEIC_MIME_TYPE));
        drive.add_file(&folder, file("h1", "img1.heif", ""));
        (drive, folder)
    }

    #[tokio::test]
    async fn batch_converts_places_and_trashes_in_name_order() {
        let (drive, folder) = seeded_drive();
        let sheet = MemorySheet::new();
        let settings = Settings::default();
        let wf = Workflow::new(&drive, &sheet, &settings);

        let mut offered = Vec::new();
        let summary = wf
            .convert_all(folder.as_str(), |files| {
                offered = files.iter().map(|f| f.name.clone()).collect();
                true
            })
            .await
            .unwrap();

        assert_eq!(offered, vec!["img1.heif", "img2.heic", "img10.HEIC"]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.fail_count, 0);
        assert_eq!(summary.trashed_count, 3);
        assert_eq!(summary.placed_count, 3);

        assert_eq!(
            sheet.formula_cells(),
            vec![
                GridPosition::new(2, 2),
                GridPosition::new(2, 3),
                GridPosition::new(2, 4)
            ]
        );
        assert_eq!(drive.trashed(), vec!["h1", "h2", "h10"]);
        assert!(drive.file("j1").is_some_and(|f| !f.trashed));

        let names = drive.children_names(&folder);
        for expected in ["img1.jpg", "img2.jpg", "img10.jpg"] {
            assert!(names.contains(&expected.to_string()), "missing {}", expected);
        }
        assert_eq!(drive.shared().len(), 3);
    }

    #[tokio::test]
    async fn locked_sheet_dimensions_still_yield_a_summary() {
        let (drive, folder) = seeded_drive();
        let sheet = MemorySheet::new();
        sheet.fail_resizing();
        let settings = Settings::default();
        let wf = Workflow::new(&drive, &sheet, &settings);

        let summary = wf.convert_all(folder.as_str(), |_| true).await.unwrap();

        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.trashed_count, 3);
        assert_eq!(summary.placed_count, 3);
        assert!(summary.skipped_placements.is_empty());
        assert_eq!(drive.trashed(), vec!["h1", "h2", "h10"]);
    }

    #[tokio::test]
    async fn batch_keeps_going_after_a_conversion_failure() {
        let (drive, folder) = seeded_drive();
        drive.fail_thumbnail("h2");
        let sheet = MemorySheet::new();
        let settings = Settings::default();
        let wf = Workflow::new(&drive, &sheet, &settings);

        let summary = wf.convert_all(folder.as_str(), |_| true).await.unwrap();

        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.fail_count, 1);
        assert_eq!(summary.failures[0].0, "img2.heic");
        assert_eq!(summary.placed_count, 2);
        assert_eq!(drive.trashed(), vec!["h1", "h10"]);
        assert!(drive.file("h2").is_some_and(|f| !f.trashed));
        assert!(!drive.children_names(&folder).contains(&"img2.jpg".to_string()));
        assert_eq!(
            sheet.formula_cells(),
            vec![GridPosition::new(2, 2), GridPosition::new(2, 3)]
        );
        assert!(summary.message().contains("Converted 2 of 3 files (1 failed)"));
    }

    #[tokio::test]
    async fn trash_failure_does_not_stop_the_batch() {
        let (drive, folder) = seeded_drive();
        drive.fail_trash("h1");
        let sheet = MemorySheet::new();
        let settings = Settings::default();
        let wf = Workflow::new(&drive, &sheet, &settings);

        let summary = wf.convert_all(folder.as_str(), |_| true).await.unwrap();

        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.trashed_count, 2);
        assert_eq!(summary.placed_count, 3);
    }

    #[tokio::test]
    async fn declined_confirmation_changes_nothing() {
        let (drive, folder) = seeded_drive();
        let sheet = MemorySheet::new();
        let settings = Settings::default();
        let wf = Workflow::new(&drive, &sheet, &settings);

        let err = wf.convert_all(folder.as_str(), |_| false).await.unwrap_err();

        assert!(matches!(err, AppError::Cancelled));
        assert!(drive.thumbnail_requests().is_empty());
        assert!(sheet.ops().is_empty());
    }

    #[tokio::test]
    async fn single_mode_uses_backend_order_and_fixed_cell() {
        let (drive, folder) = seeded_drive();
        let sheet = MemorySheet::new();
        let settings = Settings::default();
        let wf = Workflow::new(&drive, &sheet, &settings);

        // backend order: img2.heic, img10.HEIC, img1.heif
        let outcome = wf.convert_single(folder.as_str(), 2).await.unwrap();

        assert_eq!(outcome.original_name, "img10.HEIC");
        assert_eq!(outcome.new_name, "img10.jpg");
        assert_eq!(outcome.cell, GridPosition::new(2, 2));
        let created = drive
            .children_names(&folder)
            .iter()
            .any(|n| n == "img10.jpg");
        assert!(created);
        assert!(drive.trashed().is_empty());

        let formula = sheet.formula_at(GridPosition::new(2, 2)).unwrap();
        let new_id = formula
            .split("id=")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap()
            .to_string();
        assert_eq!(formula, image_formula(&new_id));
    }

    #[tokio::test]
    async fn single_mode_rejects_out_of_range_index() {
        let (drive, folder) = seeded_drive();
        let sheet = MemorySheet::new();
        let settings = Settings::default();
        let wf = Workflow::new(&drive, &sheet, &settings);

        for index in [0, 4] {
            let err = wf.convert_single(folder.as_str(), index).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)), "index {}", index);
        }
        assert!(drive.thumbnail_requests().is_empty());
    }

    #[tokio::test]
    async fn single_mode_surfaces_conversion_fault() {
        let (drive, folder) = seeded_drive();
        drive.fail_thumbnail("h2");
        let sheet = MemorySheet::new();
        let settings = Settings::default();
        let wf = Workflow::new(&drive, &sheet, &settings);

        let err = wf.convert_single(folder.as_str(), 1).await.unwrap_err();

        assert!(matches!(err, AppError::ConversionFault { ref name, .. } if name == "img2.heic"));
        assert!(sheet.ops().is_empty());
    }

    #[tokio::test]
    async fn folder_without_heic_is_not_found() {
        let drive = MemoryDrive::new();
        let folder = drive.add_folder("Jpegs");
        drive.add_file(&folder, file("j1", "a.jpg", "image/jpeg"));
        let sheet = MemorySheet::new();
        let settings = Settings::default();
        let wf = Workflow::new(&drive, &sheet, &settings);

        let err = wf.convert_all(folder.as_str(), |_| true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn bad_folder_input_fails_before_any_backend_call() {
        let drive = MemoryDrive::new();
        let sheet = MemorySheet::new();
        let settings = Settings::default();
        let wf = Workflow::new(&drive, &sheet, &settings);

        let err = wf.convert_single("not a link", 1).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
    }
}
