// Folder identifiers
pub const MIN_FOLDER_ID_LEN: usize = 25;

// Content types
pub const HEIC_MIME_TYPE: &str = "image/heic";
pub const JPEG_MIME_TYPE: &str = "image/jpeg";
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

// Rendition size requested from the thumbnail endpoint (long edge, px)
pub const THUMBNAIL_SIZE: u32 = 1000;
pub const JPEG_QUALITY: u8 = 85;

// Batch grid layout
pub const GRID_WIDTH: u32 = 6;
pub const GRID_START_ROW: u32 = 2;
pub const GRID_START_COL: u32 = 2;

// Single-file target cell
pub const SINGLE_CELL_ROW: u32 = 2;
pub const SINGLE_CELL_COL: u32 = 2;

// Row height and column width applied to image cells (px)
pub const CELL_SIZE_PX: u32 = 200;

// IMAGE() display mode 1 = resize to fit the cell, keeping aspect ratio
pub const IMAGE_FIT_MODE: u8 = 1;
pub const PUBLIC_VIEW_URL: &str = "https://drive.google.com/uc?export=view&id=";

// REST endpoints
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com";
pub const UPLOAD_API_BASE: &str = "https://www.googleapis.com";
pub const THUMBNAIL_BASE: &str = "https://drive.google.com";
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

pub const REQUEST_TIMEOUT_SECS: u64 = 60;
pub const LIST_PAGE_SIZE: u32 = 1000;

pub const ACCESS_TOKEN_ENV: &str = "HEICSHEET_ACCESS_TOKEN";
