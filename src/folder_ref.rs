use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::constants::MIN_FOLDER_ID_LEN;
use crate::error::{AppError, AppResult};

/// Identifier of a Drive folder, as accepted by the storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderReference(String);

impl FolderReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static EMBEDDED_ID: OnceLock<Regex> = OnceLock::new();
static WHOLE_ID: OnceLock<Regex> = OnceLock::new();

fn embedded_id() -> &'static Regex {
    EMBEDDED_ID.get_or_init(|| {
        Regex::new(&format!("[A-Za-z0-9_-]{{{},}}", MIN_FOLDER_ID_LEN))
            .expect("static folder id pattern")
    })
}

fn whole_id() -> &'static Regex {
    WHOLE_ID.get_or_init(|| {
        Regex::new(&format!("^[A-Za-z0-9_-]{{{},}}$", MIN_FOLDER_ID_LEN))
            .expect("static folder id pattern")
    })
}

/// Extracts a folder identifier from a pasted link or a bare ID.
///
/// The first run of 25 or more URL-safe characters wins, whatever link shape
/// surrounds it. A long unrelated token placed before the real ID (a tracking
/// parameter, say) is picked up instead of the folder ID.
pub fn resolve_folder_reference(input: &str) -> AppResult<FolderReference> {
    if let Some(m) = embedded_id().find(input) {
        return Ok(FolderReference(m.as_str().to_string()));
    }

    let trimmed = input.trim();
    if whole_id().is_match(trimmed) {
        return Ok(FolderReference(trimmed.to_string()));
    }

    Err(AppError::InvalidReference(input.trim().to_string()))
}
