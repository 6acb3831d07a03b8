use anyhow::Result;
use std::cmp::Ordering;
use tracing::{debug, info};

use crate::constants::HEIC_MIME_TYPE;
use crate::folder_ref::FolderReference;
use crate::storage::{StorageBackend, StoredFile};

/// HEIC/HEIF by name (case-insensitive) or by declared content type
pub fn is_heic_candidate(file: &StoredFile) -> bool {
    let name = file.name.to_lowercase();
    name.contains(".heic") || name.contains(".heif") || file.mime_type == HEIC_MIME_TYPE
}

/// Lists the HEIC candidates of a folder in the order the backend yields them.
/// No matches is an empty list, not an error.
pub async fn list_heic_files(
    storage: &dyn StorageBackend,
    folder: &FolderReference,
) -> Result<Vec<StoredFile>> {
    let folder_meta = storage.get_folder(folder).await?;
    info!("📂 Scanning folder: {} ({})", folder_meta.name, folder);

    let children = storage.list_children(folder).await?;
    let total = children.len();
    let files: Vec<StoredFile> = children
        .into_iter()
        .filter(|f| !f.trashed)
        .filter(is_heic_candidate)
        .collect();

    debug!("{} entries in folder, {} HEIC candidates", total, files.len());
    Ok(files)
}

/// Sorts by name ascending with numbers compared by value, so `img2` comes before `img10`.
/// The sort is stable.
pub fn sort_by_name_natural(files: &mut [StoredFile]) {
    files.sort_by(|a, b| natural_cmp(&a.name, &b.name));
}

fn digit_run(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    end
}

fn cmp_digits(a: &[char], b: &[char]) -> Ordering {
    let a_trim: Vec<char> = a.iter().copied().skip_while(|c| *c == '0').collect();
    let b_trim: Vec<char> = b.iter().copied().skip_while(|c| *c == '0').collect();
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(&b_trim))
        // "01" after "1"
        .then_with(|| a.len().cmp(&b.len()))
}

/// Numeric-aware, case-insensitive comparison; exact ties fall back to the raw strings.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let right: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        if left[i].is_ascii_digit() && right[j].is_ascii_digit() {
            let i_end = digit_run(&left, i);
            let j_end = digit_run(&right, j);
            let ord = cmp_digits(&left[i..i_end], &right[j..j_end]);
            if ord != Ordering::Equal {
                return ord;
            }
            i = i_end;
            j = j_end;
            continue;
        }

        let ord = left[i].cmp(&right[j]);
        if ord != Ordering::Equal {
            return ord;
        }
        i += 1;
        j += 1;
    }

    (left.len() - i).cmp(&(right.len() - j)).then_with(|| a.cmp(b))
}
