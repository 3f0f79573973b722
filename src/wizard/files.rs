//! Knowledge file selection. Files are held as metadata only and never uploaded.

use serde::{Deserialize, Serialize};

/// MIME types accepted for knowledge files.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "text/plain",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/csv",
    "application/json",
];

/// Maximum number of files held by one form.
pub const MAX_FILES: usize = 10;

/// Metadata for a selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    pub mime_type: String,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

/// A file that was not accepted, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRejection {
    pub name: String,
    pub reason: String,
}

/// Outcome of a selection: what was attached and what was turned away.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSelection {
    pub accepted: Vec<UploadedFile>,
    pub rejected: Vec<FileRejection>,
}

/// Strip parameters (`; charset=...`) and lowercase a MIME type.
fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Check a single file against the type allowlist and size cap.
pub fn check_file(file: &UploadedFile, max_bytes: u64) -> Result<(), String> {
    let mime = essence(&file.mime_type);
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(format!(
            "Unsupported file type '{}'. Use TXT, PDF, DOC, DOCX, CSV or JSON",
            file.mime_type
        ));
    }
    if file.size > max_bytes {
        return Err(format!(
            "File is {} but the limit is {}",
            format_size(file.size),
            format_size(max_bytes)
        ));
    }
    Ok(())
}

/// Attach `incoming` files to `attached`, enforcing type, size, count, and
/// name uniqueness.
pub fn select_files(
    attached: &mut Vec<UploadedFile>,
    incoming: Vec<UploadedFile>,
    max_bytes: u64,
) -> FileSelection {
    let mut selection = FileSelection::default();

    for file in incoming {
        let verdict = if attached.iter().any(|f| f.name == file.name) {
            Err("A file with this name is already attached".to_string())
        } else if attached.len() >= MAX_FILES {
            Err(format!("At most {MAX_FILES} files can be attached"))
        } else {
            check_file(&file, max_bytes)
        };

        match verdict {
            Ok(()) => {
                attached.push(file.clone());
                selection.accepted.push(file);
            }
            Err(reason) => {
                tracing::debug!(file = %file.name, %reason, "File rejected");
                selection.rejected.push(FileRejection {
                    name: file.name,
                    reason,
                });
            }
        }
    }

    selection
}

/// Remove an attached file by name. Returns whether anything was removed.
pub fn remove_file(attached: &mut Vec<UploadedFile>, name: &str) -> bool {
    let before = attached.len();
    attached.retain(|f| f.name != name);
    attached.len() != before
}

/// Render a byte count as B / KB / MB.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN_MB: u64 = 10 * 1024 * 1024;

    #[test]
    fn accepts_allowed_types_under_cap() {
        let mut attached = Vec::new();
        let selection = select_files(
            &mut attached,
            vec![
                UploadedFile::new("faq.pdf", 2_000, "application/pdf"),
                UploadedFile::new("prices.csv", 500, "text/csv; charset=utf-8"),
                UploadedFile::new("notes.txt", TEN_MB, "TEXT/PLAIN"),
            ],
            TEN_MB,
        );
        assert_eq!(selection.accepted.len(), 3);
        assert!(selection.rejected.is_empty());
        assert_eq!(attached.len(), 3);
    }

    #[test]
    fn rejects_wrong_type_and_oversize() {
        let mut attached = Vec::new();
        let selection = select_files(
            &mut attached,
            vec![
                UploadedFile::new("logo.png", 100, "image/png"),
                UploadedFile::new("big.pdf", TEN_MB + 1, "application/pdf"),
            ],
            TEN_MB,
        );
        assert!(selection.accepted.is_empty());
        assert_eq!(selection.rejected.len(), 2);
        assert!(selection.rejected[0].reason.contains("Unsupported"));
        assert!(selection.rejected[1].reason.contains("limit"));
        assert!(attached.is_empty());
    }

    #[test]
    fn rejects_duplicates_and_overflow() {
        let mut attached: Vec<UploadedFile> = (0..MAX_FILES)
            .map(|i| UploadedFile::new(format!("doc{i}.txt"), 10, "text/plain"))
            .collect();

        let selection = select_files(
            &mut attached,
            vec![
                UploadedFile::new("doc0.txt", 10, "text/plain"),
                UploadedFile::new("extra.txt", 10, "text/plain"),
            ],
            TEN_MB,
        );
        assert!(selection.accepted.is_empty());
        assert!(selection.rejected[0].reason.contains("already attached"));
        assert!(selection.rejected[1].reason.contains("At most"));
        assert_eq!(attached.len(), MAX_FILES);
    }

    #[test]
    fn remove_by_name() {
        let mut attached = vec![UploadedFile::new("a.json", 1, "application/json")];
        assert!(!remove_file(&mut attached, "b.json"));
        assert!(remove_file(&mut attached, "a.json"));
        assert!(attached.is_empty());
    }

    #[test]
    fn sizes_render_readably() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(TEN_MB), "10.0 MB");
    }
}
