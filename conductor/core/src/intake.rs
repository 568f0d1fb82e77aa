//! File Intake
//!
//! Turns user-selected files into staged attachments: extension filtering
//! against the allow-list, then text decoding through an injected reader.
//!
//! Files with an extension outside the allow-list are dropped without a
//! transcript message. They are still named in the [`StageReport`] so a
//! surface can show a notice if it wants to.

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;

use crate::messages::AttachedFile;

/// Extensions accepted by default (case-insensitive)
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "py", "java", "cpp", "c", "cs", "go", "rs", "rb", "php", "swift",
    "kt",
];

/// Errors that can occur while reading a selected file
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The file could not be read
    #[error("Failed to read {name}: {source}")]
    Io {
        /// Original filename
        name: String,
        /// The underlying IO error
        source: std::io::Error,
    },
}

/// Where a selected file's bytes come from
#[derive(Clone, Debug)]
pub enum FileSource {
    /// A file on disk
    Path(PathBuf),
    /// Bytes already in memory
    Bytes(Vec<u8>),
}

/// A file the user selected for upload
#[derive(Clone, Debug)]
pub struct FileHandle {
    /// Original filename
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Byte source
    pub source: FileSource,
}

impl FileHandle {
    /// A handle over in-memory bytes
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            source: FileSource::Bytes(bytes),
        }
    }

    /// A handle over a file on disk
    ///
    /// The filename is the last path component; the size is read from
    /// the file's metadata.
    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self, IntakeError> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|source| IntakeError::Io {
                name: name.clone(),
                source,
            })?;
        Ok(Self {
            name,
            size: metadata.len(),
            source: FileSource::Path(path),
        })
    }
}

/// Capability for decoding a selected file as text
#[async_trait]
pub trait FileReader: Send + Sync {
    /// Read the whole file as text
    async fn read_text(&self, handle: &FileHandle) -> Result<String, IntakeError>;
}

/// Reads files with tokio, decoding UTF-8 lossily like a browser text reader
#[derive(Clone, Copy, Debug, Default)]
pub struct FsFileReader;

#[async_trait]
impl FileReader for FsFileReader {
    async fn read_text(&self, handle: &FileHandle) -> Result<String, IntakeError> {
        let bytes = match &handle.source {
            FileSource::Bytes(bytes) => return Ok(String::from_utf8_lossy(bytes).into_owned()),
            FileSource::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| IntakeError::Io {
                        name: handle.name.clone(),
                        source,
                    })?
            }
        };
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// The set of accepted source-code extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionAllowList {
    extensions: BTreeSet<String>,
}

impl Default for ExtensionAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl ExtensionAllowList {
    /// Build an allow-list, normalizing each entry
    ///
    /// Entries are lower-cased and a leading `.` is stripped; empty entries
    /// are ignored.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .filter_map(|e| {
                let e = e.as_ref().trim().trim_start_matches('.').to_lowercase();
                (!e.is_empty()).then_some(e)
            })
            .collect();
        Self { extensions }
    }

    /// Whether a filename's extension is accepted
    pub fn accepts(&self, filename: &str) -> bool {
        self.extensions.contains(&extension_of(filename))
    }

    /// Accepted extensions in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Number of accepted extensions
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Whether nothing is accepted
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// The text after the last `.`, lower-cased
///
/// A name with no `.` is its own extension.
pub fn extension_of(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or(filename)
        .to_lowercase()
}

/// Outcome of staging a batch of selected files
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Names staged, in selection order
    pub accepted: Vec<String>,
    /// Names dropped for an unsupported extension
    pub unsupported: Vec<String>,
    /// Names whose decode failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl StageReport {
    /// Whether every selected file was staged
    pub fn is_clean(&self) -> bool {
        self.unsupported.is_empty() && self.failed.is_empty()
    }
}

/// Filter and decode a batch of selected files
///
/// Decoding runs concurrently; results come back in selection order. A
/// failed decode is recorded in the report and does not affect the others.
pub async fn decode_selection<R>(
    reader: &R,
    allow_list: &ExtensionAllowList,
    handles: Vec<FileHandle>,
) -> (Vec<AttachedFile>, StageReport)
where
    R: FileReader + ?Sized,
{
    let mut report = StageReport::default();
    let mut candidates = Vec::with_capacity(handles.len());

    for handle in handles {
        if allow_list.accepts(&handle.name) {
            candidates.push(handle);
        } else {
            tracing::debug!(file = %handle.name, "Dropping file with unsupported extension");
            report.unsupported.push(handle.name);
        }
    }

    let decoded = join_all(candidates.iter().map(|h| reader.read_text(h))).await;

    let mut accepted = Vec::with_capacity(candidates.len());
    for (handle, result) in candidates.into_iter().zip(decoded) {
        match result {
            Ok(content) => {
                report.accepted.push(handle.name.clone());
                accepted.push(AttachedFile::new(handle.name, handle.size, content));
            }
            Err(e) => {
                tracing::warn!(file = %handle.name, error = %e, "Failed to decode file");
                report.failed.push((handle.name, e.to_string()));
            }
        }
    }

    (accepted, report)
}
