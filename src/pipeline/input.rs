//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! The extraction engine needs a file-system path, so URL inputs are
//! downloaded into a `TempDir` that lives exactly as long as the
//! [`ResolvedInput`]. Both paths are checked for the `%PDF` magic bytes
//! before any engine runs, so a typo'd path or an HTML error page fails
//! here instead of deep inside `pdftotext`.
//!
//! Nothing in this module writes outside the temp directory: a missing input
//! leaves the working tree untouched.

use crate::error::Pdf2TexError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The resolved input - either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    /// True when the file lives in a temp directory that is deleted after the run.
    pub fn is_downloaded(&self) -> bool {
        matches!(self, ResolvedInput::Downloaded { .. })
    }

    /// File name without directory or extension, used to name outputs.
    ///
    /// `reports/q3.final.pdf` → `q3.final`.
    pub fn stem(&self) -> String {
        file_stem(self.path())
    }
}

/// File name without directory or its last extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// First bytes of a file for the `NotAPdf` report, zero-padded when the
/// file is shorter than the magic.
fn magic_of(head: &[u8]) -> [u8; 4] {
    let mut magic = [0u8; 4];
    let n = head.len().min(magic.len());
    magic[..n].copy_from_slice(&head[..n]);
    magic
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local PDF file path.
///
/// If the input is a URL, download it to a temporary directory.
/// If the input is a local file, validate it exists and is readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2TexError> {
    if input.trim().is_empty() {
        return Err(Pdf2TexError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, Pdf2TexError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(Pdf2TexError::FileNotFound { path });
    }

    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    let read = std::fs::File::open(&path)
        .and_then(|f| f.take(PDF_MAGIC.len() as u64).read_to_end(&mut head));
    match read {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2TexError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2TexError::FileNotFound { path });
        }
    }
    if !head.starts_with(PDF_MAGIC) {
        return Err(Pdf2TexError::NotAPdf {
            path,
            magic: magic_of(&head),
        });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2TexError> {
    info!("Downloading PDF from: {}", url);

    let parsed = reqwest::Url::parse(url).map_err(|_| Pdf2TexError::InvalidInput {
        input: url.to_string(),
    })?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2TexError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(parsed.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2TexError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2TexError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2TexError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(&parsed);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2TexError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(Pdf2TexError::NotAPdf {
            path: PathBuf::from(filename),
            magic: magic_of(&bytes),
        });
    }

    let temp_dir = TempDir::new().map_err(|e| Pdf2TexError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Pdf2TexError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Pick a file name from the last URL path segment.
///
/// `https://arxiv.org/pdf/1706.03762` has no usable extension, so the
/// segment gets `.pdf` appended; an empty path falls back to `downloaded.pdf`.
fn filename_from_url(url: &reqwest::Url) -> String {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    if last.is_empty() {
        "downloaded.pdf".to_string()
    } else if last.to_ascii_lowercase().ends_with(".pdf") {
        last.to_string()
    } else {
        format!("{last}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("report.pdf")), "report");
        assert_eq!(file_stem(Path::new("dir/sub/q3.final.pdf")), "q3.final");
        assert_eq!(file_stem(Path::new("noext")), "noext");
    }

    #[test]
    fn test_filename_from_url() {
        let u = reqwest::Url::parse("https://host/papers/attention.pdf").unwrap();
        assert_eq!(filename_from_url(&u), "attention.pdf");
        let u = reqwest::Url::parse("https://arxiv.org/pdf/1706.03762").unwrap();
        assert_eq!(filename_from_url(&u), "1706.03762.pdf");
        let u = reqwest::Url::parse("https://host/").unwrap();
        assert_eq!(filename_from_url(&u), "downloaded.pdf");
    }

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pdf");
        let err = resolve_input(missing.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, Pdf2TexError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(dir.path().to_str().unwrap(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2TexError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn non_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("notes.pdf");
        std::fs::write(&p, "hello world").unwrap();
        let err = resolve_input(p.to_str().unwrap(), 5).await.unwrap_err();
        match err {
            Pdf2TexError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn short_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("tiny.pdf");
        std::fs::write(&p, b"%P").unwrap();
        let err = resolve_input(p.to_str().unwrap(), 5).await.unwrap_err();
        match err {
            Pdf2TexError::NotAPdf { magic, .. } => assert_eq!(&magic, b"%P\0\0"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("empty.pdf");
        std::fs::write(&p, b"").unwrap();
        let err = resolve_input(p.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, Pdf2TexError::NotAPdf { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn local_pdf_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("report.pdf");
        std::fs::write(&p, b"%PDF-1.4\n").unwrap();
        let resolved = resolve_input(p.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.path(), p.as_path());
        assert_eq!(resolved.stem(), "report");
        assert!(!resolved.is_downloaded());
    }

    #[tokio::test]
    async fn empty_input_is_invalid() {
        let err = resolve_input("  ", 5).await.unwrap_err();
        assert!(matches!(err, Pdf2TexError::InvalidInput { .. }));
    }
}
