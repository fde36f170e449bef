// Text Processing Service
// Upload text extraction (.txt / .pdf) and log-safe previews

use std::path::Path;
use thiserror::Error;

/// Uploads above this size are refused before extraction.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const PREVIEW_CHARS: usize = 100;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Please upload a .txt or .pdf file")]
    UnsupportedType(String),
    #[error("File size must be less than 5MB")]
    TooLarge { size: usize },
    #[error("Text file is not valid UTF-8")]
    InvalidEncoding,
    #[error("failed to extract text: {0}")]
    Extraction(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    PlainText,
    Pdf,
}

/// Decide how to read an upload. The declared MIME type wins; the extension is
/// the fallback for clients that send `application/octet-stream` or nothing.
pub fn detect_upload_kind(file_name: &str, content_type: Option<&str>) -> Result<UploadKind, UploadError> {
    let mime = content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    match mime.as_str() {
        "text/plain" => return Ok(UploadKind::PlainText),
        "application/pdf" => return Ok(UploadKind::Pdf),
        _ => {}
    }

    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" => Ok(UploadKind::PlainText),
        "pdf" => Ok(UploadKind::Pdf),
        _ => Err(UploadError::UnsupportedType(if mime.is_empty() {
            file_name.to_string()
        } else {
            mime
        })),
    }
}

/// Pull plain text out of an uploaded file. PDF extraction is CPU-bound; call this
/// from a blocking context.
pub fn extract_upload_text(
    file_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, UploadError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { size: bytes.len() });
    }

    match detect_upload_kind(file_name, content_type)? {
        UploadKind::PlainText => {
            let text = std::str::from_utf8(bytes).map_err(|_| UploadError::InvalidEncoding)?;
            // Drop a UTF-8 BOM; everything else is analyzed as written.
            Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
        }
        UploadKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| UploadError::Extraction(e.to_string())),
    }
}

/// Short single-line excerpt for logs, so full submissions never land in log files.
pub fn preview(s: &str) -> String {
    preview_chars(s, PREVIEW_CHARS)
}

pub fn preview_chars(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_upload_kind() {
        assert_eq!(
            detect_upload_kind("a.bin", Some("text/plain; charset=utf-8")).unwrap(),
            UploadKind::PlainText
        );
        assert_eq!(
            detect_upload_kind("paper.PDF", Some("application/octet-stream")).unwrap(),
            UploadKind::Pdf
        );
        assert!(matches!(
            detect_upload_kind("notes.docx", None),
            Err(UploadError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_extract_plain_text() {
        let text = extract_upload_text("essay.txt", None, "\u{feff}Hello world".as_bytes()).unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_rejects_oversized_upload() {
        let bytes = vec![b'a'; MAX_UPLOAD_BYTES + 1];
        let err = extract_upload_text("big.txt", Some("text/plain"), &bytes).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
        assert_eq!(err.to_string(), "File size must be less than 5MB");
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let err = extract_upload_text("x.txt", None, &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, UploadError::InvalidEncoding));
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview_chars("line one\nline two", 8), "line one...");
        assert_eq!(preview("short"), "short");
    }
}
