//! Document text extraction for uploaded resumes.
//!
//! PDF goes through `pdf-extract`; DOCX is a ZIP container whose body lives
//! in `word/document.xml`, so we read that entry and collect the text runs.
//! Either path produces plain text or a typed `DocumentError` — the field
//! extractor never sees raw bytes.

use std::io::{Cursor, Read};

use tracing::debug;

use crate::errors::DocumentError;

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Detects the document kind from upload metadata. The declared content
    /// type wins; the filename extension covers clients that upload as
    /// `application/octet-stream`.
    pub fn detect(filename: &str, content_type: Option<&str>) -> Result<Self, DocumentError> {
        if let Some(ct) = content_type {
            if ct.eq_ignore_ascii_case("application/pdf") {
                return Ok(DocumentKind::Pdf);
            }
            if ct.eq_ignore_ascii_case(DOCX_MIME) {
                return Ok(DocumentKind::Docx);
            }
        }

        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            Ok(DocumentKind::Pdf)
        } else if lower.ends_with(".docx") {
            Ok(DocumentKind::Docx)
        } else {
            let ext = lower.rsplit('.').next().unwrap_or("unknown").to_string();
            Err(DocumentError::UnsupportedFormat(ext))
        }
    }
}

/// Extracts plain text from an uploaded document payload.
/// A document with no extractable text is treated as unreadable — there is
/// nothing for the field extractor to work with.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, DocumentError> {
    let text = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| DocumentError::Unreadable(format!("PDF extraction failed: {e}")))?,
        DocumentKind::Docx => extract_docx_text(bytes)?,
    };

    if text.trim().is_empty() {
        return Err(DocumentError::Unreadable(
            "document contains no extractable text".to_string(),
        ));
    }

    debug!("Extracted {} chars from {:?} upload", text.len(), kind);
    Ok(text)
}

/// Walks `word/document.xml` events, collecting `w:t` text with a newline
/// appended per closing `w:p` so the extractor sees one paragraph per line.
fn extract_docx_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocumentError::Unreadable(format!("not a DOCX archive: {e}")))?;

    let mut doc_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| DocumentError::Unreadable("missing word/document.xml".to_string()))?
        .read_to_string(&mut doc_xml)
        .map_err(|e| DocumentError::Unreadable(format!("unreadable document.xml: {e}")))?;

    let mut reader = quick_xml::Reader::from_str(&doc_xml);
    let mut text = String::new();
    let mut in_text_run = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(quick_xml::events::Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(ref e)) => {
                if in_text_run {
                    if let Ok(run) = e.unescape() {
                        text.push_str(&run);
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::Unreadable(format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document.as_bytes()).unwrap();
        writer.finish().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_detect_prefers_content_type() {
        let kind = DocumentKind::detect("upload.bin", Some("application/pdf")).unwrap();
        assert_eq!(kind, DocumentKind::Pdf);

        let kind = DocumentKind::detect("upload.bin", Some(DOCX_MIME)).unwrap();
        assert_eq!(kind, DocumentKind::Docx);
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        assert_eq!(
            DocumentKind::detect("Resume.PDF", None).unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::detect("cv.docx", Some("application/octet-stream")).unwrap(),
            DocumentKind::Docx
        );
    }

    #[test]
    fn test_detect_rejects_other_formats() {
        let err = DocumentKind::detect("notes.txt", Some("text/plain")).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let bytes = docx_bytes(&["Jane Doe", "jane.doe@example.com", "+1 555 010 0199"]);
        let text = extract_text(DocumentKind::Docx, &bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["Jane Doe", "jane.doe@example.com", "+1 555 010 0199"]);
    }

    #[test]
    fn test_docx_unescapes_entities() {
        let bytes = docx_bytes(&["Fisher &amp; Sons"]);
        let text = extract_text(DocumentKind::Docx, &bytes).unwrap();
        assert_eq!(text.trim(), "Fisher & Sons");
    }

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        let err = extract_text(DocumentKind::Pdf, b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, DocumentError::Unreadable(_)));

        let err = extract_text(DocumentKind::Docx, b"definitely not a zip").unwrap_err();
        assert!(matches!(err, DocumentError::Unreadable(_)));
    }

    #[test]
    fn test_zip_without_document_xml_is_unreadable() {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("mimetype", options).unwrap();
        writer.write_all(b"application/zip").unwrap();
        writer.finish().unwrap();

        let err = extract_text(DocumentKind::Docx, &cursor.into_inner()).unwrap_err();
        assert!(matches!(err, DocumentError::Unreadable(_)));
    }

    #[test]
    fn test_docx_with_no_text_is_unreadable() {
        let bytes = docx_bytes(&[]);
        let err = extract_text(DocumentKind::Docx, &bytes).unwrap_err();
        assert!(matches!(err, DocumentError::Unreadable(_)));
    }
}
