//! Format-specific text extraction for uploaded documents.
//!
//! Dispatch is by file extension: `.pdf` via `pdf-extract`, `.docx`/`.doc`
//! via ZIP + WordprocessingML parsing, `.txt` as UTF-8. An extension outside
//! the allow-list fails with [`ServiceError::UnsupportedFormat`] before any
//! byte is inspected; the pipeline never silently treats an unrecognized
//! upload as empty text.

use std::io::Read;

use crate::error::ServiceError;

/// Extensions accepted by the upload endpoint (lowercase, no dot).
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "docx", "doc", "txt"];

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extract plain text from `bytes` according to the filename's extension.
///
/// Extension matching is case-insensitive. `.doc` is routed through the
/// OOXML extractor; a legacy binary `.doc` payload fails ZIP parsing and
/// surfaces as an extraction error rather than an empty document.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, ServiceError> {
    match file_extension(filename).as_deref() {
        Some("pdf") => extract_pdf(bytes),
        Some("docx") | Some("doc") => extract_docx(bytes),
        Some("txt") => extract_txt(bytes),
        _ => Err(ServiceError::UnsupportedFormat(filename.to_string())),
    }
}

/// Lowercased extension of `filename`, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ServiceError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ServiceError::Extraction(e.to_string()))
}

fn extract_txt(bytes: &[u8]) -> Result<String, ServiceError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| ServiceError::Extraction("text file is not valid UTF-8".to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ServiceError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ServiceError::Extraction(e.to_string()))?;
    let mut doc_xml = Vec::new();
    let mut found = false;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ServiceError::Extraction(e.to_string()))?;
        if entry.name() == "word/document.xml" {
            entry
                .take(MAX_XML_ENTRY_BYTES)
                .read_to_end(&mut doc_xml)
                .map_err(|e| ServiceError::Extraction(e.to_string()))?;
            if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
                return Err(ServiceError::Extraction(
                    "word/document.xml exceeds size limit".to_string(),
                ));
            }
            found = true;
            break;
        }
    }
    if !found {
        return Err(ServiceError::Extraction(
            "word/document.xml not found".to_string(),
        ));
    }
    extract_paragraph_text(&doc_xml)
}

/// Collect `<w:t>` runs grouped by paragraph; paragraphs are newline-joined.
fn extract_paragraph_text(xml: &[u8]) -> Result<String, ServiceError> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        current.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" {
                    paragraphs.push(std::mem::take(&mut current));
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ServiceError::Extraction(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}
