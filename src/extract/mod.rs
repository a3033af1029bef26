//! Plain-text extraction from resume attachments (TXT, PDF, DOCX).
//!
//! The core treats this as an opaque `bytes -> text` collaborator: the
//! caller gets extracted text or a typed failure it can show the user.

use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported format \"{0}\" - send PDF, DOCX, or TXT, or paste the text")]
    UnsupportedFormat(String),

    #[error("file too large ({size} bytes; limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("could not read the document: {0}")]
    Corrupt(String),
}

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Extract plain text from an attachment, routed by MIME type with a
/// filename-extension fallback.
pub fn extract_text(
    file_name: &str,
    mime: Option<&str>,
    data: &[u8],
    max_bytes: u64,
) -> Result<String, ExtractError> {
    if data.len() as u64 > max_bytes {
        return Err(ExtractError::TooLarge {
            size: data.len() as u64,
            limit: max_bytes,
        });
    }

    let name = file_name.to_ascii_lowercase();
    let mime = mime.unwrap_or("").to_ascii_lowercase();

    if mime == "text/plain" || name.ends_with(".txt") {
        return Ok(String::from_utf8_lossy(data).trim().to_string());
    }
    if mime == "application/pdf" || name.ends_with(".pdf") {
        return pdf_text(data);
    }
    if mime == DOCX_MIME || name.ends_with(".docx") {
        return docx_text(data);
    }

    let label = if file_name.is_empty() {
        mime
    } else {
        file_name.to_string()
    };
    Err(ExtractError::UnsupportedFormat(label))
}

fn pdf_text(data: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(data)
        .map(|text| text.trim().to_string())
        .map_err(|err| ExtractError::Corrupt(err.to_string()))
}

fn docx_text(data: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|err| ExtractError::Corrupt(err.to_string()))?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|err| ExtractError::Corrupt(err.to_string()))?;
    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|err| ExtractError::Corrupt(err.to_string()))?;
    Ok(document_xml_to_text(&xml))
}

static TEXT_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t[^>]*>([^<]*)</w:t>").expect("text-run pattern is valid")
});

/// Collect `<w:t>` runs; `</w:p>` paragraph ends become line breaks.
fn document_xml_to_text(xml: &str) -> String {
    let mut paragraphs = Vec::new();
    for paragraph in xml.split("</w:p>") {
        let mut runs = String::new();
        for capture in TEXT_RUN.captures_iter(paragraph) {
            runs.push_str(&unescape_xml(&capture[1]));
        }
        let trimmed = runs.trim();
        if !trimmed.is_empty() {
            paragraphs.push(trimmed.to_string());
        }
    }
    paragraphs.join("\n")
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
