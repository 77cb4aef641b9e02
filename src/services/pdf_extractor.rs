use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use lopdf::{Document, Object};

use crate::error::{AppError, AppResult};
use crate::models::{ExtractedDocument, UploadedFile};
use crate::services::text::truncate_chars;

/// Pulls plain text out of an uploaded PDF, page by page, stopping once
/// `char_cap` characters have been collected.
pub struct PdfExtractor {
    char_cap: usize,
}

impl PdfExtractor {
    pub fn new(char_cap: usize) -> Self {
        Self { char_cap }
    }

    pub fn extract(&self, file: &UploadedFile) -> AppResult<ExtractedDocument> {
        let start = Instant::now();

        tracing::info!(
            "Starting PDF text extraction for file: {} ({} bytes)",
            file.name,
            file.size
        );

        if !file.is_pdf() {
            return Err(AppError::InvalidFile {
                message: "File is not a valid PDF".to_string(),
            });
        }

        let doc = Document::load_mem(&file.content).map_err(|e| {
            tracing::warn!("PDF structure could not be parsed: {}", e);
            AppError::extraction(format!("not a parseable PDF document: {}", e))
        })?;

        let pages = doc.get_pages().len();
        let (mut text, stopped_early) = match self.extract_pages(&doc) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Per-page extraction failed: {}, falling back to pdf-extract", e);
                (extract_whole_document(&file.content)?, false)
            }
        };

        let truncated = truncate_chars(&mut text, self.char_cap) || stopped_early;

        tracing::info!(
            pages = pages,
            extracted_chars = text.chars().count(),
            truncated = truncated,
            "PDF extraction completed in {}ms",
            start.elapsed().as_millis()
        );

        Ok(ExtractedDocument {
            text,
            pages,
            title: info_entry(&doc, b"Title"),
            author: info_entry(&doc, b"Author"),
            file_size_bytes: file.size,
            truncated,
        })
    }

    /// Concatenates page text in page order. Returns the text and whether
    /// pages were left unread because the cap was already exceeded.
    fn extract_pages(&self, doc: &Document) -> lopdf::Result<(String, bool)> {
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut text = String::new();
        let mut chars = 0;

        for (idx, page_number) in page_numbers.iter().enumerate() {
            let page_text = doc.extract_text(&[*page_number])?;
            chars += page_text.chars().count();
            text.push_str(&page_text);

            if chars > self.char_cap {
                let remaining = page_numbers.len() - idx - 1;
                tracing::debug!(
                    page = page_number,
                    skipped_pages = remaining,
                    "Character cap reached, stopping extraction"
                );
                return Ok((text, remaining > 0));
            }
        }

        Ok((text, false))
    }
}

/// pdf-extract decodes some fonts lopdf can not, but panics on others.
fn extract_whole_document(content: &[u8]) -> AppResult<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(content))) {
        Ok(Ok(text)) => {
            tracing::debug!("pdf-extract fallback successful, {} characters", text.len());
            Ok(text)
        }
        Ok(Err(e)) => Err(AppError::extraction(format!("text extraction failed: {}", e))),
        Err(_) => Err(AppError::extraction("text extraction aborted on malformed content")),
    }
}

fn info_entry(doc: &Document, key: &[u8]) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        direct => direct,
    };
    let bytes = info.as_dict().ok()?.get(key).ok()?.as_str().ok()?;

    let decoded = decode_pdf_string(bytes);
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Info strings are either PDFDocEncoding (read as Latin-ish UTF-8 here) or
/// UTF-16 with or without a byte order mark.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        decode_utf16(rest, u16::from_be_bytes)
    } else if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        decode_utf16(rest, u16::from_le_bytes)
    } else if looks_like_utf16(bytes) {
        decode_utf16(bytes, u16::from_be_bytes)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

fn looks_like_utf16(bytes: &[u8]) -> bool {
    if bytes.len() < 2 {
        return false;
    }
    let null_count = bytes.iter().filter(|&&b| b == 0).count();
    null_count > bytes.len() / 3
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .filter_map(Result::ok)
        .filter(|ch| *ch != '\0')
        .collect()
}
