//! PDF text extraction, page by page

use async_trait::async_trait;
use std::path::Path;

use crate::error::{Error, Result};
use crate::providers::DocumentLoader;
use crate::types::Page;

/// Ligatures and typographic characters that PDF fonts commonly emit
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{0000}', ""),
    ('\u{00A0}', " "),  // Non-breaking space
    ('\u{2010}', "-"),  // Hyphen
    ('\u{2011}', "-"),  // Non-breaking hyphen
    ('\u{2013}', "-"),  // En dash
    ('\u{2014}', "--"), // Em dash
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "* "), // Bullet
    ('\u{2026}', "..."),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Normalize extracted PDF text: map glyphs to ASCII, trim lines, collapse blank runs
pub fn cleanup_pdf_text(text: &str) -> String {
    let mut mapped = String::with_capacity(text.len());
    for c in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => mapped.push_str(to),
            None => mapped.push(c),
        }
    }

    let mut out = String::with_capacity(mapped.len());
    let mut blank_run = 0;
    for line in mapped.lines().map(str::trim) {
        if line.is_empty() {
            blank_run += 1;
            // Keep a single blank line as a paragraph break
            if blank_run == 1 && !out.is_empty() {
                out.push('\n');
            }
            continue;
        }
        blank_run = 0;
        out.push_str(line);
        out.push('\n');
    }

    out.trim_end().to_string()
}

/// Loads PDFs from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct PdfLoader;

impl PdfLoader {
    /// Create a loader
    pub fn new() -> Self {
        Self
    }

    /// Extract pages from PDF bytes (blocking)
    ///
    /// Uses lopdf per page; falls back to pdf-extract for the whole document
    /// when lopdf finds no text, in which case everything lands on page 1.
    pub fn extract_pages(filename: &str, data: &[u8]) -> Result<Vec<Page>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::load(filename, format!("Failed to parse PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => {
                    let text = cleanup_pdf_text(&text);
                    if !text.is_empty() {
                        pages.push(Page::new(*page_number, text));
                    }
                }
                Err(e) => {
                    tracing::debug!("{}: no text on page {}: {}", filename, page_number, e);
                }
            }
        }

        if pages.is_empty() {
            tracing::warn!("{}: lopdf found no text, trying pdf-extract", filename);
            match pdf_extract::extract_text_from_mem(data) {
                Ok(text) => {
                    let text = cleanup_pdf_text(&text);
                    if !text.is_empty() {
                        pages.push(Page::new(1, text));
                    }
                }
                Err(e) => {
                    tracing::warn!("{}: pdf-extract failed: {}", filename, e);
                }
            }
        }

        if pages.is_empty() {
            return Err(Error::load(
                filename,
                "PDF has no extractable text (it may be scanned or encrypted)",
            ));
        }

        Ok(pages)
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, location: &Path) -> Result<Vec<Page>> {
        let filename = location
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| location.display().to_string());

        let data = tokio::fs::read(location)
            .await
            .map_err(|e| Error::load(&filename, format!("Failed to read file: {}", e)))?;

        tracing::debug!("Read {} bytes from {}", data.len(), location.display());

        tokio::task::spawn_blocking(move || Self::extract_pages(&filename, &data))
            .await
            .map_err(|e| Error::load(location.display().to_string(), format!("Extraction task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "pdf"
    }
}
