//! PDF text extraction: pull per-page text out of the document via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling while pdfium walks the page trees.
//!
//! ## Why pdfium's text layer, not OCR?
//!
//! Procurement documents exported from tender systems carry a real text
//! layer, and pdfium reproduces its layout quirks (running headers, margin
//! column text folded into body lines) consistently. The downstream cleanup
//! stages depend on exactly those quirks, so the raw text is returned
//! untouched here, one string per page.

use crate::error::Pdf2KravError;
use crate::output::DocumentMetadata;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Raw per-page text plus document metadata, extracted in one pass.
pub struct PdfText {
    /// One entry per page, in page order. Pages without a text layer are
    /// empty strings.
    pub pages: Vec<String>,
    pub metadata: DocumentMetadata,
}

/// Extract the text layer of every page, in page order.
pub async fn extract_pdf_text(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<PdfText, Pdf2KravError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_pdf_text_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2KravError::Internal(format!("Text extraction task panicked: {}", e)))?
}

fn extract_pdf_text_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<PdfText, Pdf2KravError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let page_count = pages.len();
    info!("PDF loaded: {} pages", page_count);

    let mut texts = Vec::with_capacity(page_count as usize);
    for idx in 0..page_count {
        let page = pages.get(idx).map_err(|e| Pdf2KravError::PageTextFailed {
            page: idx as usize + 1,
            detail: format!("{:?}", e),
        })?;
        let text = page
            .text()
            .map_err(|e| Pdf2KravError::PageTextFailed {
                page: idx as usize + 1,
                detail: format!("{:?}", e),
            })?
            .all();
        debug!("Page {}: {} chars of text", idx + 1, text.chars().count());
        texts.push(text);
    }

    let metadata = metadata_from(&document);
    Ok(PdfText {
        pages: texts,
        metadata,
    })
}

/// Extract document metadata from a PDF without touching page text.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2KravError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = load_document(&pdfium, &path, pwd.as_deref())?;
        Ok(metadata_from(&document))
    })
    .await
    .map_err(|e| Pdf2KravError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Locate and bind the pdfium dynamic library.
///
/// Tried in order: the directory named by `PDFIUM_LIB_PATH`, the current
/// directory, the system library search path.
fn bind_pdfium() -> Result<Pdfium, Pdf2KravError> {
    if let Ok(dir) = std::env::var("PDFIUM_LIB_PATH") {
        if !dir.is_empty() {
            if let Ok(bindings) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            {
                return Ok(Pdfium::new(bindings));
            }
            debug!("No usable pdfium library in PDFIUM_LIB_PATH={}", dir);
        }
    }

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Pdf2KravError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2KravError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2KravError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2KravError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2KravError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

fn metadata_from(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    let version = match document.version() {
        PdfDocumentVersion::Unset => None,
        v => Some(format!("{:?}", v)),
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: version,
    }
}
