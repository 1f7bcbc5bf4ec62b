//! Text extraction from uploaded report files.
//!
//! Every extractor failure degrades to an empty string: to the analyzer an
//! unreadable file looks the same as a file with no known parameters.

use std::path::Path;

use docx_rs::{DocumentChild, InsertChild, ParagraphChild, Run, RunChild};
use image::{ImageBuffer, Rgb, RgbImage};
use mupdf::{Colorspace, Device, Document, Matrix, Pixmap, TextPageOptions};
use ocrs::{ImageSource, OcrEngine};

use crate::error::{Error, Result};

/// Rasterization resolution for PDF pages without a text layer.
const OCR_DPI: f32 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Image,
    Pdf,
    WordDocument,
    PlainText,
}

impl DocumentKind {
    /// Detect the kind from the file extension, ignoring case.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "png" | "jpg" | "jpeg" => Ok(DocumentKind::Image),
            "pdf" => Ok(DocumentKind::Pdf),
            "doc" | "docx" => Ok(DocumentKind::WordDocument),
            "txt" => Ok(DocumentKind::PlainText),
            _ => Err(Error::UnsupportedFormat(filename.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Image => "image",
            DocumentKind::Pdf => "pdf",
            DocumentKind::WordDocument => "word",
            DocumentKind::PlainText => "text",
        }
    }
}

/// Pulls lowercase text out of report files. OCR is optional; without an
/// engine images and scanned PDF pages yield no text.
pub struct TextExtractor {
    ocr: Option<OcrEngine>,
}

impl TextExtractor {
    pub fn new(ocr: Option<OcrEngine>) -> Self {
        Self { ocr }
    }

    pub fn without_ocr() -> Self {
        Self { ocr: None }
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract and lowercase the text of `path`. Never fails.
    pub fn extract(&self, path: &Path, kind: DocumentKind) -> String {
        match self.try_extract(path, kind) {
            Ok(text) => {
                tracing::debug!(kind = kind.as_str(), chars = text.len(), "text extracted");
                text.to_lowercase()
            }
            Err(e) => {
                tracing::warn!(kind = kind.as_str(), path = %path.display(), error = %e, "text extraction failed");
                String::new()
            }
        }
    }

    fn try_extract(&self, path: &Path, kind: DocumentKind) -> Result<String> {
        match kind {
            DocumentKind::Image => self.extract_image(path),
            DocumentKind::Pdf => self.extract_pdf(path),
            DocumentKind::WordDocument => extract_docx(path),
            DocumentKind::PlainText => extract_plain_text(path),
        }
    }

    fn engine(&self) -> Result<&OcrEngine> {
        self.ocr
            .as_ref()
            .ok_or_else(|| Error::Extraction("no OCR engine loaded".to_string()))
    }

    fn extract_image(&self, path: &Path) -> Result<String> {
        let engine = self.engine()?;

        // Load and decode the image
        let img = image::io::Reader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| Error::Extraction(format!("failed to decode image: {e}")))?
            .into_rgb8();
        Ok(recognize_page(engine, img)?.join("\n"))
    }

    /// Text layer of every page, one page per line block. Pages with an
    /// empty text layer go through OCR when an engine is available.
    fn extract_pdf(&self, path: &Path) -> Result<String> {
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Extraction("PDF path is not valid UTF-8".to_string()))?;

        // Open PDF document
        let doc = Document::open(path_str).map_err(pdf_error)?;

        // Get number of pages
        let page_count = doc.page_count().map_err(pdf_error)?;

        // Process each page
        let pages = (0..page_count).map(|page_num| (page_num, self.pdf_page_text(&doc, page_num)));
        Ok(join_pages(pages))
    }

    fn pdf_page_text(&self, doc: &Document, page_num: i32) -> Result<String> {
        let page = doc.load_page(page_num).map_err(pdf_error)?;

        // Try the embedded text layer first
        let text = page
            .to_text_page(TextPageOptions::empty())
            .and_then(|tp| tp.to_text())
            .map_err(pdf_error)?;
        if !text.trim().is_empty() {
            return Ok(text);
        }

        // Scanned page: render and OCR it
        let Some(engine) = &self.ocr else {
            return Ok(text);
        };
        tracing::debug!(page = page_num + 1, "no text layer, running OCR");
        let img = pdf_page_to_image(doc, page_num, OCR_DPI)?;
        Ok(recognize_page(engine, img)?.join("\n"))
    }
}

fn pdf_error(e: mupdf::Error) -> Error {
    Error::Extraction(format!("PDF error: {e}"))
}

/// Newline-joined page texts. A page that failed is logged and left out.
fn join_pages(pages: impl IntoIterator<Item = (i32, Result<String>)>) -> String {
    let mut text = String::new();
    for (page_num, page_text) in pages {
        match page_text {
            Ok(page_text) if !page_text.is_empty() => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(page = page_num + 1, error = %e, "skipping unreadable page"),
        }
    }
    text
}

/// Paragraph texts joined by newlines. Within a paragraph, tabs and line
/// breaks are kept, so tab-aligned columns stay apart.
fn extract_docx(path: &Path) -> Result<String> {
    let content = std::fs::read(path)?;
    let docx = docx_rs::read_docx(&content)
        .map_err(|e| Error::Extraction(format!("failed to parse DOCX: {e}")))?;

    let mut text = String::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(para) = child {
            push_paragraph_text(&mut text, para.children);
            text.push('\n');
        }
    }
    Ok(text)
}

fn push_paragraph_text(text: &mut String, children: Vec<ParagraphChild>) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(text, *run),
            // Link text and tracked insertions read as ordinary runs
            ParagraphChild::Hyperlink(link) => push_paragraph_text(text, link.children),
            ParagraphChild::Insert(insert) => {
                for child in insert.children {
                    if let InsertChild::Run(run) = child {
                        push_run_text(text, *run);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run_text(text: &mut String, run: Run) {
    for child in run.children {
        match child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

/// UTF-8 with invalid byte sequences dropped.
fn extract_plain_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(decode_utf8_lossless(&bytes))
}

fn decode_utf8_lossless(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Render a PDF page to a black and white RGB image.
fn pdf_page_to_image(doc: &Document, page_num: i32, dpi: f32) -> Result<RgbImage> {
    let page = doc.load_page(page_num).map_err(pdf_error)?;

    let bounds = page.bounds().map_err(pdf_error)?;
    let scale = dpi / 72.0; // PDF points are 1/72 inch
    let width = ((bounds.x1 - bounds.x0) * scale) as i32;
    let height = ((bounds.y1 - bounds.y0) * scale) as i32;

    // Render page to a grayscale pixmap
    let transform = Matrix::new_scale(scale, scale);

    let mut pixmap = Pixmap::new_with_w_h(&Colorspace::device_gray(), width, height, false)
        .map_err(pdf_error)?;
    pixmap.clear().map_err(pdf_error)?;

    let device = Device::from_pixmap(&pixmap).map_err(pdf_error)?;
    page.run(&device, &transform).map_err(pdf_error)?;

    let samples = pixmap.samples();
    let mut img = ImageBuffer::new(width as u32, height as u32);

    // Fixed threshold; low enough to keep light text
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            if idx < samples.len() {
                let value = if samples[idx] < 160 { 0 } else { 255 };
                img.put_pixel(x as u32, y as u32, Rgb([value, value, value]));
            }
        }
    }

    Ok(img)
}

/// Run OCR over one image and return the recognized lines.
fn recognize_page(engine: &OcrEngine, mut img: RgbImage) -> Result<Vec<String>> {
    // Contrast boost
    for pixel in img.pixels_mut() {
        let r = (pixel[0] as f32 * 1.2).min(255.0) as u8;
        let g = (pixel[1] as f32 * 1.2).min(255.0) as u8;
        let b = (pixel[2] as f32 * 1.2).min(255.0) as u8;
        *pixel = Rgb([r, g, b]);
    }

    let ocr_error = |stage: &str, e: &dyn std::fmt::Display| Error::Extraction(format!("{stage}: {e}"));

    // Convert image to OCR input format
    let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
        .map_err(|e| ocr_error("failed to create image source", &e))?;
    let ocr_input = engine
        .prepare_input(img_source)
        .map_err(|e| ocr_error("failed to prepare OCR input", &e))?;

    // Detect words and group into lines
    let word_rects = engine
        .detect_words(&ocr_input)
        .map_err(|e| ocr_error("failed to detect words", &e))?;
    let line_rects = engine.find_text_lines(&ocr_input, &word_rects);

    // Recognize text in each line
    let line_texts = engine
        .recognize_text(&ocr_input, &line_rects)
        .map_err(|e| ocr_error("failed to recognize text", &e))?;

    Ok(line_texts
        .iter()
        .flatten()
        .map(|line| line.to_string())
        .collect())
}
