//! MuPDF-backed resolver and renderer for local files

use std::cell::RefCell;
use std::path::Path;

use log::debug;
use mupdf::text_page::TextBlockType;
use mupdf::{Colorspace, Document, Matrix, Page, TextPageFlags};

use super::backend::{DocumentHandle, DocumentResolver, PageImage, PageRenderer};
use super::request::{DocumentFault, DocumentRef};
use super::sequence::PageRequest;

impl From<mupdf::error::Error> for DocumentFault {
    fn from(err: mupdf::error::Error) -> Self {
        Self::Engine(err.to_string())
    }
}

fn open_document(reference: &DocumentRef) -> Result<Document, DocumentFault> {
    if !Path::new(reference.as_str()).exists() {
        return Err(DocumentFault::NotFound(reference.to_string()));
    }
    Ok(Document::open(reference.as_str())?)
}

/// Opens the referenced file and reads its page count and title
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfResolver;

impl DocumentResolver for MupdfResolver {
    fn resolve(&self, reference: &DocumentRef) -> Result<DocumentHandle, DocumentFault> {
        let doc = open_document(reference)?;
        let page_count = usize::try_from(doc.page_count()?)
            .map_err(|_| DocumentFault::generic("negative page count"))?;

        let mut handle = DocumentHandle::new(reference.clone(), page_count);
        if let Ok(title) = doc.metadata(mupdf::MetadataName::Title) {
            if !title.is_empty() {
                handle = handle.with_title(title);
            }
        }

        Ok(handle)
    }
}

/// Rasterizes pages at a fixed zoom, keeping the last document open.
///
/// Holds a MuPDF document, so each worker thread builds its own.
pub struct MupdfRenderer {
    zoom: f32,
    open: RefCell<Option<(DocumentRef, Document)>>,
}

impl MupdfRenderer {
    #[must_use]
    pub fn new(zoom: f32) -> Self {
        Self {
            zoom: zoom.max(0.1),
            open: RefCell::new(None),
        }
    }

    fn with_document<T>(
        &self,
        reference: &DocumentRef,
        f: impl FnOnce(&Document) -> Result<T, DocumentFault>,
    ) -> Result<T, DocumentFault> {
        let mut slot = self.open.borrow_mut();
        if slot.as_ref().is_none_or(|(open, _)| open != reference) {
            debug!("Opening {reference} for rendering");
            *slot = Some((reference.clone(), open_document(reference)?));
        }

        match slot.as_ref() {
            Some((_, doc)) => f(doc),
            None => Err(DocumentFault::generic("document is not open")),
        }
    }
}

impl Default for MupdfRenderer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PageRenderer for MupdfRenderer {
    fn render_page(
        &self,
        document: &DocumentHandle,
        request: &PageRequest,
    ) -> Result<PageImage, DocumentFault> {
        self.with_document(&document.reference, |doc| {
            let page_num = i32::try_from(request.index.zero_based())
                .map_err(|_| DocumentFault::generic("page index out of range"))?;
            let page = doc.load_page(page_num)?;

            let transform = Matrix::new_scale(self.zoom, self.zoom);
            let rgb = Colorspace::device_rgb();
            let pixmap = page.to_pixmap(&transform, &rgb, false, request.options.annotation_layer)?;

            let text = if request.options.text_layer {
                Some(extract_text(&page)?)
            } else {
                None
            };

            Ok(PageImage {
                width_px: pixmap.width(),
                height_px: pixmap.height(),
                text,
            })
        })
    }
}

fn extract_text(page: &Page) -> Result<String, DocumentFault> {
    let text_page = page.to_text_page(TextPageFlags::empty())?;
    let mut out = String::new();

    for block in text_page.blocks() {
        if block.r#type() != TextBlockType::Text {
            continue;
        }
        for line in block.lines() {
            out.extend(line.chars().filter_map(|ch| ch.char()));
            out.push('\n');
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let reference = DocumentRef::new("/definitely/not/here.pdf");
        let err = MupdfResolver.resolve(&reference).unwrap_err();
        assert_eq!(err, DocumentFault::NotFound(reference.to_string()));
    }

    #[test]
    fn renderer_reports_missing_file() {
        let handle = DocumentHandle::new(DocumentRef::new("/definitely/not/here.pdf"), 1);
        let request = super::super::PageSequence::new(1).iter().next().unwrap();
        let err = MupdfRenderer::default()
            .render_page(&handle, &request)
            .unwrap_err();
        assert!(matches!(err, DocumentFault::NotFound(_)));
    }

    fn write_pdf(media_box: &str) -> tempfile::NamedTempFile {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!("<< /Type /Page /Parent 2 0 R /MediaBox [{media_box}] >>"),
        ];

        let mut body = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        for (i, object) in objects.iter().enumerate() {
            offsets.push(body.len());
            body.push_str(&format!("{} 0 obj\n{object}\nendobj\n", i + 1));
        }
        let xref = body.len();
        body.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            body.push_str(&format!("{offset:010} 00000 n \n"));
        }
        body.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        ));

        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        std::io::Write::write_all(&mut file, body.as_bytes()).unwrap();
        file
    }

    fn first_page() -> PageRequest {
        super::super::PageSequence::new(1).iter().next().unwrap()
    }

    #[test]
    fn resolves_page_count_and_renders_at_zoom() {
        let file = write_pdf("0 0 200 100");
        let reference = DocumentRef::new(file.path().to_string_lossy());

        let handle = MupdfResolver.resolve(&reference).unwrap();
        assert_eq!(handle.page_count, 1);

        let image = MupdfRenderer::new(2.0)
            .render_page(&handle, &first_page())
            .unwrap();
        assert_eq!((image.width_px, image.height_px), (400, 200));
        assert!(image.text.is_none());
    }

    #[test]
    fn degenerate_page_box_does_not_panic() {
        let file = write_pdf("0 0 0 0");
        let reference = DocumentRef::new(file.path().to_string_lossy());
        let handle = DocumentHandle::new(reference, 1);

        // Either outcome is fine as long as the worker survives it.
        let _ = MupdfRenderer::default().render_page(&handle, &first_page());
    }
}
