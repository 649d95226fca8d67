//! Thin multi-page canvas over `pdf_writer`. Renderers draw with baseline
//! coordinates (origin bottom-left, y grows upward) and break pages
//! explicitly; this module owns object allocation and the font resources.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

use super::layout::{PAGE_HEIGHT, PAGE_WIDTH};
use super::metrics::{Font, text_width};

pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

pub struct DocumentBuilder {
    title: String,
    author: Option<String>,
    subject: Option<String>,
    keywords: Option<String>,
    finished_pages: Vec<Content>,
    current: Content,
}

impl DocumentBuilder {
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            author: None,
            subject: None,
            keywords: None,
            finished_pages: Vec::new(),
            current: Content::new(),
        }
    }

    pub fn author(&mut self, author: &str) -> &mut Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn subject(&mut self, subject: &str) -> &mut Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn keywords(&mut self, keywords: &str) -> &mut Self {
        self.keywords = Some(keywords.to_string());
        self
    }

    /// Pages emitted so far, counting the one in progress.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.finished_pages.len() + 1
    }

    /// Draws `text` with its left edge at `x`, baseline at `y`.
    pub fn draw_string(&mut self, x: f32, y: f32, font: Font, size: f32, text: &str) {
        self.current
            .begin_text()
            .set_font(Name(font.resource_name()), size)
            .next_line(x, y)
            .show(Str(text.as_bytes()))
            .end_text();
    }

    /// Draws `text` with its right edge at `x`.
    pub fn draw_right_string(&mut self, x: f32, y: f32, font: Font, size: f32, text: &str) {
        let width = text_width(text, font, size);
        self.draw_string(x - width, y, font, size, text);
    }

    /// Draws `text` centered on `x`.
    pub fn draw_centered_string(&mut self, x: f32, y: f32, font: Font, size: f32, text: &str) {
        let width = text_width(text, font, size);
        self.draw_string(x - width / 2.0, y, font, size, text);
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.current.move_to(x1, y1).line_to(x2, y2).stroke();
    }

    /// Stroked rectangle; `(x, y)` is the bottom-left corner.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.current.rect(x, y, width, height).stroke();
    }

    /// Fill gray level for subsequent text, 0.0 black to 1.0 white.
    pub fn set_fill_gray(&mut self, gray: f32) {
        self.current.set_fill_gray(gray);
    }

    /// Closes the page in progress and starts a fresh one.
    pub fn show_page(&mut self) {
        let content = std::mem::replace(&mut self.current, Content::new());
        self.finished_pages.push(content);
    }

    /// Serializes the document, closing the page in progress.
    #[must_use]
    pub fn finish(mut self) -> RenderedPdf {
        self.show_page();
        let page_count = self.finished_pages.len();

        let mut alloc = RefAllocator::default();
        let catalog_id = alloc.next();
        let page_tree_id = alloc.next();
        let helvetica_id = alloc.next();
        let helvetica_bold_id = alloc.next();
        let info_id = alloc.next();

        let page_refs: Vec<(Ref, Ref)> = self
            .finished_pages
            .iter()
            .map(|_| (alloc.next(), alloc.next()))
            .collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);

        {
            let mut pages = pdf.pages(page_tree_id);
            pages.kids(page_refs.iter().map(|(page_id, _)| *page_id));
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            pages.count(page_count as i32);
        }

        for ((page_id, content_id), content) in page_refs.iter().zip(self.finished_pages) {
            let mut page = pdf.page(*page_id);
            page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
            page.parent(page_tree_id);
            page.contents(*content_id);
            {
                let mut resources = page.resources();
                let mut fonts = resources.fonts();
                fonts.pair(
                    Name(Font::Helvetica.resource_name()),
                    helvetica_id,
                );
                fonts.pair(
                    Name(Font::HelveticaBold.resource_name()),
                    helvetica_bold_id,
                );
            }
            page.finish();

            pdf.stream(*content_id, &content.finish());
        }

        pdf.type1_font(helvetica_id)
            .base_font(Name(Font::Helvetica.base_name().as_bytes()));
        pdf.type1_font(helvetica_bold_id)
            .base_font(Name(Font::HelveticaBold.base_name().as_bytes()));

        {
            let mut info = pdf.document_info(info_id);
            info.title(TextStr(&self.title));
            if let Some(author) = &self.author {
                info.author(TextStr(author));
            }
            if let Some(subject) = &self.subject {
                info.subject(TextStr(subject));
            }
            if let Some(keywords) = &self.keywords {
                info.keywords(TextStr(keywords));
            }
        }

        RenderedPdf {
            bytes: pdf.finish(),
            page_count,
        }
    }
}

#[derive(Default)]
struct RefAllocator {
    next: i32,
}

impl RefAllocator {
    fn next(&mut self) -> Ref {
        self.next += 1;
        Ref::new(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page_document() {
        let mut builder = DocumentBuilder::new("Test");
        builder.draw_string(72.0, 700.0, Font::Helvetica, 11.0, "hello");
        let rendered = builder.finish();
        assert_eq!(rendered.page_count, 1);
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn page_breaks_accumulate() {
        let mut builder = DocumentBuilder::new("Test");
        builder.draw_string(72.0, 700.0, Font::Helvetica, 11.0, "one");
        builder.show_page();
        builder.draw_string(72.0, 700.0, Font::Helvetica, 11.0, "two");
        assert_eq!(builder.page_count(), 2);
        let rendered = builder.finish();
        assert_eq!(rendered.page_count, 2);
    }

    #[test]
    fn body_text_survives_in_stream() {
        let mut builder = DocumentBuilder::new("Test");
        builder.draw_string(72.0, 700.0, Font::Helvetica, 11.0, "Net Pay marker");
        let rendered = builder.finish();
        let haystack = rendered.bytes;
        assert!(
            haystack
                .windows(b"Net Pay marker".len())
                .any(|w| w == b"Net Pay marker")
        );
    }
}
