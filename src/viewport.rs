//! Height-capped, independently scrolling region that hosts page views

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};

use crate::theme::Palette;
use crate::viewer::{LoadState, PageContent, PageView};

/// Carve the viewport out of `outer`: full width, at most `height_percent`
/// of the height, anchored at the top.
#[must_use]
pub fn viewport_area(outer: Rect, height_percent: u16) -> Rect {
    let [area, _] = Layout::vertical([
        Constraint::Percentage(height_percent.min(100)),
        Constraint::Fill(1),
    ])
    .areas(outer);
    area
}

/// Scroll position of a viewport, in rows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewportState {
    offset: u16,
    content_rows: u16,
    visible_rows: u16,
}

impl ViewportState {
    #[must_use]
    pub fn offset(&self) -> u16 {
        self.offset
    }

    #[must_use]
    pub fn max_offset(&self) -> u16 {
        self.content_rows.saturating_sub(self.visible_rows)
    }

    /// Record the current geometry and pull the offset back into range
    pub fn set_geometry(&mut self, content_rows: u16, visible_rows: u16) {
        self.content_rows = content_rows;
        self.visible_rows = visible_rows;
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.offset = self.offset.saturating_add(rows).min(self.max_offset());
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.offset = self.offset.saturating_sub(rows);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.visible_rows.max(1));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.visible_rows.max(1));
    }

    pub fn home(&mut self) {
        self.offset = 0;
    }

    pub fn end(&mut self) {
        self.offset = self.max_offset();
    }
}

/// Renders the page views of one viewer inside a bordered, scrolling box
pub struct Viewport<'a> {
    pages: &'a [PageView],
    load: &'a LoadState,
    palette: Palette,
    page_height: u16,
}

impl<'a> Viewport<'a> {
    #[must_use]
    pub fn new(pages: &'a [PageView], load: &'a LoadState, palette: Palette) -> Self {
        Self {
            pages,
            load,
            palette,
            page_height: 12,
        }
    }

    #[must_use]
    pub fn page_height(mut self, rows: u16) -> Self {
        self.page_height = rows.max(3);
        self
    }

    fn title(&self) -> String {
        match self.load {
            LoadState::NotLoaded => String::new(),
            LoadState::Loading { reference, .. } => format!(" {reference} "),
            LoadState::Loaded { handle } => {
                let name = handle
                    .title
                    .clone()
                    .unwrap_or_else(|| handle.reference.to_string());
                let noun = if handle.page_count == 1 { "page" } else { "pages" };
                format!(" {name} ({} {noun}) ", handle.page_count)
            }
            LoadState::Failed { reference, .. } => format!(" {reference} "),
        }
    }

    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        match self.load {
            LoadState::Loading { reference, .. } => {
                return vec![Line::styled(
                    format!("Loading {reference}…"),
                    Style::default().fg(self.palette.muted),
                )];
            }
            LoadState::Failed { reason, .. } => {
                return vec![Line::styled(
                    format!("Failed to load: {reason}"),
                    Style::default().fg(self.palette.error),
                )];
            }
            LoadState::NotLoaded | LoadState::Loaded { .. } => {}
        }

        let mut lines = Vec::with_capacity(self.pages.len() * usize::from(self.page_height));
        for page in self.pages {
            lines.extend(self.page_lines(page, width));
        }
        lines
    }

    fn page_lines(&self, page: &PageView, width: u16) -> Vec<Line<'static>> {
        let height = usize::from(self.page_height);
        let label = format!("─ Page {} ", page.request.index);
        let rule = "─".repeat(usize::from(width).saturating_sub(label.chars().count()));

        let mut lines = vec![Line::from(Span::styled(
            format!("{label}{rule}"),
            Style::default()
                .fg(self.palette.border)
                .add_modifier(Modifier::BOLD),
        ))];

        match &page.content {
            PageContent::Rendered(image) => {
                lines.push(Line::styled(
                    format!("{}×{} px", image.width_px, image.height_px),
                    Style::default().fg(self.palette.text),
                ));
                if let Some(text) = &image.text {
                    let style = Style::default().fg(self.palette.muted);
                    lines.extend(
                        text.lines()
                            .take(height.saturating_sub(2))
                            .map(|l| Line::styled(l.to_string(), style)),
                    );
                }
            }
            PageContent::Pending => {
                lines.push(Line::styled(
                    "Rendering…",
                    Style::default().fg(self.palette.muted),
                ));
            }
            PageContent::Failed(reason) => {
                lines.push(Line::styled(
                    reason.clone(),
                    Style::default().fg(self.palette.error),
                ));
            }
        }

        lines.resize(height, Line::default());
        lines
    }
}

impl StatefulWidget for Viewport<'_> {
    type State = ViewportState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut ViewportState) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.palette.border))
            .title(self.title());
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.lines(inner.width);
        let content_rows = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        state.set_geometry(content_rows, inner.height);

        Paragraph::new(lines)
            .scroll((state.offset, 0))
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::{DocumentHandle, DocumentRef, LoadId, PageImage, PageSequence};

    fn views(count: usize) -> Vec<PageView> {
        PageSequence::new(count)
            .iter()
            .map(|request| PageView {
                request,
                content: PageContent::Rendered(PageImage {
                    width_px: 612,
                    height_px: 792,
                    text: None,
                }),
            })
            .collect()
    }

    fn buffer_text(buf: &Buffer) -> Vec<String> {
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn viewport_area_is_capped() {
        let area = viewport_area(Rect::new(0, 0, 80, 40), 55);
        assert_eq!(area.width, 80);
        assert_eq!(area.height, 22);
        assert_eq!(area.y, 0);
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let mut state = ViewportState::default();
        state.set_geometry(30, 10);
        state.scroll_down(100);
        assert_eq!(state.offset(), 20);
        state.scroll_up(5);
        assert_eq!(state.offset(), 15);
        state.home();
        assert_eq!(state.offset(), 0);
        state.end();
        assert_eq!(state.offset(), 20);

        state.set_geometry(12, 10);
        assert_eq!(state.offset(), 2);
    }

    #[test]
    fn renders_one_block_per_page() {
        let pages = views(3);
        let load = LoadState::Loaded {
            handle: DocumentHandle::new(DocumentRef::new("doc-a.pdf"), 3),
        };
        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        let mut state = ViewportState::default();

        Viewport::new(&pages, &load, Palette::default())
            .page_height(4)
            .render(area, &mut buf, &mut state);

        let text = buffer_text(&buf);
        assert!(text[0].contains("doc-a.pdf (3 pages)"));
        assert!(text[1].contains("─ Page 1"));
        assert!(text[5].contains("─ Page 2"));
        assert!(text[9].contains("─ Page 3"));
        assert!(text[2].contains("612×792 px"));
        assert_eq!(state.max_offset(), 0);
    }

    #[test]
    fn scrolled_viewport_skips_rows() {
        let pages = views(5);
        let load = LoadState::Loaded {
            handle: DocumentHandle::new(DocumentRef::new("doc-a.pdf"), 5),
        };
        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        let mut state = ViewportState::default();

        Viewport::new(&pages, &load, Palette::default())
            .page_height(4)
            .render(area, &mut buf, &mut state);
        assert_eq!(state.max_offset(), 16);

        state.scroll_down(4);
        let mut buf = Buffer::empty(area);
        Viewport::new(&pages, &load, Palette::default())
            .page_height(4)
            .render(area, &mut buf, &mut state);
        assert!(buffer_text(&buf)[1].contains("─ Page 2"));
    }

    #[test]
    fn loading_and_failure_have_messages() {
        let area = Rect::new(0, 0, 50, 5);

        let loading = LoadState::Loading {
            reference: DocumentRef::new("doc-a.pdf"),
            id: LoadId::new(1),
        };
        let mut buf = Buffer::empty(area);
        Viewport::new(&[], &loading, Palette::default()).render(
            area,
            &mut buf,
            &mut ViewportState::default(),
        );
        assert!(buffer_text(&buf)[1].contains("Loading doc-a.pdf"));

        let failed = LoadState::Failed {
            reference: DocumentRef::new("doc-a.pdf"),
            reason: "boom".into(),
        };
        let mut buf = Buffer::empty(area);
        Viewport::new(&[], &failed, Palette::default()).render(
            area,
            &mut buf,
            &mut ViewportState::default(),
        );
        assert!(buffer_text(&buf)[1].contains("Failed to load: boom"));
    }

    #[test]
    fn pending_page_shows_placeholder() {
        let mut pages = views(2);
        pages[1].content = PageContent::Pending;
        let load = LoadState::Loaded {
            handle: DocumentHandle::new(DocumentRef::new("doc-a.pdf"), 2),
        };
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);

        Viewport::new(&pages, &load, Palette::default())
            .page_height(4)
            .render(area, &mut buf, &mut ViewportState::default());

        let text = buffer_text(&buf);
        assert!(text[5].contains("─ Page 2"));
        assert!(text[6].contains("Rendering…"));
    }

    #[test]
    fn no_document_renders_empty_frame() {
        let area = Rect::new(0, 0, 20, 4);
        let mut buf = Buffer::empty(area);
        let mut state = ViewportState::default();
        Viewport::new(&[], &LoadState::NotLoaded, Palette::default())
            .render(area, &mut buf, &mut state);

        let text = buffer_text(&buf);
        assert_eq!(text[1].trim_matches(|c| c == '│' || c == ' '), "");
        assert_eq!(state.max_offset(), 0);
    }
}
