use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use log::{debug, info};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Layout},
    style::Style,
    text::Line,
    widgets::Paragraph,
};

use crate::event_source::EventSource;
use crate::settings::Settings;
use crate::theme::Palette;
use crate::viewer::{DocumentRef, LoadState, ViewerController};
use crate::viewport::{Viewport, ViewportState, viewport_area};

const TICK_RATE: Duration = Duration::from_millis(50);
const HELP: &str = "j/k: Scroll | PgUp/PgDn: Page | g/G: Top/Bottom | n/p: Document | r: Reload | q: Quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Terminal front end: one viewer, a list of documents to flip through
pub struct App {
    viewer: ViewerController,
    documents: Vec<DocumentRef>,
    current: usize,
    viewport: ViewportState,
    settings: Settings,
    palette: Palette,
}

impl App {
    pub fn new(
        mut viewer: ViewerController,
        documents: Vec<DocumentRef>,
        settings: Settings,
        palette: Palette,
    ) -> Self {
        viewer.set_document(documents.first().cloned());
        Self {
            viewer,
            documents,
            current: 0,
            viewport: ViewportState::default(),
            settings,
            palette,
        }
    }

    #[must_use]
    pub fn viewer(&self) -> &ViewerController {
        &self.viewer
    }

    #[must_use]
    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    /// Apply finished loads; returns whether anything changed
    pub fn tick(&mut self) -> bool {
        self.viewer.poll()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        let step = self.settings.scroll_step;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppAction::Quit),
            KeyCode::Char('j') | KeyCode::Down => self.viewport.scroll_down(step),
            KeyCode::Char('k') | KeyCode::Up => self.viewport.scroll_up(step),
            KeyCode::PageDown | KeyCode::Char(' ') => self.viewport.page_down(),
            KeyCode::PageUp => self.viewport.page_up(),
            KeyCode::Char('g') | KeyCode::Home => self.viewport.home(),
            KeyCode::Char('G') | KeyCode::End => self.viewport.end(),
            KeyCode::Char('n') => self.switch_document(1),
            KeyCode::Char('p') => self.switch_document(self.documents.len().saturating_sub(1)),
            KeyCode::Char('r') => {
                info!("Reloading current document");
                self.viewer.reload();
                self.viewport.home();
            }
            _ => {}
        }
        None
    }

    fn switch_document(&mut self, delta: usize) {
        if self.documents.len() < 2 {
            return;
        }
        self.current = (self.current + delta) % self.documents.len();
        debug!("Switching to document {}", self.current + 1);
        self.viewer
            .set_document(self.documents.get(self.current).cloned());
        self.viewport.home();
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let [header, body, help] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(
            Paragraph::new(self.header_line()).style(Style::default().fg(self.palette.text)),
            header,
        );

        let area = viewport_area(body, self.settings.viewport_height_percent);
        let viewport = Viewport::new(
            self.viewer.pages(),
            self.viewer.load_state(),
            self.palette,
        )
        .page_height(self.settings.page_height_rows);
        frame.render_stateful_widget(viewport, area, &mut self.viewport);

        frame.render_widget(
            Paragraph::new(HELP).style(Style::default().fg(self.palette.muted)),
            help,
        );
    }

    fn header_line(&self) -> Line<'static> {
        if self.documents.is_empty() {
            return Line::from("pageview: no document");
        }
        let status = match self.viewer.load_state() {
            LoadState::NotLoaded => "idle".to_string(),
            LoadState::Loading { .. } => "loading".to_string(),
            LoadState::Loaded { handle } => match self.viewer.pages_pending() {
                0 => format!("{} pages", handle.page_count),
                pending => format!("{} pages, {pending} rendering", handle.page_count),
            },
            LoadState::Failed { .. } => "failed".to_string(),
        };
        Line::from(format!(
            "pageview: document {}/{} [{status}]",
            self.current + 1,
            self.documents.len()
        ))
    }
}

pub fn run_app_with_event_source<B>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B: ratatui::backend::Backend,
    B::Error: Send + Sync + 'static,
{
    loop {
        app.tick();
        terminal.draw(|f| app.draw(f))?;

        if event_source.poll(TICK_RATE)? {
            if let Event::Key(key) = event_source.read()? {
                if app.handle_key(key) == Some(AppAction::Quit) {
                    return Ok(());
                }
            }
        }
    }
}
