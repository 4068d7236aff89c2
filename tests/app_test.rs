use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pageview::event_source::SimulatedEventSource;
use pageview::settings::Settings;
use pageview::test_utils::{RecordingRenderer, StaticResolver, Timeline};
use pageview::theme::Palette;
use pageview::viewport::viewport_area;
use pageview::viewer::{DocumentRef, LoadState, PageContent, ViewerController};
use pageview::{App, AppAction, run_app_with_event_source};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

fn loaded_app(documents: &[&str]) -> App {
    let resolver = StaticResolver::new()
        .with_document("doc-a.pdf", 3)
        .with_document("doc-b.pdf", 2);
    let mut viewer = ViewerController::new(
        Arc::new(resolver),
        RecordingRenderer::new(Timeline::new()).per_worker(),
    );

    let documents: Vec<DocumentRef> = documents.iter().map(|d| DocumentRef::new(d)).collect();
    viewer.set_document(documents.first().cloned());
    while viewer.load_state().is_loading() || viewer.pages_pending() > 0 {
        assert!(viewer.wait_response(Duration::from_secs(5)));
    }

    App::new(viewer, documents, Settings::default(), Palette::default())
}

fn rows(buf: &Buffer) -> Vec<String> {
    (0..buf.area.height)
        .map(|y| {
            (0..buf.area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect()
        })
        .collect()
}

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::empty())
}

#[test]
fn draws_header_viewport_and_help() {
    let mut app = loaded_app(&["doc-a.pdf", "doc-b.pdf"]);
    let mut terminal = Terminal::new(TestBackend::new(60, 40)).unwrap();

    terminal.draw(|f| app.draw(f)).unwrap();
    let rows = rows(terminal.backend().buffer());

    assert!(rows[0].contains("document 1/2 [3 pages]"));
    assert!(rows[1].contains("doc-a.pdf (3 pages)"));
    assert!(rows[2].contains("─ Page 1"));
    assert!(rows[39].contains("q: Quit"));
    // The viewport stops well above the help line.
    assert!(rows[38].trim().is_empty());
    assert!(rows[30].trim().is_empty());
}

#[test]
fn viewport_cap_applies_to_body_between_header_and_help() {
    let mut app = loaded_app(&["doc-a.pdf"]);
    let mut terminal = Terminal::new(TestBackend::new(60, 40)).unwrap();
    terminal.draw(|f| app.draw(f)).unwrap();

    let body = Rect::new(0, 1, 60, 38);
    let expected = viewport_area(body, Settings::default().viewport_height_percent);
    let rows = rows(terminal.backend().buffer());

    let bottom = usize::from(expected.bottom() - 1);
    assert!(rows[bottom].starts_with('└'));
    assert!(rows[bottom + 1].trim().is_empty());
}

#[test]
fn scrolling_moves_viewport_only() {
    let mut app = loaded_app(&["doc-a.pdf"]);
    let mut terminal = Terminal::new(TestBackend::new(60, 40)).unwrap();
    let mut events = SimulatedEventSource::from_keys("jj");

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

    assert_eq!(app.viewport().offset(), 6);
    let rows = rows(terminal.backend().buffer());
    assert!(rows[0].contains("document 1/1"));
    assert!(!rows[2].contains("─ Page 1"));
}

#[test]
fn switching_documents_restarts_load_and_scroll() {
    let mut app = loaded_app(&["doc-a.pdf", "doc-b.pdf"]);
    let mut terminal = Terminal::new(TestBackend::new(60, 40)).unwrap();
    terminal.draw(|f| app.draw(f)).unwrap();

    app.handle_key(press(KeyCode::Char('G')));
    assert!(app.viewport().offset() > 0);

    assert_eq!(app.handle_key(press(KeyCode::Char('n'))), None);
    assert_eq!(app.viewport().offset(), 0);
    assert_eq!(app.viewer().document(), Some(&DocumentRef::new("doc-b.pdf")));
    assert!(app.viewer().pages().is_empty());

    for _ in 0..50 {
        if !app.viewer().load_state().is_loading() && app.viewer().pages_pending() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
        app.tick();
    }
    assert!(matches!(app.viewer().load_state(), LoadState::Loaded { handle } if handle.page_count == 2));
    assert_eq!(app.viewer().pages().len(), 2);
    assert!(
        app.viewer()
            .pages()
            .iter()
            .all(|p| matches!(p.content, PageContent::Rendered(_)))
    );
}

#[test]
fn quit_keys() {
    let mut app = loaded_app(&[]);
    assert_eq!(app.handle_key(press(KeyCode::Char('q'))), Some(AppAction::Quit));
    assert_eq!(app.handle_key(press(KeyCode::Esc)), Some(AppAction::Quit));
    assert_eq!(app.viewer().load_state(), &LoadState::NotLoaded);
}
