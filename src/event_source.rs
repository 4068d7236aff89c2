use anyhow::Result;
pub use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;
use std::time::Duration;

/// Where the app loop gets its input from
pub trait EventSource {
    /// Wait up to `timeout` for an event to become available
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<Event>;
}

/// Terminal input via crossterm
pub struct KeyboardEventSource;

impl EventSource for KeyboardEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Scripted input for tests; yields `q` once the script runs out
pub struct SimulatedEventSource {
    events: VecDeque<Event>,
}

impl SimulatedEventSource {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// One key press per character of `keys`
    pub fn from_keys(keys: &str) -> Self {
        Self::new(keys.chars().map(Self::char_key))
    }

    pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    pub fn char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::empty())
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        // Never idle: an exhausted script still has the final quit to deliver.
        Ok(true)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(self
            .events
            .pop_front()
            .unwrap_or_else(|| Self::char_key('q')))
    }
}
