//! Test harness: drives the whole application with synthetic key events
//! against a ratatui TestBackend and asserts on rendered screen content.

use chrono::{TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::path::Path;
use tempfile::TempDir;
use till::app::App;
use till::clock::FixedClock;
use till::commands::Command;
use till::store::DataContext;
use till::ui;

pub struct PosTestHarness {
    pub app: App,
    pub clock: FixedClock,
    terminal: Terminal<TestBackend>,
    temp: TempDir,
}

impl PosTestHarness {
    pub fn new(width: u16, height: u16) -> Self {
        let temp = TempDir::new().unwrap();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap());
        let data = DataContext::for_testing(temp.path());
        let app = App::load(data, Box::new(clock.clone()));
        let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();

        let mut harness = Self {
            app,
            clock,
            terminal,
            temp,
        };
        harness.render();
        harness
    }

    pub fn data_dir(&self) -> &Path {
        self.temp.path()
    }

    pub fn render(&mut self) {
        let app = &self.app;
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .unwrap();
    }

    /// Send one key and re-render. Returns false once Exit was dispatched.
    pub fn send_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let alive = self.app.handle_key_event(KeyEvent::new(code, modifiers));
        self.render();
        alive
    }

    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.send_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    /// Type a line into the active prompt and press Enter.
    pub fn submit_line(&mut self, text: &str) {
        self.type_text(text);
        self.send_key(KeyCode::Enter, KeyModifiers::NONE);
    }

    /// Move the menu cursor onto a command (the menu must be showing).
    pub fn goto_command(&mut self, command: Command) {
        let index = Command::ALL.iter().position(|c| *c == command).unwrap();
        while self.app.selected != index {
            self.send_key(KeyCode::Down, KeyModifiers::NONE);
        }
    }

    /// Select a command from the menu and press Enter.
    pub fn run_command(&mut self, command: Command) -> bool {
        self.goto_command(command);
        self.send_key(KeyCode::Enter, KeyModifiers::NONE)
    }

    pub fn screen_to_string(&self) -> String {
        let buffer = self.terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.cell((x, y)).map_or(" ", |cell| cell.symbol()));
            }
            out.push('\n');
        }
        out
    }

    pub fn assert_screen_contains(&self, needle: &str) {
        let screen = self.screen_to_string();
        assert!(
            screen.contains(needle),
            "screen does not contain {needle:?}:\n{screen}"
        );
    }

    pub fn assert_screen_not_contains(&self, needle: &str) {
        let screen = self.screen_to_string();
        assert!(
            !screen.contains(needle),
            "screen unexpectedly contains {needle:?}:\n{screen}"
        );
    }
}
