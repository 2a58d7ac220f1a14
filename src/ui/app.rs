//! Main TUI application state and logic

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

use crate::engine::errors::SizeError;
use crate::engine::profile::ProfileView;
use crate::engine::sizer::{SizeRecord, Sizer, SizerStats};
use crate::runtime::heap::{ObjRef, ObjectHeap};
use crate::track::Tracker;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Profiles,
    Breakdown,
    Summary,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Profiles => FocusedPane::Breakdown,
            FocusedPane::Breakdown => FocusedPane::Summary,
            FocusedPane::Summary => FocusedPane::Profiles,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Profiles => FocusedPane::Summary,
            FocusedPane::Breakdown => FocusedPane::Profiles,
            FocusedPane::Summary => FocusedPane::Breakdown,
        }
    }
}

/// The main application state
pub struct App {
    heap: ObjectHeap,
    sizer: Sizer,
    tracker: Tracker,
    roots: Vec<ObjRef>,

    /// Data caches rebuilt on every recording pass
    view: ProfileView,
    records: Vec<SizeRecord>,
    stats: SizerStats,

    pub focused_pane: FocusedPane,
    pub profile_scroll: usize,
    pub record_scroll: usize,
    pub should_quit: bool,
    pub status_message: String,
}

impl App {
    /// Create the app and run the first sizing pass.
    pub fn new(
        heap: ObjectHeap,
        sizer: Sizer,
        tracker: Tracker,
        roots: Vec<ObjRef>,
    ) -> Result<Self, SizeError> {
        let mut app = App {
            heap,
            sizer,
            tracker,
            roots,
            view: ProfileView {
                rows: Vec::new(),
                collapsed: None,
                grand_total: 0,
            },
            records: Vec::new(),
            stats: SizerStats::default(),
            focused_pane: FocusedPane::Profiles,
            profile_scroll: 0,
            record_scroll: 0,
            should_quit: false,
            status_message: String::from("Ready!"),
        };
        app.refresh()?;
        Ok(app)
    }

    /// Run the tracker and rebuild the pane caches.
    fn refresh(&mut self) -> Result<(), SizeError> {
        self.tracker.record(&self.heap, &mut self.sizer)?;
        self.records = self.sizer.detailed_of(&self.heap, &self.roots)?;
        self.stats = self.sizer.stats();
        self.view = self.sizer.profiles().ranked(self.sizer.config().cutoff);
        Ok(())
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes on top, one-line status bar at the bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let pane_area = main_chunks[0];
        let status_area = main_chunks[1];

        // Left column: profile table; right column: breakdown over summary
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(pane_area);

        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(columns[1]);

        super::panes::render_profile_pane(
            frame,
            columns[0],
            &self.heap,
            &self.view,
            self.focused_pane == FocusedPane::Profiles,
            self.profile_scroll,
        );

        super::panes::render_records_pane(
            frame,
            right_rows[0],
            &self.records,
            self.focused_pane == FocusedPane::Breakdown,
            self.record_scroll,
        );

        super::panes::render_summary_pane(
            frame,
            right_rows[1],
            &self.stats,
            &self.tracker,
            self.focused_pane == FocusedPane::Summary,
        );

        super::panes::render_status_bar(
            frame,
            status_area,
            &self.status_message,
            self.tracker.len(),
            self.stats.missed,
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Char('r') => match self.refresh() {
                Ok(()) => {
                    self.status_message =
                        format!("Recorded snapshot {}", self.tracker.len());
                }
                Err(e) => {
                    self.status_message = format!("Record failed: {}", e);
                }
            },
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Profiles => {
                    self.profile_scroll = self.profile_scroll.saturating_sub(1);
                }
                FocusedPane::Breakdown => {
                    self.record_scroll = self.record_scroll.saturating_sub(1);
                }
                FocusedPane::Summary => {}
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Profiles => {
                    self.profile_scroll = self.profile_scroll.saturating_add(1);
                }
                FocusedPane::Breakdown => {
                    self.record_scroll = self.record_scroll.saturating_add(1);
                }
                FocusedPane::Summary => {}
            },
            _ => {}
        }
    }
}
