//! Main application state and TUI event loop for the sales dashboard.
//!
//! [`App`] owns the theme, the active view, the filter panel cursor and the
//! [`DashboardSession`]. Every key that changes the filters recomputes the
//! snapshot; between keys the snapshot is refreshed once the table cache TTL
//! has passed.

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
    Frame, Terminal,
};
use tracing::{debug, warn};

use sales_core::filters::FilterOptions;
use sales_runtime::data_manager::{ParquetSource, TableSource};
use sales_runtime::session::{DashboardSession, DashboardSnapshot};

use crate::components::header::Header;
use crate::filter_panel::{render_filter_panel, FilterPanel};
use crate::markets_view::render_markets_view;
use crate::overview_view::render_overview_view;
use crate::table_view::render_no_data;
use crate::themes::Theme;

// ── View ──────────────────────────────────────────────────────────────────────

/// Which tab the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Overview,
    Markets,
}

impl View {
    pub const ALL: [View; 2] = [View::Overview, View::Markets];

    /// Parse the CLI spelling; anything but `markets` selects the overview.
    pub fn from_name(name: &str) -> Self {
        match name {
            "markets" => View::Markets,
            _ => View::Overview,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Markets => "markets",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Overview => "Sales Overview",
            View::Markets => "Top Markets",
        }
    }

    fn index(self) -> usize {
        match self {
            View::Overview => 0,
            View::Markets => 1,
        }
    }

    fn next(self) -> Self {
        match self {
            View::Overview => View::Markets,
            View::Markets => View::Overview,
        }
    }
}

// ── TerminalGuard ─────────────────────────────────────────────────────────────

/// Raw mode plus alternate screen, restored on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard TUI.
pub struct App<S: TableSource = ParquetSource> {
    /// Active colour theme.
    pub theme: Theme,
    /// Current tab.
    pub view: View,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    pub filter_panel: FilterPanel,
    session: DashboardSession<S>,
    /// Most recent snapshot, `None` until the first successful load.
    snapshot: Option<DashboardSnapshot>,
    /// Error from the last recomputation, cleared on success.
    load_error: Option<String>,
    last_refresh: Option<Instant>,
}

impl<S: TableSource> App<S> {
    /// Construct a new application around `session`.
    pub fn new(session: DashboardSession<S>, theme_name: &str, view: View) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            view,
            should_quit: false,
            filter_panel: FilterPanel::new(),
            session,
            snapshot: None,
            load_error: None,
            last_refresh: None,
        }
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn session(&self) -> &DashboardSession<S> {
        &self.session
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the interactive dashboard until the user quits.
    ///
    /// Uses `crossterm::event::poll` (synchronous, with a 250 ms timeout) so
    /// the terminal event loop stays on the current thread, and yields to the
    /// runtime after every frame so a surrounding `ctrl_c` race can fire.
    ///
    /// The loop exits on `q`, `Q`, or `Ctrl+C`.
    pub async fn run(mut self) -> io::Result<()> {
        let _guard = TerminalGuard::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

        let tick_rate = Duration::from_millis(250);
        self.refresh(Instant::now());

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key, Instant::now());
                    }
                }
            }

            self.tick(Instant::now());
            tokio::task::yield_now().await;
        }

        terminal.show_cursor()?;
        Ok(())
    }

    // ── State updates ─────────────────────────────────────────────────────────

    /// Recompute the snapshot, reloading the table only if its TTL passed.
    pub fn refresh(&mut self, now: Instant) {
        let result = self.session.snapshot(now);
        self.apply(result, now);
    }

    /// Reload the table regardless of its age, then recompute.
    pub fn reload(&mut self, now: Instant) {
        debug!("manual reload requested");
        let result = self.session.reload(now);
        self.apply(result, now);
    }

    /// Refresh when the table cache is due for a reload.
    pub fn tick(&mut self, now: Instant) {
        let due = self.last_refresh.is_none_or(|at| {
            now.saturating_duration_since(at) >= self.session.data().cache_ttl()
        });
        if due {
            self.refresh(now);
        }
    }

    fn apply(&mut self, result: sales_core::error::Result<DashboardSnapshot>, now: Instant) {
        self.last_refresh = Some(now);
        match result {
            Ok(snapshot) => {
                let count = self.filter_panel.values(&snapshot.filter_options).len();
                self.filter_panel.clamp(count);
                self.snapshot = Some(snapshot);
                self.load_error = None;
            }
            Err(e) => {
                warn!(error = %e, "dashboard refresh failed");
                self.load_error = Some(e.to_string());
            }
        }
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.filter_panel.open {
            self.handle_panel_key(key, now);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => self.view = self.view.next(),
            KeyCode::Char('1') => self.view = View::Overview,
            KeyCode::Char('2') => self.view = View::Markets,
            KeyCode::Char('f') => self.filter_panel.open(),
            KeyCode::Char('r') => self.reload(now),
            _ => {}
        }
    }

    fn handle_panel_key(&mut self, key: KeyEvent, now: Instant) {
        let options: &[FilterOptions] = self
            .snapshot
            .as_ref()
            .map(|s| s.filter_options.as_slice())
            .unwrap_or_default();
        let value_count = self.filter_panel.values(options).len();
        let dim = self.filter_panel.dimension();

        let changed = match key.code {
            KeyCode::Esc | KeyCode::Char('f') => {
                self.filter_panel.close();
                false
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                false
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.filter_panel.move_up();
                false
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.filter_panel.move_down(value_count);
                false
            }
            KeyCode::Left
            | KeyCode::Right
            | KeyCode::Tab
            | KeyCode::Enter
            | KeyCode::Char('h')
            | KeyCode::Char('l') => {
                self.filter_panel.switch_column();
                false
            }
            KeyCode::Char(' ') => match self.filter_panel.selected_value(options).map(str::to_string) {
                Some(value) => Self::report(self.session.toggle(dim, &value)),
                None => false,
            },
            KeyCode::Char('a') => Self::report(self.session.reset_dimension(dim)),
            KeyCode::Char('c') => {
                self.session.clear_filters();
                true
            }
            _ => false,
        };

        if changed {
            self.refresh(now);
        }
    }

    /// `true` when a filter update succeeded; failures are logged.
    fn report(result: sales_core::error::Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "filter update rejected");
                false
            }
        }
    }

    // ── Render ────────────────────────────────────────────────────────────────

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let Some(snapshot) = &self.snapshot else {
            let reason = self.load_error.as_deref().unwrap_or("Loading sales data...");
            render_no_data(frame, area, reason, &self.theme);
            return;
        };

        let loaded_at = snapshot.loaded_at.map(|t| t.format("%H:%M:%S").to_string());
        let header = Header::new(
            &snapshot.filter_summary,
            snapshot.filtered_rows,
            snapshot.total_rows,
            &self.theme,
        )
        .loaded_at(loaded_at)
        .warning(snapshot.load_warning.as_deref().or(self.load_error.as_deref()));

        let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(header.height()),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(header.to_lines()), header_area);

        let tabs = Tabs::new(
            View::ALL
                .iter()
                .enumerate()
                .map(|(i, v)| format!("{} {}", i + 1, v.title())),
        )
        .select(self.view.index())
        .style(self.theme.tab_inactive)
        .highlight_style(self.theme.tab_active)
        .divider(Span::styled("│", self.theme.separator));
        frame.render_widget(tabs, tabs_area);

        match self.view {
            View::Overview => render_overview_view(frame, body_area, &snapshot.overview, &self.theme),
            View::Markets => render_markets_view(frame, body_area, &snapshot.markets, &self.theme),
        }

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Tab/1/2 switch view  f filters  r reload  q quit",
                self.theme.dim,
            ))),
            footer_area,
        );

        if self.filter_panel.open {
            render_filter_panel(
                frame,
                area,
                &self.filter_panel,
                self.session.filters(),
                &snapshot.filter_options,
                &self.theme,
            );
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use sales_core::error::{Result, SalesError};
    use sales_core::models::{Dimension, Month, SalesRecord, SalesTable};
    use sales_data::analysis::ReportOptions;
    use sales_runtime::data_manager::DataManager;
    use std::cell::Cell;

    fn record(month: Month, channel: &str, region: &str, state: &str, amount: f64) -> SalesRecord {
        SalesRecord {
            day: Some(1),
            month,
            year: Some(2024),
            channel: Some(channel.to_string()),
            distribution_channel: Some("Distributor".to_string()),
            sub_channel: Some("GT".to_string()),
            customer_name: Some("Acme".to_string()),
            customer_group: Some("Key".to_string()),
            state_name: Some(state.to_string()),
            region_name: Some(region.to_string()),
            item_name: Some("Chips".to_string()),
            qty_sold: 2.0,
            amount,
            l1_category: None,
            l0_category: Some("Snacks".to_string()),
        }
    }

    /// Fixed table that counts loads; fails while `fail` is set.
    struct TestSource {
        table: SalesTable,
        fail: Cell<bool>,
        loads: Cell<usize>,
    }

    impl TableSource for TestSource {
        fn load(&self) -> Result<SalesTable> {
            self.loads.set(self.loads.get() + 1);
            if self.fail.get() {
                Err(SalesError::Config("data file missing".to_string()))
            } else {
                Ok(self.table.clone())
            }
        }

        fn describe(&self) -> String {
            "test".to_string()
        }
    }

    fn app_with(fail: bool) -> App<TestSource> {
        let source = TestSource {
            table: SalesTable::new(vec![
                record(Month::Apr, "Online", "South", "Kerala", 50.0),
                record(Month::May, "Retail", "North", "Punjab", 30.0),
                record(Month::Jul, "Retail", "South", "Goa", 20.0),
                record(Month::Oct, "Online", "South", "Kerala", 10.0),
            ]),
            fail: Cell::new(fail),
            loads: Cell::new(0),
        };
        let session = DashboardSession::new(DataManager::new(source, 300), ReportOptions::default());
        App::new(session, "dark", View::Overview)
    }

    fn press(app: &mut App<TestSource>, code: KeyCode, now: Instant) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), now);
    }

    fn draw(app: &App<TestSource>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(150, 48)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ── View ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_view_from_name() {
        assert_eq!(View::from_name("markets"), View::Markets);
        assert_eq!(View::from_name("overview"), View::Overview);
        assert_eq!(View::from_name("anything"), View::Overview);
        assert_eq!(View::Markets.name(), "markets");
    }

    #[test]
    fn test_view_cycles() {
        assert_eq!(View::Overview.next(), View::Markets);
        assert_eq!(View::Markets.next(), View::Overview);
    }

    // ── App::new ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_creation_defaults() {
        let app = app_with(false);
        assert_eq!(app.view, View::Overview);
        assert!(!app.should_quit);
        assert!(!app.filter_panel.open);
        assert!(app.snapshot().is_none());
        assert!(app.load_error().is_none());
    }

    #[test]
    fn test_refresh_builds_snapshot() {
        let mut app = app_with(false);
        app.refresh(Instant::now());
        let snap = app.snapshot().unwrap();
        assert_eq!(snap.total_rows, 4);
        assert_eq!(snap.markets.reference_states, vec!["Kerala", "Punjab"]);
    }

    #[test]
    fn test_refresh_failure_records_error() {
        let mut app = app_with(true);
        app.refresh(Instant::now());
        assert!(app.snapshot().is_none());
        assert!(app.load_error().unwrap().contains("data file missing"));
        assert!(draw(&app).contains("No sales data available"));
    }

    // ── Keys ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_quit_keys() {
        let now = Instant::now();
        let mut app = app_with(false);
        press(&mut app, KeyCode::Char('q'), now);
        assert!(app.should_quit);

        let mut app = app_with(false);
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), now);
        assert!(app.should_quit);
    }

    #[test]
    fn test_view_switch_keys() {
        let now = Instant::now();
        let mut app = app_with(false);
        press(&mut app, KeyCode::Tab, now);
        assert_eq!(app.view, View::Markets);
        press(&mut app, KeyCode::Char('1'), now);
        assert_eq!(app.view, View::Overview);
        press(&mut app, KeyCode::Char('2'), now);
        assert_eq!(app.view, View::Markets);
    }

    #[test]
    fn test_filter_panel_toggle_value() {
        let now = Instant::now();
        let mut app = app_with(false);
        app.refresh(now);

        press(&mut app, KeyCode::Char('f'), now);
        assert!(app.filter_panel.open);

        // Channel options are [Online, Retail]; pick Online.
        press(&mut app, KeyCode::Right, now);
        press(&mut app, KeyCode::Char(' '), now);

        let snap = app.snapshot().unwrap();
        assert_eq!(snap.filtered_rows, 2);
        assert_eq!(snap.filter_summary, "Channel: Online");
        assert!(app
            .session()
            .filters()
            .get(Dimension::Channel)
            .contains("Online"));

        press(&mut app, KeyCode::Char('a'), now);
        assert_eq!(app.snapshot().unwrap().filtered_rows, 4);

        press(&mut app, KeyCode::Esc, now);
        assert!(!app.filter_panel.open);
    }

    #[test]
    fn test_clear_all_filters() {
        let now = Instant::now();
        let mut app = app_with(false);
        app.refresh(now);
        press(&mut app, KeyCode::Char('f'), now);
        press(&mut app, KeyCode::Right, now);
        press(&mut app, KeyCode::Down, now);
        press(&mut app, KeyCode::Char(' '), now);
        assert_eq!(app.snapshot().unwrap().filter_summary, "Channel: Retail");

        press(&mut app, KeyCode::Char('c'), now);
        assert!(app.session().filters().is_unrestricted());
        assert_eq!(app.snapshot().unwrap().filtered_rows, 4);
    }

    #[test]
    fn test_space_on_dimension_list_does_nothing() {
        let now = Instant::now();
        let mut app = app_with(false);
        app.refresh(now);
        press(&mut app, KeyCode::Char('f'), now);
        press(&mut app, KeyCode::Char(' '), now);
        assert!(app.session().filters().is_unrestricted());
    }

    #[test]
    fn test_reload_key_forces_load() {
        let now = Instant::now();
        let mut app = app_with(false);
        app.refresh(now);
        press(&mut app, KeyCode::Char('r'), now);
        assert_eq!(app.session().data().source().loads.get(), 2);
    }

    #[test]
    fn test_tick_reloads_after_ttl() {
        let t0 = Instant::now();
        let mut app = app_with(false);
        app.tick(t0);
        app.tick(t0 + Duration::from_secs(10));
        assert_eq!(app.session().data().source().loads.get(), 1);

        app.tick(t0 + Duration::from_secs(300));
        assert_eq!(app.session().data().source().loads.get(), 2);
    }

    // ── Render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_overview_tab() {
        let mut app = app_with(false);
        app.refresh(Instant::now());
        let text = draw(&app);
        assert!(text.contains("PRIMARY SALES DASHBOARD"));
        assert!(text.contains("Sales Overview"));
        assert!(text.contains("Total Revenue"));
    }

    #[test]
    fn test_render_markets_tab() {
        let mut app = app_with(false);
        app.refresh(Instant::now());
        press(&mut app, KeyCode::Char('2'), Instant::now());
        let text = draw(&app);
        assert!(text.contains("Q1 State Contribution"));
        assert!(text.contains("Punjab"));
    }

    #[test]
    fn test_render_with_panel_open() {
        let mut app = app_with(false);
        app.refresh(Instant::now());
        press(&mut app, KeyCode::Char('f'), Instant::now());
        let text = draw(&app);
        assert!(text.contains("Filters"));
        assert!(text.contains("[ ] Online"));
    }

    #[test]
    fn test_render_before_first_load() {
        let app = app_with(false);
        assert!(draw(&app).contains("Loading sales data..."));
    }
}
