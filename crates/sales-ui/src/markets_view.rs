//! "Top Markets" view.
//!
//! Every chart on this view is restricted to the Q1 reference states and uses
//! one colour per state, so a state keeps its colour across the full-range
//! trend, the quarterly charts, the October ranking and the table.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use sales_core::models::Period;
use sales_data::aggregator::Series;
use sales_data::analysis::TopMarketsReport;

use crate::components::bars::{BarConfig, RankingBars};
use crate::components::charts::{plot_series, render_line_chart, render_lines, render_message};
use crate::table_view::render_contribution_table;
use crate::themes::Theme;

pub const NO_Q1_TOP_STATES: &str =
    "No Q1 data exists under current filters, cannot compute top states.";
pub const NO_Q1_DATA: &str = "No Q1 data available for this filter.";
pub const NO_Q2_DATA: &str = "No Q2 data under current filters.";
pub const NO_OCTOBER_DATA: &str = "No October data found for this selection.";
pub const NO_REFERENCE_STATES: &str = "None of the Q1 top states have sales in this period.";

// ── StateColors ───────────────────────────────────────────────────────────────

/// Colour assignment for the reference states, by Q1 rank.
#[derive(Debug, Clone)]
pub struct StateColors {
    entries: Vec<(String, Color)>,
}

impl StateColors {
    pub fn new(reference_states: &[String], theme: &Theme) -> Self {
        Self {
            entries: reference_states
                .iter()
                .enumerate()
                .map(|(i, s)| (s.clone(), theme.series_color(i)))
                .collect(),
        }
    }

    /// Colour for `state`, `None` outside the reference set.
    pub fn color(&self, state: &str) -> Option<Color> {
        self.entries
            .iter()
            .find(|(s, _)| s == state)
            .map(|(_, c)| *c)
    }

    pub fn contains(&self, state: &str) -> bool {
        self.color(state).is_some()
    }
}

// ── Render ────────────────────────────────────────────────────────────────────

/// Render the Top Markets view into `area`.
pub fn render_markets_view(frame: &mut Frame, area: Rect, report: &TopMarketsReport, theme: &Theme) {
    let colors = StateColors::new(&report.reference_states, theme);

    let [summary_area, full_area, quarters_area, bottom_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(10),
        Constraint::Length(12),
        Constraint::Length(12),
    ])
    .areas(area);
    let [q1_area, q2_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(quarters_area);
    let [october_area, table_area] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
            .areas(bottom_area);

    frame.render_widget(Paragraph::new(summary_lines(report, &colors, theme)), summary_area);

    let full_title = format!(
        "{} Trend (Q1 Top {:.0}% States)",
        Period::FullRange.label(),
        report.options.threshold_pct
    );
    match &report.full_trend {
        Some(series) => {
            render_state_chart(frame, full_area, &full_title, Period::FullRange, series, &colors, theme)
        }
        None => render_message(frame, full_area, &full_title, NO_Q1_TOP_STATES, theme),
    }

    let q1_title = format!("{} State Performance", Period::Q1.label());
    match &report.q1_trend {
        Some(series) => render_state_chart(frame, q1_area, &q1_title, Period::Q1, series, &colors, theme),
        None => render_message(frame, q1_area, &q1_title, NO_Q1_DATA, theme),
    }

    let q2_title = format!("{} State Performance", Period::Q2.label());
    match &report.q2_trend {
        Some(series) => render_state_chart(frame, q2_area, &q2_title, Period::Q2, series, &colors, theme),
        None => render_message(frame, q2_area, &q2_title, NO_Q2_DATA, theme),
    }

    let october_title = "October Snapshot (Q1 Top States)";
    match &report.october {
        None => render_message(frame, october_area, october_title, NO_OCTOBER_DATA, theme),
        Some(ranking) if ranking.is_empty() => {
            render_message(frame, october_area, october_title, NO_REFERENCE_STATES, theme)
        }
        Some(ranking) => {
            let items = ranking.iter().map(|g| {
                let style = colors
                    .color(&g.key)
                    .map_or_else(|| theme.amount_style(g.total), |c| Style::default().fg(c));
                (g.key.clone(), g.total, style)
            });
            let lines = RankingBars::styled(items, theme)
                .config(BarConfig::fit(october_area, 14))
                .to_lines();
            render_lines(frame, october_area, october_title, lines, theme);
        }
    }

    render_contribution_table(
        frame,
        table_area,
        "Q1 State Contribution",
        &report.contribution,
        &colors,
        theme,
    );
}

fn render_state_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    period: Period,
    series: &[Series],
    colors: &StateColors,
    theme: &Theme,
) {
    if series.is_empty() {
        render_message(frame, area, title, NO_REFERENCE_STATES, theme);
        return;
    }
    let lines: Vec<_> = series
        .iter()
        .map(|s| {
            let color = colors.color(&s.key).unwrap_or(Color::Gray);
            plot_series(s, period.months(), color)
        })
        .collect();
    render_line_chart(frame, area, title, period.months(), &lines, theme);
}

/// One-line description of the reference state set.
fn summary_lines<'a>(report: &TopMarketsReport, colors: &StateColors, theme: &'a Theme) -> Vec<Line<'a>> {
    let mut spans = vec![Span::styled(
        format!(
            "Q1 top states ({} rule, {:.0}%): ",
            report.options.cutoff, report.options.threshold_pct
        ),
        theme.label,
    )];
    if report.reference_states.is_empty() {
        spans.push(Span::styled("none", theme.dim));
    }
    for (i, state) in report.reference_states.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(", ", theme.dim));
        }
        let style = colors
            .color(state)
            .map_or(theme.value, |c| Style::default().fg(c));
        spans.push(Span::styled(state.clone(), style));
    }
    vec![Line::from(spans)]
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use sales_core::models::{Month, SalesRecord, SalesTable};
    use sales_data::analysis::{top_markets, ReportOptions};

    fn record(month: Month, state: &str, amount: f64) -> SalesRecord {
        SalesRecord {
            day: Some(1),
            month,
            year: Some(2024),
            channel: Some("Retail".to_string()),
            distribution_channel: None,
            sub_channel: None,
            customer_name: None,
            customer_group: None,
            state_name: Some(state.to_string()),
            region_name: Some("South".to_string()),
            item_name: None,
            qty_sold: 1.0,
            amount,
            l1_category: None,
            l0_category: None,
        }
    }

    fn report(rows: Vec<SalesRecord>) -> TopMarketsReport {
        top_markets(&SalesTable::new(rows), ReportOptions::default()).unwrap()
    }

    fn draw(report: &TopMarketsReport) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let theme = Theme::dark();
        terminal
            .draw(|frame| render_markets_view(frame, frame.area(), report, &theme))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ── StateColors ───────────────────────────────────────────────────────────

    #[test]
    fn test_state_colors_follow_rank() {
        let theme = Theme::dark();
        let colors = StateColors::new(&["Kerala".to_string(), "Goa".to_string()], &theme);
        assert_eq!(colors.color("Kerala"), Some(theme.series_color(0)));
        assert_eq!(colors.color("Goa"), Some(theme.series_color(1)));
        assert_eq!(colors.color("Assam"), None);
        assert!(!colors.contains("Assam"));
    }

    // ── Render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_full_report() {
        let text = draw(&report(vec![
            record(Month::Apr, "Kerala", 50.0),
            record(Month::May, "Goa", 30.0),
            record(Month::Jun, "Assam", 20.0),
            record(Month::Aug, "Kerala", 40.0),
            record(Month::Oct, "Goa", 15.0),
        ]));
        assert!(text.contains("Kerala"));
        assert!(text.contains("Q1 State Contribution"));
        assert!(!text.contains(NO_Q2_DATA));
        assert!(!text.contains(NO_OCTOBER_DATA));
    }

    #[test]
    fn test_render_without_q1_shows_messages() {
        let text = draw(&report(vec![record(Month::Aug, "Kerala", 40.0)]));
        assert!(text.contains("No Q1 data exists under current filters"));
        assert!(text.contains(NO_Q1_DATA));
        assert!(text.contains(NO_OCTOBER_DATA));
    }

    #[test]
    fn test_render_missing_periods_show_messages() {
        let text = draw(&report(vec![record(Month::Apr, "Kerala", 40.0)]));
        assert!(text.contains(NO_Q2_DATA));
        assert!(text.contains(NO_OCTOBER_DATA));
    }

    #[test]
    fn test_render_empty_report_does_not_panic() {
        let text = draw(&report(Vec::new()));
        assert!(text.contains("none"));
    }
}
