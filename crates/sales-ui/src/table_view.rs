//! Q1 state contribution table for the Top Markets view.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per ranked
//! state plus a highlighted totals row at the bottom. States inside the
//! reference set are marked and drawn in their series colour.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use sales_core::formatting;
use sales_data::contribution::ContributionRow;

use crate::markets_view::StateColors;
use crate::themes::Theme;

/// Totals row values for a contribution table.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionTotals {
    pub states: usize,
    pub selected: usize,
    pub revenue: f64,
    /// Sum of the row shares: 100 for any table with revenue, 0 when the
    /// grand total is zero.
    pub share_pct: f64,
}

impl ContributionTotals {
    pub fn from_rows(rows: &[ContributionRow], colors: &StateColors) -> Self {
        Self {
            states: rows.len(),
            selected: rows.iter().filter(|r| colors.contains(&r.state)).count(),
            revenue: rows.iter().map(|r| r.revenue).sum(),
            share_pct: rows.iter().map(|r| r.share_pct).sum(),
        }
    }
}

/// Render the ranked contribution table into `area`.
pub fn render_contribution_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[ContributionRow],
    colors: &StateColors,
    theme: &Theme,
) {
    let header_cells = ["#", "", "State", "Revenue", "Share", "Cumulative"]
        .iter()
        .map(|h| Cell::from(*h).style(theme.table_header));
    let header = Row::new(header_cells).height(1);

    let data_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            let (marker, state_style) = match colors.color(&row.state) {
                Some(color) => ("●", Style::default().fg(color)),
                None => ("", style),
            };
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(marker).style(state_style),
                Cell::from(row.state.clone()).style(state_style),
                Cell::from(formatting::format_currency(row.revenue)),
                Cell::from(format!("{:.1}%", row.share_pct)),
                Cell::from(format!("{:.1}%", row.cumulative_pct)),
            ])
            .style(style)
        })
        .collect();

    let totals = ContributionTotals::from_rows(rows, colors);
    let total_row = Row::new(vec![
        Cell::from(""),
        Cell::from(""),
        Cell::from(format!("TOTAL ({} of {})", totals.selected, totals.states)),
        Cell::from(formatting::format_currency(totals.revenue)),
        Cell::from(if totals.states > 0 {
            format!("{:.1}%", totals.share_pct)
        } else {
            String::new()
        }),
        Cell::from(""),
    ])
    .style(theme.table_total);

    let mut all_rows = data_rows;
    all_rows.push(total_row);

    let widths = [
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(14),
        Constraint::Length(16),
        Constraint::Length(7),
        Constraint::Length(10),
    ];

    let table = Table::new(all_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(format!(" {} ", title), theme.bold)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render a placeholder when no table could be loaded at all.
pub fn render_no_data(frame: &mut Frame, area: Rect, reason: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No sales data available", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(reason.to_string(), theme.error)),
        Line::from(""),
        Line::from(Span::styled(
            "Run sales-convert to produce the data file, then press 'r' to retry.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Primary Sales Dashboard "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
