//! "Sales Overview" view: KPI cards, the monthly category trend, three
//! revenue breakdowns and the regional mix per period.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use sales_core::models::{Month, Period};
use sales_data::aggregator::GroupTotal;
use sales_data::analysis::{OverviewReport, RegionMix};

use crate::components::bars::{BarConfig, RankingBars, ShareBar};
use crate::components::charts::{plot_series, render_line_chart, render_lines, render_message};
use crate::components::kpi::kpi_cards;
use crate::themes::Theme;

pub const INSUFFICIENT_VARIATION: &str =
    "Insufficient month variation for trend analysis under current filters.";
pub const NO_ROWS: &str = "No sales match the current filters.";

/// Render the overview into `area`.
pub fn render_overview_view(frame: &mut Frame, area: Rect, report: &OverviewReport, theme: &Theme) {
    let [kpi_area, trend_area, breakdown_area, region_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(10),
        Constraint::Length(9),
        Constraint::Length(7),
    ])
    .areas(area);

    render_kpis(frame, kpi_area, report, theme);
    render_trend(frame, trend_area, report, theme);

    let [distr_area, sub_area, group_area] = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .areas(breakdown_area);
    render_ranking(frame, distr_area, "Revenue by Distribution Channel", &report.by_distribution_channel, theme);
    render_ranking(frame, sub_area, "Revenue by Sub-Channel", &report.by_sub_channel, theme);
    render_ranking(frame, group_area, "Revenue by Customer Group", &report.by_customer_group, theme);

    let region_areas: [Rect; 3] = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .areas(region_area);
    for (mix, mix_area) in report.region_mix.iter().zip(region_areas) {
        render_region_mix(frame, mix_area, mix, theme);
    }
}

fn render_kpis(frame: &mut Frame, area: Rect, report: &OverviewReport, theme: &Theme) {
    let cards = kpi_cards(&report.totals, theme);
    let constraints = vec![Constraint::Ratio(1, cards.len() as u32); cards.len()];
    let areas = Layout::horizontal(constraints).split(area);
    for (card, card_area) in cards.iter().zip(areas.iter()) {
        frame.render_widget(
            Paragraph::new(card.to_lines()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border),
            ),
            *card_area,
        );
    }
}

fn render_trend(frame: &mut Frame, area: Rect, report: &OverviewReport, theme: &Theme) {
    let title = "Monthly Revenue Trend by Category";
    if report.totals.rows == 0 {
        render_message(frame, area, title, NO_ROWS, theme);
        return;
    }

    let chart_area = if report.insufficient_variation {
        let [notice, rest] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(INSUFFICIENT_VARIATION, theme.warning))),
            notice,
        );
        rest
    } else {
        area
    };

    let months = axis_months(report);
    let lines: Vec<_> = report
        .category_trend
        .iter()
        .enumerate()
        .map(|(i, s)| plot_series(s, &months, theme.series_color(i)))
        .collect();
    render_line_chart(frame, chart_area, title, &months, &lines, theme);
}

/// Months spanned by the trend, from the first to the last observed month.
fn axis_months(report: &OverviewReport) -> Vec<Month> {
    let observed = || report.category_trend.iter().flat_map(|s| s.points.iter().map(|p| p.month));
    match (observed().min(), observed().max()) {
        (Some(first), Some(last)) => Month::ALL
            .into_iter()
            .filter(|m| *m >= first && *m <= last)
            .collect(),
        _ => Month::ALL.to_vec(),
    }
}

fn render_ranking(frame: &mut Frame, area: Rect, title: &str, groups: &[GroupTotal], theme: &Theme) {
    if groups.is_empty() {
        render_message(frame, area, title, NO_ROWS, theme);
        return;
    }
    let lines = RankingBars::new(groups.iter().map(|g| (g.key.clone(), g.total)), theme)
        .config(BarConfig::fit(area, 14))
        .to_lines();
    render_lines(frame, area, title, lines, theme);
}

fn render_region_mix(frame: &mut Frame, area: Rect, mix: &RegionMix, theme: &Theme) {
    let title = format!("{} Region Mix", short_label(mix.period));
    match &mix.shares {
        None => {
            let message = format!("No {} data under current filters.", short_label(mix.period));
            render_message(frame, area, &title, &message, theme);
        }
        Some(shares) => {
            let config = BarConfig::fit(area, 20);
            let lines = shares
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    ShareBar::new(&s.key, s.share_pct, s.total, theme)
                        .style(ratatui::style::Style::default().fg(theme.series_color(i)))
                        .config(config)
                        .to_line()
                })
                .collect();
            render_lines(frame, area, &title, lines, theme);
        }
    }
}

fn short_label(period: Period) -> &'static str {
    match period {
        Period::Q1 => "Q1",
        Period::Q2 => "Q2",
        Period::October => "October",
        Period::FullRange => "Apr-Oct",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
