//! Month-series line charts and the placeholder drawn for empty slices.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph, Wrap},
    Frame,
};

use sales_core::formatting::format_compact;
use sales_core::models::Month;
use sales_data::aggregator::Series;

use crate::themes::Theme;

/// One plotted line: legend key, colour and `(x, y)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Line2D {
    pub key: String,
    pub color: Color,
    pub points: Vec<(f64, f64)>,
}

/// Place `series` on an x axis of `months`, one unit per month.
///
/// Points for months outside `months` are skipped.
pub fn plot_series(series: &Series, months: &[Month], color: Color) -> Line2D {
    let points = series
        .points
        .iter()
        .filter_map(|p| {
            months
                .iter()
                .position(|m| *m == p.month)
                .map(|x| (x as f64, p.total))
        })
        .collect();
    Line2D {
        key: series.key.clone(),
        color,
        points,
    }
}

/// Y bounds covering every point and zero, with headroom above the peak.
pub fn y_bounds(lines: &[Line2D]) -> [f64; 2] {
    let (lo, hi) = lines
        .iter()
        .flat_map(|l| l.points.iter().map(|(_, y)| *y))
        .fold((0.0_f64, 0.0_f64), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if hi == lo {
        return [lo, lo + 1.0];
    }
    let pad = (hi - lo) * 0.1;
    [if lo < 0.0 { lo - pad } else { lo }, hi + pad]
}

/// Draw `lines` as a line chart over `months`.
///
/// With a single month the points are drawn as a scatter, since a line needs
/// two points.
pub fn render_line_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    months: &[Month],
    lines: &[Line2D],
    theme: &Theme,
) {
    let graph_type = if months.len() > 1 {
        GraphType::Line
    } else {
        GraphType::Scatter
    };

    let datasets: Vec<Dataset> = lines
        .iter()
        .map(|l| {
            Dataset::default()
                .name(l.key.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(graph_type)
                .style(Style::default().fg(l.color))
                .data(&l.points)
        })
        .collect();

    let [y_lo, y_hi] = y_bounds(lines);
    let x_hi = months.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<Span> = months
        .iter()
        .map(|m| Span::styled(m.label(), theme.label))
        .collect();
    let y_labels: Vec<Span> = [y_lo, (y_lo + y_hi) / 2.0, y_hi]
        .iter()
        .map(|v| Span::styled(format_compact(*v), theme.label))
        .collect();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(format!(" {title} "), theme.bold)),
        )
        .x_axis(
            Axis::default()
                .style(theme.dim)
                .bounds([0.0, x_hi])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(theme.dim)
                .bounds([y_lo, y_hi])
                .labels(y_labels),
        )
        .legend_position(Some(LegendPosition::TopLeft))
        .style(theme.text);

    frame.render_widget(chart, area);
}

/// Draw an explicit message in place of a chart whose slice is empty.
pub fn render_message(frame: &mut Frame, area: Rect, title: &str, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.warning)),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border)
                    .title(Span::styled(format!(" {title} "), theme.bold)),
            ),
        area,
    );
}

/// Draw pre-built lines inside a titled border.
pub fn render_lines(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>, theme: &Theme) {
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(format!(" {title} "), theme.bold)),
        ),
        area,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
