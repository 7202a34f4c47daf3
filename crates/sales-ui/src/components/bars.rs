use crate::themes::Theme;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use sales_core::formatting::{format_currency, format_number};

/// Configuration controlling visual appearance of a horizontal bar.
#[derive(Debug, Clone, Copy)]
pub struct BarConfig {
    /// Width in terminal columns of the bar portion (excluding labels).
    pub width: u16,
    /// Width reserved for the leading key label.
    pub label_width: u16,
    /// Character used to fill the completed portion of the bar.
    pub filled_char: char,
    /// Character used to fill the empty portion of the bar.
    pub empty_char: char,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            width: 30,
            label_width: 18,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
        }
    }
}

impl BarConfig {
    /// Bar layout for a bordered box `area`, reserving `tail` columns for the
    /// figures after the bar.
    pub fn fit(area: Rect, tail: u16) -> Self {
        let inner = area.width.saturating_sub(2);
        let label_width = (inner / 3).clamp(6, 18);
        Self {
            label_width,
            width: inner.saturating_sub(label_width + 1 + tail).max(1),
            ..Self::default()
        }
    }
}

/// Pad or truncate `text` to exactly `width` display columns.
pub fn fit_label(text: &str, width: usize) -> String {
    if text.width() <= width {
        let pad = width - text.width();
        return format!("{text}{}", " ".repeat(pad));
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn filled_cells(fraction: f64, width: u16) -> u16 {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((fraction * width as f64).round() as u16).min(width)
}

// ── ShareBar ─────────────────────────────────────────────────────────────────

/// Horizontal bar showing one key's share of a whole.
///
/// Renders as `key  ████░░░░  45.2%  ₹ 1,234`.
pub struct ShareBar<'a> {
    pub key: &'a str,
    /// Share in percent; clamped to `[0, 100]` when drawn.
    pub share_pct: f64,
    pub total: f64,
    pub style: Style,
    pub theme: &'a Theme,
    pub config: BarConfig,
}

impl<'a> ShareBar<'a> {
    pub fn new(key: &'a str, share_pct: f64, total: f64, theme: &'a Theme) -> Self {
        Self {
            key,
            share_pct,
            total,
            style: theme.amount_style(total),
            theme,
            config: BarConfig::default(),
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn config(mut self, config: BarConfig) -> Self {
        self.config = config;
        self
    }

    /// Render the bar as a [`Line`].
    pub fn to_line(&self) -> Line<'a> {
        let filled = filled_cells(self.share_pct / 100.0, self.config.width);
        let empty = self.config.width - filled;

        let filled_str: String =
            std::iter::repeat_n(self.config.filled_char, filled as usize).collect();
        let empty_str: String =
            std::iter::repeat_n(self.config.empty_char, empty as usize).collect();

        Line::from(vec![
            Span::styled(
                fit_label(self.key, self.config.label_width as usize),
                self.theme.label,
            ),
            Span::raw(" "),
            Span::styled(filled_str, self.style),
            Span::styled(empty_str, self.theme.bar_empty),
            Span::styled(format!(" {:>5.1}%", self.share_pct), self.theme.value),
            Span::styled(format!("  {}", format_currency(self.total)), self.theme.dim),
        ])
    }
}

// ── RankingBars ──────────────────────────────────────────────────────────────

/// A list of keyed totals drawn as bars scaled to the largest magnitude.
///
/// Negative totals are drawn with the same length rule in the negative style.
pub struct RankingBars<'a> {
    /// `(key, total, bar style)` triples, in display order.
    pub items: Vec<(String, f64, Style)>,
    pub theme: &'a Theme,
    pub config: BarConfig,
}

impl<'a> RankingBars<'a> {
    /// Bars for `items`, each styled by the sign of its total.
    pub fn new<I>(items: I, theme: &'a Theme) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        Self {
            items: items
                .into_iter()
                .map(|(key, total)| {
                    let style = theme.amount_style(total);
                    (key, total, style)
                })
                .collect(),
            theme,
            config: BarConfig::default(),
        }
    }

    /// Bars with a caller-chosen style per key.
    pub fn styled<I>(items: I, theme: &'a Theme) -> Self
    where
        I: IntoIterator<Item = (String, f64, Style)>,
    {
        Self {
            items: items.into_iter().collect(),
            theme,
            config: BarConfig::default(),
        }
    }

    pub fn config(mut self, config: BarConfig) -> Self {
        self.config = config;
        self
    }

    /// Render one line per item.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let peak = self
            .items
            .iter()
            .map(|(_, total, _)| total.abs())
            .fold(0.0_f64, f64::max);

        self.items
            .iter()
            .map(|(key, total, style)| {
                let fraction = if peak > 0.0 { total.abs() / peak } else { 0.0 };
                let filled = filled_cells(fraction, self.config.width);
                let bar: String =
                    std::iter::repeat_n(self.config.filled_char, filled as usize).collect();
                let pad = " ".repeat((self.config.width - filled) as usize);

                Line::from(vec![
                    Span::styled(
                        fit_label(key, self.config.label_width as usize),
                        self.theme.label,
                    ),
                    Span::raw(" "),
                    Span::styled(bar, *style),
                    Span::raw(pad),
                    Span::styled(
                        format!(" ₹ {}", format_number(*total, 0)),
                        self.theme.value,
                    ),
                ])
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
