use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Decorative marker placed either side of the dashboard title.
pub const ACCENT: &str = "◆ ◇ ◆";

/// Dashboard header rendering three lines plus an optional warning:
///
/// 1. Dashboard title with accent decorations (ALL CAPS).
/// 2. A 60-column `=` separator.
/// 3. `[ filters | loaded HH:MM:SS | rows filtered/total ]`.
/// 4. The reload warning, when the last reload failed.
pub struct Header<'a> {
    /// Active filter summary, e.g. `"All data"`.
    pub filter_summary: &'a str,
    /// Pre-formatted load time, or `None` before the first load.
    pub loaded_at: Option<String>,
    pub filtered_rows: usize,
    pub total_rows: usize,
    /// Message from a failed reload while older data is displayed.
    pub warning: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    /// Construct a header with no load time or warning.
    pub fn new(filter_summary: &'a str, filtered_rows: usize, total_rows: usize, theme: &'a Theme) -> Self {
        Self {
            filter_summary,
            loaded_at: None,
            filtered_rows,
            total_rows,
            warning: None,
            theme,
        }
    }

    pub fn loaded_at(mut self, loaded_at: Option<String>) -> Self {
        self.loaded_at = loaded_at;
        self
    }

    pub fn warning(mut self, warning: Option<&'a str>) -> Self {
        self.warning = warning;
        self
    }

    /// Number of rows [`Self::to_lines`] produces.
    pub fn height(&self) -> u16 {
        if self.warning.is_some() {
            4
        } else {
            3
        }
    }

    /// Render the header as a `Vec<Line>`.
    ///
    /// 1. `"◆ ◇ ◆ PRIMARY SALES DASHBOARD ◆ ◇ ◆"`
    /// 2. `"============================================================"`
    /// 3. `"[ All data | loaded 09:15:02 | rows 1,200/1,200 ]"`
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);
        let loaded = self.loaded_at.clone().unwrap_or_else(|| "--:--:--".to_string());

        let mut lines = vec![
            Line::from(vec![
                Span::styled(ACCENT, self.theme.header_accent),
                Span::styled(" PRIMARY SALES DASHBOARD ", self.theme.header),
                Span::styled(ACCENT, self.theme.header_accent),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.filter_summary.to_string(), self.theme.value),
                Span::styled(" | loaded ", self.theme.label),
                Span::styled(loaded, self.theme.value),
                Span::styled(" | rows ", self.theme.label),
                Span::styled(
                    format!(
                        "{}/{}",
                        sales_core::formatting::format_number(self.filtered_rows as f64, 0),
                        sales_core::formatting::format_number(self.total_rows as f64, 0),
                    ),
                    self.theme.value,
                ),
                Span::styled(" ]", self.theme.label),
            ]),
        ];

        if let Some(warning) = self.warning {
            lines.push(Line::from(Span::styled(
                format!("⚠ Reload failed, showing previous data: {warning}"),
                self.theme.warning,
            )));
        }

        lines
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
