use crate::themes::Theme;
use ratatui::text::{Line, Span};

use sales_core::formatting::{format_currency, format_number};
use sales_data::aggregator::Totals;

// ── KpiCard ──────────────────────────────────────────────────────────────────

/// One headline figure: a caption line above a value line.
pub struct KpiCard<'a> {
    pub caption: &'static str,
    pub value: String,
    pub theme: &'a Theme,
}

impl<'a> KpiCard<'a> {
    pub fn new(caption: &'static str, value: String, theme: &'a Theme) -> Self {
        Self {
            caption,
            value,
            theme,
        }
    }

    /// Render the card as two [`Line`]s: caption, then value.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        vec![
            Line::from(Span::styled(self.caption, self.theme.label)),
            Line::from(Span::styled(self.value.clone(), self.theme.value)),
        ]
    }
}

/// The four overview cards, in display order: revenue, quantity, unique
/// items, active states.
pub fn kpi_cards<'a>(totals: &Totals, theme: &'a Theme) -> Vec<KpiCard<'a>> {
    vec![
        KpiCard::new("Total Revenue", format_currency(totals.revenue), theme),
        KpiCard::new("Quantity Sold", format_number(totals.quantity, 0), theme),
        KpiCard::new("Unique Items", format_number(totals.unique_items as f64, 0), theme),
        KpiCard::new("Active States", format_number(totals.active_states as f64, 0), theme),
    ]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
