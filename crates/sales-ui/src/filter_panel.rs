//! Filter panel overlay: a dimension list beside the cascading option list
//! for the dimension under the cursor.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use sales_core::filters::{FilterOptions, FilterSelection, Selection, FILTER_ORDER};
use sales_core::models::Dimension;

use crate::themes::Theme;

/// Which list the cursor keys move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelColumn {
    Dimensions,
    Values,
}

/// Cursor state of the filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPanel {
    pub open: bool,
    pub column: PanelColumn,
    dim_index: usize,
    value_index: usize,
}

impl Default for FilterPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterPanel {
    pub fn new() -> Self {
        Self {
            open: false,
            column: PanelColumn::Dimensions,
            dim_index: 0,
            value_index: 0,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.column = PanelColumn::Dimensions;
    }

    /// Dimension under the cursor.
    pub fn dimension(&self) -> Dimension {
        FILTER_ORDER[self.dim_index]
    }

    pub fn value_index(&self) -> usize {
        self.value_index
    }

    pub fn switch_column(&mut self) {
        self.column = match self.column {
            PanelColumn::Dimensions => PanelColumn::Values,
            PanelColumn::Values => PanelColumn::Dimensions,
        };
    }

    pub fn move_up(&mut self) {
        match self.column {
            PanelColumn::Dimensions => {
                self.dim_index = self.dim_index.saturating_sub(1);
                self.value_index = 0;
            }
            PanelColumn::Values => self.value_index = self.value_index.saturating_sub(1),
        }
    }

    /// Move down, stopping at the last of `value_count` options.
    pub fn move_down(&mut self, value_count: usize) {
        match self.column {
            PanelColumn::Dimensions => {
                if self.dim_index + 1 < FILTER_ORDER.len() {
                    self.dim_index += 1;
                    self.value_index = 0;
                }
            }
            PanelColumn::Values => {
                if self.value_index + 1 < value_count {
                    self.value_index += 1;
                }
            }
        }
    }

    /// Keep the value cursor inside a list that may have shrunk.
    pub fn clamp(&mut self, value_count: usize) {
        self.value_index = self.value_index.min(value_count.saturating_sub(1));
    }

    /// Option values for the dimension under the cursor.
    pub fn values<'o>(&self, options: &'o [FilterOptions]) -> &'o [String] {
        options
            .iter()
            .find(|o| o.dimension == self.dimension())
            .map(|o| o.values.as_slice())
            .unwrap_or_default()
    }

    /// Value under the cursor, when the values list has focus.
    pub fn selected_value<'o>(&self, options: &'o [FilterOptions]) -> Option<&'o str> {
        if self.column != PanelColumn::Values {
            return None;
        }
        self.values(options)
            .get(self.value_index)
            .map(String::as_str)
    }
}

/// Short description of one dimension's selection for the dimension list.
fn selection_label(selection: &Selection) -> String {
    match selection {
        Selection::Unrestricted => "All".to_string(),
        Selection::Values(set) if set.len() == 1 => set.iter().next().cloned().unwrap_or_default(),
        Selection::Values(set) => format!("{} selected", set.len()),
    }
}

/// Centre a `percent_x` × `percent_y` box inside `area`.
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}

/// Draw the panel over `area`.
pub fn render_filter_panel(
    frame: &mut Frame,
    area: Rect,
    panel: &FilterPanel,
    selection: &FilterSelection,
    options: &[FilterOptions],
    theme: &Theme,
) {
    let popup = centered(area, 80, 80);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(Span::styled(" Filters ", theme.header));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [lists_area, help_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(inner);
    let [dims_area, values_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .areas(lists_area);

    let focus_style = |column: PanelColumn| {
        if panel.column == column {
            theme.info
        } else {
            theme.table_border
        }
    };

    let dim_items: Vec<ListItem> = FILTER_ORDER
        .iter()
        .map(|dim| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<22}", dim.display_name()), theme.label),
                Span::styled(selection_label(selection.get(*dim)), theme.value),
            ]))
        })
        .collect();
    let dims = List::new(dim_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(PanelColumn::Dimensions))
                .title(" Dimension "),
        )
        .highlight_style(theme.selected);
    let mut dim_state = ListState::default().with_selected(Some(panel.dim_index));
    frame.render_stateful_widget(dims, dims_area, &mut dim_state);

    let dim = panel.dimension();
    let current = selection.get(dim);
    let single = dim == Dimension::RegionName;
    let values = panel.values(options);
    let value_items: Vec<ListItem> = values
        .iter()
        .map(|v| {
            let chosen = current.contains(v);
            let marker = match (single, chosen) {
                (true, true) => "(•) ",
                (true, false) => "( ) ",
                (false, true) => "[x] ",
                (false, false) => "[ ] ",
            };
            let marker_style = if chosen { theme.checked } else { theme.dim };
            ListItem::new(Line::from(vec![
                Span::styled(marker, marker_style),
                Span::styled(v.clone(), theme.text),
            ]))
        })
        .collect();

    let values_title = format!(" {} ({}) ", dim.display_name(), values.len());
    let values_block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(PanelColumn::Values))
        .title(values_title);

    if values.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("No values under the preceding filters", theme.dim))
                .block(values_block),
            values_area,
        );
    } else {
        let list = List::new(value_items)
            .block(values_block)
            .highlight_style(theme.selected);
        let mut value_state = ListState::default().with_selected(
            (panel.column == PanelColumn::Values).then_some(panel.value_index),
        );
        frame.render_stateful_widget(list, values_area, &mut value_state);
    }

    frame.render_widget(
        Paragraph::new(Span::styled(
            "↑↓ move  ←→/Enter switch list  Space toggle  a all  c clear all  Esc close",
            theme.dim,
        )),
        help_area,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
