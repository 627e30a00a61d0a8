use crate::themes::Theme;
use dashboard_core::models::View;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Navigation menu listing every view, numbered for the `1`–`6` shortcuts.
pub struct Sidebar<'a> {
    pub selected: View,
    pub theme: &'a Theme,
}

impl<'a> Sidebar<'a> {
    pub fn new(selected: View, theme: &'a Theme) -> Self {
        Self { selected, theme }
    }

    /// One line per view, in navigation order.
    pub fn items(&self) -> Vec<ListItem<'a>> {
        View::ALL
            .iter()
            .enumerate()
            .map(|(i, view)| {
                let style = if *view == self.selected {
                    self.theme.sidebar_selected
                } else {
                    self.theme.sidebar_item
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", i + 1), self.theme.dim),
                    Span::styled(view.title(), style),
                ]))
            })
            .collect()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let list = List::new(self.items())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.table_border)
                    .title(Span::styled(" Analysis Dashboard ", self.theme.header)),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.selected.index()));
        frame.render_stateful_widget(list, area, &mut state);
    }
}
