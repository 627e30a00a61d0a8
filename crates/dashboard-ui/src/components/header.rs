use crate::themes::Theme;
use dashboard_data::reader::LoadReport;
use ratatui::text::{Line, Span};

/// Application title shown on the first header line.
pub const TITLE: &str = "SALES ANALYTICS DASHBOARD";

/// Dashboard header rendering three lines:
///
/// 1. Application title.
/// 2. Load summary in `[ source | N records | M rejected ]` format.
/// 3. A separator the width of the title block.
pub struct Header<'a> {
    pub load: &'a LoadReport,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(load: &'a LoadReport, theme: &'a Theme) -> Self {
        Self { load, theme }
    }

    /// Render the header as exactly three lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let rejected = self.load.rejected.total();
        let rejected_style = if rejected > 0 {
            self.theme.warning
        } else {
            self.theme.value
        };

        vec![
            Line::from(Span::styled(TITLE, self.theme.header)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.load.source.display().to_string(), self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(format!("{} records", self.load.accepted), self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(format!("{} rejected", rejected), rejected_style),
                Span::styled(" | loaded ", self.theme.label),
                Span::styled(
                    self.load.loaded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                    self.theme.value,
                ),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(Span::styled("=".repeat(60), self.theme.separator)),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
