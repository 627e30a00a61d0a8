use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`.  Background values
/// 0–6 are considered dark; 7–15 are considered light.  If the variable is
/// absent or unparseable, `BackgroundType::Dark` is returned.
pub fn detect_background() -> BackgroundType {
    background_from(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_from(colorfgbg: Option<&str>) -> BackgroundType {
    if let Some(val) = colorfgbg {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

/// Every style the dashboard widgets draw with.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Sidebar ──────────────────────────────────────────────────────────────
    pub sidebar_item: Style,
    pub sidebar_selected: Style,

    // ── Charts ───────────────────────────────────────────────────────────────
    pub chart_title: Style,
    pub chart_axis: Style,
    pub bar_value: Style,
    /// Bars for a measure that went negative (loss-making profit).
    pub bar_negative: Style,
    /// Colours cycled across series in grouped charts.
    pub series: Vec<Color>,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub table_total: Style,
}

impl Theme {
    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            sidebar_item: Style::default().fg(Color::Gray),
            sidebar_selected: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),

            chart_title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            chart_axis: Style::default().fg(Color::Gray),
            bar_value: Style::default().fg(Color::White),
            bar_negative: Style::default().fg(Color::Red),
            series: vec![
                Color::Blue,
                Color::Red,
                Color::Green,
                Color::Magenta,
                Color::Yellow,
                Color::Cyan,
            ],

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Light-background terminal theme.
    ///
    /// Uses dark colours for text so that content remains legible against a
    /// white or light-grey terminal canvas.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            sidebar_item: Style::default().fg(Color::DarkGray),
            sidebar_selected: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),

            chart_title: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            chart_axis: Style::default().fg(Color::DarkGray),
            bar_value: Style::default().fg(Color::Black),
            bar_negative: Style::default().fg(Color::Red),
            series: vec![
                Color::Blue,
                Color::Red,
                Color::Green,
                Color::Magenta,
                Color::Rgb(255, 127, 14),
                Color::DarkGray,
            ],

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_total: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Classic terminal theme using only the basic 8-colour ANSI palette, no
    /// bold.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            sidebar_item: Style::default().fg(Color::White),
            sidebar_selected: Style::default().fg(Color::Black).bg(Color::White),

            chart_title: Style::default().fg(Color::Cyan),
            chart_axis: Style::default().fg(Color::White),
            bar_value: Style::default().fg(Color::White),
            bar_negative: Style::default().fg(Color::Red),
            series: vec![
                Color::Blue,
                Color::Red,
                Color::Green,
                Color::Magenta,
                Color::Yellow,
                Color::Cyan,
            ],

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default().fg(Color::Yellow),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name.  Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Colour for the `index`-th series, cycling through the palette.
    pub fn series_color(&self, index: usize) -> Color {
        if self.series.is_empty() {
            return Color::Gray;
        }
        self.series[index % self.series.len()]
    }

    /// Bar style for a value: the series colour, or `bar_negative` below zero.
    pub fn bar_style(&self, value: f64, index: usize) -> Style {
        if value < 0.0 {
            self.bar_negative
        } else {
            Style::default().fg(self.series_color(index))
        }
    }

    /// Style for a signed percentage such as a growth rate.
    pub fn growth_style(&self, pct: f64) -> Style {
        if pct > 0.0 {
            self.success
        } else if pct < 0.0 {
            self.error
        } else {
            self.text
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_theme_creation() {
        let t = Theme::dark();
        assert_eq!(t.header.fg, Some(Color::Cyan));
        assert_eq!(t.success.fg, Some(Color::Green));
        assert_eq!(t.error.fg, Some(Color::Red));
        assert_eq!(t.sidebar_selected.bg, Some(Color::Cyan));
        assert_eq!(t.series.len(), 6);
    }

    #[test]
    fn test_light_theme_creation() {
        let t = Theme::light();
        assert_eq!(t.header.fg, Some(Color::Blue));
        assert_eq!(t.text.fg, Some(Color::Black));
        assert_eq!(t.table_row.fg, Some(Color::Black));
    }

    #[test]
    fn test_classic_theme_has_no_bold() {
        let t = Theme::classic();
        assert!(!t.header.add_modifier.contains(Modifier::BOLD));
        assert!(!t.value.add_modifier.contains(Modifier::BOLD));
        assert!(!t.sidebar_selected.add_modifier.contains(Modifier::BOLD));
        assert_eq!(t.table_total.fg, Some(Color::Yellow));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Theme::from_name("dark").header.fg, Some(Color::Cyan));
        assert_eq!(Theme::from_name("light").header.fg, Some(Color::Blue));
        assert!(Theme::from_name("does-not-exist").header.fg.is_some());
    }

    #[test]
    fn test_background_from_colorfgbg() {
        assert_eq!(background_from(Some("15;0")), BackgroundType::Dark);
        assert_eq!(background_from(Some("0;15")), BackgroundType::Light);
        assert_eq!(background_from(Some("0;7")), BackgroundType::Light);
        assert_eq!(background_from(Some("garbage")), BackgroundType::Dark);
        assert_eq!(background_from(None), BackgroundType::Dark);
    }

    #[test]
    fn test_series_color_cycles() {
        let t = Theme::dark();
        assert_eq!(t.series_color(0), Color::Blue);
        assert_eq!(t.series_color(6), Color::Blue);
        assert_eq!(t.series_color(7), Color::Red);
    }

    #[test]
    fn test_bar_style_negative() {
        let t = Theme::dark();
        assert_eq!(t.bar_style(-1.0, 0).fg, Some(Color::Red));
        assert_eq!(t.bar_style(1.0, 2).fg, Some(Color::Green));
    }

    #[test]
    fn test_growth_style() {
        let t = Theme::dark();
        assert_eq!(t.growth_style(12.5).fg, Some(Color::Green));
        assert_eq!(t.growth_style(-3.0).fg, Some(Color::Red));
        assert_eq!(t.growth_style(0.0).fg, Some(Color::White));
    }
}
