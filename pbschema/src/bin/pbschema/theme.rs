use colored::Color;
use comfy_table::Color as TableColor;
use once_cell::sync::Lazy;
use pbschema::Severity;

/// Colors for messages and help output.
pub struct ColorTheme {
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub highlight: Color,
    pub muted: Color,
    pub primary: Color,
    pub secondary: Color,
    pub key: Color,
    pub value: Color,
}

impl ColorTheme {
    const fn standard() -> Self {
        Self {
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Blue,
            highlight: Color::Cyan,
            muted: Color::BrightBlack,
            primary: Color::BrightBlue,
            secondary: Color::Magenta,
            key: Color::BrightCyan,
            value: Color::White,
        }
    }

    pub fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::High => self.error,
            Severity::Medium => self.warning,
            Severity::Low => self.muted,
        }
    }
}

pub static THEME: Lazy<ColorTheme> = Lazy::new(ColorTheme::standard);

/// Marker shown next to a row of a diff table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMark {
    Added,
    Removed,
    Changed,
}

impl ChangeMark {
    pub fn icon(self) -> &'static str {
        match self {
            ChangeMark::Added => "+",
            ChangeMark::Removed => "-",
            ChangeMark::Changed => "~",
        }
    }

    pub fn table_color(self) -> TableColor {
        match self {
            ChangeMark::Added => TableColor::Green,
            ChangeMark::Removed => TableColor::Red,
            ChangeMark::Changed => TableColor::Yellow,
        }
    }
}

/// Message icons
pub struct Icons {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub arrow: &'static str,
    pub bullet: &'static str,
    pub lock: &'static str,
}

pub const ICONS: Icons = Icons {
    success: "✓",
    error: "✗",
    warning: "⚠",
    info: "ℹ",
    arrow: "→",
    bullet: "•",
    lock: "🔒",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_colors() {
        assert_eq!(THEME.severity(Severity::High), Color::Red);
        assert_eq!(THEME.severity(Severity::Low), Color::BrightBlack);
    }

    #[test]
    fn test_change_marks() {
        assert_eq!(ChangeMark::Added.icon(), "+");
        assert_eq!(ChangeMark::Removed.table_color(), TableColor::Red);
    }
}
