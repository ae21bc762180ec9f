//! ANSI color decoration

use crate::level::Level;

/// Terminal colors used for level decoration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Yellow,
    Blue,
    Magenta,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Yellow => 33,
            Color::Blue => 34,
            Color::Magenta => 35,
        }
    }
}

/// Color for a level; INFO is left undecorated
pub fn level_color(level: Level) -> Option<Color> {
    match level {
        Level::Debug => Some(Color::Blue),
        Level::Info => None,
        Level::Warning => Some(Color::Yellow),
        Level::Error => Some(Color::Red),
        Level::Critical => Some(Color::Magenta),
    }
}

/// Wrap `text` in bold color and reset sequences
pub fn colorize(text: &str, color: Color) -> String {
    format!("\x1b[1;{}m{}\x1b[0m", color.code(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_colors() {
        assert_eq!(level_color(Level::Debug), Some(Color::Blue));
        assert_eq!(level_color(Level::Info), None);
        assert_eq!(level_color(Level::Warning), Some(Color::Yellow));
        assert_eq!(level_color(Level::Error), Some(Color::Red));
        assert_eq!(level_color(Level::Critical), Some(Color::Magenta));
    }

    #[test]
    fn test_colorize() {
        assert_eq!(colorize("x", Color::Red), "\x1b[1;31mx\x1b[0m");
    }
}
