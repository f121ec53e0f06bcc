// Colored console output

use ::console::Style;

const RESET: &str = "\x1b[0m";

/// Terminal colors used by the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
    Reset,
}

impl Color {
    /// Bright variant of the color; `None` for `Reset`
    fn style(&self) -> Option<Style> {
        let style = Style::new();
        let style = match self {
            Self::Red => style.red(),
            Self::Green => style.green(),
            Self::Yellow => style.yellow(),
            Self::Blue => style.blue(),
            Self::Cyan => style.cyan(),
            Self::Reset => return None,
        };
        Some(style.bright().force_styling(true))
    }
}

/// Wrap `text` in the color code and a trailing reset
pub fn paint(text: &str, color: Color) -> String {
    match color.style() {
        Some(style) => style.apply_to(text).to_string(),
        None => format!("{}{}{}", RESET, text, RESET),
    }
}

pub fn print_colored(text: &str, color: Color) {
    println!("{}", paint(text, color));
}
