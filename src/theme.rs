use std::collections::HashMap;
use std::str::FromStr;

use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeTokens {
    pub text_primary: Color,
    pub text_muted: Color,
    pub border: Color,
    pub title: Color,

    pub status_fg: Color,
    pub status_bg: Color,

    pub accent_danger: Color,

    pub selection_fg: Color,
    pub selection_bg: Color,
}

impl Default for ThemeTokens {
    fn default() -> Self {
        Self::builtin_dark()
    }
}

impl ThemeTokens {
    #[must_use]
    pub fn builtin_dark() -> Self {
        Self {
            text_primary: Color::White,
            text_muted: Color::Gray,
            border: Color::DarkGray,
            title: Color::White,

            status_fg: Color::White,
            status_bg: Color::Rgb(30, 30, 46),

            accent_danger: Color::Red,

            selection_fg: Color::Black,
            selection_bg: Color::Cyan,
        }
    }

    #[must_use]
    pub fn builtin_light() -> Self {
        Self {
            text_primary: Color::Black,
            text_muted: Color::DarkGray,
            border: Color::Gray,
            title: Color::Black,

            status_fg: Color::Black,
            status_bg: Color::Rgb(238, 238, 238),

            accent_danger: Color::Red,

            selection_fg: Color::White,
            selection_bg: Color::Blue,
        }
    }

    fn apply_token(&mut self, key: &str, value: &str) -> bool {
        let Some(color) = parse_color(value) else {
            return false;
        };
        let slot = match key {
            "text_primary" => &mut self.text_primary,
            "text_muted" => &mut self.text_muted,
            "border" => &mut self.border,
            "title" => &mut self.title,
            "status_fg" => &mut self.status_fg,
            "status_bg" => &mut self.status_bg,
            "accent_danger" => &mut self.accent_danger,
            "selection_fg" => &mut self.selection_fg,
            "selection_bg" => &mut self.selection_bg,
            _ => return false,
        };
        *slot = color;
        true
    }
}

/// Builtin theme by name (dark unless "light") with per-token overrides.
/// Unknown tokens and unparsable colours are skipped.
#[must_use]
pub fn load_theme<S: ::std::hash::BuildHasher>(
    name: Option<&str>,
    overrides: Option<&HashMap<String, String, S>>,
) -> ThemeTokens {
    let mut tokens = match name.map(str::to_ascii_lowercase) {
        Some(n) if n == "light" => ThemeTokens::builtin_light(),
        _ => ThemeTokens::builtin_dark(),
    };
    if let Some(map) = overrides {
        for (k, v) in map {
            if !tokens.apply_token(k, v) {
                tracing::warn!(token = %k, value = %v, "ignoring theme override");
            }
        }
    }
    tokens
}

/// `#rrggbb`, bare `rrggbb`, a colour name or an ANSI index.
#[must_use]
pub fn parse_color(spec: &str) -> Option<Color> {
    let s = spec.trim();
    if s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Color::from_str(&format!("#{s}")).ok();
    }
    Color::from_str(s).ok()
}
