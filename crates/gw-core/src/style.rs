//! Terminal styling for result tables, with NO_COLOR support.

/// Check if color output is allowed by the environment (`NO_COLOR`).
pub fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// What a piece of table text means, which decides its colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Column headers and row labels.
    Header,
    /// Positive terminal payoffs.
    Gain,
    /// Negative terminal payoffs.
    Loss,
    /// Obstacles, elisions and other filler.
    Muted,
    /// The best action in a Q-value row.
    Highlight,
}

#[derive(Debug, Clone, Copy)]
pub struct Style {
    enabled: bool,
}

impl Style {
    /// Honour an explicit `--no-color` on top of the environment.
    pub fn with_color(color: bool) -> Self {
        Self {
            enabled: color && color_enabled(),
        }
    }

    /// Create a style with colors explicitly enabled (for tests).
    pub fn force_enabled() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn code(tone: Tone) -> &'static str {
        match tone {
            Tone::Header => "\x1b[1m",
            Tone::Gain => "\x1b[32m",
            Tone::Loss => "\x1b[31m",
            Tone::Muted => "\x1b[2m",
            Tone::Highlight => "\x1b[36m",
        }
    }

    pub fn paint(&self, tone: Tone, text: &str) -> String {
        if self.enabled {
            format!("{}{text}\x1b[0m", Self::code(tone))
        } else {
            text.to_string()
        }
    }
}

/// Printed width of a string, skipping ANSI escape sequences.
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if c == '\x1b' {
            in_escape = true;
        } else if c >= ' ' {
            width += 1;
        }
    }
    width
}

/// Right-align `s` in a field of `width` printed columns.
pub fn pad_left(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(visible_width(s));
    format!("{}{s}", " ".repeat(pad))
}

/// Format a signed value with a fixed number of decimals and an explicit sign.
pub fn format_signed(value: f64, decimals: usize) -> String {
    format!("{value:+.decimals$}")
}
