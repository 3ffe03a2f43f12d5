use crate::ui::style::{Color, Style};

/// Styles handed to every draw call through the render context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub label: Style,
    pub value: Style,
    pub placeholder: Style,
    pub error: Style,
    pub hint: Style,
    pub group: Style,
    pub accent: Style,
    pub missing: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            label: Style::new().bold(),
            value: Style::new(),
            placeholder: Style::new().color(Color::DarkGrey),
            error: Style::new().color(Color::Red).bold(),
            hint: Style::new().color(Color::DarkGrey),
            group: Style::new().color(Color::Cyan).bold(),
            accent: Style::new().color(Color::Green),
            missing: Style::new().color(Color::Yellow).strikethrough(),
        }
    }
}
