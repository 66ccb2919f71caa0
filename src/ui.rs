// src/ui.rs
use iced::widget::container;
use iced::{Background, Color, Theme};
use once_cell::sync::Lazy;

pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub panel_bg: Color,
    pub panel_border: Color,
    pub header_bg: Color,
    pub total: Color,
    pub pending: Color,
    pub shipped: Color,
    pub success: Color,
    pub error: Color,
}

pub static LIGHT_THEME: Lazy<Palette> = Lazy::new(|| Palette {
    bg: Color::from_rgb(0.976, 0.98, 0.984),
    fg: Color::from_rgb(0.122, 0.161, 0.216),
    muted: Color::from_rgb(0.42, 0.447, 0.502),
    panel_bg: Color::WHITE,
    panel_border: Color::from_rgb(0.898, 0.906, 0.922),
    header_bg: Color::from_rgb(0.976, 0.98, 0.984),
    total: Color::from_rgb(0.494, 0.133, 0.808),   // #7e22ce
    pending: Color::from_rgb(0.961, 0.62, 0.043),  // #f59e0b
    shipped: Color::from_rgb(0.086, 0.639, 0.29),  // #16a34a
    success: Color::from_rgb(0.086, 0.639, 0.29),
    error: Color::from_rgb(0.863, 0.149, 0.149),
});

pub static DARK_THEME: Lazy<Palette> = Lazy::new(|| Palette {
    bg: Color::from_rgb(0.067, 0.075, 0.09),
    fg: Color::from_rgb(0.953, 0.957, 0.965),
    muted: Color::from_rgb(0.612, 0.639, 0.686),
    panel_bg: Color::from_rgb(0.122, 0.133, 0.157),
    panel_border: Color::from_rgb(0.216, 0.255, 0.318),
    header_bg: Color::from_rgb(0.2, 0.2, 0.2),
    total: Color::from_rgb(0.753, 0.518, 0.988),
    pending: Color::from_rgb(0.988, 0.827, 0.302),
    shipped: Color::from_rgb(0.29, 0.871, 0.502),
    success: Color::from_rgb(0.29, 0.871, 0.502),
    error: Color::from_rgb(0.973, 0.443, 0.443),
});

/// Flat container with an optional border, used for cards, headers and banners.
pub struct Panel {
    pub bg: Color,
    pub border: Color,
    pub radius: f32,
}

impl Panel {
    pub fn card(palette: &Palette) -> Self {
        Panel {
            bg: palette.panel_bg,
            border: palette.panel_border,
            radius: 6.0,
        }
    }

    pub fn fill(bg: Color) -> Self {
        Panel {
            bg,
            border: Color::TRANSPARENT,
            radius: 0.0,
        }
    }
}

impl container::StyleSheet for Panel {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> container::Appearance {
        container::Appearance {
            text_color: None,
            background: Some(Background::Color(self.bg)),
            border_radius: self.radius.into(),
            border_width: if self.border == Color::TRANSPARENT { 0.0 } else { 1.0 },
            border_color: self.border,
        }
    }
}
