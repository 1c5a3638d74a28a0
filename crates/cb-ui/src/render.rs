//! Visual helpers: theme flag, category glyphs, and the avatar SVG renderer.

use cb_core::avatar::{AvatarSpec, Shape};
use cb_core::models::CategoryIcon;

/// The visitor's light/dark preference, persisted as a session-scope flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }

    /// The CSS class on `<body>`, doubling as the stored flag value.
    pub fn class(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Static icon lookup with a defined fallback; category rows carry free-form
/// icon names and unknown ones already collapsed to `Chat` at decode time.
pub fn icon_glyph(icon: CategoryIcon) -> &'static str {
    match icon {
        CategoryIcon::Chat => "💬",
        CategoryIcon::Book => "📚",
        CategoryIcon::GraduationCap => "🎓",
        CategoryIcon::Coffee => "☕",
        CategoryIcon::Home => "🏠",
        CategoryIcon::Megaphone => "📣",
        CategoryIcon::Lightbulb => "💡",
    }
}

/// Renders an avatar spec as a standalone SVG document of `size` pixels.
///
/// Geometry: the shape is inset inside the square so the background color
/// stays visible as a ring around it.
pub fn render_avatar_svg(spec: &AvatarSpec, size: u32) -> String {
    let s = size as f32;
    let half = s / 2.0;
    let shape = match spec.shape {
        Shape::Circle => format!(
            r#"<circle cx="{half}" cy="{half}" r="{r}" fill="{fill}"/>"#,
            r = half * 0.6,
            fill = spec.foreground,
        ),
        Shape::Square => {
            let side = s * 0.7;
            let offset = (s - side) / 2.0;
            format!(
                r#"<rect x="{offset}" y="{offset}" width="{side}" height="{side}" fill="{fill}"/>"#,
                fill = spec.foreground,
            )
        }
        Shape::Triangle => format!(
            r#"<polygon points="{half},{top} {left},{bottom} {right},{bottom}" fill="{fill}"/>"#,
            top = s * 0.2,
            left = s * 0.2,
            bottom = s * 0.8,
            right = s * 0.8,
            fill = spec.foreground,
        ),
        Shape::Diamond => format!(
            r#"<polygon points="{half},{top} {right},{half} {half},{bottom} {left},{half}" fill="{fill}"/>"#,
            top = s * 0.2,
            right = s * 0.8,
            bottom = s * 0.8,
            left = s * 0.2,
            fill = spec.foreground,
        ),
    };
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}" style="background-color:{bg}">{shape}</svg>"#,
        bg = spec.background,
    )
}
