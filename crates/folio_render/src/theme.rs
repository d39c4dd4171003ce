/// Points per millimetre.
pub const MM: f32 = 72.0 / 25.4;

/// A4 portrait, in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

pub const MARGIN: f32 = 18.0 * MM;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
pub const HEADER_HEIGHT: f32 = 9.0 * MM;
pub const FOOTER_HEIGHT: f32 = 8.0 * MM;
pub const COVER_BAR_HEIGHT: f32 = 7.0 * MM;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    pub const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];

    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
        }
    }

    /// Resource name used inside content streams.
    pub fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
        }
    }
}

/// An sRGB colour stored as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFFFFFF);

    pub fn components(&self) -> [f32; 3] {
        let channel = |shift: u32| ((self.0 >> shift) & 0xFF) as f32 / 255.0;
        [channel(16), channel(8), channel(0)]
    }

    /// Mixes `amount` (0..=1) of `other` into this colour.
    pub fn blend(&self, other: Rgb, amount: f32) -> Rgb {
        let a = self.components();
        let b = other.components();
        let mix = |i: usize| ((a[i] + (b[i] - a[i]) * amount) * 255.0).round() as u32;
        Rgb((mix(0) << 16) | (mix(1) << 8) | mix(2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub leading: f32,
    pub color: Rgb,
    pub space_after: f32,
}

impl TextStyle {
    const fn new(font: Font, size: f32, leading: f32, color: Rgb, space_after: f32) -> Self {
        Self {
            font,
            size,
            leading,
            color,
            space_after,
        }
    }
}

/// Brand colours and the text styles built from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub primary: Rgb,
    pub accent: Rgb,
    pub accent_pale: Rgb,
    pub dark: Rgb,
    pub body: Rgb,
    pub rule: Rgb,

    pub cover_company: TextStyle,
    pub cover_headline: TextStyle,
    pub cover_body: TextStyle,
    pub cover_tagline: TextStyle,
    pub label: TextStyle,
    pub heading: TextStyle,
    pub body_text: TextStyle,
    pub bullet: TextStyle,
    pub cta_heading: TextStyle,
    pub cta_body: TextStyle,
    pub contact_key: TextStyle,
    pub contact_value: TextStyle,
    pub header: TextStyle,
    pub header_tagline: TextStyle,
    pub footer: TextStyle,
}

impl Default for Theme {
    fn default() -> Self {
        let primary = Rgb(0x1C2E4A);
        let accent = Rgb(0xD4A843);
        let accent_pale = Rgb(0xF5E9C6);
        let dark = Rgb(0x1A1A2E);
        let body = Rgb(0x4A5568);
        let rule = Rgb(0xD8DEE4);

        Self {
            primary,
            accent,
            accent_pale,
            dark,
            body,
            rule,
            cover_company: TextStyle::new(Font::Bold, 34.0, 40.0, Rgb::WHITE, 10.0),
            cover_headline: TextStyle::new(Font::Bold, 22.0, 28.0, accent_pale, 4.0),
            cover_body: TextStyle::new(Font::Regular, 13.0, 20.0, Rgb::WHITE, 4.0),
            cover_tagline: TextStyle::new(Font::Oblique, 10.0, 14.0, accent, 0.0),
            label: TextStyle::new(Font::Bold, 8.0, 12.0, accent, 0.0),
            heading: TextStyle::new(Font::Bold, 22.0, 28.0, primary, 4.0),
            body_text: TextStyle::new(Font::Regular, 10.0, 16.0, body, 5.0),
            bullet: TextStyle::new(Font::Regular, 10.0, 16.0, body, 3.0),
            cta_heading: TextStyle::new(Font::Bold, 18.0, 24.0, accent_pale, 6.0),
            cta_body: TextStyle::new(Font::Regular, 11.0, 18.0, Rgb::WHITE, 6.0),
            contact_key: TextStyle::new(Font::Bold, 9.0, 14.0, primary, 0.0),
            contact_value: TextStyle::new(Font::Regular, 9.0, 14.0, body, 0.0),
            header: TextStyle::new(Font::Bold, 8.0, 10.0, Rgb::WHITE, 0.0),
            header_tagline: TextStyle::new(Font::Oblique, 7.5, 10.0, accent_pale, 0.0),
            footer: TextStyle::new(Font::Regular, 7.5, 10.0, body, 0.0),
        }
    }
}
