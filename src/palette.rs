//! Ball color palette
//!
//! Each ball in a match gets one of twelve fixed colors. The closest-color
//! lookup is purely cosmetic (stats text) and has no effect on the physics.

use serde::{Deserialize, Serialize};

/// 8-bit RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance in RGB space
    pub fn distance_sq(&self, other: Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// The twelve ball colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaletteColor {
    Red,
    ForestGreen,
    Blue,
    Yellow,
    Magenta,
    Turquoise,
    Orange,
    Purple,
    Gold,
    HotPink,
    NavyBlue,
    DarkMagenta,
}

impl PaletteColor {
    /// Palette order; also the default assignment order for balls
    pub const ALL: [PaletteColor; 12] = [
        PaletteColor::Red,
        PaletteColor::ForestGreen,
        PaletteColor::Blue,
        PaletteColor::Yellow,
        PaletteColor::Magenta,
        PaletteColor::Turquoise,
        PaletteColor::Orange,
        PaletteColor::Purple,
        PaletteColor::Gold,
        PaletteColor::HotPink,
        PaletteColor::NavyBlue,
        PaletteColor::DarkMagenta,
    ];

    pub fn rgb(&self) -> Rgb {
        match self {
            PaletteColor::Red => Rgb::new(231, 76, 60),
            PaletteColor::ForestGreen => Rgb::new(34, 139, 34),
            PaletteColor::Blue => Rgb::new(52, 152, 219),
            PaletteColor::Yellow => Rgb::new(241, 196, 15),
            PaletteColor::Magenta => Rgb::new(255, 20, 147),
            PaletteColor::Turquoise => Rgb::new(64, 224, 208),
            PaletteColor::Orange => Rgb::new(255, 140, 0),
            PaletteColor::Purple => Rgb::new(138, 43, 226),
            PaletteColor::Gold => Rgb::new(255, 215, 0),
            PaletteColor::HotPink => Rgb::new(255, 105, 180),
            PaletteColor::NavyBlue => Rgb::new(25, 25, 112),
            PaletteColor::DarkMagenta => Rgb::new(128, 0, 128),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PaletteColor::Red => "Red",
            PaletteColor::ForestGreen => "Forest Green",
            PaletteColor::Blue => "Blue",
            PaletteColor::Yellow => "Yellow",
            PaletteColor::Magenta => "Magenta",
            PaletteColor::Turquoise => "Turquoise",
            PaletteColor::Orange => "Orange",
            PaletteColor::Purple => "Purple",
            PaletteColor::Gold => "Gold",
            PaletteColor::HotPink => "Hot Pink",
            PaletteColor::NavyBlue => "Navy Blue",
            PaletteColor::DarkMagenta => "Dark Magenta",
        }
    }

    /// Nearest palette entry to an arbitrary RGB value (first entry wins ties)
    pub fn closest(rgb: Rgb) -> Self {
        let mut best = PaletteColor::ALL[0];
        let mut best_dist = u32::MAX;
        for color in PaletteColor::ALL {
            let dist = rgb.distance_sq(color.rgb());
            if dist < best_dist {
                best_dist = dist;
                best = color;
            }
        }
        best
    }
}

/// Human-readable name of the palette color closest to `rgb`
pub fn closest_color_name(rgb: Rgb) -> &'static str {
    PaletteColor::closest(rgb).name()
}
