//! Conversion flags
//!
//! Selects the dithering kind used when color information is lost and
//! whether an indexed conversion prefers an exact palette over a
//! dithered one.

/// Dithering applied when converting to a format with fewer colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMode {
    /// Floyd-Steinberg error diffusion
    #[default]
    Diffuse,
    /// 16x16 ordered Bayer matrix
    Ordered,
    /// Plain mid-point threshold
    Threshold,
}

/// Dithering applied to the alpha channel when it collapses to a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaDitherMode {
    /// Hard 50% cut
    #[default]
    Threshold,
    /// 16x16 ordered Bayer matrix
    Ordered,
    /// Floyd-Steinberg error diffusion
    Diffuse,
}

/// Palette strategy for 32-bit to indexed conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteMode {
    /// Use the exact colors when at most 256 are present, quantize
    /// otherwise
    #[default]
    Auto,
    /// Always quantize to the uniform color cube and dither
    PreferDither,
}

/// Options steering lossy conversions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversionFlags {
    pub color_dither: DitherMode,
    pub alpha_dither: AlphaDitherMode,
    pub palette_mode: PaletteMode,
}

impl ConversionFlags {
    /// Flags selecting ordered dithering for color and alpha.
    pub fn ordered() -> Self {
        Self {
            color_dither: DitherMode::Ordered,
            alpha_dither: AlphaDitherMode::Ordered,
            palette_mode: PaletteMode::Auto,
        }
    }

    /// Flags selecting plain thresholding everywhere.
    pub fn threshold() -> Self {
        Self {
            color_dither: DitherMode::Threshold,
            alpha_dither: AlphaDitherMode::Threshold,
            palette_mode: PaletteMode::Auto,
        }
    }
}
