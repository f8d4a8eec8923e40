//! RGB color type for the overlays drawn on visualization canvases.

/// RGB color with f32 components in the 0-255 range, the same range as image samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a color from RGB components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create a gray color with all components equal to `v`.
    pub const fn gray(v: f32) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Rec. 709 luminance.
    pub fn luminance(&self) -> f32 {
        luminance(self.to_rgb())
    }

    pub const fn to_rgb(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub const RED: Color = Color::rgb(255.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 255.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 255.0);
    pub const YELLOW: Color = Color::rgb(255.0, 255.0, 0.0);
    pub const WHITE: Color = Color::gray(255.0);
    pub const BLACK: Color = Color::gray(0.0);
}

/// Rec. 709 luminance of an RGB triple.
#[inline]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2]
}

impl From<[f32; 3]> for Color {
    fn from(arr: [f32; 3]) -> Self {
        Self::rgb(arr[0], arr[1], arr[2])
    }
}

impl From<Color> for [f32; 3] {
    fn from(c: Color) -> Self {
        c.to_rgb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_of_white_is_full_scale() {
        assert!((Color::WHITE.luminance() - 255.0).abs() < 1e-3);
        assert_eq!(Color::BLACK.luminance(), 0.0);
    }

    #[test]
    fn test_array_conversion() {
        let c: Color = [1.0, 2.0, 3.0].into();
        let arr: [f32; 3] = c.into();
        assert_eq!(arr, [1.0, 2.0, 3.0]);
    }
}
