//! Node colours.
//!
//! Colours are carried as 8-bit RGBA and converted to normalized floats only
//! at the renderer boundary. HSL is the authoring space: the planner derives
//! hue, saturation and lightness straight from a similarity score.

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Self = Self { r: 255, g: 255, b: 255, a: 255 };

    /// Convert to normalized f32 (for rendering)
    #[inline(always)]
    pub fn to_f32(self) -> [f32; 4] {
        const INV_255: f32 = 1.0 / 255.0;
        [
            self.r as f32 * INV_255,
            self.g as f32 * INV_255,
            self.b as f32 * INV_255,
            self.a as f32 * INV_255,
        ]
    }

    /// Opaque colour from hue/saturation/lightness, each in [0, 1].
    ///
    /// Hue wraps, so `h = 1.0` is the same red as `h = 0.0`.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);

        if s == 0.0 {
            let v = to_byte(l);
            return Self { r: v, g: v, b: v, a: 255 };
        }

        let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self {
            r: to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
            g: to_byte(hue_to_channel(p, q, h)),
            b: to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
            a: 255,
        }
    }
}

#[inline]
fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

#[inline(always)]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(Rgba::from_hsl(0.0, 1.0, 0.5), Rgba { r: 255, g: 0, b: 0, a: 255 });
        assert_eq!(Rgba::from_hsl(1.0 / 3.0, 1.0, 0.5), Rgba { r: 0, g: 255, b: 0, a: 255 });
        assert_eq!(Rgba::from_hsl(2.0 / 3.0, 1.0, 0.5), Rgba { r: 0, g: 0, b: 255, a: 255 });
        assert_eq!(Rgba::from_hsl(1.0, 1.0, 0.5), Rgba::from_hsl(0.0, 1.0, 0.5));
    }

    #[test]
    fn greys_and_extremes() {
        assert_eq!(Rgba::from_hsl(0.3, 0.0, 0.5), Rgba { r: 128, g: 128, b: 128, a: 255 });
        assert_eq!(Rgba::from_hsl(0.7, 0.9, 1.0), Rgba::WHITE);
        assert_eq!(Rgba::from_hsl(0.7, 0.9, 0.0), Rgba::BLACK);
    }

    #[test]
    fn normalized_output() {
        let c = Rgba::WHITE.to_f32();
        assert!(c.iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }
}
