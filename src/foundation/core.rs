use crate::foundation::error::{KilnError, KilnResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Integer pixel dimensions of a surface or frame.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IntSize {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
}

impl IntSize {
    /// Create a size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bytes required for an RGBA8 allocation of this size.
    pub fn rgba8_byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }

    pub(crate) fn to_u16_pair(self) -> KilnResult<(u16, u16)> {
        let w: u16 = self
            .width
            .try_into()
            .map_err(|_| KilnError::validation(format!("surface width exceeds u16: {}", self.width)))?;
        let h: u16 = self.height.try_into().map_err(|_| {
            KilnError::validation(format!("surface height exceeds u16: {}", self.height))
        })?;
        Ok((w, h))
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Fully opaque black.
    pub fn black() -> Self {
        Self { r: 0, g: 0, b: 0, a: 255 }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub(crate) fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_size_empty_and_bytes() {
        assert!(IntSize::new(0, 8).is_empty());
        assert!(!IntSize::new(1, 1).is_empty());
        assert_eq!(IntSize::new(8, 4).rgba8_byte_len(), 8 * 4 * 4);
    }

    #[test]
    fn premul_is_rounded_not_truncated() {
        let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
        assert_eq!(c.r, 128);
        assert_eq!(c.g, 64);
        assert_eq!(c.b, 0);
        assert_eq!(c.a, 128);
    }
}
