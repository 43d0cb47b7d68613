//! Pixel formats understood by the frame-distribution service.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// `RSPixelFormat`. Discriminants are the SDK's integer codes.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive)]
pub enum PixelFormat {
    Invalid = 0,
    Bgra8 = 1,
    Bgrx8 = 2,
    Rgba32F = 3,
    Rgba16 = 4,
    Rgba8 = 5,
    Rgbx8 = 6,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 7] = [
        PixelFormat::Invalid,
        PixelFormat::Bgra8,
        PixelFormat::Bgrx8,
        PixelFormat::Rgba32F,
        PixelFormat::Rgba16,
        PixelFormat::Rgba8,
        PixelFormat::Rgbx8,
    ];

    /// Decode an integer code received over the C ABI.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::from_i32(code)
    }

    /// True for the 8-bit-per-channel formats, the only ones with an sRGB
    /// variant.
    pub fn is_8bit(self) -> bool {
        matches!(
            self,
            PixelFormat::Bgra8 | PixelFormat::Bgrx8 | PixelFormat::Rgba8 | PixelFormat::Rgbx8
        )
    }
}
