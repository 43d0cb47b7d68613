//! Service pixel format to native texture format translation.

use renderstream_core::PixelFormat;

/// The `DXGI_FORMAT` values this bridge allocates. Discriminants are the
/// DXGI enumeration values, so the mapping is checkable on every platform.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NativeFormat {
    R32G32B32A32Float = 2,
    R16G16B16A16Unorm = 11,
    R8G8B8A8Unorm = 28,
    R8G8B8A8UnormSrgb = 29,
    B8G8R8A8Unorm = 87,
    B8G8R8A8UnormSrgb = 91,
}

impl NativeFormat {
    pub fn dxgi_value(self) -> u32 {
        self as u32
    }

    pub fn is_srgb(self) -> bool {
        matches!(
            self,
            NativeFormat::R8G8B8A8UnormSrgb | NativeFormat::B8G8R8A8UnormSrgb
        )
    }
}

/// Map a service pixel format to its native format.
///
/// `srgb` selects the sRGB-encoded variant of the 8-bit formats and is
/// ignored for the float and 16-bit formats. X8 formats share their A8
/// counterpart's storage. `Invalid` has no mapping.
pub fn translate(format: PixelFormat, srgb: bool) -> Option<NativeFormat> {
    let native = match (format, srgb) {
        (PixelFormat::Bgra8 | PixelFormat::Bgrx8, false) => NativeFormat::B8G8R8A8Unorm,
        (PixelFormat::Bgra8 | PixelFormat::Bgrx8, true) => NativeFormat::B8G8R8A8UnormSrgb,
        (PixelFormat::Rgba8 | PixelFormat::Rgbx8, false) => NativeFormat::R8G8B8A8Unorm,
        (PixelFormat::Rgba8 | PixelFormat::Rgbx8, true) => NativeFormat::R8G8B8A8UnormSrgb,
        (PixelFormat::Rgba32F, _) => NativeFormat::R32G32B32A32Float,
        (PixelFormat::Rgba16, _) => NativeFormat::R16G16B16A16Unorm,
        (PixelFormat::Invalid, _) => return None,
    };
    Some(native)
}

#[cfg(target_os = "windows")]
impl From<NativeFormat> for windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT {
    fn from(format: NativeFormat) -> Self {
        Self(format.dxgi_value() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_valid_format_translates() {
        for format in PixelFormat::ALL {
            for srgb in [false, true] {
                let native = translate(format, srgb);
                assert_eq!(native.is_some(), format != PixelFormat::Invalid, "{format:?}");
            }
        }
    }

    #[test]
    fn invalid_never_translates() {
        assert_eq!(translate(PixelFormat::Invalid, false), None);
        assert_eq!(translate(PixelFormat::Invalid, true), None);
    }

    #[test]
    fn srgb_selects_encoded_variant_for_8bit_only() {
        assert_eq!(translate(PixelFormat::Bgrx8, true), Some(NativeFormat::B8G8R8A8UnormSrgb));
        assert_eq!(translate(PixelFormat::Rgba8, false), Some(NativeFormat::R8G8B8A8Unorm));
        assert_eq!(translate(PixelFormat::Rgbx8, true), Some(NativeFormat::R8G8B8A8UnormSrgb));
        assert_eq!(translate(PixelFormat::Rgba32F, true), Some(NativeFormat::R32G32B32A32Float));
        for format in PixelFormat::ALL {
            if let Some(native) = translate(format, true) {
                assert_eq!(native.is_srgb(), format.is_8bit(), "{format:?}");
            }
        }
    }

    #[test]
    fn rgba16_is_16bit_unorm_not_float() {
        for srgb in [false, true] {
            let native = translate(PixelFormat::Rgba16, srgb).unwrap();
            assert_eq!(native, NativeFormat::R16G16B16A16Unorm);
            assert_eq!(native.dxgi_value(), 11);
        }
    }
}
