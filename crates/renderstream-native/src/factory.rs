//! Shared texture creation on the engine's device.

use gpu_interop::{translate, SharedTextureAllocator, SharedTextureDesc, TextureHandle};
use renderstream_core::{InteropError, PixelFormat, Result};
use tracing::{debug, error};

use crate::device::DeviceState;

/// A texture request as the managed side describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub srgb: bool,
    /// Debug name shown in GPU captures.
    pub name: Option<&'a str>,
}

impl<'a> TextureDescriptor<'a> {
    /// Validate raw C ABI arguments.
    pub fn from_abi(
        name: Option<&'a str>,
        width: i32,
        height: i32,
        format: i32,
        srgb: bool,
    ) -> Result<Self> {
        let invalid = || InteropError::InvalidDimensions {
            width: i64::from(width),
            height: i64::from(height),
        };
        let width = u32::try_from(width).map_err(|_| invalid())?;
        let height = u32::try_from(height).map_err(|_| invalid())?;
        let format = PixelFormat::from_code(format).ok_or(InteropError::UnsupportedFormat(format))?;
        Ok(Self {
            width,
            height,
            format,
            srgb,
            name,
        })
    }
}

/// Validates requests and hands them to the backend allocator.
pub struct TextureFactory<A> {
    allocator: A,
}

impl<A: SharedTextureAllocator> TextureFactory<A> {
    pub fn new(allocator: A) -> Self {
        Self { allocator }
    }

    /// Create one shareable texture. The caller owns the returned reference.
    ///
    /// Fails without touching the driver unless the device is ready, both
    /// dimensions are non-zero and the format has a native mapping.
    pub fn create_shared_texture(
        &self,
        device: &DeviceState,
        desc: &TextureDescriptor<'_>,
    ) -> Result<TextureHandle> {
        let device = device.device().ok_or(InteropError::NotInitialized)?;

        if desc.width == 0 || desc.height == 0 {
            return Err(InteropError::InvalidDimensions {
                width: i64::from(desc.width),
                height: i64::from(desc.height),
            });
        }

        let native = translate(desc.format, desc.srgb)
            .ok_or(InteropError::UnsupportedFormat(desc.format as i32))?;

        let request = SharedTextureDesc::shared_render_target(desc.width, desc.height, native)
            .with_name(desc.name);

        let texture = self.allocator.allocate(device, &request).map_err(|e| {
            error!("Failed to create texture {}: {e}", desc.name.unwrap_or("unnamed"));
            e
        })?;

        debug!(
            "Texture {} ready ({}x{} {:?} -> {:?})",
            desc.name.unwrap_or("unnamed"),
            desc.width,
            desc.height,
            desc.format,
            native
        );
        Ok(texture)
    }
}
