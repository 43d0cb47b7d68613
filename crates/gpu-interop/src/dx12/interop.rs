//! COM capability probing of engine texture pointers.

use std::ffi::c_void;
use std::ptr::NonNull;

use renderstream_core::{InteropError, Result};
use windows::core::{IUnknown, Interface};
use windows::Win32::Graphics::Direct3D11::ID3D11Resource;
use windows::Win32::Graphics::Direct3D12::ID3D12Resource;

use crate::payload::FramePayload;
use crate::probe::{identify, ProbeKind, TextureProbe, TextureResolver};

/// A borrowed COM texture of unknown concrete type.
pub struct ComTexture<'a>(&'a IUnknown);

impl<'a> ComTexture<'a> {
    pub fn new(unknown: &'a IUnknown) -> Self {
        Self(unknown)
    }
}

impl TextureProbe for ComTexture<'_> {
    fn try_as(&self, kind: ProbeKind) -> Option<NonNull<c_void>> {
        // The queried interface is released at the end of each arm; the
        // engine's own reference keeps the object alive.
        let raw = match kind {
            ProbeKind::Dx11Resource => self.0.cast::<ID3D11Resource>().ok()?.as_raw(),
            ProbeKind::Dx12Resource => self.0.cast::<ID3D12Resource>().ok()?.as_raw(),
        };
        NonNull::new(raw)
    }
}

/// Resolves wire texture pointers by `QueryInterface`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComTextureResolver;

impl TextureResolver for ComTextureResolver {
    unsafe fn resolve(&self, texture: NonNull<c_void>) -> Result<FramePayload> {
        let raw = texture.as_ptr();
        let unknown =
            unsafe { IUnknown::from_raw_borrowed(&raw) }.ok_or(InteropError::NullTexture)?;
        identify(&ComTexture::new(unknown))
    }
}
