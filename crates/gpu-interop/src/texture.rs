//! Shareable texture allocation requests and the allocator seam.

use renderstream_core::Result;

use crate::format::NativeFormat;
use crate::handle::{DeviceHandle, TextureHandle};

/// Which memory heap a committed resource lives in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeapKind {
    /// GPU-local memory, not CPU visible.
    Default,
}

/// State a resource is placed in at creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Written by a copy before its first read.
    CopyDest,
}

/// Resource usage flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TextureUsage {
    /// Accessible from several queues (and processes) at once.
    pub simultaneous_access: bool,
    pub render_target: bool,
}

/// A fully resolved request for one committed 2-D texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedTextureDesc<'a> {
    pub width: u32,
    pub height: u32,
    pub format: NativeFormat,
    pub mip_levels: u16,
    pub array_size: u16,
    pub sample_count: u32,
    pub usage: TextureUsage,
    pub heap: HeapKind,
    /// Allocate from a heap other processes may open.
    pub shared_heap: bool,
    pub initial_state: ResourceState,
    pub name: Option<&'a str>,
}

impl<'a> SharedTextureDesc<'a> {
    /// A single-mip, single-sample render target in a cross-process
    /// shareable default heap, created in the copy-destination state.
    ///
    /// The frame-distribution service opens these textures from its own
    /// process; dropping any of these flags breaks that silently.
    pub fn shared_render_target(width: u32, height: u32, format: NativeFormat) -> Self {
        Self {
            width,
            height,
            format,
            mip_levels: 1,
            array_size: 1,
            sample_count: 1,
            usage: TextureUsage {
                simultaneous_access: true,
                render_target: true,
            },
            heap: HeapKind::Default,
            shared_heap: true,
            initial_state: ResourceState::CopyDest,
            name: None,
        }
    }

    pub fn with_name(mut self, name: Option<&'a str>) -> Self {
        self.name = name;
        self
    }
}

/// Allocates committed textures on a backend device.
///
/// Implementations make exactly one driver allocation per call and never
/// retry. On success the caller owns one reference to the returned texture.
pub trait SharedTextureAllocator: Send + Sync {
    fn allocate(&self, device: DeviceHandle, desc: &SharedTextureDesc<'_>) -> Result<TextureHandle>;
}

impl<T: SharedTextureAllocator + ?Sized> SharedTextureAllocator for Box<T> {
    fn allocate(&self, device: DeviceHandle, desc: &SharedTextureDesc<'_>) -> Result<TextureHandle> {
        (**self).allocate(device, desc)
    }
}

impl<T: SharedTextureAllocator + ?Sized> SharedTextureAllocator for std::sync::Arc<T> {
    fn allocate(&self, device: DeviceHandle, desc: &SharedTextureDesc<'_>) -> Result<TextureHandle> {
        (**self).allocate(device, desc)
    }
}
