//! Backend side of the native RenderStream bridge.
//!
//! This crate owns everything that touches a GPU API: translating service
//! pixel formats into native formats, describing and allocating textures the
//! frame-distribution service can open from its own process, and resolving
//! type-erased engine textures into the tagged payload the service expects.
//! The [`SharedTextureAllocator`] and [`TextureResolver`] traits are the seams
//! the plugin is written against; the D3D12 implementations live in [`dx12`].

pub mod format;
pub mod handle;
pub mod payload;
pub mod probe;
pub mod texture;

pub use format::{translate, NativeFormat};
pub use handle::{DeviceHandle, QueueHandle, TextureHandle};
pub use payload::FramePayload;
pub use probe::{identify, ProbeKind, TextureProbe, TextureResolver, PROBE_ORDER};
pub use texture::{SharedTextureAllocator, SharedTextureDesc};

// Platform-specific implementations.

#[cfg(target_os = "windows")]
pub mod dx12;
