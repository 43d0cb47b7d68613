//! D3D12 backend (Windows): committed shareable textures and COM probing.

pub mod device;
pub mod interop;

pub use device::Dx12Allocator;
pub use interop::{ComTexture, ComTextureResolver};
