//! Native rendering plugin bridging the engine's D3D12 renderer and the
//! RenderStream frame-distribution service.
//!
//! The engine loads this library, hands it its graphics interfaces and then
//! drives it from two threads: device lifecycle events on the main thread
//! and render events on the render thread. Managed code calls the exports in
//! [`exports`] to query the device, create shareable textures and obtain the
//! render-event callback it queues payloads against.

pub mod config;
pub mod device;
pub mod dispatch;
pub mod factory;
pub mod plugin;
pub mod unity;

#[cfg(target_os = "windows")]
pub mod exports;

pub use config::PluginConfig;
pub use device::{Backend, DeviceContext, DeviceState, GraphicsHost};
pub use dispatch::{
    DispatchPhase, DispatchStats, EntryPoints, EventId, FrameService, InputImageData, RenderThreadDispatcher,
    SendFrameData, EVENT_COUNT,
};
pub use factory::{TextureDescriptor, TextureFactory};
pub use plugin::Plugin;
