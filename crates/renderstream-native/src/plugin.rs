//! The plugin context: everything one load of the library owns.
//!
//! A `Plugin` is built in `UnityPluginLoad` and dropped after
//! `UnityPluginUnload`. The C exports are thin wrappers around its methods,
//! which turn errors into log lines and neutral return values.

use std::sync::Arc;

use gpu_interop::{DeviceHandle, QueueHandle, SharedTextureAllocator, TextureHandle, TextureResolver};
use num_traits::FromPrimitive;
use renderstream_core::host::UnityGfxDeviceEventType;
use renderstream_core::{InteropError, Result};
use tracing::{error, info, warn};

use crate::config::PluginConfig;
use crate::device::{DeviceContext, GraphicsHost};
use crate::dispatch::{FrameService, RenderThreadDispatcher};
use crate::factory::{TextureDescriptor, TextureFactory};

pub struct Plugin {
    config: PluginConfig,
    host: Box<dyn GraphicsHost>,
    device: DeviceContext,
    factory: TextureFactory<Box<dyn SharedTextureAllocator>>,
    dispatcher: RenderThreadDispatcher,
}

impl Plugin {
    pub fn new(
        config: PluginConfig,
        host: Box<dyn GraphicsHost>,
        allocator: Box<dyn SharedTextureAllocator>,
        resolver: Box<dyn TextureResolver>,
        event_base: i32,
    ) -> Self {
        Self {
            config,
            host,
            device: DeviceContext::new(),
            factory: TextureFactory::new(allocator),
            dispatcher: RenderThreadDispatcher::new(event_base, resolver),
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn device(&self) -> &DeviceContext {
        &self.device
    }

    pub fn dispatcher(&self) -> &RenderThreadDispatcher {
        &self.dispatcher
    }

    /// Apply a raw device event code from the engine.
    pub fn on_device_event(&self, event: i32) {
        match UnityGfxDeviceEventType::from_i32(event) {
            Some(event) => self.device.on_device_event(event, self.host.as_ref()),
            None => warn!("Ignoring unknown graphics device event {event}"),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.device.is_ready()
    }

    pub fn device_handle(&self) -> Option<DeviceHandle> {
        let device = self.device.device();
        if device.is_none() {
            error!("D3D12 device requested before the graphics device was initialized");
        }
        device
    }

    pub fn command_queue_handle(&self) -> Option<QueueHandle> {
        let queue = self.device.command_queue();
        if queue.is_none() {
            error!("D3D12 command queue requested before the graphics device was initialized");
        }
        queue
    }

    /// Create a shared texture from C ABI arguments. `srgb` falls back to
    /// the configured default.
    pub fn try_create_texture(
        &self,
        name: Option<&str>,
        width: i32,
        height: i32,
        format: i32,
        srgb: Option<bool>,
    ) -> Result<TextureHandle> {
        let device = self.device.snapshot();
        if !device.is_ready() {
            return Err(InteropError::NotInitialized);
        }
        let srgb = srgb.unwrap_or(self.config.default_srgb);
        let desc = TextureDescriptor::from_abi(name, width, height, format, srgb)?;
        self.factory.create_shared_texture(&device, &desc)
    }

    /// Like [`Plugin::try_create_texture`], logging failures.
    pub fn create_texture(
        &self,
        name: Option<&str>,
        width: i32,
        height: i32,
        format: i32,
        srgb: Option<bool>,
    ) -> Option<TextureHandle> {
        self.try_create_texture(name, width, height, format, srgb)
            .map_err(|e| {
                error!(
                    "CreateNativeTexture({}, {width}x{height}, format {format}) failed: {e}",
                    name.unwrap_or("unnamed")
                )
            })
            .ok()
    }

    pub fn set_frame_service(&self, service: Option<Arc<dyn FrameService>>) {
        info!(
            "Frame service {}",
            if service.is_some() { "installed" } else { "cleared, using payload entry points" }
        );
        self.dispatcher.set_service(service);
    }

    /// Final teardown before the context is dropped.
    pub fn shutdown(&self) {
        self.device
            .on_device_event(UnityGfxDeviceEventType::Shutdown, self.host.as_ref());
        let stats = self.dispatcher.stats();
        info!(
            "Plugin unloaded after {} render events ({} failed)",
            stats.dispatched, stats.failed
        );
    }
}

/// Read a NUL-terminated UTF-16 string.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated UTF-16 buffer.
pub unsafe fn wide_str(ptr: *const u16) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let mut len = 0;
    while unsafe { *ptr.add(len) } != 0 {
        len += 1;
    }
    let units = unsafe { std::slice::from_raw_parts(ptr, len) };
    Some(String::from_utf16_lossy(units))
}
