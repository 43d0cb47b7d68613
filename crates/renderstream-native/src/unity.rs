//! The engine's graphics interfaces behind [`GraphicsHost`].

use std::ffi::{c_int, c_void};

use anyhow::{bail, Result};
use gpu_interop::{DeviceHandle, QueueHandle};
use renderstream_core::host::{
    self, IUnityGraphics, IUnityGraphicsD3D12v5, IUnityGraphicsDeviceEventCallback,
    IUnityInterfaces, UnityGfxRenderer,
};

use crate::device::GraphicsHost;

type ObjectGetter = unsafe extern "system" fn() -> *mut c_void;

/// Interface tables fetched once at plugin load.
#[derive(Debug, Clone, Copy)]
pub struct UnityGraphics {
    graphics: *mut IUnityGraphics,
    /// Null unless the engine runs D3D12.
    d3d12: *mut IUnityGraphicsD3D12v5,
}

// SAFETY: the tables are immutable host function tables that stay valid
// until UnityPluginUnload.
unsafe impl Send for UnityGraphics {}
unsafe impl Sync for UnityGraphics {}

impl UnityGraphics {
    /// # Safety
    ///
    /// `interfaces` must be null or the registry passed to `UnityPluginLoad`.
    pub unsafe fn from_interfaces(interfaces: *mut IUnityInterfaces) -> Result<Self> {
        let Some(interfaces) = (unsafe { interfaces.as_ref() }) else {
            bail!("host passed a null interface registry");
        };
        let graphics = unsafe { interfaces.get::<IUnityGraphics>() };
        if graphics.is_null() {
            bail!("host does not provide IUnityGraphics");
        }
        Ok(Self {
            graphics,
            d3d12: unsafe { interfaces.get::<IUnityGraphicsD3D12v5>() },
        })
    }

    fn graphics(&self) -> &IUnityGraphics {
        // SAFETY: checked non-null at construction, valid while loaded.
        unsafe { &*self.graphics }
    }

    fn d3d12(&self) -> Option<&IUnityGraphicsD3D12v5> {
        unsafe { self.d3d12.as_ref() }
    }

    /// Reserve `count` consecutive render-event ids; returns the first.
    pub fn reserve_event_ids(&self, count: i32) -> Option<i32> {
        let reserve = self.graphics().ReserveEventIDRange?;
        Some(unsafe { reserve(count as c_int) })
    }

    pub fn register_device_callback(&self, callback: IUnityGraphicsDeviceEventCallback) -> bool {
        match self.graphics().RegisterDeviceEventCallback {
            Some(register) => {
                unsafe { register(callback) };
                true
            }
            None => false,
        }
    }

    pub fn unregister_device_callback(&self, callback: IUnityGraphicsDeviceEventCallback) {
        if let Some(unregister) = self.graphics().UnregisterDeviceEventCallback {
            unsafe { unregister(callback) };
        }
    }

    fn d3d12_object(&self, get: impl Fn(&IUnityGraphicsD3D12v5) -> Option<ObjectGetter>) -> *mut c_void {
        match self.d3d12().and_then(get) {
            Some(getter) => unsafe { getter() },
            None => std::ptr::null_mut(),
        }
    }
}

impl GraphicsHost for UnityGraphics {
    fn renderer(&self) -> UnityGfxRenderer {
        match self.graphics().GetRenderer {
            Some(get_renderer) => unsafe { get_renderer() },
            None => host::kUnityGfxRendererNull,
        }
    }

    fn d3d12_device(&self) -> Option<DeviceHandle> {
        DeviceHandle::from_raw(self.d3d12_object(|t| t.GetDevice))
    }

    fn d3d12_command_queue(&self) -> Option<QueueHandle> {
        QueueHandle::from_raw(self.d3d12_object(|t| t.GetCommandQueue))
    }
}
