//! Device lifecycle tracking.
//!
//! [`DeviceContext`] caches the engine's D3D12 device and command queue
//! between the engine's Initialize and Shutdown notifications. Readers take
//! a [`DeviceState`] snapshot (backend, device and queue read together) and
//! work from that, so a Shutdown racing a render-thread call can only make
//! the snapshot stale, never half-updated.

use std::sync::{PoisonError, RwLock};

use gpu_interop::{DeviceHandle, QueueHandle};
use renderstream_core::host::{self, UnityGfxDeviceEventType, UnityGfxRenderer};
use tracing::{debug, info, warn};

/// GPU API the engine is rendering with, as far as this plugin cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    None,
    D3D12,
}

/// The engine's graphics interfaces, as seen by the device context.
pub trait GraphicsHost: Send + Sync {
    fn renderer(&self) -> UnityGfxRenderer;
    fn d3d12_device(&self) -> Option<DeviceHandle>;
    fn d3d12_command_queue(&self) -> Option<QueueHandle>;
}

/// Device and queue, only ever present together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceHandles {
    pub device: DeviceHandle,
    pub queue: QueueHandle,
}

/// A point-in-time copy of the device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceState {
    backend: Backend,
    handles: Option<DeviceHandles>,
}

impl DeviceState {
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// True when both handles were acquired. Always false for `Backend::None`.
    pub fn is_ready(&self) -> bool {
        self.handles.is_some()
    }

    pub fn handles(&self) -> Option<DeviceHandles> {
        self.handles
    }

    pub fn device(&self) -> Option<DeviceHandle> {
        self.handles.map(|h| h.device)
    }

    pub fn command_queue(&self) -> Option<QueueHandle> {
        self.handles.map(|h| h.queue)
    }
}

/// Owner of the cached device state for one plugin load.
#[derive(Debug, Default)]
pub struct DeviceContext {
    state: RwLock<DeviceState>,
}

impl DeviceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an engine device notification. Main thread only.
    pub fn on_device_event(&self, event: UnityGfxDeviceEventType, host: &dyn GraphicsHost) {
        match event {
            UnityGfxDeviceEventType::Initialize => self.initialize(host),
            UnityGfxDeviceEventType::Shutdown => self.shutdown(),
            // Cached handles are left as they are across a reset.
            UnityGfxDeviceEventType::BeforeReset | UnityGfxDeviceEventType::AfterReset => {
                debug!("Graphics device event {event:?} ignored");
            }
        }
    }

    fn initialize(&self, host: &dyn GraphicsHost) {
        let renderer = host.renderer();
        if renderer != host::kUnityGfxRendererD3D12 {
            info!("Renderer {renderer} is not D3D12, native texture sharing disabled");
            self.store(DeviceState::default());
            return;
        }

        let handles = match (host.d3d12_device(), host.d3d12_command_queue()) {
            (Some(device), Some(queue)) => Some(DeviceHandles { device, queue }),
            (device, queue) => {
                warn!(
                    "D3D12 renderer without usable handles (device: {}, queue: {})",
                    device.is_some(),
                    queue.is_some()
                );
                None
            }
        };

        self.store(DeviceState {
            backend: Backend::D3D12,
            handles,
        });
        info!("D3D12 device context initialized (ready: {})", handles.is_some());
    }

    fn shutdown(&self) {
        self.store(DeviceState::default());
        info!("Graphics device context shut down");
    }

    fn store(&self, state: DeviceState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn snapshot(&self) -> DeviceState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn backend(&self) -> Backend {
        self.snapshot().backend()
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_ready()
    }

    pub fn device(&self) -> Option<DeviceHandle> {
        self.snapshot().device()
    }

    pub fn command_queue(&self) -> Option<QueueHandle> {
        self.snapshot().command_queue()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::ffi::c_void;

    /// Host stub: a renderer id plus optional raw device/queue addresses.
    pub(crate) struct FakeHost {
        pub renderer: UnityGfxRenderer,
        pub device: usize,
        pub queue: usize,
    }

    impl FakeHost {
        pub fn d3d12() -> Self {
            Self {
                renderer: host::kUnityGfxRendererD3D12,
                device: 0x1000,
                queue: 0x2000,
            }
        }
    }

    impl GraphicsHost for FakeHost {
        fn renderer(&self) -> UnityGfxRenderer {
            self.renderer
        }

        fn d3d12_device(&self) -> Option<DeviceHandle> {
            DeviceHandle::from_raw(self.device as *mut c_void)
        }

        fn d3d12_command_queue(&self) -> Option<QueueHandle> {
            QueueHandle::from_raw(self.queue as *mut c_void)
        }
    }

    #[test]
    fn initialize_on_d3d12_acquires_both_handles() {
        let ctx = DeviceContext::new();
        ctx.on_device_event(UnityGfxDeviceEventType::Initialize, &FakeHost::d3d12());

        let state = ctx.snapshot();
        assert_eq!(state.backend(), Backend::D3D12);
        assert!(state.is_ready());
        assert_eq!(state.device().unwrap().as_raw() as usize, 0x1000);
        assert_eq!(state.command_queue().unwrap().as_raw() as usize, 0x2000);
    }

    #[test]
    fn missing_queue_records_backend_but_not_ready() {
        let ctx = DeviceContext::new();
        let host = FakeHost {
            queue: 0,
            ..FakeHost::d3d12()
        };
        ctx.on_device_event(UnityGfxDeviceEventType::Initialize, &host);

        assert_eq!(ctx.backend(), Backend::D3D12);
        assert!(!ctx.is_ready());
        assert_eq!(ctx.device(), None);
        assert_eq!(ctx.command_queue(), None);
    }

    #[test]
    fn other_renderer_stays_uninitialized() {
        let ctx = DeviceContext::new();
        let host = FakeHost {
            renderer: host::kUnityGfxRendererD3D11,
            ..FakeHost::d3d12()
        };
        ctx.on_device_event(UnityGfxDeviceEventType::Initialize, &host);
        assert_eq!(ctx.snapshot(), DeviceState::default());

        ctx.on_device_event(UnityGfxDeviceEventType::Initialize, &FakeHost::d3d12());
        assert!(ctx.is_ready());
    }

    #[test]
    fn initialize_then_shutdown_restores_reset_state() {
        let ctx = DeviceContext::new();
        let before = ctx.snapshot();
        ctx.on_device_event(UnityGfxDeviceEventType::Initialize, &FakeHost::d3d12());
        ctx.on_device_event(UnityGfxDeviceEventType::Shutdown, &FakeHost::d3d12());
        assert_eq!(ctx.snapshot(), before);
        assert_eq!(before.backend(), Backend::None);
        assert!(!before.is_ready());

        ctx.on_device_event(UnityGfxDeviceEventType::Shutdown, &FakeHost::d3d12());
        assert_eq!(ctx.snapshot(), before);
    }

    #[test]
    fn resets_keep_cached_handles() {
        let ctx = DeviceContext::new();
        ctx.on_device_event(UnityGfxDeviceEventType::Initialize, &FakeHost::d3d12());
        let ready = ctx.snapshot();
        ctx.on_device_event(UnityGfxDeviceEventType::BeforeReset, &FakeHost::d3d12());
        ctx.on_device_event(UnityGfxDeviceEventType::AfterReset, &FakeHost::d3d12());
        assert_eq!(ctx.snapshot(), ready);
    }

    #[test]
    fn snapshot_outlives_shutdown() {
        let ctx = DeviceContext::new();
        ctx.on_device_event(UnityGfxDeviceEventType::Initialize, &FakeHost::d3d12());
        let snapshot = ctx.snapshot();
        ctx.on_device_event(UnityGfxDeviceEventType::Shutdown, &FakeHost::d3d12());
        assert!(snapshot.is_ready());
        assert!(!ctx.is_ready());
    }
}
