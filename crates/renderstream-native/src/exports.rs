//! C ABI surface loaded by the engine and called from managed code.
//!
//! Every export tolerates being called before load or after unload and
//! returns a neutral value (null, `false`, 0) in that case.

#![allow(non_snake_case)]

use std::ffi::{c_int, c_void};
use std::ptr;
use std::sync::{Arc, PoisonError, RwLock};

use gpu_interop::dx12::{ComTextureResolver, Dx12Allocator};
use once_cell::sync::Lazy;
use renderstream_core::ffi::{GetFrameImageFn, SendFrameFn};
use renderstream_core::host::{
    IUnityInterfaces, IUnityLog, UnityGfxDeviceEventType, UnityRenderingEventAndData,
};
use renderstream_core::logging::{self, UnityLogSink};
use tracing::{error, info, warn};

use crate::config::PluginConfig;
use crate::dispatch::{EntryPoints, FrameService, EVENT_COUNT};
use crate::plugin::{wide_str, Plugin};
use crate::unity::UnityGraphics;

struct Loaded {
    plugin: Arc<Plugin>,
    graphics: UnityGraphics,
}

static LOADED: Lazy<RwLock<Option<Loaded>>> = Lazy::new(|| RwLock::new(None));

fn current() -> Option<Arc<Plugin>> {
    LOADED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map(|loaded| loaded.plugin.clone())
}

#[no_mangle]
pub unsafe extern "system" fn UnityPluginLoad(interfaces: *mut IUnityInterfaces) {
    if let Some(registry) = unsafe { interfaces.as_ref() } {
        if let Some(sink) = unsafe { UnityLogSink::new(registry.get::<IUnityLog>()) } {
            logging::attach_sink(Arc::new(sink));
        }
    }

    let config = PluginConfig::from_env();
    if let Err(e) = logging::init(&config.log_filter) {
        eprintln!("native_rendering_plugin: {e:#}");
    }

    for var in &config.rejected {
        warn!("Ignoring invalid value of {var}");
    }

    let graphics = match unsafe { UnityGraphics::from_interfaces(interfaces) } {
        Ok(graphics) => graphics,
        Err(e) => {
            error!("Plugin load failed: {e:#}");
            return;
        }
    };

    let base = match graphics.reserve_event_ids(EVENT_COUNT) {
        Some(base) if base >= 0 => base,
        reserved => {
            warn!("Render event id reservation failed ({reserved:?}), using base 0");
            0
        }
    };

    let plugin = Arc::new(Plugin::new(
        config,
        Box::new(graphics),
        Box::new(Dx12Allocator),
        Box::new(ComTextureResolver),
        base,
    ));
    *LOADED.write().unwrap_or_else(PoisonError::into_inner) = Some(Loaded { plugin, graphics });

    if !graphics.register_device_callback(OnGraphicsDeviceEvent) {
        warn!("Host cannot register device event callbacks");
    }
    info!("Plugin loaded, render events [{base}, {})", base + EVENT_COUNT);

    // The engine does not replay Initialize for a device created before load.
    unsafe { OnGraphicsDeviceEvent(UnityGfxDeviceEventType::Initialize as c_int) };
}

#[no_mangle]
pub unsafe extern "system" fn UnityPluginUnload() {
    let loaded = LOADED.write().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(Loaded { plugin, graphics }) = loaded {
        graphics.unregister_device_callback(OnGraphicsDeviceEvent);
        plugin.shutdown();
    }
    logging::detach_sink();
}

unsafe extern "system" fn OnGraphicsDeviceEvent(event_type: c_int) {
    if let Some(plugin) = current() {
        plugin.on_device_event(event_type);
    }
}

unsafe extern "system" fn OnRenderEvent(event_id: c_int, data: *mut c_void) {
    if let Some(plugin) = current() {
        unsafe { plugin.dispatcher().dispatch(event_id, data) };
    }
}

#[no_mangle]
pub extern "system" fn GetRenderEventCallback() -> UnityRenderingEventAndData {
    OnRenderEvent
}

/// First id of the reserved render-event range; 0 when not loaded.
#[no_mangle]
pub extern "system" fn GetRenderEventBase() -> c_int {
    current().map_or(0, |plugin| plugin.dispatcher().base())
}

#[no_mangle]
pub extern "system" fn IsInitialized() -> bool {
    current().is_some_and(|plugin| plugin.is_initialized())
}

#[no_mangle]
pub extern "system" fn GetD3D12Device() -> *mut c_void {
    current()
        .and_then(|plugin| plugin.device_handle())
        .map_or(ptr::null_mut(), |device| device.as_raw())
}

#[no_mangle]
pub extern "system" fn GetD3D12CommandQueue() -> *mut c_void {
    current()
        .and_then(|plugin| plugin.command_queue_handle())
        .map_or(ptr::null_mut(), |queue| queue.as_raw())
}

unsafe fn create_texture(
    name: *const u16,
    width: c_int,
    height: c_int,
    format: c_int,
    srgb: Option<bool>,
) -> *mut c_void {
    let Some(plugin) = current() else {
        return ptr::null_mut();
    };
    let name = unsafe { wide_str(name) };
    plugin
        .create_texture(name.as_deref(), width, height, format, srgb)
        .map_or(ptr::null_mut(), |texture| texture.as_raw())
}

/// Create a shareable texture. The caller owns the returned
/// `ID3D12Resource*` and must release it; null on failure.
#[no_mangle]
pub unsafe extern "system" fn CreateNativeTexture(
    name: *const u16,
    width: c_int,
    height: c_int,
    format: c_int,
) -> *mut c_void {
    unsafe { create_texture(name, width, height, format, None) }
}

#[no_mangle]
pub unsafe extern "system" fn CreateNativeTextureEx(
    name: *const u16,
    width: c_int,
    height: c_int,
    format: c_int,
    srgb: bool,
) -> *mut c_void {
    unsafe { create_texture(name, width, height, format, Some(srgb)) }
}

/// Route render events straight to the service library's entry points
/// instead of the pointers carried in each payload. Passing two nulls
/// restores the payload pointers.
#[no_mangle]
pub extern "system" fn SetFrameServiceEntryPoints(
    get_frame_image: Option<GetFrameImageFn>,
    send_frame: Option<SendFrameFn>,
) {
    let Some(plugin) = current() else {
        return;
    };
    let service = (get_frame_image.is_some() || send_frame.is_some()).then(|| {
        Arc::new(EntryPoints {
            get_frame_image,
            send_frame,
        }) as Arc<dyn FrameService>
    });
    plugin.set_frame_service(service);
}
