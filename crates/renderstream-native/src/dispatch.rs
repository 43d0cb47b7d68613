//! Render-thread event dispatch.
//!
//! The engine's render thread calls back with `(event_id, data)` where `data`
//! points at a managed payload laid out as [`InputImageData`] or
//! [`SendFrameData`]. The dispatcher decodes the id relative to the reserved
//! base, resolves the payload's texture to a tagged frame payload and forwards
//! it to the frame service. Nothing is reported back to the engine; failures
//! are logged and counted.

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use gpu_interop::{FramePayload, TextureResolver};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use renderstream_core::ffi::{
    CameraResponseData, FrameResponseData, GetFrameImageFn, SendFrameFn, StreamHandle,
};
use renderstream_core::{InteropError, Result};
use tracing::{error, trace};

/// Render events, as offsets from the reserved base id.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum EventId {
    InputImage = 0,
    SendFrame = 1,
}

/// Number of event ids reserved with the engine.
pub const EVENT_COUNT: i32 = 2;

impl EventId {
    fn operation(self) -> &'static str {
        match self {
            EventId::InputImage => "rs_getFrameImage",
            EventId::SendFrame => "rs_sendFrame",
        }
    }
}

/// Payload of [`EventId::InputImage`]: pull remote image `image_id` into
/// `texture`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InputImageData {
    pub get_frame_image: Option<GetFrameImageFn>,
    pub image_id: i64,
    /// Engine texture, any COM texture type.
    pub texture: *mut c_void,
}

/// Payload of [`EventId::SendFrame`]: publish `texture` on `stream`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SendFrameData {
    pub send_frame: Option<SendFrameFn>,
    pub stream: StreamHandle,
    pub texture: *mut c_void,
    pub camera: CameraResponseData,
}

/// The frame-distribution service as the dispatcher uses it.
pub trait FrameService: Send + Sync {
    fn get_frame_image(&self, image_id: i64, payload: &FramePayload) -> Result<()>;

    fn send_frame(
        &self,
        stream: StreamHandle,
        payload: &FramePayload,
        camera: &CameraResponseData,
    ) -> Result<()>;
}

/// Direct calls into the service library's exported entry points.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryPoints {
    pub get_frame_image: Option<GetFrameImageFn>,
    pub send_frame: Option<SendFrameFn>,
}

impl FrameService for EntryPoints {
    fn get_frame_image(&self, image_id: i64, payload: &FramePayload) -> Result<()> {
        let get_frame_image = self
            .get_frame_image
            .ok_or(InteropError::MissingEntryPoint("rs_getFrameImage"))?;
        let (frame_type, data) = payload.to_sender();
        let code = unsafe { get_frame_image(image_id, frame_type, data) };
        InteropError::check("rs_getFrameImage", code)
    }

    fn send_frame(
        &self,
        stream: StreamHandle,
        payload: &FramePayload,
        camera: &CameraResponseData,
    ) -> Result<()> {
        let send_frame = self
            .send_frame
            .ok_or(InteropError::MissingEntryPoint("rs_sendFrame"))?;
        let (frame_type, data) = payload.to_sender();
        let response = FrameResponseData::with_camera(camera);
        let code = unsafe { send_frame(stream, frame_type, data, &response) };
        InteropError::check("rs_sendFrame", code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Idle,
    Executing,
}

/// Dispatch counters, for diagnostics at unload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    pub dispatched: u64,
    pub failed: u64,
}

/// Routes render events to the frame service, one at a time.
pub struct RenderThreadDispatcher {
    base: i32,
    resolver: Box<dyn TextureResolver>,
    service: RwLock<Option<Arc<dyn FrameService>>>,
    // Held for the whole dispatch: render events never overlap.
    stats: Mutex<DispatchStats>,
    executing: AtomicBool,
}

impl RenderThreadDispatcher {
    pub fn new(base: i32, resolver: Box<dyn TextureResolver>) -> Self {
        Self {
            base,
            resolver,
            service: RwLock::new(None),
            stats: Mutex::new(DispatchStats::default()),
            executing: AtomicBool::new(false),
        }
    }

    /// First event id of the reserved range.
    pub fn base(&self) -> i32 {
        self.base
    }

    /// Route all events through `service` instead of the entry points
    /// carried in each payload. `None` restores the payload entry points.
    pub fn set_service(&self, service: Option<Arc<dyn FrameService>>) {
        *self.service.write().unwrap_or_else(PoisonError::into_inner) = service;
    }

    pub fn phase(&self) -> DispatchPhase {
        if self.executing.load(Ordering::Acquire) {
            DispatchPhase::Executing
        } else {
            DispatchPhase::Idle
        }
    }

    pub fn stats(&self) -> DispatchStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Map an absolute event id to its operation.
    pub fn decode(&self, event_id: i32) -> Result<EventId> {
        event_id
            .checked_sub(self.base)
            .and_then(EventId::from_i32)
            .ok_or(InteropError::UnknownEvent(event_id))
    }

    /// Handle one render event. Never fails and never unwinds: errors and
    /// panics are logged.
    ///
    /// # Safety
    ///
    /// `data` must be null or point to the payload type matching `event_id`,
    /// valid for the duration of the call. Its texture pointer must be null
    /// or a live engine texture.
    pub unsafe fn dispatch(&self, event_id: i32, data: *const c_void) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.dispatched += 1;

        self.executing.store(true, Ordering::Release);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            self.handle(event_id, data)
        }));
        self.executing.store(false, Ordering::Release);

        match outcome {
            Ok(Ok(())) => trace!("Render event {event_id} handled"),
            Ok(Err(e)) => {
                stats.failed += 1;
                let operation = self.decode(event_id).map_or("render event", EventId::operation);
                error!("{operation} failed: {e} (code {})", e.code());
            }
            Err(_) => {
                stats.failed += 1;
                error!("Render event {event_id} panicked");
            }
        }
    }

    /// Decode and execute one event.
    ///
    /// # Safety
    ///
    /// As for [`RenderThreadDispatcher::dispatch`].
    pub unsafe fn handle(&self, event_id: i32, data: *const c_void) -> Result<()> {
        // The id is checked before the payload is looked at.
        let event = self.decode(event_id)?;
        if data.is_null() {
            return Err(InteropError::NullPayload);
        }

        match event {
            EventId::InputImage => {
                let payload = unsafe { data.cast::<InputImageData>().read_unaligned() };
                self.input_image(&payload)
            }
            EventId::SendFrame => {
                let payload = unsafe { data.cast::<SendFrameData>().read_unaligned() };
                self.send_frame(&payload)
            }
        }
    }

    fn resolve(&self, texture: *mut c_void) -> Result<FramePayload> {
        let texture = NonNull::new(texture).ok_or(InteropError::NullTexture)?;
        // SAFETY: non-null texture pointers in payloads are live engine
        // textures for the duration of the event.
        unsafe { self.resolver.resolve(texture) }
    }

    fn injected(&self) -> Option<Arc<dyn FrameService>> {
        self.service
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn input_image(&self, data: &InputImageData) -> Result<()> {
        let payload = self.resolve(data.texture)?;
        match self.injected() {
            Some(service) => service.get_frame_image(data.image_id, &payload),
            None => EntryPoints {
                get_frame_image: data.get_frame_image,
                send_frame: None,
            }
            .get_frame_image(data.image_id, &payload),
        }
    }

    fn send_frame(&self, data: &SendFrameData) -> Result<()> {
        let payload = self.resolve(data.texture)?;
        match self.injected() {
            Some(service) => service.send_frame(data.stream, &payload, &data.camera),
            None => EntryPoints {
                get_frame_image: None,
                send_frame: data.send_frame,
            }
            .send_frame(data.stream, &payload, &data.camera),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use renderstream_core::ffi::{self, SenderFrameType, SenderFrameTypeData, RS_ERROR};
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    /// Resolves every texture to a D3D12 payload, or panics on request.
    #[derive(Clone, Default)]
    pub(crate) struct Dx12Resolver {
        pub calls: Arc<AtomicUsize>,
        pub panic: bool,
    }

    impl TextureResolver for Dx12Resolver {
        unsafe fn resolve(&self, texture: NonNull<c_void>) -> Result<FramePayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("resolver exploded");
            }
            Ok(FramePayload::Dx12Resource(texture))
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        GetFrameImage(i64, FramePayload),
        SendFrame(StreamHandle, FramePayload, f64),
    }

    #[derive(Default)]
    pub(crate) struct RecordingService {
        pub calls: Mutex<Vec<Call>>,
    }

    impl FrameService for RecordingService {
        fn get_frame_image(&self, image_id: i64, payload: &FramePayload) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::GetFrameImage(image_id, *payload));
            Ok(())
        }

        fn send_frame(
            &self,
            stream: StreamHandle,
            payload: &FramePayload,
            camera: &CameraResponseData,
        ) -> Result<()> {
            let tracked = camera.tTracked;
            self.calls
                .lock()
                .unwrap()
                .push(Call::SendFrame(stream, *payload, tracked));
            Ok(())
        }
    }

    const BASE: i32 = 40;

    fn dispatcher() -> (RenderThreadDispatcher, Dx12Resolver) {
        let resolver = Dx12Resolver::default();
        (
            RenderThreadDispatcher::new(BASE, Box::new(resolver.clone())),
            resolver,
        )
    }

    fn texture_ptr(slot: &mut u64) -> *mut c_void {
        (slot as *mut u64).cast()
    }

    #[test]
    fn ids_decode_relative_to_base() {
        let (dispatcher, _) = dispatcher();
        assert_eq!(dispatcher.decode(BASE), Ok(EventId::InputImage));
        assert_eq!(dispatcher.decode(BASE + 1), Ok(EventId::SendFrame));
        assert_eq!(dispatcher.decode(BASE + EVENT_COUNT), Err(InteropError::UnknownEvent(42)));
        assert_eq!(dispatcher.decode(BASE - 1), Err(InteropError::UnknownEvent(39)));
        assert_eq!(
            dispatcher.decode(i32::MIN),
            Err(InteropError::UnknownEvent(i32::MIN))
        );
    }

    #[test]
    fn unknown_event_never_reads_payload() {
        let (dispatcher, resolver) = dispatcher();
        // A dangling payload pointer would fault if it were dereferenced.
        let bogus = NonNull::<InputImageData>::dangling().as_ptr() as *const c_void;
        let result = unsafe { dispatcher.handle(BASE + 7, bogus) };
        assert_eq!(result, Err(InteropError::UnknownEvent(BASE + 7)));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn null_payload_and_null_texture_are_invalid_parameters() {
        let (dispatcher, resolver) = dispatcher();
        let result = unsafe { dispatcher.handle(BASE, std::ptr::null()) };
        assert_eq!(result, Err(InteropError::NullPayload));

        let payload = InputImageData {
            get_frame_image: None,
            image_id: 3,
            texture: std::ptr::null_mut(),
        };
        let result = unsafe { dispatcher.handle(BASE, (&payload as *const InputImageData).cast()) };
        assert_eq!(result, Err(InteropError::NullTexture));
        assert_eq!(result.unwrap_err().code(), ffi::RS_ERROR_INVALID_PARAMETERS);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn injected_service_receives_resolved_payloads() {
        let (dispatcher, _) = dispatcher();
        let service = Arc::new(RecordingService::default());
        dispatcher.set_service(Some(service.clone()));

        let mut object = 0u64;
        let texture = texture_ptr(&mut object);
        let input = InputImageData {
            get_frame_image: None,
            image_id: 11,
            texture,
        };
        let mut camera = CameraResponseData::default();
        camera.tTracked = 2.5;
        let send = SendFrameData {
            send_frame: None,
            stream: 99,
            texture,
            camera,
        };

        unsafe {
            dispatcher.dispatch(BASE, (&input as *const InputImageData).cast());
            dispatcher.dispatch(BASE + 1, (&send as *const SendFrameData).cast());
        }

        let expected = FramePayload::Dx12Resource(NonNull::new(texture).unwrap());
        assert_eq!(
            *service.calls.lock().unwrap(),
            vec![
                Call::GetFrameImage(11, expected),
                Call::SendFrame(99, expected, 2.5)
            ]
        );
        assert_eq!(
            dispatcher.stats(),
            DispatchStats {
                dispatched: 2,
                failed: 0
            }
        );
    }

    static LAST_FRAME_TYPE: AtomicI32 = AtomicI32::new(-1);
    static LAST_IMAGE_ID: AtomicI32 = AtomicI32::new(-1);

    unsafe extern "C" fn wire_get_frame_image(
        image_id: i64,
        frame_type: SenderFrameType,
        _data: SenderFrameTypeData,
    ) -> RS_ERROR {
        LAST_FRAME_TYPE.store(frame_type, Ordering::SeqCst);
        LAST_IMAGE_ID.store(image_id as i32, Ordering::SeqCst);
        ffi::RS_ERROR_SUCCESS
    }

    unsafe extern "C" fn wire_send_frame_rejects(
        _stream: StreamHandle,
        _frame_type: SenderFrameType,
        _data: SenderFrameTypeData,
        response: *const FrameResponseData,
    ) -> RS_ERROR {
        assert!(!unsafe { (*response).cameraData }.is_null());
        ffi::RS_ERROR_STREAMS_CHANGED
    }

    #[test]
    fn payload_entry_points_are_the_fallback() {
        let (dispatcher, _) = dispatcher();
        let mut object = 0u64;
        let input = InputImageData {
            get_frame_image: Some(wire_get_frame_image),
            image_id: 5,
            texture: texture_ptr(&mut object),
        };
        let result = unsafe { dispatcher.handle(BASE, (&input as *const InputImageData).cast()) };
        assert_eq!(result, Ok(()));
        assert_eq!(LAST_FRAME_TYPE.load(Ordering::SeqCst), ffi::RS_FRAMETYPE_DX12_TEXTURE);
        assert_eq!(LAST_IMAGE_ID.load(Ordering::SeqCst), 5);

        let send = SendFrameData {
            send_frame: Some(wire_send_frame_rejects),
            stream: 1,
            texture: texture_ptr(&mut object),
            camera: CameraResponseData::default(),
        };
        let result = unsafe { dispatcher.handle(BASE + 1, (&send as *const SendFrameData).cast()) };
        let err = result.unwrap_err();
        assert_eq!(
            err,
            InteropError::Service {
                op: "rs_sendFrame",
                code: ffi::RS_ERROR_STREAMS_CHANGED
            }
        );
        assert_eq!(err.code(), ffi::RS_ERROR_STREAMS_CHANGED);
    }

    #[test]
    fn missing_entry_point_is_reported() {
        let (dispatcher, _) = dispatcher();
        let mut object = 0u64;
        let input = InputImageData {
            get_frame_image: None,
            image_id: 1,
            texture: texture_ptr(&mut object),
        };
        let result = unsafe { dispatcher.handle(BASE, (&input as *const InputImageData).cast()) };
        assert_eq!(result, Err(InteropError::MissingEntryPoint("rs_getFrameImage")));
    }

    #[test]
    fn send_frame_with_null_texture_fails_and_returns() {
        let (dispatcher, resolver) = dispatcher();
        let service = Arc::new(RecordingService::default());
        dispatcher.set_service(Some(service.clone()));
        let send = SendFrameData {
            send_frame: None,
            stream: 7,
            texture: std::ptr::null_mut(),
            camera: CameraResponseData::default(),
        };

        unsafe { dispatcher.dispatch(BASE + 1, (&send as *const SendFrameData).cast()) };

        assert_eq!(
            dispatcher.stats(),
            DispatchStats {
                dispatched: 1,
                failed: 1
            }
        );
        assert_eq!(dispatcher.phase(), DispatchPhase::Idle);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert!(service.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn failures_and_panics_are_contained() {
        let resolver = Dx12Resolver {
            panic: true,
            ..Default::default()
        };
        let dispatcher = RenderThreadDispatcher::new(0, Box::new(resolver.clone()));
        let mut object = 0u64;
        let input = InputImageData {
            get_frame_image: None,
            image_id: 1,
            texture: texture_ptr(&mut object),
        };
        unsafe {
            dispatcher.dispatch(0, (&input as *const InputImageData).cast());
            dispatcher.dispatch(9, std::ptr::null());
            dispatcher.dispatch(0, (&input as *const InputImageData).cast());
        }
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            dispatcher.stats(),
            DispatchStats {
                dispatched: 3,
                failed: 3
            }
        );
        assert_eq!(dispatcher.phase(), DispatchPhase::Idle);
    }
}
