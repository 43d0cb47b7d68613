//! `tracing` bridge into the host engine's log sink.
//!
//! The subscriber is installed once per process. The sink it forwards to is
//! swappable: the plugin attaches the host's `IUnityLog` on load and detaches
//! it on unload, so a reloaded plugin logs through the new host interface.
//! With no sink attached, events are dropped.

use std::ffi::{c_int, CString};
use std::fmt::Write as _;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use once_cell::sync::{Lazy, OnceCell};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::host::{self, IUnityLog};

/// Directive used when the configured one does not parse.
pub const DEFAULT_FILTER: &str = "info";

/// One formatted log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

/// Destination for formatted events.
pub trait LogSink: Send + Sync {
    fn log(&self, record: &LogRecord);
}

/// Holds the currently attached sink.
#[derive(Default)]
pub struct SinkSlot {
    sink: RwLock<Option<Arc<dyn LogSink>>>,
}

impl SinkSlot {
    pub fn attach(&self, sink: Arc<dyn LogSink>) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    pub fn detach(&self) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn current(&self) -> Option<Arc<dyn LogSink>> {
        self.sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

static HOST_SINK: Lazy<Arc<SinkSlot>> = Lazy::new(Default::default);
static INSTALLED: OnceCell<()> = OnceCell::new();

/// Install the process-wide subscriber (idempotent).
///
/// Fails if another global subscriber was set first, in which case events
/// still go wherever that subscriber sends them.
pub fn init(filter: &str) -> Result<()> {
    INSTALLED.get_or_try_init(|| {
        let (env_filter, rejected) = match EnvFilter::try_new(filter) {
            Ok(env_filter) => (env_filter, None),
            Err(e) => (EnvFilter::new(DEFAULT_FILTER), Some(e)),
        };
        tracing_subscriber::registry()
            .with(env_filter)
            .with(HostLogLayer::new(HOST_SINK.clone()))
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
        if let Some(e) = rejected {
            tracing::warn!("Invalid log filter {filter:?} ({e}), using {DEFAULT_FILTER:?}");
        }
        anyhow::Ok(())
    })?;
    Ok(())
}

/// Route events to `sink` until [`detach_sink`] is called.
pub fn attach_sink(sink: Arc<dyn LogSink>) {
    HOST_SINK.attach(sink);
}

pub fn detach_sink() {
    HOST_SINK.detach();
}

/// Layer that formats each event and hands it to the slot's sink.
pub struct HostLogLayer {
    slot: Arc<SinkSlot>,
}

impl HostLogLayer {
    pub fn new(slot: Arc<SinkSlot>) -> Self {
        Self { slot }
    }
}

impl<S: Subscriber> Layer<S> for HostLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Some(sink) = self.slot.current() else {
            return;
        };
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        sink.log(&LogRecord {
            level: *metadata.level(),
            message: visitor.finish(),
            file: metadata.file(),
            line: metadata.line(),
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_owned()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

// ---------------------------------------------------------------------------
// Host sink
// ---------------------------------------------------------------------------

/// Forwards records to the engine's `IUnityLog`.
pub struct UnityLogSink {
    log: *mut IUnityLog,
}

// SAFETY: IUnityLog is a table of thread-safe host functions that stays valid
// for the lifetime of the plugin load.
unsafe impl Send for UnityLogSink {}
unsafe impl Sync for UnityLogSink {}

impl UnityLogSink {
    /// Returns `None` when the host did not provide a log interface.
    ///
    /// # Safety
    ///
    /// `log` must be null or point to a live `IUnityLog`, valid until the sink
    /// is detached.
    pub unsafe fn new(log: *mut IUnityLog) -> Option<Self> {
        if log.is_null() {
            None
        } else {
            Some(Self { log })
        }
    }
}

fn log_type(level: &Level) -> host::UnityLogType {
    match *level {
        Level::ERROR => host::kUnityLogTypeError,
        Level::WARN => host::kUnityLogTypeWarning,
        _ => host::kUnityLogTypeLog,
    }
}

fn to_cstring(text: &str) -> CString {
    CString::new(text.replace('\0', "\u{FFFD}")).unwrap_or_default()
}

impl LogSink for UnityLogSink {
    fn log(&self, record: &LogRecord) {
        let Some(log) = (unsafe { (*self.log).Log }) else {
            return;
        };
        let message = to_cstring(&record.message);
        let file = to_cstring(record.file.unwrap_or(""));
        let line = record.line.unwrap_or(0) as c_int;
        unsafe { log(log_type(&record.level), message.as_ptr(), file.as_ptr(), line) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<LogRecord>>);

    impl LogSink for Capture {
        fn log(&self, record: &LogRecord) {
            self.0.lock().unwrap().push(record.clone());
        }
    }

    fn with_layer(slot: Arc<SinkSlot>, f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(HostLogLayer::new(slot));
        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn events_reach_attached_sink_with_fields() {
        let slot = Arc::new(SinkSlot::default());
        let capture = Arc::new(Capture::default());
        slot.attach(capture.clone());

        with_layer(slot, || {
            tracing::error!(code = 8, "SendFrame failed");
        });

        let records = capture.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::ERROR);
        assert_eq!(records[0].message, "SendFrame failed code=8");
        assert!(records[0].file.is_some());
    }

    #[test]
    fn detached_slot_drops_events() {
        let slot = Arc::new(SinkSlot::default());
        let capture = Arc::new(Capture::default());
        slot.attach(capture.clone());
        slot.detach();

        with_layer(slot, || tracing::warn!("dropped"));

        assert!(capture.0.lock().unwrap().is_empty());
    }

    #[test]
    fn levels_map_to_host_log_types() {
        assert_eq!(log_type(&Level::ERROR), host::kUnityLogTypeError);
        assert_eq!(log_type(&Level::WARN), host::kUnityLogTypeWarning);
        assert_eq!(log_type(&Level::DEBUG), host::kUnityLogTypeLog);
    }

    #[test]
    fn interior_nul_does_not_lose_the_message() {
        assert_eq!(to_cstring("a\0b").to_str().unwrap(), "a\u{FFFD}b");
    }

    static LINES: Mutex<Vec<(host::UnityLogType, String)>> = Mutex::new(Vec::new());

    unsafe extern "system" fn fake_log(
        log_type: host::UnityLogType,
        message: *const std::ffi::c_char,
        _file: *const std::ffi::c_char,
        _line: c_int,
    ) {
        let text = unsafe { std::ffi::CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned();
        LINES.lock().unwrap().push((log_type, text));
    }

    #[test]
    fn unity_sink_calls_host_log() {
        let mut table = IUnityLog { Log: Some(fake_log) };
        let sink = unsafe { UnityLogSink::new(&mut table) }.unwrap();
        sink.log(&LogRecord {
            level: Level::WARN,
            message: "device lost".into(),
            file: None,
            line: None,
        });
        let lines = LINES.lock().unwrap();
        assert_eq!(
            lines.as_slice(),
            &[(host::kUnityLogTypeWarning, "device lost".to_owned())]
        );
        assert!(unsafe { UnityLogSink::new(std::ptr::null_mut()) }.is_none());
    }
}
