//! Native unary call interception.
//!
//! Each intercepted call is posted as a [`UnaryCallEvent`]. Subscribers may
//! replace the buffer or cancel the event; a canceled call is not executed
//! and the host receives the event's buffer instead.

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::host::ClassLoader;
use bridge_traits::native::{NativeBridge, NativeRequest};
use bridge_traits::session::SessionStore;
use core_runtime::config::ModConfig;
use core_runtime::events::{Event, EventBus, UnaryCallEvent};
use std::sync::Arc;
use tracing::{debug, trace};

/// Native interception needs an active session and the experimental flag.
pub fn native_hooks_enabled(session: &dyn SessionStore, config: &ModConfig) -> bool {
    config.experimental.native_hooks && session.has_active_session()
}

/// Initializes the native layer and routes its unary calls through `events`.
pub fn install_unary_interceptor(
    native: &dyn NativeBridge,
    class_loader: Arc<dyn ClassLoader>,
    events: EventBus,
) -> BridgeResult<()> {
    native.init_once(class_loader)?;
    native.set_unary_call_interceptor(Arc::new(move |request: &mut NativeRequest| {
        let event = events.post(UnaryCallEvent::new(
            request.uri.clone(),
            request.buffer.clone(),
        ));
        let canceled = event.is_canceled();
        if canceled {
            trace!(uri = %request.uri, "Unary call suppressed");
        }
        request.canceled = canceled;
        request.buffer = event.buffer;
    }));
    debug!("Native unary interception installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::host::HostClass;
    use bridge_traits::native::UnaryCallInterceptor;
    use bytes::Bytes;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingNative {
        interceptor: Mutex<Option<UnaryCallInterceptor>>,
        inits: Mutex<usize>,
    }

    impl NativeBridge for RecordingNative {
        fn init_once(&self, _class_loader: Arc<dyn ClassLoader>) -> BridgeResult<()> {
            *self.inits.lock() += 1;
            Ok(())
        }

        fn set_unary_call_interceptor(&self, interceptor: UnaryCallInterceptor) {
            *self.interceptor.lock() = Some(interceptor);
        }
    }

    impl RecordingNative {
        fn call(&self, uri: &str, buffer: &'static [u8]) -> NativeRequest {
            let mut request = NativeRequest::new(uri, Bytes::from_static(buffer));
            let interceptor = self.interceptor.lock().clone();
            if let Some(interceptor) = interceptor {
                interceptor(&mut request);
            }
            request
        }
    }

    struct NoClasses;

    impl ClassLoader for NoClasses {
        fn load_class(&self, name: &str) -> BridgeResult<HostClass> {
            Err(BridgeError::NotAvailable(name.to_string()))
        }
    }

    #[test]
    fn test_uncanceled_call_passes_through() {
        let native = RecordingNative::default();
        install_unary_interceptor(&native, Arc::new(NoClasses), EventBus::new()).unwrap();

        let request = native.call("/messaging.Send", b"payload");
        assert!(!request.canceled);
        assert_eq!(request.buffer, Bytes::from_static(b"payload"));
        assert_eq!(*native.inits.lock(), 1);
    }

    #[test]
    fn test_canceled_call_returns_replacement_buffer() {
        let native = RecordingNative::default();
        let events = EventBus::new();
        events.subscribe(|event: &mut UnaryCallEvent| {
            if event.uri.ends_with("Typing") {
                event.buffer = Bytes::from_static(b"ok");
                event.cancel();
            }
        });
        install_unary_interceptor(&native, Arc::new(NoClasses), events).unwrap();

        let request = native.call("/messaging.Typing", b"original");
        assert!(request.canceled);
        assert_eq!(request.buffer, Bytes::from_static(b"ok"));

        assert!(!native.call("/messaging.Send", b"x").canceled);
    }
}
