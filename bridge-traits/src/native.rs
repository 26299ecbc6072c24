//! Native Call Interception
//!
//! The native layer intercepts the host's unary RPC calls. Each intercepted
//! call is handed to a single interceptor which may replace the request
//! buffer or cancel the call outright.

use bytes::Bytes;
use std::sync::Arc;

use crate::{error::Result, host::ClassLoader};

/// An intercepted unary call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeRequest {
    pub uri: String,
    pub buffer: Bytes,
    /// When set, the real call is skipped and `buffer` is returned instead
    pub canceled: bool,
}

impl NativeRequest {
    pub fn new(uri: impl Into<String>, buffer: Bytes) -> Self {
        Self {
            uri: uri.into(),
            buffer,
            canceled: false,
        }
    }
}

/// Interceptor invoked for every unary call.
pub type UnaryCallInterceptor = Arc<dyn Fn(&mut NativeRequest) + Send + Sync>;

/// Native interception layer.
pub trait NativeBridge: Send + Sync {
    /// Loads and initializes the native layer. Calling it again is a no-op.
    fn init_once(&self, class_loader: Arc<dyn ClassLoader>) -> Result<()>;

    /// Installs the unary call interceptor, replacing any previous one.
    fn set_unary_call_interceptor(&self, interceptor: UnaryCallInterceptor);
}
