//! Process-scoped host state.
//!
//! The host context and its class loader are captured once when the process
//! attaches and read by every feature afterwards. Reading before attach is an
//! error rather than a silent default.

use crate::error::{CoreError, Result};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::host::{ClassLoader, HostClass, HostContext};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Memoizes class lookups against the host class loader.
pub struct ClassCache {
    loader: Arc<dyn ClassLoader>,
    classes: RwLock<HashMap<String, HostClass>>,
}

impl ClassCache {
    pub fn new(loader: Arc<dyn ClassLoader>) -> Self {
        Self {
            loader,
            classes: RwLock::new(HashMap::new()),
        }
    }

    /// Loads `name`, reusing an earlier successful lookup. Failures are not
    /// cached.
    pub fn get(&self, name: &str) -> BridgeResult<HostClass> {
        if let Some(class) = self.classes.read().get(name) {
            return Ok(class.clone());
        }

        let class = self.loader.load_class(name)?;
        trace!(class = name, "Class resolved");
        self.classes
            .write()
            .insert(name.to_string(), class.clone());
        Ok(class)
    }

    pub fn loader(&self) -> Arc<dyn ClassLoader> {
        Arc::clone(&self.loader)
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

impl fmt::Debug for ClassCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassCache")
            .field("cached", &self.len())
            .finish()
    }
}

struct ScopeData {
    host: Arc<dyn HostContext>,
    classes: Arc<ClassCache>,
}

/// Init-once holder of the attached host.
#[derive(Default)]
pub struct ProcessScope {
    data: OnceLock<ScopeData>,
}

impl ProcessScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the host context and its class loader.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyInitialized`] on a second call.
    pub fn init(&self, host: Arc<dyn HostContext>) -> Result<()> {
        let classes = Arc::new(ClassCache::new(host.class_loader()));
        self.data
            .set(ScopeData { host, classes })
            .map_err(|_| CoreError::AlreadyInitialized("process scope"))
    }

    pub fn is_initialized(&self) -> bool {
        self.data.get().is_some()
    }

    fn data(&self) -> Result<&ScopeData> {
        self.data
            .get()
            .ok_or(CoreError::NotInitialized("process scope"))
    }

    pub fn host(&self) -> Result<Arc<dyn HostContext>> {
        Ok(Arc::clone(&self.data()?.host))
    }

    pub fn class_loader(&self) -> Result<Arc<dyn ClassLoader>> {
        Ok(self.data()?.classes.loader())
    }

    pub fn classes(&self) -> Result<Arc<ClassCache>> {
        Ok(Arc::clone(&self.data()?.classes))
    }
}

impl fmt::Debug for ProcessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ProcessScope");
        match self.data.get() {
            Some(data) => s.field("host", &data.host.package_name()),
            None => s.field("host", &"<unattached>"),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::host::PackageInfo;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl ClassLoader for CountingLoader {
        fn load_class(&self, name: &str) -> BridgeResult<HostClass> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if name.starts_with("missing") {
                return Err(BridgeError::NotAvailable(name.to_string()));
            }
            Ok(HostClass {
                name: name.to_string(),
                handle: Arc::new(()),
            })
        }
    }

    struct Host(Arc<CountingLoader>);

    impl HostContext for Host {
        fn package_name(&self) -> String {
            "com.host.app".to_string()
        }

        fn package_info(&self, _package: &str) -> BridgeResult<Option<PackageInfo>> {
            Ok(None)
        }

        fn class_loader(&self) -> Arc<dyn ClassLoader> {
            self.0.clone()
        }

        fn report_fatal(&self, _message: &str) {}

        fn soft_restart(&self) {}
    }

    #[test]
    fn test_access_before_init_fails() {
        let scope = ProcessScope::new();
        assert!(matches!(scope.host(), Err(CoreError::NotInitialized(_))));
        assert!(matches!(
            scope.class_loader(),
            Err(CoreError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_init_once() {
        let loader = Arc::new(CountingLoader::default());
        let scope = ProcessScope::new();
        scope.init(Arc::new(Host(loader.clone()))).unwrap();
        assert!(scope.is_initialized());
        assert_eq!(scope.host().unwrap().package_name(), "com.host.app");

        let err = scope.init(Arc::new(Host(loader))).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyInitialized(_)));
    }

    #[test]
    fn test_class_cache_memoizes_hits_only() {
        let loader = Arc::new(CountingLoader::default());
        let cache = ClassCache::new(loader.clone());

        cache.get("a.b.C").unwrap();
        cache.get("a.b.C").unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

        assert!(cache.get("missing.X").is_err());
        assert!(cache.get("missing.X").is_err());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 1);
    }
}
