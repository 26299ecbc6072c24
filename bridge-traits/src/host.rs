//! Host Process Abstractions
//!
//! The host process context is captured once at attach time. It answers
//! package metadata queries (used to probe the companion service and to read
//! the host binary's version), exposes the host class loader, and provides
//! the two process-level escape hatches: reporting a fatal condition to the
//! user and requesting a soft restart.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;

/// Installed package metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub package_name: String,
    /// Monotonic build number of the installed binary
    pub version_code: i64,
    /// Path of the installed package binary, when readable
    pub source_dir: Option<PathBuf>,
}

/// A class resolved through the host class loader.
#[derive(Clone)]
pub struct HostClass {
    pub name: String,
    /// Opaque runtime handle owned by the interception engine
    pub handle: Arc<dyn Any + Send + Sync>,
}

impl fmt::Debug for HostClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostClass").field("name", &self.name).finish()
    }
}

/// Host class loader.
pub trait ClassLoader: Send + Sync {
    fn load_class(&self, name: &str) -> Result<HostClass>;
}

/// Host process context captured at attach time.
pub trait HostContext: Send + Sync {
    /// Package name of the host process
    fn package_name(&self) -> String;

    /// Metadata of an installed package, `Ok(None)` if not installed
    fn package_info(&self, package: &str) -> Result<Option<PackageInfo>>;

    /// The host class loader
    fn class_loader(&self) -> Arc<dyn ClassLoader>;

    /// Shows a fatal error on the user-visible surface
    fn report_fatal(&self, message: &str);

    /// Requests a controlled restart of the host process
    fn soft_restart(&self);

    /// Metadata of the host package itself
    fn installed_package(&self) -> Option<PackageInfo> {
        self.package_info(&self.package_name()).ok().flatten()
    }
}

/// Identity of a foreground entry point instance.
pub type EntryId = u64;

/// Intent data delivered to a foreground entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentData {
    pub action: Option<String>,
    pub extras: HashMap<String, String>,
}

impl IntentData {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            extras: HashMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}

/// A foreground entry point (activity) of the host.
pub trait ForegroundEntry: Send + Sync {
    /// Stable identity of this instance
    fn id(&self) -> EntryId;

    /// Package the entry point belongs to
    fn package_name(&self) -> String;

    /// Intent the entry point was (re)started with
    fn intent(&self) -> Option<IntentData>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SingleHost;

    impl HostContext for SingleHost {
        fn package_name(&self) -> String {
            "com.host.app".to_string()
        }

        fn package_info(&self, package: &str) -> Result<Option<PackageInfo>> {
            Ok((package == "com.host.app").then(|| PackageInfo {
                package_name: package.to_string(),
                version_code: 100,
                source_dir: None,
            }))
        }

        fn class_loader(&self) -> Arc<dyn ClassLoader> {
            unimplemented!()
        }

        fn report_fatal(&self, _message: &str) {}

        fn soft_restart(&self) {}
    }

    #[test]
    fn test_installed_package_uses_own_name() {
        let info = SingleHost.installed_package().unwrap();
        assert_eq!(info.version_code, 100);
    }

    #[test]
    fn test_intent_builder() {
        let intent = IntentData::new("open").with_extra("id", "42");
        assert_eq!(intent.action.as_deref(), Some("open"));
        assert_eq!(intent.extras.get("id"), Some(&"42".to_string()));
    }

    #[test]
    fn test_host_class_debug_hides_handle() {
        let class = HostClass {
            name: "a.b.C".to_string(),
            handle: Arc::new(1u32),
        };
        assert_eq!(format!("{:?}", class), "HostClass { name: \"a.b.C\" }");
    }
}
