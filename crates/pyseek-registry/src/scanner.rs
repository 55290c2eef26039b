//! Lazy walk of roots, vendors and tags
//!
//! The walk is depth first. At most the root, one vendor and one tag (or its
//! `InstallPath`) handle are open at any point; a vendor's handle is dropped
//! before the next vendor is opened, and nothing under a root is opened until
//! the consumer asks for the next record.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::record::{InterpreterRecord, RESERVED_VENDOR};
use crate::resolve::{resolve_architecture, resolve_executable, resolve_version, TagContext};
use crate::roots::{DiscoveryRoot, DISCOVERY_ROOTS};
use crate::store::{RegistryKey, RegistryStore, StoreError};

struct RootCursor<K> {
    root: DiscoveryRoot,
    key: K,
    next: u32,
}

struct VendorCursor<K> {
    name: String,
    key: K,
    next: u32,
}

/// Iterator over the interpreters registered in a store.
///
/// Records come out in root order, then vendor and tag enumeration order.
/// Nothing is sorted or deduplicated. Dropping the iterator abandons the scan.
pub struct Scan<'a, S: RegistryStore> {
    store: &'a S,
    sink: &'a dyn DiagnosticSink,
    roots: std::vec::IntoIter<DiscoveryRoot>,
    root: Option<RootCursor<S::Key>>,
    vendor: Option<VendorCursor<S::Key>>,
}

/// Scan the standard PEP 514 roots of `store`
pub fn scan<'a, S: RegistryStore>(store: &'a S, sink: &'a dyn DiagnosticSink) -> Scan<'a, S> {
    scan_roots(store, DISCOVERY_ROOTS.to_vec(), sink)
}

/// Scan an explicit list of roots, in the given order
pub fn scan_roots<'a, S: RegistryStore>(
    store: &'a S,
    roots: Vec<DiscoveryRoot>,
    sink: &'a dyn DiagnosticSink,
) -> Scan<'a, S> {
    Scan {
        store,
        sink,
        roots: roots.into_iter(),
        root: None,
        vendor: None,
    }
}

/// Next child name at `*next`, advancing the cursor.
///
/// `None` ends the enumeration, either because the key has no more children
/// or because reading failed (which is reported).
fn next_child<K: RegistryKey>(
    key: &K,
    next: &mut u32,
    path: impl FnOnce() -> String,
    sink: &dyn DiagnosticSink,
) -> Option<String> {
    match key.subkey_name(*next) {
        Ok(Some(name)) => {
            *next += 1;
            Some(name)
        }
        Ok(None) => None,
        Err(err) => {
            sink.report(Diagnostic::new(path(), format!("enumeration failed: {}", err)));
            None
        }
    }
}

/// Turn one tag into a record, or nothing if version or executable is unobtainable
fn extract<K: RegistryKey>(
    root: &DiscoveryRoot,
    vendor: &str,
    vendor_key: &K,
    tag: &str,
    sink: &dyn DiagnosticSink,
) -> Option<InterpreterRecord> {
    let tag_path = format!("{}/{}/{}", root.label, vendor, tag);

    let (version, architecture) = {
        let tag_key = match vendor_key.open_subkey(tag) {
            Ok(key) => key,
            Err(err) => {
                sink.report(Diagnostic::new(&tag_path, open_failure(&err)));
                return None;
            }
        };
        let ctx = TagContext {
            hive: root.label,
            vendor,
            tag,
            key: &tag_key,
            default_architecture: root.default_architecture,
        };
        let version = resolve_version(&ctx, sink)?;
        (version, resolve_architecture(&ctx, sink))
    };

    let (executable, arguments) = resolve_executable(vendor_key, tag, &tag_path, sink)?;
    tracing::trace!(path = %tag_path, exe = %executable.display(), "resolved interpreter");
    Some(InterpreterRecord::new(
        vendor,
        version,
        architecture,
        executable,
        arguments,
    ))
}

fn open_failure(err: &StoreError) -> String {
    match err {
        StoreError::NotFound(_) => "missing".to_string(),
        other => format!("cannot open ({})", other),
    }
}

impl<S: RegistryStore> Iterator for Scan<'_, S> {
    type Item = InterpreterRecord;

    fn next(&mut self) -> Option<InterpreterRecord> {
        loop {
            if let (Some(root), Some(vendor)) = (&self.root, &mut self.vendor) {
                let tag = next_child(
                    &vendor.key,
                    &mut vendor.next,
                    || format!("{}/{}", root.root.label, vendor.name),
                    self.sink,
                );
                match tag {
                    Some(tag) => {
                        if let Some(record) =
                            extract(&root.root, &vendor.name, &vendor.key, &tag, self.sink)
                        {
                            return Some(record);
                        }
                    }
                    None => self.vendor = None,
                }
                continue;
            }

            if let Some(root) = &mut self.root {
                let label = root.root.label;
                let Some(vendor) =
                    next_child(&root.key, &mut root.next, || label.to_string(), self.sink)
                else {
                    self.root = None;
                    continue;
                };
                if vendor == RESERVED_VENDOR {
                    continue;
                }
                match root.key.open_subkey(&vendor) {
                    Ok(key) => {
                        self.vendor = Some(VendorCursor {
                            name: vendor,
                            key,
                            next: 0,
                        });
                    }
                    Err(err) => self.sink.report(Diagnostic::new(
                        format!("{}/{}", label, vendor),
                        open_failure(&err),
                    )),
                }
                continue;
            }

            let root = self.roots.next()?;
            match self.store.open_root(&root) {
                Ok(key) => {
                    tracing::debug!(root = %root, "scanning registry root");
                    self.root = Some(RootCursor { root, key, next: 0 });
                }
                Err(err) => {
                    tracing::debug!(root = %root, error = %err, "skipping registry root");
                }
            }
        }
    }
}

#[cfg(windows)]
static SYSTEM_REGISTRY: crate::windows::WindowsRegistry = crate::windows::WindowsRegistry;

/// Scan the live registry.
///
/// Only Windows has one; elsewhere this yields nothing.
pub fn discover_interpreters(
    sink: &dyn DiagnosticSink,
) -> impl Iterator<Item = InterpreterRecord> + '_ {
    #[cfg(windows)]
    {
        scan(&SYSTEM_REGISTRY, sink)
    }
    #[cfg(not(windows))]
    {
        tracing::debug!("no system registry on this platform");
        let _ = sink;
        std::iter::empty()
    }
}
