//! In-memory registry used for tests and offline inspection
//!
//! Keys are addressed by their full path including the hive name, e.g.
//! `HKEY_CURRENT_USER\Software\Python\PythonCore\3.9`. Names compare
//! case-insensitively and children enumerate in insertion order. Opening
//! `HKEY_LOCAL_MACHINE\Software\...` through the 32-bit view is redirected to
//! `Software\WOW6432Node\...`, as on a 64-bit Windows host.
//!
//! A registry can be loaded from TOML where every table is a key path and its
//! entries are the key's values (`""` names the default value):
//!
//! ```toml
//! ['HKEY_CURRENT_USER\Software\Python\PythonCore\3.9\InstallPath']
//! "" = 'C:\Py\'
//! ExecutableArguments = "-E"
//! ```
//!
//! Strings map to `REG_SZ`, integers to `REG_DWORD` (or `REG_QWORD` when they
//! do not fit), arrays of strings to `REG_MULTI_SZ`.

use crate::roots::{DiscoveryRoot, Hive, RegistryView};
use crate::store::{RegValue, RegistryKey, RegistryStore, StoreError};
use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

/// Errors while building a [`MemoryRegistry`] from TOML
#[derive(Error, Debug)]
pub enum MemoryRegistryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse registry file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unsupported value {name:?} at {path}: {reason}")]
    UnsupportedValue {
        path: String,
        name: String,
        reason: String,
    },
}

#[derive(Debug, Default)]
struct Node {
    values: Vec<(String, RegValue)>,
    children: Vec<(String, Node)>,
    denied: bool,
    /// Enumerating past this many children fails
    enumeration_limit: Option<usize>,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, node)| node)
    }

    fn child_or_insert(&mut self, name: &str) -> &mut Node {
        let pos = match self
            .children
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(pos) => pos,
            None => {
                self.children.push((name.to_string(), Node::default()));
                self.children.len() - 1
            }
        };
        &mut self.children[pos].1
    }
}

#[derive(Debug, Default)]
struct Shared {
    tree: RefCell<Node>,
    open: Cell<usize>,
    peak: Cell<usize>,
}

impl Shared {
    fn acquire(&self) {
        let open = self.open.get() + 1;
        self.open.set(open);
        if open > self.peak.get() {
            self.peak.set(open);
        }
    }

    fn release(&self) {
        self.open.set(self.open.get().saturating_sub(1));
    }
}

/// A registry held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    shared: Rc<Shared>,
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('\\').filter(|s| !s.is_empty())
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a key and any missing parents
    pub fn create_key(&self, path: &str) {
        let mut tree = self.shared.tree.borrow_mut();
        let mut node = &mut *tree;
        for segment in segments(path) {
            node = node.child_or_insert(segment);
        }
    }

    /// Set a value, creating the key if needed; an empty name sets the default value
    pub fn set_value(&self, path: &str, name: &str, value: RegValue) {
        let mut tree = self.shared.tree.borrow_mut();
        let mut node = &mut *tree;
        for segment in segments(path) {
            node = node.child_or_insert(segment);
        }
        match node
            .values
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => node.values.push((name.to_string(), value)),
        }
    }

    /// Builder form of [`set_value`](Self::set_value)
    pub fn with_value(self, path: &str, name: &str, value: RegValue) -> Self {
        self.set_value(path, name, value);
        self
    }

    /// Make every open of this key fail with access denied
    pub fn deny(&self, path: &str) {
        let mut tree = self.shared.tree.borrow_mut();
        let mut node = &mut *tree;
        for segment in segments(path) {
            node = node.child_or_insert(segment);
        }
        node.denied = true;
    }

    /// Make enumeration of this key fail once `after` children were listed
    pub fn fail_enumeration(&self, path: &str, after: usize) {
        let mut tree = self.shared.tree.borrow_mut();
        let mut node = &mut *tree;
        for segment in segments(path) {
            node = node.child_or_insert(segment);
        }
        node.enumeration_limit = Some(after);
    }

    pub fn from_toml_str(content: &str) -> Result<Self, MemoryRegistryError> {
        let table: toml::Table = toml::from_str(content)?;
        let registry = Self::new();
        for (path, entry) in &table {
            registry.create_key(path);
            let toml::Value::Table(values) = entry else {
                return Err(MemoryRegistryError::UnsupportedValue {
                    path: path.clone(),
                    name: String::new(),
                    reason: "a key must be a table of values".to_string(),
                });
            };
            for (name, value) in values {
                let value = convert_value(value).map_err(|reason| {
                    MemoryRegistryError::UnsupportedValue {
                        path: path.clone(),
                        name: name.clone(),
                        reason,
                    }
                })?;
                registry.set_value(path, name, value);
            }
        }
        Ok(registry)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, MemoryRegistryError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Number of handles currently open
    pub fn open_handles(&self) -> usize {
        self.shared.open.get()
    }

    /// Largest number of handles that were open at the same time
    pub fn peak_open_handles(&self) -> usize {
        self.shared.peak.get()
    }

    fn open_path(&self, path: Vec<String>) -> Result<MemoryKey, StoreError> {
        {
            let tree = self.shared.tree.borrow();
            let mut node = &*tree;
            for segment in &path {
                node = node
                    .child(segment)
                    .ok_or_else(|| StoreError::NotFound(path.join("\\")))?;
            }
            if node.denied {
                return Err(StoreError::AccessDenied(path.join("\\")));
            }
        }
        self.shared.acquire();
        Ok(MemoryKey {
            shared: Rc::clone(&self.shared),
            path,
        })
    }
}

fn convert_value(value: &toml::Value) -> Result<RegValue, String> {
    match value {
        toml::Value::String(s) => Ok(RegValue::String(s.clone())),
        toml::Value::Integer(i) => match u32::try_from(*i) {
            Ok(dword) => Ok(RegValue::Dword(dword)),
            Err(_) => u64::try_from(*i)
                .map(RegValue::Qword)
                .map_err(|_| format!("negative integer {}", i)),
        },
        toml::Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| "arrays may only contain strings".to_string())
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RegValue::MultiString),
        other => Err(format!("unsupported TOML type {}", other.type_str())),
    }
}

impl RegistryStore for MemoryRegistry {
    type Key = MemoryKey;

    fn open_root(&self, root: &DiscoveryRoot) -> Result<MemoryKey, StoreError> {
        let hive = match root.hive {
            Hive::CurrentUser => "HKEY_CURRENT_USER",
            Hive::LocalMachine => "HKEY_LOCAL_MACHINE",
        };
        let mut path = vec![hive.to_string()];
        for (i, segment) in segments(root.subpath).enumerate() {
            path.push(segment.to_string());
            let redirected = root.hive == Hive::LocalMachine
                && root.view == RegistryView::Bits32
                && i == 0
                && segment.eq_ignore_ascii_case("Software");
            if redirected {
                path.push("WOW6432Node".to_string());
            }
        }
        self.open_path(path)
    }
}

/// Open handle into a [`MemoryRegistry`]
#[derive(Debug)]
pub struct MemoryKey {
    shared: Rc<Shared>,
    path: Vec<String>,
}

impl MemoryKey {
    fn with_node<T>(&self, f: impl FnOnce(&Node) -> T) -> Result<T, StoreError> {
        let tree = self.shared.tree.borrow();
        let mut node = &*tree;
        for segment in &self.path {
            node = node
                .child(segment)
                .ok_or_else(|| StoreError::NotFound(self.path.join("\\")))?;
        }
        Ok(f(node))
    }
}

impl RegistryKey for MemoryKey {
    fn open_subkey(&self, name: &str) -> Result<Self, StoreError> {
        let mut path = self.path.clone();
        path.extend(segments(name).map(str::to_string));
        MemoryRegistry {
            shared: Rc::clone(&self.shared),
        }
        .open_path(path)
    }

    fn subkey_name(&self, index: u32) -> Result<Option<String>, StoreError> {
        self.with_node(|node| match node.enumeration_limit {
            Some(limit) if index as usize >= limit => {
                Err(StoreError::AccessDenied(self.path.join("\\")))
            }
            _ => Ok(node
                .children
                .get(index as usize)
                .map(|(name, _)| name.clone())),
        })?
    }

    fn value(&self, name: &str) -> Result<Option<RegValue>, StoreError> {
        self.with_node(|node| {
            node.values
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.clone())
        })
    }
}

impl Drop for MemoryKey {
    fn drop(&mut self) {
        self.shared.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roots::DISCOVERY_ROOTS;

    const CORE: &str = "HKEY_CURRENT_USER\\Software\\Python\\PythonCore";

    #[test]
    fn test_enumeration_follows_insertion_order() {
        let registry = MemoryRegistry::new();
        registry.create_key(&format!("{CORE}\\3.9"));
        registry.create_key(&format!("{CORE}\\3.10"));

        let Ok(root) = registry.open_root(&DISCOVERY_ROOTS[0]) else {
            panic!("root should open");
        };
        assert_eq!(root.subkey_name(0).ok().flatten(), Some("PythonCore".into()));
        assert_eq!(root.subkey_name(1).ok().flatten(), None);

        let Ok(core) = root.open_subkey("PythonCore") else {
            panic!("vendor should open");
        };
        assert_eq!(core.subkey_name(0).ok().flatten(), Some("3.9".into()));
        assert_eq!(core.subkey_name(1).ok().flatten(), Some("3.10".into()));
        assert_eq!(core.subkey_name(2).ok().flatten(), None);
    }

    #[test]
    fn test_values_are_case_insensitive() {
        let registry = MemoryRegistry::new().with_value(
            &format!("{CORE}\\3.9"),
            "SysVersion",
            RegValue::String("3.9".into()),
        );
        let value = registry
            .open_root(&DISCOVERY_ROOTS[0])
            .and_then(|root| root.open_subkey("pythoncore\\3.9"))
            .and_then(|tag| tag.value("sysversion"));
        assert_eq!(value.ok().flatten(), Some(RegValue::String("3.9".into())));
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let registry = MemoryRegistry::new();
        let result = registry.open_root(&DISCOVERY_ROOTS[1]);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_denied_key() {
        let registry = MemoryRegistry::new();
        registry.deny("HKEY_LOCAL_MACHINE\\Software\\Python");
        let result = registry.open_root(&DISCOVERY_ROOTS[1]);
        assert!(matches!(result, Err(StoreError::AccessDenied(_))));
    }

    #[test]
    fn test_failing_enumeration() {
        let registry = MemoryRegistry::new();
        registry.create_key(&format!("{CORE}\\3.9"));
        registry.create_key(&format!("{CORE}\\3.10"));
        registry.fail_enumeration(CORE, 1);

        let Ok(core) = registry
            .open_root(&DISCOVERY_ROOTS[0])
            .and_then(|root| root.open_subkey("PythonCore"))
        else {
            panic!("vendor should open");
        };
        assert_eq!(core.subkey_name(0).ok().flatten(), Some("3.9".into()));
        assert!(matches!(core.subkey_name(1), Err(StoreError::AccessDenied(_))));
    }

    #[test]
    fn test_32bit_view_is_redirected() {
        let registry = MemoryRegistry::new();
        registry.create_key("HKEY_LOCAL_MACHINE\\Software\\WOW6432Node\\Python\\PythonCore");

        assert!(registry.open_root(&DISCOVERY_ROOTS[1]).is_err());
        assert!(registry.open_root(&DISCOVERY_ROOTS[2]).is_ok());
    }

    #[test]
    fn test_handles_are_counted() {
        let registry = MemoryRegistry::new();
        registry.create_key(&format!("{CORE}\\3.9"));
        {
            let root = registry.open_root(&DISCOVERY_ROOTS[0]);
            let vendor = root.as_ref().map(|r| r.open_subkey("PythonCore"));
            assert!(vendor.is_ok());
            assert_eq!(registry.open_handles(), 2);
        }
        assert_eq!(registry.open_handles(), 0);
        assert_eq!(registry.peak_open_handles(), 2);
    }

    #[test]
    fn test_from_toml() {
        let content = r#"
['HKEY_CURRENT_USER\Software\Python\PythonCore\3.9']
SysVersion = "3.9"
SysArchitecture = 64
Flags = ["a", "b"]

['HKEY_CURRENT_USER\Software\Python\PythonCore\3.9\InstallPath']
"" = 'C:\Py\'
"#;
        let Ok(registry) = MemoryRegistry::from_toml_str(content) else {
            panic!("fixture should parse");
        };
        let Ok(tag) = registry
            .open_root(&DISCOVERY_ROOTS[0])
            .and_then(|root| root.open_subkey("PythonCore\\3.9"))
        else {
            panic!("tag should open");
        };
        assert_eq!(tag.value("SysArchitecture").ok().flatten(), Some(RegValue::Dword(64)));
        assert_eq!(
            tag.value("Flags").ok().flatten(),
            Some(RegValue::MultiString(vec!["a".into(), "b".into()]))
        );
        let default = tag
            .open_subkey("InstallPath")
            .and_then(|ip| ip.default_value());
        assert_eq!(default.ok().flatten(), Some(RegValue::String("C:\\Py\\".into())));
    }

    #[test]
    fn test_from_toml_rejects_unsupported_values() {
        let content = "['HKEY_CURRENT_USER\\Software']\nX = 1.5\n";
        let result = MemoryRegistry::from_toml_str(content);
        assert!(matches!(
            result,
            Err(MemoryRegistryError::UnsupportedValue { .. })
        ));
    }
}
