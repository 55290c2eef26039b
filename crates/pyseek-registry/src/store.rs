//! Read-only view of a hierarchical registry
//!
//! The scanner only ever opens, enumerates and reads. Handles are owned
//! values and are closed when dropped. Enumeration is positional: callers ask
//! for index 0, 1, 2, ... until the key reports no further entries.

use crate::roots::DiscoveryRoot;
use std::io;
use thiserror::Error;

/// Errors reported by a registry backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("registry I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Typed registry value data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegValue {
    String(String),
    ExpandString(String),
    MultiString(Vec<String>),
    Dword(u32),
    Qword(u64),
    Binary(Vec<u8>),
    None,
}

impl RegValue {
    /// Text of a `REG_SZ` / `REG_EXPAND_SZ` value, `None` for every other type
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RegValue::String(s) | RegValue::ExpandString(s) => Some(s),
            _ => None,
        }
    }

    /// Registry type name, used when describing unexpected values
    pub fn type_name(&self) -> &'static str {
        match self {
            RegValue::String(_) => "REG_SZ",
            RegValue::ExpandString(_) => "REG_EXPAND_SZ",
            RegValue::MultiString(_) => "REG_MULTI_SZ",
            RegValue::Dword(_) => "REG_DWORD",
            RegValue::Qword(_) => "REG_QWORD",
            RegValue::Binary(_) => "REG_BINARY",
            RegValue::None => "REG_NONE",
        }
    }
}

/// An open key
pub trait RegistryKey: Sized {
    /// Open a descendant key; `name` may contain `\` separated segments
    fn open_subkey(&self, name: &str) -> Result<Self, StoreError>;

    /// Name of the child key at `index`; `Ok(None)` once the index runs past the last child
    fn subkey_name(&self, index: u32) -> Result<Option<String>, StoreError>;

    /// Named value; `Ok(None)` if the key has no such value
    fn value(&self, name: &str) -> Result<Option<RegValue>, StoreError>;

    /// The key's unnamed default value
    fn default_value(&self) -> Result<Option<RegValue>, StoreError> {
        self.value("")
    }
}

/// A registry backend
pub trait RegistryStore {
    type Key: RegistryKey;

    /// Open `root.subpath` under `root.hive` using `root.view`
    fn open_root(&self, root: &DiscoveryRoot) -> Result<Self::Key, StoreError>;
}
