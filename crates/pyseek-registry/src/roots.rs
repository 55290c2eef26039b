//! Registry roots searched for PEP 514 entries

use std::fmt;

/// Predefined registry hive a root lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hive {
    CurrentUser,
    LocalMachine,
}

/// Which word-size view of the registry to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryView {
    /// Whatever view the calling process gets by default
    Native,
    Bits32,
    Bits64,
}

/// A place in the registry where vendors register interpreters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryRoot {
    pub hive: Hive,
    /// Hive name used as the first segment of diagnostic paths
    pub label: &'static str,
    pub subpath: &'static str,
    pub view: RegistryView,
    /// Architecture assumed for tags that do not declare `SysArchitecture`
    pub default_architecture: u32,
}

/// Roots in scan order
pub const DISCOVERY_ROOTS: [DiscoveryRoot; 3] = [
    DiscoveryRoot {
        hive: Hive::CurrentUser,
        label: "HKEY_CURRENT_USER",
        subpath: "Software\\Python",
        view: RegistryView::Native,
        default_architecture: 64,
    },
    DiscoveryRoot {
        hive: Hive::LocalMachine,
        label: "HKEY_LOCAL_MACHINE",
        subpath: "Software\\Python",
        view: RegistryView::Bits64,
        default_architecture: 64,
    },
    DiscoveryRoot {
        hive: Hive::LocalMachine,
        label: "HKEY_LOCAL_MACHINE",
        subpath: "Software\\Python",
        view: RegistryView::Bits32,
        default_architecture: 32,
    },
];

impl fmt::Display for DiscoveryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.view {
            RegistryView::Native => write!(f, "{}\\{}", self.label, self.subpath),
            RegistryView::Bits32 => write!(f, "{}\\{} (32-bit view)", self.label, self.subpath),
            RegistryView::Bits64 => write!(f, "{}\\{} (64-bit view)", self.label, self.subpath),
        }
    }
}
