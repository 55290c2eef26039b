//! Live registry backend built on `winreg`

use crate::roots::{DiscoveryRoot, Hive, RegistryView};
use crate::store::{RegValue, RegistryKey, RegistryStore, StoreError};
use std::io;
use winreg::enums::{
    RegType, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ, KEY_WOW64_32KEY, KEY_WOW64_64KEY,
};
use winreg::types::FromRegValue;
use winreg::RegKey;

const ERROR_FILE_NOT_FOUND: i32 = 2;
const ERROR_ACCESS_DENIED: i32 = 5;
const ERROR_NO_MORE_ITEMS: i32 = 259;

/// The registry of the running Windows host
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    pub fn new() -> Self {
        Self
    }
}

/// Open key plus the access flags every descendant is opened with
pub struct WindowsKey {
    key: RegKey,
    flags: u32,
}

fn view_flags(view: RegistryView) -> u32 {
    match view {
        RegistryView::Native => KEY_READ,
        RegistryView::Bits32 => KEY_READ | KEY_WOW64_32KEY,
        RegistryView::Bits64 => KEY_READ | KEY_WOW64_64KEY,
    }
}

fn classify(err: io::Error, path: &str) -> StoreError {
    match err.raw_os_error() {
        Some(ERROR_FILE_NOT_FOUND) => StoreError::NotFound(path.to_string()),
        Some(ERROR_ACCESS_DENIED) => StoreError::AccessDenied(path.to_string()),
        _ => StoreError::Io(err),
    }
}

fn is_missing(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(ERROR_FILE_NOT_FOUND)
}

impl RegistryStore for WindowsRegistry {
    type Key = WindowsKey;

    fn open_root(&self, root: &DiscoveryRoot) -> Result<WindowsKey, StoreError> {
        let hive = match root.hive {
            Hive::CurrentUser => HKEY_CURRENT_USER,
            Hive::LocalMachine => HKEY_LOCAL_MACHINE,
        };
        let flags = view_flags(root.view);
        let key = RegKey::predef(hive)
            .open_subkey_with_flags(root.subpath, flags)
            .map_err(|e| classify(e, root.subpath))?;
        Ok(WindowsKey { key, flags })
    }
}

impl RegistryKey for WindowsKey {
    fn open_subkey(&self, name: &str) -> Result<Self, StoreError> {
        let key = self
            .key
            .open_subkey_with_flags(name, self.flags)
            .map_err(|e| classify(e, name))?;
        Ok(WindowsKey {
            key,
            flags: self.flags,
        })
    }

    fn subkey_name(&self, index: u32) -> Result<Option<String>, StoreError> {
        match self.key.enum_keys().nth(index as usize) {
            None => Ok(None),
            Some(Ok(name)) => Ok(Some(name)),
            Some(Err(err)) if err.raw_os_error() == Some(ERROR_NO_MORE_ITEMS) => Ok(None),
            Some(Err(err)) => Err(StoreError::Io(err)),
        }
    }

    fn value(&self, name: &str) -> Result<Option<RegValue>, StoreError> {
        let raw = match self.key.get_raw_value(name) {
            Ok(raw) => raw,
            Err(err) if is_missing(&err) => return Ok(None),
            Err(err) => return Err(classify(err, name)),
        };
        let value = match raw.vtype {
            RegType::REG_SZ => RegValue::String(String::from_reg_value(&raw)?),
            RegType::REG_EXPAND_SZ => RegValue::ExpandString(String::from_reg_value(&raw)?),
            RegType::REG_MULTI_SZ => RegValue::MultiString(Vec::<String>::from_reg_value(&raw)?),
            RegType::REG_DWORD => RegValue::Dword(u32::from_reg_value(&raw)?),
            RegType::REG_QWORD => RegValue::Qword(u64::from_reg_value(&raw)?),
            RegType::REG_NONE => RegValue::None,
            _ => RegValue::Binary(raw.bytes.to_vec()),
        };
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::scanner::scan_roots;
    use std::fs;
    use tempfile::TempDir;
    use winreg::enums::KEY_ALL_ACCESS;

    const TEST_ROOT: &str = "Software\\pyseek-test";

    /// Throwaway key under `HKCU\Software\pyseek-test`, deleted on drop
    struct ScratchKey {
        name: &'static str,
        key: RegKey,
    }

    impl ScratchKey {
        fn create(name: &'static str) -> io::Result<Self> {
            let (key, _) = RegKey::predef(HKEY_CURRENT_USER)
                .create_subkey(format!("{}\\{}", TEST_ROOT, name))?;
            Ok(Self { name, key })
        }

        fn open(&self) -> Result<WindowsKey, StoreError> {
            let path = format!("{}\\{}", TEST_ROOT, self.name);
            let key = RegKey::predef(HKEY_CURRENT_USER)
                .open_subkey_with_flags(&path, KEY_READ)
                .map_err(|e| classify(e, &path))?;
            Ok(WindowsKey {
                key,
                flags: KEY_READ,
            })
        }
    }

    impl Drop for ScratchKey {
        fn drop(&mut self) {
            if let Ok(parent) =
                RegKey::predef(HKEY_CURRENT_USER).open_subkey_with_flags(TEST_ROOT, KEY_ALL_ACCESS)
            {
                let _ = parent.delete_subkey_all(self.name);
            }
        }
    }

    #[test]
    fn test_value_types_are_mapped() {
        let scratch = ScratchKey::create("values").expect("create scratch key");
        scratch.key.set_value("", &"C:\\Py\\").expect("default");
        scratch.key.set_value("Sz", &"3.9").expect("sz");
        scratch.key.set_value("Dword", &64u32).expect("dword");
        scratch.key.set_value("Qword", &(1u64 << 40)).expect("qword");
        scratch
            .key
            .set_value("Multi", &vec!["a".to_string(), "b".to_string()])
            .expect("multi");
        scratch
            .key
            .set_raw_value(
                "Blob",
                &winreg::RegValue {
                    bytes: vec![1, 2, 3],
                    vtype: RegType::REG_BINARY,
                },
            )
            .expect("binary");

        let key = scratch.open().expect("open scratch key");
        assert_eq!(
            key.default_value().ok().flatten(),
            Some(RegValue::String("C:\\Py\\".into()))
        );
        assert_eq!(key.value("Sz").ok().flatten(), Some(RegValue::String("3.9".into())));
        assert_eq!(key.value("Dword").ok().flatten(), Some(RegValue::Dword(64)));
        assert_eq!(key.value("Qword").ok().flatten(), Some(RegValue::Qword(1 << 40)));
        assert_eq!(
            key.value("Multi").ok().flatten(),
            Some(RegValue::MultiString(vec!["a".into(), "b".into()]))
        );
        assert_eq!(key.value("Blob").ok().flatten(), Some(RegValue::Binary(vec![1, 2, 3])));
        assert!(matches!(key.value("Missing"), Ok(None)));
    }

    #[test]
    fn test_enumeration_ends_cleanly() {
        let scratch = ScratchKey::create("enum").expect("create scratch key");
        scratch.key.create_subkey("first").expect("first");
        scratch.key.create_subkey("second").expect("second");

        let key = scratch.open().expect("open scratch key");
        let mut names = Vec::new();
        let mut index = 0;
        while let Ok(Some(name)) = key.subkey_name(index) {
            names.push(name);
            index += 1;
        }
        names.sort();
        assert_eq!(names, ["first", "second"]);
        assert!(matches!(key.subkey_name(2), Ok(None)));
        assert!(matches!(key.subkey_name(100), Ok(None)));
    }

    #[test]
    fn test_missing_subkey_is_not_found() {
        let scratch = ScratchKey::create("missing").expect("create scratch key");
        let key = scratch.open().expect("open scratch key");
        assert!(matches!(key.open_subkey("nope"), Err(StoreError::NotFound(_))));

        let root = DiscoveryRoot {
            hive: Hive::CurrentUser,
            label: "HKEY_CURRENT_USER",
            subpath: "Software\\pyseek-test\\no-such-root",
            view: RegistryView::Native,
            default_architecture: 64,
        };
        assert!(matches!(
            WindowsRegistry::new().open_root(&root),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_scan_of_live_keys() {
        let tmp = TempDir::new().expect("temp dir");
        let exe = tmp.path().join("python.exe");
        fs::write(&exe, "").expect("fake interpreter");

        let scratch = ScratchKey::create("scan").expect("create scratch key");
        let (tag, _) = scratch
            .key
            .create_subkey("PythonCore\\3.12")
            .expect("tag key");
        tag.set_value("SysArchitecture", &"32bit").expect("arch");
        let (install, _) = tag.create_subkey("InstallPath").expect("install key");
        install
            .set_value("ExecutablePath", &exe.display().to_string())
            .expect("exe");
        drop((tag, install));

        let root = DiscoveryRoot {
            hive: Hive::CurrentUser,
            label: "HKEY_CURRENT_USER",
            subpath: "Software\\pyseek-test\\scan",
            view: RegistryView::Native,
            default_architecture: 64,
        };
        let sink = CollectingSink::new();
        let records: Vec<_> = scan_roots(&WindowsRegistry::new(), vec![root], &sink).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "python");
        assert_eq!(records[0].version(), (3, 12));
        assert_eq!(records[0].architecture(), 32);
        assert_eq!(records[0].executable(), exe.as_path());
        assert!(sink.is_empty(), "unexpected diagnostics: {:?}", sink.diagnostics());
    }
}
