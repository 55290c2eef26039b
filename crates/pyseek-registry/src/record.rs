use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Vendor key of the reference CPython distribution
pub const CANONICAL_VENDOR: &str = "PythonCore";

/// Display name used for [`CANONICAL_VENDOR`] installs
pub const CANONICAL_NAME: &str = "python";

/// Vendor key reserved for the `py` launcher, never an interpreter
pub const RESERVED_VENDOR: &str = "PyLauncher";

/// An interpreter found in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterpreterRecord {
    name: String,
    major: u32,
    minor: u32,
    architecture: u32,
    executable: PathBuf,
    arguments: Option<String>,
}

impl InterpreterRecord {
    /// Assemble a record for `vendor`; `PythonCore` is renamed to `python`
    pub fn new(
        vendor: &str,
        (major, minor): (u32, u32),
        architecture: u32,
        executable: PathBuf,
        arguments: Option<String>,
    ) -> Self {
        Self {
            name: display_name(vendor).to_string(),
            major,
            minor,
            architecture,
            executable,
            arguments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn version(&self) -> (u32, u32) {
        (self.major, self.minor)
    }

    pub fn architecture(&self) -> u32 {
        self.architecture
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn arguments(&self) -> Option<&str> {
        self.arguments.as_deref()
    }
}

/// Name shown for a vendor key
pub fn display_name(vendor: &str) -> &str {
    if vendor == CANONICAL_VENDOR {
        CANONICAL_NAME
    } else {
        vendor
    }
}

impl fmt::Display for InterpreterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}.{}-{} ({})",
            self.name,
            self.major,
            self.minor,
            self.architecture,
            self.executable.display()
        )?;
        if let Some(args) = &self.arguments {
            write!(f, " {}", args)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_vendor_is_renamed() {
        let record = InterpreterRecord::new(
            "PythonCore",
            (3, 9),
            64,
            PathBuf::from("C:\\Py\\python.exe"),
            None,
        );
        assert_eq!(record.name(), "python");
        assert_eq!(record.version(), (3, 9));
        assert_eq!(record.to_string(), "python3.9-64 (C:\\Py\\python.exe)");
    }

    #[test]
    fn test_other_vendor_keeps_name() {
        let record = InterpreterRecord::new(
            "ContinuumAnalytics",
            (3, 11),
            32,
            PathBuf::from("python.exe"),
            Some("-E".to_string()),
        );
        assert_eq!(record.name(), "ContinuumAnalytics");
        assert_eq!(record.arguments(), Some("-E"));
        assert!(record.to_string().ends_with(" -E"));
    }

    #[test]
    fn test_serializes_all_fields() {
        let record =
            InterpreterRecord::new("PythonCore", (3, 12), 64, PathBuf::from("p.exe"), None);
        let json = serde_json::to_value(&record).unwrap_or_default();
        assert_eq!(json["name"], "python");
        assert_eq!(json["major"], 3);
        assert_eq!(json["minor"], 12);
        assert_eq!(json["architecture"], 64);
        assert_eq!(json["executable"], "p.exe");
        assert!(json["arguments"].is_null());
    }
}
