//! Per-tag field resolution
//!
//! Each field is resolved by an ordered list of resolvers. A resolver either
//! produces the value or explains why it could not; the first value wins.
//! Failures that point at a broken registry entry are reported, a value that
//! simply is not there is not.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::store::{RegValue, RegistryKey, StoreError};
use once_cell::sync::Lazy;
use pyseek_config::exe_paths;
use regex::Regex;
use std::path::PathBuf;
use thiserror::Error;

// ASCII digits only; `u32::from_str` rejects anything else
static VERSION_RE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^([0-9]+)\.([0-9]+)"));

static ARCH_RE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^([0-9]+)bit$"));

/// Why a registry string could not be interpreted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("key is not string")]
    VersionNotString,

    #[error("arch is not string")]
    ArchNotString,

    #[error("invalid format {0}")]
    InvalidFormat(String),

    #[error("number out of range in {0}")]
    OutOfRange(String),
}

/// Outcome of a resolver that produced nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The source does not exist; try the next one quietly
    Absent,
    /// The source exists but is unusable; report it and try the next one
    Malformed(Diagnostic),
}

pub type Resolver<C, T> = fn(&C) -> Result<T, Resolution>;

/// Run `resolvers` in order and return the first value produced
pub fn first_success<C, T>(
    ctx: &C,
    resolvers: &[Resolver<C, T>],
    sink: &dyn DiagnosticSink,
) -> Option<T> {
    for resolver in resolvers {
        match resolver(ctx) {
            Ok(value) => return Some(value),
            Err(Resolution::Absent) => {}
            Err(Resolution::Malformed(diagnostic)) => sink.report(diagnostic),
        }
    }
    None
}

/// Parse the leading `major.minor` of a version string
pub fn parse_version(text: &str) -> Result<(u32, u32), FormatError> {
    let caps = VERSION_RE
        .as_ref()
        .ok()
        .and_then(|re| re.captures(text))
        .ok_or_else(|| FormatError::InvalidFormat(text.to_string()))?;
    let number = |i: usize| {
        caps[i]
            .parse::<u32>()
            .map_err(|_| FormatError::OutOfRange(text.to_string()))
    };
    Ok((number(1)?, number(2)?))
}

/// Parse a `<digits>bit` architecture string
pub fn parse_architecture(text: &str) -> Result<u32, FormatError> {
    let caps = ARCH_RE
        .as_ref()
        .ok()
        .and_then(|re| re.captures(text))
        .ok_or_else(|| FormatError::InvalidFormat(text.to_string()))?;
    caps[1]
        .parse::<u32>()
        .map_err(|_| FormatError::OutOfRange(text.to_string()))
}

/// A tag key being resolved
pub struct TagContext<'a, K> {
    pub hive: &'a str,
    pub vendor: &'a str,
    pub tag: &'a str,
    pub key: &'a K,
    pub default_architecture: u32,
}

impl<K> TagContext<'_, K> {
    /// `hive/vendor/tag`
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.hive, self.vendor, self.tag)
    }

    fn child_path(&self, name: &str) -> String {
        format!("{}/{}", self.path(), name)
    }
}

/// Read a named value; read failures are reported as malformed
fn read_value<K: RegistryKey>(
    key: &K,
    name: &str,
    path: impl FnOnce() -> String,
) -> Result<RegValue, Resolution> {
    match key.value(name) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(Resolution::Absent),
        Err(err) => Err(Resolution::Malformed(Diagnostic::new(path(), err.to_string()))),
    }
}

fn version_from_sys_version<K: RegistryKey>(
    ctx: &TagContext<'_, K>,
) -> Result<(u32, u32), Resolution> {
    let path = || ctx.child_path("SysVersion");
    let value = read_value(ctx.key, "SysVersion", path)?;
    value
        .as_str()
        .ok_or(FormatError::VersionNotString)
        .and_then(parse_version)
        .map_err(|e| Resolution::Malformed(Diagnostic::new(path(), e.to_string())))
}

fn version_from_tag_name<K: RegistryKey>(
    ctx: &TagContext<'_, K>,
) -> Result<(u32, u32), Resolution> {
    parse_version(ctx.tag)
        .map_err(|e| Resolution::Malformed(Diagnostic::new(ctx.path(), e.to_string())))
}

fn architecture_from_sys_architecture<K: RegistryKey>(
    ctx: &TagContext<'_, K>,
) -> Result<u32, Resolution> {
    let path = || ctx.child_path("SysArchitecture");
    let value = read_value(ctx.key, "SysArchitecture", path)?;
    value
        .as_str()
        .ok_or(FormatError::ArchNotString)
        .and_then(parse_architecture)
        .map_err(|e| Resolution::Malformed(Diagnostic::new(path(), e.to_string())))
}

fn architecture_from_root<K>(ctx: &TagContext<'_, K>) -> Result<u32, Resolution> {
    Ok(ctx.default_architecture)
}

/// `SysVersion`, then the tag name
pub fn resolve_version<'c, K: RegistryKey>(
    ctx: &TagContext<'c, K>,
    sink: &dyn DiagnosticSink,
) -> Option<(u32, u32)> {
    let resolvers: [Resolver<TagContext<'c, K>, (u32, u32)>; 2] = [
        |c| version_from_sys_version(c),
        |c| version_from_tag_name(c),
    ];
    first_success(ctx, &resolvers, sink)
}

/// `SysArchitecture`, then the root default
pub fn resolve_architecture<'c, K: RegistryKey>(
    ctx: &TagContext<'c, K>,
    sink: &dyn DiagnosticSink,
) -> u32 {
    let resolvers: [Resolver<TagContext<'c, K>, u32>; 2] = [
        |c| architecture_from_sys_architecture(c),
        |c| architecture_from_root(c),
    ];
    first_success(ctx, &resolvers, sink).unwrap_or(ctx.default_architecture)
}

/// An open `InstallPath` key
pub struct InstallContext<'a, K> {
    /// `hive/vendor/tag` of the owning tag
    pub tag_path: &'a str,
    pub key: &'a K,
}

impl<K> InstallContext<'_, K> {
    fn value_path(&self, name: &str) -> String {
        format!("{}/InstallPath/{}", self.tag_path, name)
    }
}

fn exe_from_executable_path<K: RegistryKey>(
    ctx: &InstallContext<'_, K>,
) -> Result<PathBuf, Resolution> {
    let path = || ctx.value_path("ExecutablePath");
    let value = read_value(ctx.key, "ExecutablePath", path)?;
    match value.as_str() {
        Some(exe) => Ok(PathBuf::from(exe)),
        None => Err(Resolution::Malformed(Diagnostic::new(
            path(),
            format!("expected a string, found {}", value.type_name()),
        ))),
    }
}

fn exe_from_install_dir<K: RegistryKey>(
    ctx: &InstallContext<'_, K>,
) -> Result<PathBuf, Resolution> {
    let path = || ctx.value_path("(Default)");
    let value = match ctx.key.default_value() {
        Ok(Some(value)) => value,
        Ok(None) => return Err(Resolution::Absent),
        Err(err) => {
            return Err(Resolution::Malformed(Diagnostic::new(
                path(),
                err.to_string(),
            )))
        }
    };
    match value.as_str() {
        Some(dir) => Ok(exe_paths::interpreter_in(dir)),
        None => Err(Resolution::Malformed(Diagnostic::new(
            path(),
            format!("expected a string, found {}", value.type_name()),
        ))),
    }
}

fn arguments<K: RegistryKey>(
    ctx: &InstallContext<'_, K>,
    sink: &dyn DiagnosticSink,
) -> Option<String> {
    let path = || ctx.value_path("ExecutableArguments");
    match read_value(ctx.key, "ExecutableArguments", path) {
        Ok(value) => match value.as_str() {
            Some(args) => Some(args.to_string()),
            None => {
                sink.report(Diagnostic::new(
                    path(),
                    format!("expected a string, found {}", value.type_name()),
                ));
                None
            }
        },
        Err(Resolution::Absent) => None,
        Err(Resolution::Malformed(diagnostic)) => {
            sink.report(diagnostic);
            None
        }
    }
}

/// Resolve the executable and its launch arguments for `tag` under `vendor_key`.
///
/// The `InstallPath` handle is opened and released within this call.
pub fn resolve_executable<K: RegistryKey>(
    vendor_key: &K,
    tag: &str,
    tag_path: &str,
    sink: &dyn DiagnosticSink,
) -> Option<(PathBuf, Option<String>)> {
    let install_key = match vendor_key.open_subkey(&format!("{}\\InstallPath", tag)) {
        Ok(key) => key,
        Err(StoreError::NotFound(_)) => {
            sink.report(Diagnostic::new(format!("{}/InstallPath", tag_path), "missing"));
            return None;
        }
        Err(err) => {
            sink.report(Diagnostic::new(
                format!("{}/InstallPath", tag_path),
                format!("missing ({})", err),
            ));
            return None;
        }
    };
    let ctx = InstallContext {
        tag_path,
        key: &install_key,
    };

    let resolvers: [Resolver<InstallContext<'_, K>, PathBuf>; 2] = [
        |c| exe_from_executable_path(c),
        |c| exe_from_install_dir(c),
    ];
    let Some(exe) = first_success(&ctx, &resolvers, sink) else {
        sink.report(Diagnostic::new(tag_path, "no ExecutablePath or default for it"));
        return None;
    };

    if !exe.exists() {
        sink.report(Diagnostic::new(
            tag_path,
            format!("exe does not exists {}", exe.display()),
        ));
        return None;
    }

    Some((exe, arguments(&ctx, sink)))
}
