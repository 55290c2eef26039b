//! Optional removal of interpreters seen through more than one registry view

use crate::record::InterpreterRecord;
use ahash::AHashSet;
use std::path::PathBuf;

/// Drop records whose executable path was already produced; the first one wins.
///
/// Paths compare exactly as stored, so `C:\Py\python.exe` and
/// `c:\py\python.exe` are kept as two records.
pub fn dedupe_by_executable<I>(records: I) -> impl Iterator<Item = InterpreterRecord>
where
    I: IntoIterator<Item = InterpreterRecord>,
{
    let mut seen: AHashSet<PathBuf> = AHashSet::new();
    records
        .into_iter()
        .filter(move |record| seen.insert(record.executable().to_path_buf()))
}
