//! JSON output files.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{Result, SheetlintError};

/// Write a value as pretty JSON with a 4-space indent and a trailing newline.
///
/// Keys come out sorted as long as the value is built from ordered maps,
/// which every output type in this crate is.
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| SheetlintError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let file = File::create(path).map_err(|e| SheetlintError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut writer = BufWriter::new(file);
    let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;

    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| SheetlintError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Render a value the same way [`write_json`] does, without the newline.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| SheetlintError::Config(format!("non UTF-8 JSON output: {}", e)))
}
