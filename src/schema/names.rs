//! # Record File Naming
//!
//! Each record type maps to `<database_dir>/<snake_case(type_name)>.dbobj`.
//! The snake-case transform lowercases the first letter, inserts `_` before
//! an uppercase letter that starts or ends a run of uppercase letters, and
//! collapses the run itself; whitespace and `.` are stripped so the result is
//! always a single path component.

use crate::config::FILE_EXTENSION;
use std::path::{Path, PathBuf};

/// File stem for a record type name: `"PersonData"` becomes `"person_data"`,
/// `"IOBuffer"` becomes `"io_buffer"`.
pub fn type_file_stem(type_name: &str) -> String {
    let chars: Vec<char> = type_name
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect();

    let mut stem = String::with_capacity(chars.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            let next_lower = chars
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_lowercase());
            // Underscore at the start of a run, and again where a run hands
            // over to a lowercase tail (HTTPServer -> http_server).
            if i > 0 && (!prev_upper || next_lower) {
                stem.push('_');
            }
            stem.push(c.to_ascii_lowercase());
        } else {
            stem.push(c);
        }
    }
    stem
}

/// Full path of the record file backing `type_name` under `dir`.
pub fn record_file_path(dir: &Path, type_name: &str) -> PathBuf {
    dir.join(format!("{}.{}", type_file_stem(type_name), FILE_EXTENSION))
}
