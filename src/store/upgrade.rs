//! # Header Migration
//!
//! Rewrites a record file whose on-disk header disagrees with the declared
//! schema, preserving instance data for every field present in both.
//!
//! The rewrite streams the old file slot by slot into a sibling file laid out
//! against the new schema:
//!
//! - tombstoned slots are dropped entirely, so the free queue starts empty
//!   after a migration;
//! - for each live slot the options byte is carried over, then every field of
//!   the **new** order is filled either by copying the old payload verbatim
//!   (matched by `(name, length)`, no codec involvement) or with zero bytes
//!   when the field is new;
//! - fields present only in the old header are dropped — the data loss is
//!   explicit and deliberate.
//!
//! The source is deleted and the rewrite renamed into its place; the caller
//! reopens the file afterwards.

use crate::config::{OPTIONS_DELETED, OPTIONS_SIZE};
use crate::error::{Error, Result};
use crate::schema::header::{self, DiskField};
use crate::schema::Schema;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::Path;

/// Per-new-field source: copy this byte range of the old slot, or zero-fill.
fn payload_plan(old_fields: &[DiskField], schema: &Schema) -> Vec<Option<Range<usize>>> {
    let mut old_offsets = Vec::with_capacity(old_fields.len());
    let mut offset = OPTIONS_SIZE;
    for field in old_fields {
        old_offsets.push(offset..offset + field.length);
        offset += field.length;
    }

    schema
        .fields()
        .iter()
        .map(|new_field| {
            old_fields
                .iter()
                .position(|old| old.name == new_field.name() && old.length == new_field.length())
                .map(|idx| old_offsets[idx].clone())
        })
        .collect()
}

pub(crate) fn migrate(path: &Path, old_fields: &[DiskField], schema: &Schema) -> Result<()> {
    let old_header_size = header::size_of(old_fields) as u64;
    let old_slot_size =
        OPTIONS_SIZE + old_fields.iter().map(|f| f.length).sum::<usize>();

    let source_len = fs::metadata(path)?.len();
    if source_len < old_header_size
        || (source_len - old_header_size) % old_slot_size as u64 != 0
    {
        return Err(Error::Corruption(format!(
            "file length {source_len} does not hold a {old_header_size}-byte header plus whole \
             {old_slot_size}-byte slots"
        )));
    }
    let slots = (source_len - old_header_size) / old_slot_size as u64;

    let plan = payload_plan(old_fields, schema);
    let zeros = vec![0u8; schema.fields().iter().map(|f| f.length()).max().unwrap_or(0)];

    let rewrite = {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(crate::config::REWRITE_SUFFIX);
        std::path::PathBuf::from(name)
    };

    let mut kept = 0u64;
    {
        let mut reader = BufReader::new(File::open(path)?);
        reader.seek(SeekFrom::Start(old_header_size))?;
        let mut writer = BufWriter::new(File::create(&rewrite)?);
        writer.write_all(&header::encode(schema.fields()))?;

        let mut old_slot = vec![0u8; old_slot_size];
        for _ in 0..slots {
            reader.read_exact(&mut old_slot)?;
            if old_slot[0] & OPTIONS_DELETED != 0 {
                continue;
            }
            writer.write_all(&old_slot[..OPTIONS_SIZE])?;
            for (field, source) in schema.fields().iter().zip(&plan) {
                match source {
                    Some(range) => writer.write_all(&old_slot[range.clone()])?,
                    None => writer.write_all(&zeros[..field.length()])?,
                }
            }
            kept += 1;
        }
        writer.flush()?;
    }

    fs::remove_file(path)?;
    fs::rename(&rewrite, path)?;
    tracing::debug!(
        type_name = schema.type_name(),
        kept,
        dropped = slots - kept,
        "migrated record file header"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldKind;

    #[test]
    fn plan_matches_by_name_and_length() {
        let old = vec![
            DiskField { name: "a".into(), length: 4 },
            DiskField { name: "b".into(), length: 4 },
        ];
        let schema = Schema::builder("T")
            .field("b", FieldKind::I32)
            .field("c", FieldKind::I32)
            .build()
            .unwrap();

        let plan = payload_plan(&old, &schema);
        assert_eq!(plan, vec![Some(5..9), None]);
    }

    #[test]
    fn plan_rejects_resized_fields() {
        let old = vec![DiskField { name: "a".into(), length: 8 }];
        let schema = Schema::builder("T")
            .field("a", FieldKind::I32)
            .build()
            .unwrap();

        // Same name, different length: treated as a brand new field.
        let plan = payload_plan(&old, &schema);
        assert_eq!(plan, vec![None]);
    }
}
