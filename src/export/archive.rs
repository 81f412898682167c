//! ZIP archive of rendered artifacts.
//!
//! PNG data is already compressed, so entries are stored rather than deflated.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;

use super::Artifact;

/// Collapse artifacts sharing a filename: one entry per name, holding the
/// last artifact's bytes at the position of the first occurrence.
pub fn collapse_duplicates(artifacts: &[Artifact]) -> Vec<&Artifact> {
    let mut slots: Vec<&Artifact> = Vec::with_capacity(artifacts.len());
    let mut index_by_name: HashMap<&str, usize> = HashMap::with_capacity(artifacts.len());

    for artifact in artifacts {
        match index_by_name.get(artifact.filename.as_str()) {
            Some(&i) => {
                if let Some(slot) = slots.get_mut(i) {
                    *slot = artifact;
                }
            }
            None => {
                index_by_name.insert(artifact.filename.as_str(), slots.len());
                slots.push(artifact);
            }
        }
    }
    slots
}

/// Write artifacts into a ZIP archive, returning the archive bytes.
pub fn write_archive(artifacts: &[Artifact]) -> Result<Vec<u8>> {
    let entries = collapse_duplicates(artifacts);
    let capacity = entries.iter().map(|a| a.bytes.len() + 128).sum();
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(capacity)));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    for artifact in entries {
        writer.start_file(artifact.filename.as_str(), options)?;
        writer.write_all(&artifact.bytes)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
