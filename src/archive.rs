use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::info;
use zip::write::SimpleFileOptions;

use crate::accumulator::Snapshot;
use crate::error::Result;

/// Name of the exported archive.
pub const ARCHIVE_NAME: &str = "generated-app.zip";

/// Zip every generated file except `status.log`, contents byte-for-byte.
pub fn build_archive(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for file in snapshot.code_files() {
        writer.start_file(file.filename.as_str(), options)?;
        writer.write_all(file.content.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Write the archive into `dir` under the fixed archive name.
pub fn write_archive(snapshot: &Snapshot, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(ARCHIVE_NAME);
    save_archive(snapshot, &path)?;
    Ok(path)
}

/// Write the archive to an explicit file path, e.g. one picked in a save dialog.
pub fn save_archive(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let bytes = build_archive(snapshot)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "exported archive");
    Ok(())
}
