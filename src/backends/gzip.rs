//! Gzip compression of finished dumps.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use derive_more::{Display, Error};
use flate2::write::GzEncoder;
use flate2::Compression;

/// Errors while compressing a dump.
#[derive(Debug, Display, Error)]
pub enum CompressionError {
    /// The dump can't be read.
    #[display("unable to read the dump: {_0}")]
    Read(io::Error),
    /// The compressed file can't be written.
    #[display("unable to write the compressed dump: {_0}")]
    Write(io::Error),
    /// The uncompressed dump can't be removed after compression.
    #[display("unable to remove the uncompressed dump: {_0}")]
    RemoveSource(io::Error),
}

/// Path of the compressed counterpart of `source`: `<source>.gz`.
pub fn compressed_path(source: &Path) -> PathBuf {
    let mut path = OsString::from(source.as_os_str());
    path.push(".gz");
    path.into()
}

/// Compresses `source` to `<source>.gz` and removes `source` afterwards.
///
/// Returns the path of the compressed file. On failure the source is kept.
pub fn compress(source: &Path) -> Result<PathBuf, CompressionError> {
    let dest = compressed_path(source);
    log::info!(target: "backend::gzip", "Compress {}", source.display());

    let mut reader = BufReader::new(File::open(source).map_err(CompressionError::Read)?);
    let dest_file = File::create_new(&dest).map_err(CompressionError::Write)?;
    let mut encoder = GzEncoder::new(dest_file, Compression::default());

    let written = io::copy(&mut reader, &mut encoder).and_then(|_| encoder.finish());
    if let Err(e) = written {
        if let Err(e) = fs::remove_file(&dest) {
            log::warn!(target: "backend::gzip", "Removing incomplete {} failed: {e}", dest.display());
        }
        return Err(CompressionError::Write(e));
    }

    fs::remove_file(source).map_err(CompressionError::RemoveSource)?;
    log::info!(target: "backend::gzip", "Compressed dump: {}", dest.display());

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::*;

    #[test]
    fn compresses_and_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("mydatabase_20250101_000000.sql");
        let dump = "CREATE TABLE t (id INT);\n".repeat(100);
        fs::write(&source, &dump).unwrap();

        let dest = compress(&source).unwrap();

        assert_eq!(dest, dir.path().join("mydatabase_20250101_000000.sql.gz"));
        assert!(!source.exists());
        let mut restored = String::new();
        GzDecoder::new(File::open(&dest).unwrap())
            .read_to_string(&mut restored)
            .unwrap();
        assert_eq!(restored, dump);
    }

    #[test]
    fn empty_dump() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty.sql");
        fs::write(&source, "").unwrap();

        let dest = compress(&source).unwrap();

        let mut restored = Vec::new();
        GzDecoder::new(File::open(&dest).unwrap())
            .read_to_end(&mut restored)
            .unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = compress(&dir.path().join("missing.sql")).unwrap_err();
        assert!(matches!(err, CompressionError::Read(_)), "{err}");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
