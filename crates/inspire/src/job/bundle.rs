//! Packaging of a job's output files for download.

use super::error::DownloadError;
use crate::records::sanitize_file_name;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A file ready to be sent to the client.
#[derive(Debug, Clone)]
pub struct DownloadBundle {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// One file is sent as is; several are zipped with paths relative to the
/// output root (`<State>/<District>.csv`).
pub(super) fn build(
    output_dir: &Path,
    state_name: &str,
    files: &[PathBuf],
) -> Result<DownloadBundle, DownloadError> {
    match files {
        [] => Err(DownloadError::NoOutput),
        [single] => Ok(DownloadBundle {
            file_name: file_name_of(single),
            content_type: "text/csv; charset=utf-8",
            bytes: fs::read(single)?,
        }),
        many => {
            let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
            let options = SimpleFileOptions::default();

            for path in many {
                let entry = path
                    .strip_prefix(output_dir)
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_else(|_| file_name_of(path));
                zip.start_file(entry, options)?;
                zip.write_all(&fs::read(path)?)?;
            }

            let bytes = zip.finish()?.into_inner();
            Ok(DownloadBundle {
                file_name: format!("{}_Data.zip", sanitize_file_name(state_name)),
                content_type: "application/zip",
                bytes,
            })
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.csv".to_string())
}
