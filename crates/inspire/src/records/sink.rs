use super::ContactRecord;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// UTF-8 byte order mark, so spreadsheet apps pick the right encoding for
/// names in Indian scripts.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header row of every district file.
pub const CSV_HEADER: [&str; 7] = [
    "State",
    "District",
    "School",
    "Contact Name",
    "Mobile Number",
    "Email",
    "Application Number",
];

/// Makes a state or district name safe to use as a path component.
pub fn sanitize_file_name(name: &str) -> String {
    name.trim().replace([' ', '/', '\\'], "_")
}

/// `<root>/<State>/<District>.csv`
pub fn district_file_path(root: &Path, state: &str, district: &str) -> PathBuf {
    root.join(sanitize_file_name(state))
        .join(format!("{}.csv", sanitize_file_name(district)))
}

/// Writes one district's records. Every row is flushed as soon as it is
/// written, so an interrupted run keeps everything appended so far.
///
/// File I/O is blocking and runs on the job task; one small row per school
/// request, which is already rate limited.
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: u64,
}

impl CsvSink {
    /// Creates (or truncates) the district file and writes the BOM and header.
    pub fn create(root: &Path, state: &str, district: &str) -> Result<Self, csv::Error> {
        let path = district_file_path(root, state, district);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&path)?;
        file.write_all(UTF8_BOM)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;

        debug!(path = %path.display(), "Created district file");
        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    /// Appends one record and flushes it to disk.
    pub fn append(&mut self, record: &ContactRecord) -> Result<(), csv::Error> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far, header excluded.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ContactRecord {
        ContactRecord {
            state: "Tamil Nadu".into(),
            district: "Chennai".into(),
            school: "GHSS, Adyar".into(),
            contact_name: name.into(),
            mobile_number: "9000000000".into(),
            email: String::new(),
            application_number: "2024TN001".into(),
        }
    }

    fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let header = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (header, rows)
    }

    #[test]
    fn test_sanitized_layout() {
        let root = Path::new("output");
        assert_eq!(
            district_file_path(root, "Tamil Nadu", "Kanchipuram/Chengalpattu"),
            root.join("Tamil_Nadu").join("Kanchipuram_Chengalpattu.csv")
        );
        assert_eq!(
            district_file_path(root, "Telangana", "Hyderabad"),
            root.join("Telangana").join("Hyderabad.csv")
        );
    }

    #[test]
    fn test_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::create(dir.path(), "Tamil Nadu", "Chennai").unwrap();
        sink.append(&record("A. Kumar")).unwrap();
        sink.append(&record("B. Priya")).unwrap();
        assert_eq!(sink.rows(), 2);

        let (header, rows) = read_rows(sink.path());
        assert_eq!(header, CSV_HEADER);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][2], "GHSS, Adyar");
        assert_eq!(rows[0][3], "A. Kumar");
        assert_eq!(rows[1][3], "B. Priya");
    }

    #[test]
    fn test_file_starts_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::create(dir.path(), "Tamil Nadu", "Chennai").unwrap();
        sink.append(&record("சரவணன்")).unwrap();

        let bytes = fs::read(sink.path()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert!(text.starts_with("State,District,School,"));
        assert_eq!(text.matches('\u{FEFF}').count(), 0);

        let (header, rows) = read_rows(sink.path());
        assert_eq!(header[0], "State");
        assert_eq!(rows[0][3], "சரவணன்");
    }

    #[test]
    fn test_empty_district_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::create(dir.path(), "Goa", "North Goa").unwrap();

        let (header, rows) = read_rows(sink.path());
        assert_eq!(header.len(), 7);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_recreate_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut sink = CsvSink::create(dir.path(), "Goa", "North Goa").unwrap();
            sink.append(&record("Old")).unwrap();
        }
        let mut sink = CsvSink::create(dir.path(), "Goa", "North Goa").unwrap();
        sink.append(&record("New")).unwrap();

        let (_, rows) = read_rows(sink.path());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][3], "New");
    }
}
