//! Append-only CSV log of submissions.

use crate::error::PersistenceWriteError;
use crate::record::PersistenceRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Appends records to a CSV file, writing the header on first use.
///
/// A store is single-writer: `append` takes `&mut self`, which serializes
/// appends made through one value. Pointing several processes at the same
/// file is not supported, since nothing locks it across processes.
#[derive(Debug)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header of the existing file, `None` if the file is missing or empty.
    fn existing_header(&self) -> Result<Option<Vec<String>>, PersistenceWriteError> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() == 0 => return Ok(None),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        let mut first = csv::StringRecord::new();
        if !reader.read_record(&mut first)? {
            return Ok(None);
        }
        Ok(Some(first.iter().map(str::to_string).collect()))
    }

    /// Whether a non-empty file is missing its final line terminator.
    fn lacks_trailing_newline(&self) -> Result<bool, PersistenceWriteError> {
        let mut file = File::open(&self.path)?;
        if file.seek(SeekFrom::End(0))? == 0 {
            return Ok(false);
        }
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] != b'\n')
    }

    /// Appends one record. The first write to a missing or empty file also
    /// writes the header; later writes check the existing header matches.
    pub fn append(&mut self, record: &PersistenceRecord) -> Result<(), PersistenceWriteError> {
        let write_header = match self.existing_header()? {
            None => true,
            Some(found) => {
                if found != record.header() {
                    return Err(PersistenceWriteError::HeaderMismatch {
                        expected: record.header().to_vec(),
                        found,
                    });
                }
                false
            }
        };

        // Build the whole chunk first so it lands with a single write.
        let mut buf = Vec::new();
        if !write_header && self.lacks_trailing_newline()? {
            buf.push(b'\n');
        }
        let mut writer = csv::Writer::from_writer(buf);
        if write_header {
            writer.write_record(record.header())?;
        }
        writer.write_record(record.fields())?;
        let bytes = writer
            .into_inner()
            .map_err(|e| PersistenceWriteError::Io(e.into_error()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&bytes)?;
        file.flush()?;

        log::info!(
            "Saved {} response to {:?}{}",
            record.prediction,
            self.path,
            if write_header { " (new store)" } else { "" }
        );
        Ok(())
    }

    /// All data rows currently in the store, header excluded.
    pub fn rows(&self) -> Result<Vec<csv::StringRecord>, PersistenceWriteError> {
        if self.existing_header()?.is_none() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerSet;
    use crate::labels::{SegmentLabel, SegmentScores};
    use crate::pipeline::Categorization;
    use crate::record::build_record;
    use crate::schema::FeatureSchema;
    use chrono::NaiveDate;

    fn record(npi: &str, schema: &FeatureSchema) -> PersistenceRecord {
        let answers = AnswerSet {
            npi_id: npi.into(),
            first_name: Some("Ada, PhD".into()),
            agreement: Some("I Agree".into()),
            ..AnswerSet::default()
        };
        let result = Categorization {
            label: SegmentLabel::RWESeekers,
            class: 2,
            scores: SegmentScores::from_slots([0.2, 0.2, 0.6]),
        };
        let ts = NaiveDate::from_ymd_opt(2025, 3, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap();
        build_record(&answers, schema, &result, ts)
    }

    #[test]
    fn first_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let schema = FeatureSchema::sma_indicator_v1();
        let mut store = CsvStore::new(dir.path().join("responses.csv"));

        for npi in ["1", "2", "3"] {
            store.append(&record(npi, &schema)).unwrap();
        }

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("Timestamp,")).count(), 1);
        let rows = store.rows().unwrap();
        let npis: Vec<&str> = rows.iter().map(|r| &r[1]).collect();
        assert_eq!(npis, vec!["1", "2", "3"]);
        assert_eq!(&rows[0][2], "Ada, PhD");
    }

    #[test]
    fn empty_file_gets_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.csv");
        std::fs::write(&path, "").unwrap();
        let schema = FeatureSchema::sma_indicator_v1();
        let mut store = CsvStore::new(&path);
        store.append(&record("1", &schema)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Timestamp,NPI_ID,"));
        assert_eq!(store.rows().unwrap().len(), 1);
    }

    #[test]
    fn different_layout_is_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.csv");
        let schema = FeatureSchema::sma_indicator_v1();
        let mut store = CsvStore::new(&path);
        store.append(&record("1", &schema)).unwrap();

        let mut other = schema.clone();
        other.questions.pop();
        let err = store.append(&record("2", &other)).unwrap_err();
        assert!(matches!(err, PersistenceWriteError::HeaderMismatch { .. }));
        assert_eq!(store.rows().unwrap().len(), 1);
    }

    #[test]
    fn row_after_unterminated_last_line_starts_on_its_own_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.csv");
        let schema = FeatureSchema::sma_indicator_v1();
        let mut store = CsvStore::new(&path);
        store.append(&record("1", &schema)).unwrap();

        // Hand-edited files often lose the final newline.
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.trim_end_matches(['\r', '\n'])).unwrap();

        store.append(&record("2", &schema)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        let npis: Vec<String> = store.rows().unwrap().iter().map(|r| r[1].to_string()).collect();
        assert_eq!(npis, vec!["1", "2"]);
    }

    #[test]
    fn unwritable_location_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let schema = FeatureSchema::sma_indicator_v1();
        let mut store = CsvStore::new(dir.path().join("missing").join("responses.csv"));
        assert!(store.append(&record("1", &schema)).is_err());
    }

    #[test]
    fn missing_store_has_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("responses.csv"));
        assert!(store.rows().unwrap().is_empty());
    }
}
