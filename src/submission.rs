//! End-to-end handling of one survey submission.

use crate::answers::AnswerSet;
use crate::encoder::FeatureEncoder;
use crate::error::{CategorizeError, PersistenceWriteError};
use crate::model::SegmentModel;
use crate::pipeline::{Categorization, categorize};
use crate::record::{PersistenceRecord, build_record};
use crate::store::CsvStore;
use chrono::NaiveDateTime;

/// A categorized submission. `persisted` carries the store outcome; a failed
/// write never takes the categorization away from the caller.
#[derive(Debug)]
pub struct Submission {
    pub categorization: Categorization,
    pub record: PersistenceRecord,
    pub persisted: Result<(), PersistenceWriteError>,
}

impl Submission {
    pub fn is_persisted(&self) -> bool {
        self.persisted.is_ok()
    }
}

/// Validates, encodes, categorizes and logs one answer set.
///
/// Nothing is written unless categorization succeeds.
pub fn submit(
    model: &SegmentModel,
    store: &mut CsvStore,
    answers: &AnswerSet,
    timestamp: NaiveDateTime,
) -> Result<Submission, CategorizeError> {
    let encoder = FeatureEncoder::new(model.schema());
    let row = encoder.encode(answers)?;
    let categorization = categorize(&row, model, model.labels())?;
    let record = build_record(answers, model.schema(), &categorization, timestamp);

    let persisted = store.append(&record);
    if let Err(e) = &persisted {
        log::warn!("Error saving response for NPI {}: {}", answers.npi_id.trim(), e);
    }

    Ok(Submission {
        categorization,
        record,
        persisted,
    })
}
