//! Inference and label decoding for one encoded row.

use crate::encoder::EncodedFeatureRow;
use crate::error::CategorizeError;
use crate::labels::{LabelTable, SegmentLabel, SegmentScores};
use crate::model::Classifier;

/// Outcome of categorizing one row. Label and scores come from the same row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Categorization {
    pub label: SegmentLabel,
    /// Raw class value the model predicted.
    pub class: i64,
    pub scores: SegmentScores,
}

/// Runs `model` on `row` and decodes the result through `labels`.
pub fn categorize<C: Classifier + ?Sized>(
    row: &EncodedFeatureRow,
    model: &C,
    labels: &LabelTable,
) -> Result<Categorization, CategorizeError> {
    let expected = model.feature_names();
    if row.names() != expected || row.len() != expected.len() {
        let detail = match row
            .names()
            .iter()
            .zip(expected)
            .position(|(found, want)| found != want)
        {
            Some(i) => format!(
                "column {i} is {:?}, model expects {:?}",
                row.names()[i],
                expected[i]
            ),
            None => format!(
                "row has {} columns, model expects {}",
                row.len(),
                expected.len()
            ),
        };
        return Err(CategorizeError::SchemaMismatch(detail));
    }

    let values = row.values().view();
    let class = model.predict(values);
    let proba = model.predict_proba(values);

    let label = labels
        .decode(class)
        .ok_or(CategorizeError::UnknownClassIndex(class))?;

    let classes = model.classes();
    if proba.len() != classes.len() || classes.len() != SegmentLabel::ALL.len() {
        return Err(CategorizeError::MalformedScores(format!(
            "{} probabilities for {} classes",
            proba.len(),
            classes.len()
        )));
    }

    let mut slots = [None; 3];
    for (&c, &p) in classes.iter().zip(proba.iter()) {
        let column_label = labels
            .decode(c)
            .ok_or(CategorizeError::UnknownClassIndex(c))?;
        let slot = &mut slots[column_label.slot()];
        if slot.is_some() {
            return Err(CategorizeError::MalformedScores(format!(
                "two probability columns map to {column_label}"
            )));
        }
        *slot = Some(p);
    }
    let [Some(gtx), Some(risk), Some(rwe)] = slots else {
        return Err(CategorizeError::MalformedScores(
            "a segment has no probability column".into(),
        ));
    };

    let scores = SegmentScores::from_slots([gtx, risk, rwe]);
    log::debug!("Predicted class {class} ({label}), scores {scores:?}");
    Ok(Categorization {
        label,
        class,
        scores,
    })
}
