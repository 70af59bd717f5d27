//! Shapes a categorized submission into one row of the response store.

use crate::answers::AnswerSet;
use crate::labels::SegmentLabel;
use crate::pipeline::Categorization;
use crate::schema::FeatureSchema;
use chrono::NaiveDateTime;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Columns written before the answer columns.
pub const IDENTITY_COLUMNS: [&str; 6] = [
    "Timestamp",
    "NPI_ID",
    "HCP_First_Name",
    "HCP_Last_Name",
    "HCP_Practicing_ID",
    "HCP_Practicing_Site",
];

pub const PREDICTION_COLUMN: &str = "Prediction";

/// Whether `column` is one the store writes regardless of schema.
pub fn is_fixed_column(column: &str) -> bool {
    IDENTITY_COLUMNS.contains(&column)
        || column == PREDICTION_COLUMN
        || SegmentLabel::ALL.iter().any(|l| l.score_column() == column)
}

/// One persisted submission. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistenceRecord {
    header: Vec<String>,
    fields: Vec<String>,
    pub prediction: SegmentLabel,
}

impl PersistenceRecord {
    /// Column names, in the order the store expects them.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, column: &str) -> Option<&str> {
        self.header
            .iter()
            .position(|h| h == column)
            .map(|i| self.fields[i].as_str())
    }
}

/// Store columns for a schema.
pub fn record_header(schema: &FeatureSchema) -> Vec<String> {
    let mut header: Vec<String> = IDENTITY_COLUMNS.iter().map(|s| s.to_string()).collect();
    header.extend(schema.drivers.iter().map(|d| d.column.clone()));
    header.extend(schema.questions.iter().map(|q| q.column.clone()));
    header.push(PREDICTION_COLUMN.to_string());
    header.extend(SegmentLabel::ALL.iter().map(|l| l.score_column().to_string()));
    header
}

/// Builds the store row for a categorized answer set. Pure.
pub fn build_record(
    answers: &AnswerSet,
    schema: &FeatureSchema,
    result: &Categorization,
    timestamp: NaiveDateTime,
) -> PersistenceRecord {
    let mut fields = vec![
        timestamp.format(TIMESTAMP_FORMAT).to_string(),
        answers.npi_id.trim().to_string(),
        answers.first_name().unwrap_or_default().to_string(),
        answers.last_name().unwrap_or_default().to_string(),
        answers.practicing_id.trim().to_string(),
        answers.practicing_site.label().to_string(),
    ];
    for d in &schema.drivers {
        let value = if answers.drivers.is_selected(d.driver) {
            d.driver.short_label()
        } else {
            ""
        };
        fields.push(value.to_string());
    }
    for q in &schema.questions {
        fields.push(answers.single_select(q.id).unwrap_or_default().to_string());
    }
    fields.push(result.label.display_name().to_string());
    fields.extend(result.scores.iter().map(|(_, score)| format!("{score:.2}")));

    PersistenceRecord {
        header: record_header(schema),
        fields,
        prediction: result.label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::SegmentScores;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 28)
            .and_then(|d| d.and_hms_opt(14, 5, 9))
            .unwrap()
    }

    #[test]
    fn record_lines_up_with_header() {
        let schema = FeatureSchema::sma_indicator_v1();
        let mut answers = AnswerSet {
            npi_id: " 1234567890 ".into(),
            first_name: Some("Ada".into()),
            practicing_id: "H-77".into(),
            agreement: Some("I Agree".into()),
            satisfaction: Some("Neutral".into()),
            key_barrier: Some("MDT collaboration needs to be stronger".into()),
            experience_role: Some("I prescribe and administer Gene therapies".into()),
            ..AnswerSet::default()
        };
        answers.drivers.efficacy = true;
        answers.drivers.dosing_convenience = true;

        let result = Categorization {
            label: SegmentLabel::RiskBalancers,
            class: 1,
            scores: SegmentScores::from_slots([0.104, 0.6951, 0.2009]),
        };
        let record = build_record(&answers, &schema, &result, timestamp());

        assert_eq!(record.header().len(), record.fields().len());
        assert_eq!(record.header().len(), 6 + 4 + 4 + 1 + 3);
        assert_eq!(record.field("Timestamp"), Some("2025-02-28 14:05:09"));
        assert_eq!(record.field("NPI_ID"), Some("1234567890"));
        assert_eq!(record.field("HCP_Last_Name"), Some(""));
        assert_eq!(record.field("HCP_Practicing_Site"), Some("Hospital"));
        assert_eq!(record.field("Q1_1"), Some("Efficacy"));
        assert_eq!(record.field("Q1_2"), Some(""));
        assert_eq!(record.field("Q1_4"), Some("Dosing"));
        assert_eq!(record.field("Q4"), Some("Neutral"));
        assert_eq!(record.field("Prediction"), Some("Risk Balancers"));
        assert_eq!(record.field("GTx_Champions_Score"), Some("0.10"));
        assert_eq!(record.field("Risk_Balancers_Score"), Some("0.70"));
        assert_eq!(record.field("RWE_Seekers_Score"), Some("0.20"));
    }
}
