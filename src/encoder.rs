//! Turns answer sets into the numeric feature rows a model was fitted on.

use crate::answers::AnswerSet;
use crate::error::CategorizeError;
use crate::schema::{Encoding, FeatureSchema, QuestionSpec, ValidatedAnswers};
use ndarray::Array1;
use std::sync::Arc;

/// A numeric feature row together with the column names it was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatureRow {
    names: Arc<[String]>,
    values: Array1<f64>,
}

impl EncodedFeatureRow {
    /// Pairs values with column names; the two must have the same length.
    pub fn new(names: Arc<[String]>, values: Array1<f64>) -> Result<Self, CategorizeError> {
        if names.len() != values.len() {
            return Err(CategorizeError::SchemaMismatch(format!(
                "{} values for {} columns",
                values.len(),
                names.len()
            )));
        }
        Ok(EncodedFeatureRow { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named column, if the row has it.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }
}

/// Encoder bound to one schema. Column names are computed once and shared
/// with every row it produces.
#[derive(Debug, Clone)]
pub struct FeatureEncoder<'s> {
    schema: &'s FeatureSchema,
    names: Arc<[String]>,
}

impl<'s> FeatureEncoder<'s> {
    pub fn new(schema: &'s FeatureSchema) -> Self {
        FeatureEncoder {
            schema,
            names: schema.feature_names().into(),
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    /// Validates completeness, then encodes.
    pub fn encode(&self, answers: &AnswerSet) -> Result<EncodedFeatureRow, CategorizeError> {
        let validated = self.schema.validate(answers)?;
        self.encode_validated(validated)
    }

    pub fn encode_validated(
        &self,
        validated: ValidatedAnswers<'_>,
    ) -> Result<EncodedFeatureRow, CategorizeError> {
        let answers = validated.answers();
        let mut values = Vec::with_capacity(self.names.len());

        for d in &self.schema.drivers {
            values.push(if answers.drivers.is_selected(d.driver) { 1.0 } else { 0.0 });
        }

        match &self.schema.encoding {
            Encoding::Indicator => {
                for q in &self.schema.questions {
                    let mut block = vec![0.0; q.options.len()];
                    if let Some(i) = answer_index(q, answers)? {
                        block[i] = 1.0;
                    }
                    values.extend(block);
                }
            }
            Encoding::Categorical { transformer } => {
                for column in &transformer.columns {
                    let q = self
                        .schema
                        .questions
                        .iter()
                        .find(|q| q.column == column.name)
                        .ok_or_else(|| {
                            CategorizeError::SchemaMismatch(format!(
                                "transformer column {} has no question",
                                column.name
                            ))
                        })?;
                    let mut block = vec![0.0; column.categories.len()];
                    // Option membership is checked first so the error names the question.
                    if answer_index(q, answers)?.is_some() {
                        let raw = answers.single_select(q.id).unwrap_or_default();
                        let i = column
                            .categories
                            .iter()
                            .position(|c| c.trim() == raw)
                            .ok_or_else(|| CategorizeError::UnknownCategory {
                                question: q.column.clone(),
                                value: raw.to_string(),
                            })?;
                        block[i] = 1.0;
                    }
                    values.extend(block);
                }
            }
        }

        let row = EncodedFeatureRow::new(self.names.clone(), Array1::from(values))?;
        log::debug!(
            "Encoded answers for NPI {} into {} features ({})",
            answers.npi_id,
            row.len(),
            self.schema.version
        );
        Ok(row)
    }
}

/// Option index for an answered question, `None` when it was left blank.
fn answer_index(q: &QuestionSpec, answers: &AnswerSet) -> Result<Option<usize>, CategorizeError> {
    match answers.single_select(q.id) {
        None => Ok(None),
        Some(raw) => q
            .option_index(raw)
            .map(Some)
            .ok_or_else(|| CategorizeError::UnknownCategory {
                question: q.column.clone(),
                value: raw.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::QuestionId;
    use crate::schema::{CategoryColumn, OneHotTransformer};

    fn answers() -> AnswerSet {
        let mut a = AnswerSet {
            npi_id: "1234567890".into(),
            first_name: Some("Ada".into()),
            agreement: Some(" I Agree".into()),
            satisfaction: Some("Extremely Satisfied".into()),
            key_barrier: Some(
                "No Barriers / Institution is well equipped to administer Gene theapy".into(),
            ),
            experience_role: Some("I prescribe and administer Gene therapies ".into()),
            ..AnswerSet::default()
        };
        a.drivers.efficacy = true;
        a
    }

    #[test]
    fn indicator_encoding_sets_one_column_per_question() {
        let schema = FeatureSchema::sma_indicator_v1();
        let encoder = FeatureEncoder::new(&schema);
        let row = encoder.encode(&answers()).unwrap();

        assert_eq!(row.names(), schema.feature_names().as_slice());
        let expected = [
            1.0, 0.0, 0.0, 0.0, // Q1
            1.0, 0.0, 0.0, // Q2
            1.0, 0.0, 0.0, // Q4
            0.0, 0.0, 0.0, 1.0, // Q5
            1.0, 0.0, 0.0, // Q7
        ];
        assert_eq!(row.values().to_vec(), expected.to_vec());
    }

    #[test]
    fn unchecked_drivers_encode_as_zero() {
        let schema = FeatureSchema::sma_indicator_v1();
        let mut a = answers();
        a.drivers = Default::default();
        let row = FeatureEncoder::new(&schema).encode(&a).unwrap();
        for column in ["Q1_1", "Q1_2", "Q1_3", "Q1_4"] {
            assert_eq!(row.get(column), Some(0.0), "{column}");
        }
    }

    #[test]
    fn unknown_option_is_rejected() {
        let schema = FeatureSchema::sma_indicator_v1();
        let mut a = answers();
        a.agreement = Some("Strongly Agree".into());
        match FeatureEncoder::new(&schema).encode(&a) {
            Err(CategorizeError::UnknownCategory { question, value }) => {
                assert_eq!(question, "Q2");
                assert_eq!(value, "Strongly Agree");
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn incomplete_answers_fail_before_encoding() {
        let schema = FeatureSchema::sma_indicator_v1();
        let mut a = answers();
        a.key_barrier = None;
        // An unknown value elsewhere must not mask the completeness failure.
        a.agreement = Some("Strongly Agree".into());
        assert!(matches!(
            FeatureEncoder::new(&schema).encode(&a),
            Err(CategorizeError::IncompleteInput { .. })
        ));
    }

    #[test]
    fn optional_unanswered_question_encodes_as_zero_block() {
        let mut schema = FeatureSchema::sma_indicator_v1();
        schema.questions[0].required = false;
        let mut a = answers();
        a.agreement = None;
        let row = FeatureEncoder::new(&schema).encode(&a).unwrap();
        assert_eq!(row.get("Q2_0"), Some(0.0));
        assert_eq!(row.get("Q2_1"), Some(0.0));
        assert_eq!(row.get("Q2_2"), Some(0.0));
    }

    /// SMA schema with a fitted transformer: columns reversed, categories sorted.
    fn categorical_schema() -> FeatureSchema {
        let mut schema = FeatureSchema::sma_indicator_v1();
        let columns = schema
            .questions
            .iter()
            .rev()
            .map(|q| {
                let mut categories: Vec<String> =
                    q.options.iter().map(|o| o.trim().to_string()).collect();
                categories.sort();
                CategoryColumn {
                    name: q.column.clone(),
                    categories,
                }
            })
            .collect();
        schema.encoding = Encoding::Categorical {
            transformer: OneHotTransformer { columns },
        };
        schema
    }

    #[test]
    fn categorical_encoding_follows_transformer_order() {
        let schema = categorical_schema();
        schema.check().unwrap();

        let encoder = FeatureEncoder::new(&schema);
        let row = encoder.encode(&answers()).unwrap();
        assert_eq!(row.len(), 17);
        assert_eq!(row.names()[4], "Q7_I need to refer my patients to a colleague at my institution");
        assert_eq!(row.get("Q7_I prescribe and administer Gene therapies"), Some(1.0));
        assert_eq!(row.get("Q2_I Agree"), Some(1.0));
        assert_eq!(row.get("Q2_I Disagree"), Some(0.0));
        assert_eq!(row.values().sum(), 5.0);
        assert!(schema.question(QuestionId::Agreement).is_some());
    }

    #[test]
    fn categorical_encoding_rejects_unlisted_answer() {
        let schema = categorical_schema();
        let mut a = answers();
        a.satisfaction = Some("Somewhat Satisfied".into());
        match FeatureEncoder::new(&schema).encode(&a) {
            Err(CategorizeError::UnknownCategory { question, value }) => {
                assert_eq!(question, "Q4");
                assert_eq!(value, "Somewhat Satisfied");
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn answer_missing_from_transformer_categories_is_rejected() {
        let mut schema = categorical_schema();
        let Encoding::Categorical { transformer } = &mut schema.encoding else {
            unreachable!()
        };
        let q7 = transformer
            .columns
            .iter_mut()
            .find(|c| c.name == "Q7")
            .unwrap();
        q7.categories
            .retain(|c| c != "I prescribe and administer Gene therapies");
        // Such a schema never passes `check`; the encoder still refuses it.
        assert!(schema.check().is_err());

        match FeatureEncoder::new(&schema).encode(&answers()) {
            Err(CategorizeError::UnknownCategory { question, value }) => {
                assert_eq!(question, "Q7");
                assert_eq!(value, "I prescribe and administer Gene therapies");
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }
}
