//! Versioned description of the feature layout a model was fitted on.
//!
//! A schema names the Q1 driver columns, the single-select questions with their
//! option enumerations, and how those answers become numeric columns. It is
//! shipped inside the model artifact so the encoder can never drift from the
//! coefficients it feeds.

use crate::answers::{AnswerSet, QuestionId, TreatmentDriver};
use crate::error::CategorizeError;
use crate::record::is_fixed_column;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Binds one Q1 driver to its 0/1 feature column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverColumn {
    pub driver: TreatmentDriver,
    pub column: String,
}

fn default_required() -> bool {
    true
}

/// A single-select question and its fixed option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub id: QuestionId,
    /// Column stem used for features and for the response store.
    pub column: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

impl QuestionSpec {
    /// Position of `answer` in the option list, ignoring surrounding whitespace.
    pub fn option_index(&self, answer: &str) -> Option<usize> {
        let answer = answer.trim();
        self.options.iter().position(|o| o.trim() == answer)
    }
}

/// Categories one input column of a fitted one-hot transformer knows, in fit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// A fitted category-to-indicator transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotTransformer {
    pub columns: Vec<CategoryColumn>,
}

impl OneHotTransformer {
    pub fn column(&self, name: &str) -> Option<&CategoryColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// How single-select answers are turned into numeric columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Encoding {
    /// One `{column}_{option_index}` indicator per listed option.
    Indicator,
    /// Raw labels expanded by a fitted transformer into `{column}_{category}`.
    Categorical { transformer: OneHotTransformer },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: String,
    pub drivers: Vec<DriverColumn>,
    pub questions: Vec<QuestionSpec>,
    pub encoding: Encoding,
    #[serde(default)]
    pub require_first_name: bool,
}

/// An answer set that passed the completeness check for a given schema.
///
/// Only [`FeatureSchema::validate`] hands these out, so anything that takes a
/// `ValidatedAnswers` cannot see an incomplete submission.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedAnswers<'a> {
    answers: &'a AnswerSet,
    schema: &'a FeatureSchema,
}

impl<'a> ValidatedAnswers<'a> {
    pub fn answers(&self) -> &'a AnswerSet {
        self.answers
    }

    pub fn schema(&self) -> &'a FeatureSchema {
        self.schema
    }
}

impl FeatureSchema {
    pub fn question(&self, id: QuestionId) -> Option<&QuestionSpec> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Ordered feature column names the model expects.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.iter().map(|d| d.column.clone()).collect();
        match &self.encoding {
            Encoding::Indicator => {
                for q in &self.questions {
                    names.extend((0..q.options.len()).map(|i| format!("{}_{}", q.column, i)));
                }
            }
            Encoding::Categorical { transformer } => {
                for c in &transformer.columns {
                    names.extend(c.categories.iter().map(|cat| format!("{}_{}", c.name, cat)));
                }
            }
        }
        names
    }

    /// Checks that `answers` is complete: NPI present, first name present when
    /// required, and every required question answered.
    pub fn validate<'a>(
        &'a self,
        answers: &'a AnswerSet,
    ) -> Result<ValidatedAnswers<'a>, CategorizeError> {
        let mut missing = Vec::new();
        if answers.npi_id.trim().is_empty() {
            missing.push("NPI ID".to_string());
        }
        if self.require_first_name && answers.first_name().is_none() {
            missing.push("HCP First Name".to_string());
        }
        for q in self.questions.iter().filter(|q| q.required) {
            if answers.single_select(q.id).is_none() {
                missing.push(q.column.clone());
            }
        }

        if missing.is_empty() {
            Ok(ValidatedAnswers {
                answers,
                schema: self,
            })
        } else {
            log::debug!("Rejecting incomplete answer set, missing {missing:?}");
            Err(CategorizeError::IncompleteInput { missing })
        }
    }

    /// Structural checks run when an artifact is loaded.
    pub fn check(&self) -> Result<(), String> {
        if self.drivers.is_empty() {
            return Err("schema lists no driver columns".into());
        }
        if self.questions.is_empty() {
            return Err("schema lists no questions".into());
        }

        let fixed = self
            .drivers
            .iter()
            .map(|d| d.column.as_str())
            .chain(self.questions.iter().map(|q| q.column.as_str()))
            .find(|c| is_fixed_column(c));
        if let Some(column) = fixed {
            return Err(format!("column {column} clashes with a fixed store column"));
        }

        let mut drivers = HashSet::new();
        let mut columns = HashSet::new();
        for d in &self.drivers {
            if !drivers.insert(d.driver) {
                return Err(format!("driver {:?} is listed twice", d.driver));
            }
            if !columns.insert(d.column.as_str()) {
                return Err(format!("column {} is listed twice", d.column));
            }
        }

        let mut ids = HashSet::new();
        for q in &self.questions {
            if !ids.insert(q.id) {
                return Err(format!("question {} is listed twice", q.id));
            }
            if !columns.insert(q.column.as_str()) {
                return Err(format!("column {} is listed twice", q.column));
            }
            if q.options.is_empty() {
                return Err(format!("question {} has no options", q.column));
            }
            let mut seen = HashSet::new();
            for o in &q.options {
                let o = o.trim();
                if o.is_empty() || !seen.insert(o) {
                    return Err(format!("question {} has a blank or repeated option", q.column));
                }
            }
        }

        if let Encoding::Categorical { transformer } = &self.encoding {
            if transformer.columns.len() != self.questions.len() {
                return Err(format!(
                    "transformer expects {} columns but the schema has {} questions",
                    transformer.columns.len(),
                    self.questions.len()
                ));
            }
            for q in &self.questions {
                let column = transformer
                    .column(&q.column)
                    .ok_or_else(|| format!("transformer has no column {}", q.column))?;
                let fitted: HashSet<&str> = column.categories.iter().map(|c| c.trim()).collect();
                let listed: HashSet<&str> = q.options.iter().map(|o| o.trim()).collect();
                if fitted != listed || fitted.len() != column.categories.len() {
                    return Err(format!(
                        "transformer categories for {} do not match the question options",
                        q.column
                    ));
                }
            }
        }

        Ok(())
    }

    /// The questionnaire used by the SMA gene therapy deployment, with
    /// pre-expanded indicator columns.
    pub fn sma_indicator_v1() -> Self {
        let driver = |driver, column: &str| DriverColumn {
            driver,
            column: column.to_string(),
        };
        let question = |id, column: &str, title: &str, prompt: &str, options: &[&str]| QuestionSpec {
            id,
            column: column.to_string(),
            title: title.to_string(),
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            required: true,
        };

        FeatureSchema {
            version: "sma-indicator-v1".to_string(),
            drivers: vec![
                driver(TreatmentDriver::Efficacy, "Q1_1"),
                driver(TreatmentDriver::Safety, "Q1_2"),
                driver(TreatmentDriver::MechanismOfAction, "Q1_3"),
                driver(TreatmentDriver::DosingConvenience, "Q1_4"),
            ],
            questions: vec![
                question(
                    QuestionId::Agreement,
                    "Q2",
                    "Belief in Gene Therapy",
                    "Please state your agreement with \"Gene therapy should be 1st line treatment for my SMA patient\"",
                    &["I Agree", "I am Neutral", "I Disagree"],
                ),
                question(
                    QuestionId::Satisfaction,
                    "Q4",
                    "Current S/E Satisfaction",
                    "Please select the level of satisfaction you have with the Spinraza and Evrysdi for SMA patients > 2 years old",
                    &["Extremely Satisfied", "Neutral", "Dissatisfied"],
                ),
                question(
                    QuestionId::KeyBarrier,
                    "Q5",
                    "Barriers in Prescribing Gene Therapy",
                    "Please select what are the key barriers in prescribing gene therapies in SMA",
                    &[
                        "Lack of experience prescribing Zolgensma",
                        "Gene Therapy capabilities at site are not good enough (e.g. Financial Barriers, Pre and Post Monitoring Capabilities, Administration)",
                        "MDT collaboration needs to be stronger",
                        "No Barriers / Institution is well equipped to administer Gene theapy",
                    ],
                ),
                question(
                    QuestionId::ExperienceRole,
                    "Q7",
                    "Experience with Gene Therapy",
                    "State your primary role while treating SMA patients with Gene Therapies",
                    &[
                        "I prescribe and administer Gene therapies",
                        "I need to refer my patients to a colleague at my institution",
                        "I need to refer my patients to another institution",
                    ],
                ),
            ],
            encoding: Encoding::Indicator,
            require_first_name: true,
        }
    }
}
