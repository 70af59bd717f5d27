//! # hcp2segment
//!
//! Assign healthcare professionals to attitudinal segments from a short
//! gene therapy survey.
//!
//! Answers are validated against a versioned [`FeatureSchema`], encoded into
//! the feature row a multinomial logistic regression was fitted on, and
//! decoded through the class-to-label table shipped with the model. Each
//! categorized submission is appended to a CSV log.
//!
//! ## Features
//! - Typed answer sets with completeness checks before encoding
//! - Indicator or fitted one-hot encoding, driven by the model's schema
//! - Label + per-segment confidence prediction
//! - Model artifacts in MessagePack (`rmp-serde`) or JSON
//! - Append-only CSV store that refuses silent column drift
//!
//! ## Example
//! ```no_run
//! use std::path::Path;
//! use hcp2segment::{AnswerSet, CsvStore, SegmentModel, submit};
//!
//! let model = SegmentModel::load_from_file(Path::new("model.msgpack"))?;
//! let mut store = CsvStore::new("sma_survey_responses.csv");
//! let answers: AnswerSet = toml::from_str(&std::fs::read_to_string("answers.toml")?)?;
//! let submission = submit(&model, &mut store, &answers, chrono::Local::now().naive_local())?;
//! println!("Segment: {}", submission.categorization.label);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod answers;
pub mod config;
pub mod encoder;
pub mod error;
pub mod labels;
pub mod model;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod store;
pub mod submission;

pub use answers::{AnswerSet, PracticingSite, QuestionId, TreatmentDriver, TreatmentDrivers};
pub use config::AppConfig;
pub use encoder::{EncodedFeatureRow, FeatureEncoder};
pub use error::{CategorizeError, ConfigError, ModelLoadError, PersistenceWriteError};
pub use labels::{LabelTable, SegmentLabel, SegmentScores};
pub use model::{Classifier, LogisticRegression, SegmentModel};
pub use pipeline::{Categorization, categorize};
pub use record::{PersistenceRecord, build_record};
pub use schema::{Encoding, FeatureSchema, QuestionSpec};
pub use store::CsvStore;
pub use submission::{Submission, submit};
