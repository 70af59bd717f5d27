//! Model artifacts: a fitted classifier bundled with its feature schema and
//! label table.

use crate::error::ModelLoadError;
use crate::labels::{LabelTable, SegmentLabel};
use crate::schema::FeatureSchema;
use ndarray::{Array1, Array2, ArrayView1};
use rmp_serde::{decode::from_read, encode::write_named};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// What the pipeline needs from a fitted model.
///
/// Column `i` of [`Classifier::predict_proba`] belongs to `classes()[i]`.
pub trait Classifier {
    fn feature_names(&self) -> &[String];
    fn classes(&self) -> &[i64];
    fn predict(&self, row: ArrayView1<'_, f64>) -> i64;
    fn predict_proba(&self, row: ArrayView1<'_, f64>) -> Array1<f64>;
}

/// Multinomial logistic regression over a fixed feature list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    feature_names: Vec<String>,
    classes: Vec<i64>,
    /// Shape `(classes, features)`.
    coef: Array2<f64>,
    intercept: Array1<f64>,
}

impl LogisticRegression {
    pub fn new(
        feature_names: Vec<String>,
        classes: Vec<i64>,
        coef: Array2<f64>,
        intercept: Array1<f64>,
    ) -> Result<Self, ModelLoadError> {
        let model = LogisticRegression {
            feature_names,
            classes,
            coef,
            intercept,
        };
        model.check().map_err(ModelLoadError::Invalid)?;
        Ok(model)
    }

    pub fn coef(&self) -> &Array2<f64> {
        &self.coef
    }

    fn check(&self) -> Result<(), String> {
        let expected = (self.classes.len(), self.feature_names.len());
        if self.classes.is_empty() || self.feature_names.is_empty() {
            return Err("classifier has no classes or no features".into());
        }
        if self.coef.dim() != expected {
            return Err(format!(
                "coefficient matrix is {:?}, expected {:?}",
                self.coef.dim(),
                expected
            ));
        }
        if self.intercept.len() != self.classes.len() {
            return Err(format!(
                "{} intercepts for {} classes",
                self.intercept.len(),
                self.classes.len()
            ));
        }
        if self.coef.iter().chain(self.intercept.iter()).any(|w| !w.is_finite()) {
            return Err("classifier weights contain non-finite values".into());
        }
        Ok(())
    }

    fn decision_function(&self, row: ArrayView1<'_, f64>) -> Array1<f64> {
        self.coef.dot(&row) + &self.intercept
    }
}

impl Classifier for LogisticRegression {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> i64 {
        let scores = self.decision_function(row);
        let mut best = 0;
        for (i, &s) in scores.iter().enumerate() {
            if s > scores[best] {
                best = i;
            }
        }
        self.classes[best]
    }

    fn predict_proba(&self, row: ArrayView1<'_, f64>) -> Array1<f64> {
        let scores = self.decision_function(row);
        let max = scores.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let exp = scores.mapv(|s| (s - max).exp());
        let total = exp.sum();
        exp / total
    }
}

/// A feature weight reported by [`SegmentModel::top_features`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWeight {
    pub feature: String,
    pub weight: f64,
}

/// Loaded model artifact. Read-only once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentModel {
    schema: FeatureSchema,
    labels: LabelTable,
    classifier: LogisticRegression,
}

impl SegmentModel {
    pub fn new(
        schema: FeatureSchema,
        labels: LabelTable,
        classifier: LogisticRegression,
    ) -> Result<Self, ModelLoadError> {
        let model = SegmentModel {
            schema,
            labels,
            classifier,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Class-to-label table fitted alongside the classifier.
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }

    /// Checks that schema, label table and coefficients belong together.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        self.schema.check().map_err(ModelLoadError::Invalid)?;
        self.labels.check().map_err(ModelLoadError::Invalid)?;
        self.classifier.check().map_err(ModelLoadError::Invalid)?;

        let expected = self.schema.feature_names();
        if expected != self.classifier.feature_names {
            return Err(ModelLoadError::Invalid(format!(
                "schema {} produces {} features {:?}, classifier was fitted on {:?}",
                self.schema.version,
                expected.len(),
                expected,
                self.classifier.feature_names
            )));
        }
        if self.classifier.classes.len() != SegmentLabel::ALL.len() {
            return Err(ModelLoadError::Invalid(format!(
                "classifier has {} classes, expected {}",
                self.classifier.classes.len(),
                SegmentLabel::ALL.len()
            )));
        }
        for &class in &self.classifier.classes {
            if self.labels.decode(class).is_none() {
                return Err(ModelLoadError::Invalid(format!(
                    "class {class} has no entry in the label table"
                )));
            }
        }
        Ok(())
    }

    /// Loads an artifact, MessagePack unless the extension is `.json`.
    pub fn load_from_file(path: &Path) -> Result<Self, ModelLoadError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let model: SegmentModel = if is_json {
            serde_json::from_reader(reader)?
        } else {
            from_read(reader)?
        };
        model.validate()?;
        log::info!(
            "Loaded model {:?} (schema {}, {} features)",
            path,
            model.schema.version,
            model.classifier.feature_names.len()
        );
        Ok(model)
    }

    /// Saves the artifact as MessagePack.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ModelLoadError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_named(&mut writer, self)?;
        writer.flush()?;
        log::info!("Saved model to {:?}", path);
        Ok(())
    }

    /// The `n` features pushing hardest toward each segment.
    pub fn top_features(&self, n: usize) -> Vec<(SegmentLabel, Vec<FeatureWeight>)> {
        let mut report = Vec::new();
        for (row, &class) in self.classifier.classes.iter().enumerate() {
            let Some(label) = self.labels.decode(class) else {
                continue;
            };
            let mut weights: Vec<FeatureWeight> = self
                .classifier
                .feature_names
                .iter()
                .zip(self.classifier.coef.row(row))
                .map(|(feature, &weight)| FeatureWeight {
                    feature: feature.clone(),
                    weight,
                })
                .collect();
            weights.sort_by(|a, b| b.weight.total_cmp(&a.weight));
            weights.truncate(n);
            report.push((label, weights));
        }
        report.sort_by_key(|(label, _)| *label);
        report
    }
}

impl Classifier for SegmentModel {
    fn feature_names(&self) -> &[String] {
        self.classifier.feature_names()
    }

    fn classes(&self) -> &[i64] {
        self.classifier.classes()
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> i64 {
        self.classifier.predict(row)
    }

    fn predict_proba(&self, row: ArrayView1<'_, f64>) -> Array1<f64> {
        self.classifier.predict_proba(row)
    }
}
