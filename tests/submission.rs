use approx::assert_abs_diff_eq;
use hcp2segment::{
    AnswerSet, CategorizeError, Classifier, CsvStore, FeatureEncoder, FeatureSchema, LabelTable,
    SegmentLabel, SegmentModel, categorize, submit,
};
use std::path::{Path, PathBuf};

fn demo_model() -> SegmentModel {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/demo_model.json");
    SegmentModel::load_from_file(&path).expect("demo model")
}

fn sample_answers() -> AnswerSet {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample_answers.toml");
    toml::from_str(&std::fs::read_to_string(path).expect("read")).expect("parse")
}

fn timestamp() -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2025, 2, 28)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid date")
}

fn store_in(dir: &tempfile::TempDir) -> (CsvStore, PathBuf) {
    let path = dir.path().join("sma_survey_responses.csv");
    (CsvStore::new(&path), path)
}

#[test]
fn demo_artifact_uses_the_sma_schema() {
    let model = demo_model();
    assert_eq!(model.schema(), &FeatureSchema::sma_indicator_v1());
    assert_eq!(model.labels(), &LabelTable::one_based());
    assert_eq!(model.feature_names(), model.schema().feature_names().as_slice());
}

#[test]
fn sample_submission_is_categorized_and_logged() {
    let model = demo_model();
    let dir = tempfile::tempdir().expect("tmpdir");
    let (mut store, path) = store_in(&dir);

    let submission = submit(&model, &mut store, &sample_answers(), timestamp()).expect("submit");
    assert_eq!(submission.categorization.label, SegmentLabel::GTxChampions);
    assert_eq!(submission.categorization.class, 1);
    assert!(submission.is_persisted());
    assert_abs_diff_eq!(submission.categorization.scores.total(), 1.0, epsilon = 1e-6);

    let text = std::fs::read_to_string(path).expect("read store");
    let mut lines = text.lines();
    assert!(lines.next().expect("header").starts_with("Timestamp,NPI_ID,"));
    let row = lines.next().expect("row");
    assert!(row.starts_with("2025-02-28 12:00:00,1234567890,Ada,Lovelace,H-0042,Hospital,Efficacy,,,,"));
    assert!(row.contains("GTx Champions"));
    assert!(lines.next().is_none());
}

#[test]
fn safety_leaning_answers_land_in_risk_balancers() {
    let model = demo_model();
    let mut answers = sample_answers();
    answers.drivers = Default::default();
    answers.drivers.safety = true;
    answers.agreement = Some("I am Neutral".into());
    answers.satisfaction = Some("Neutral".into());
    answers.key_barrier = Some(
        "Gene Therapy capabilities at site are not good enough (e.g. Financial Barriers, Pre and Post Monitoring Capabilities, Administration)".into(),
    );
    answers.experience_role =
        Some("I need to refer my patients to a colleague at my institution".into());

    let row = FeatureEncoder::new(model.schema()).encode(&answers).expect("encode");
    let result = categorize(&row, &model, model.labels()).expect("categorize");
    assert_eq!(result.label, SegmentLabel::RiskBalancers);
    let best = result
        .scores
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(label, _)| label);
    assert_eq!(best, Some(SegmentLabel::RiskBalancers));
}

#[test]
fn successive_submissions_append_in_order() {
    let model = demo_model();
    let dir = tempfile::tempdir().expect("tmpdir");
    let (mut store, path) = store_in(&dir);

    let npis = ["1000000001", "1000000002", "1000000003", "1000000004"];
    for npi in npis {
        let mut answers = sample_answers();
        answers.npi_id = npi.into();
        submit(&model, &mut store, &answers, timestamp()).expect("submit");
    }

    let text = std::fs::read_to_string(path).expect("read store");
    assert_eq!(text.lines().count(), 1 + npis.len());
    assert_eq!(
        text.lines().filter(|l| l.starts_with("Timestamp,")).count(),
        1
    );
    let rows = store.rows().expect("rows");
    let logged: Vec<&str> = rows.iter().map(|r| &r[1]).collect();
    assert_eq!(logged, npis.to_vec());
}

#[test]
fn unanswered_question_is_rejected_without_writing() {
    let model = demo_model();
    let dir = tempfile::tempdir().expect("tmpdir");
    let (mut store, path) = store_in(&dir);

    let mut answers = sample_answers();
    answers.satisfaction = None;
    let err = submit(&model, &mut store, &answers, timestamp()).unwrap_err();
    assert!(matches!(err, CategorizeError::IncompleteInput { .. }));
    assert!(err.is_recoverable());
    assert!(err.guidance().is_some());
    assert!(!path.exists());
}

#[test]
fn unknown_answer_is_fatal_for_the_submission() {
    let model = demo_model();
    let dir = tempfile::tempdir().expect("tmpdir");
    let (mut store, path) = store_in(&dir);

    let mut answers = sample_answers();
    answers.agreement = Some("Somewhat agree".into());
    let err = submit(&model, &mut store, &answers, timestamp()).unwrap_err();
    assert!(matches!(err, CategorizeError::UnknownCategory { .. }));
    assert!(!err.is_recoverable());
    assert!(!path.exists());
}

#[test]
fn failed_write_still_returns_the_categorization() {
    let model = demo_model();
    let dir = tempfile::tempdir().expect("tmpdir");
    // A directory where the file should be makes the append fail.
    let path = dir.path().join("responses.csv");
    std::fs::create_dir(&path).expect("mkdir");
    let mut store = CsvStore::new(&path);

    let submission = submit(&model, &mut store, &sample_answers(), timestamp()).expect("submit");
    assert_eq!(submission.categorization.label, SegmentLabel::GTxChampions);
    assert!(!submission.is_persisted());
}
