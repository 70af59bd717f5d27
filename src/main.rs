mod survey;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hcp2segment::{
    AnswerSet, AppConfig, CategorizeError, Classifier, CsvStore, FeatureSchema, SegmentModel,
    Submission, submit,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use survey::SurveySession;

#[derive(Parser, Debug)]
#[clap(
    name = "hcp2segment",
    version,
    about = "Categorize HCPs into gene therapy attitudinal segments from survey answers."
)]
struct Args {
    /// TOML config file (defaults to hcp2segment.toml when present).
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Model artifact, overrides the config.
    #[clap(long, global = true)]
    model: Option<PathBuf>,

    /// Response store CSV, overrides the config.
    #[clap(long, global = true)]
    store: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the interactive survey.
    Survey,
    /// Categorize one answer set read from a TOML file.
    Categorize {
        #[clap(long)]
        answers: PathBuf,
    },
    /// Validate a JSON model artifact and save it as MessagePack.
    Import { json: PathBuf, out: PathBuf },
    /// Show the features weighing most toward each segment.
    TopFeatures {
        #[clap(short, default_value_t = 10)]
        n: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(model) = args.model {
        config.model_path = model;
    }
    if let Some(store) = args.store {
        config.store_path = store;
    }

    match args.command {
        Command::Import { json, out } => import(&json, &out),
        Command::TopFeatures { n } => {
            let model = load_model(&config.model_path)?;
            show_top_features(&model, n);
            Ok(())
        }
        Command::Categorize { answers } => {
            let model = load_model(&config.model_path)?;
            let mut store = CsvStore::new(&config.store_path);
            let text = fs::read_to_string(&answers)
                .with_context(|| format!("Failed to read answers from {:?}", answers))?;
            let answers: AnswerSet = toml::from_str(&text)
                .with_context(|| format!("Invalid answer file {:?}", answers))?;
            let now = chrono::Local::now().naive_local();
            match submit(&model, &mut store, &answers, now) {
                Ok(submission) => report(&mut io::stdout(), model.schema(), &answers, &submission),
                Err(e) if e.is_recoverable() => {
                    print_guidance(&e);
                    std::process::exit(2);
                }
                Err(e) => Err(e.into()),
            }
        }
        Command::Survey => {
            let model = load_model(&config.model_path)?;
            let mut store = CsvStore::new(&config.store_path);
            run_survey(&model, &mut store)
        }
    }
}

fn load_model(path: &Path) -> Result<SegmentModel> {
    println!("📦 Loading model from {:?}...", path);
    SegmentModel::load_from_file(path)
        .with_context(|| format!("Model file {:?} could not be loaded", path))
}

fn import(json: &Path, out: &Path) -> Result<()> {
    if json.extension().is_none_or(|ext| !ext.eq_ignore_ascii_case("json")) {
        bail!("{:?} is not a .json artifact", json);
    }
    let model = SegmentModel::load_from_file(json)?;
    println!("💾 Saving model to {:?}", out);
    model.save_to_file(out)?;
    Ok(())
}

fn show_top_features(model: &SegmentModel, n: usize) {
    println!(
        "Most influential features (schema {}, {} features):",
        model.schema().version,
        model.feature_names().len()
    );
    for (label, weights) in model.top_features(n) {
        println!("{label}:");
        for w in weights {
            println!("{:>40} | weight: {:>7.3}", w.feature, w.weight);
        }
    }
}

fn print_guidance(e: &CategorizeError) {
    if let Some(guidance) = e.guidance() {
        eprintln!("⚠️  {guidance}");
    }
    eprintln!("{e}");
}

fn report(
    out: &mut impl Write,
    schema: &FeatureSchema,
    answers: &AnswerSet,
    submission: &Submission,
) -> Result<()> {
    survey::print_categorization(out, &submission.categorization)?;
    writeln!(out, "\nResponse summary:")?;
    writeln!(out, "  NPI ID: {}", answers.npi_id.trim())?;
    writeln!(out, "  Q1: {}", survey::selected_drivers(answers))?;
    for q in &schema.questions {
        writeln!(
            out,
            "  {} ({}): {}",
            q.column,
            q.title,
            answers.single_select(q.id).unwrap_or_default()
        )?;
    }
    match &submission.persisted {
        Ok(()) => writeln!(out, "💾 Response saved.")?,
        Err(e) => writeln!(out, "⚠️  Error saving response: {e}")?,
    }
    Ok(())
}

fn run_survey(model: &SegmentModel, store: &mut CsvStore) -> Result<()> {
    let mut session = SurveySession::default();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    session.welcome(&mut out)?;
    loop {
        let Some(answers) = survey::collect_answers(model.schema(), &mut input, &mut out)? else {
            break;
        };
        let now = chrono::Local::now().naive_local();
        match submit(model, store, &answers, now) {
            Ok(submission) => {
                session.submitted += 1;
                report(&mut out, model.schema(), &answers, &submission)?;
            }
            Err(e) if e.is_recoverable() => print_guidance(&e),
            Err(e) => return Err(e.into()),
        }
        writeln!(out)?;
    }
    println!("{} submission(s) this session.", session.submitted);
    Ok(())
}
