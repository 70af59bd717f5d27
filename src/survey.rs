//! Interactive terminal survey.

use anyhow::Result;
use hcp2segment::{
    AnswerSet, Categorization, FeatureSchema, PracticingSite, QuestionSpec, SegmentLabel,
    TreatmentDriver,
};
use std::io::{BufRead, Write};

/// Per-session state of the terminal front end.
#[derive(Debug, Default)]
pub struct SurveySession {
    welcome_shown: bool,
    pub submitted: usize,
}

impl SurveySession {
    /// Prints the welcome text the first time it is called in this session.
    pub fn welcome(&mut self, out: &mut impl Write) -> Result<()> {
        if self.welcome_shown {
            return Ok(());
        }
        self.welcome_shown = true;
        writeln!(out, "🧬 Welcome to the Gene Therapy HCP Typing Tool")?;
        writeln!(
            out,
            "This survey categorizes HCPs by their attitudes and practices around gene therapy prescribing for SMA patients."
        )?;
        for label in SegmentLabel::ALL {
            writeln!(out, "  - {label}")?;
        }
        writeln!(out, "Type 'exit' at the NPI prompt to quit.\n")?;
        Ok(())
    }
}

fn ask(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Reads a 1-based choice; blank means no answer. Re-asks on bad input.
fn ask_choice(
    input: &mut impl BufRead,
    out: &mut impl Write,
    options: &[&str],
) -> Result<Option<Option<usize>>> {
    for (i, option) in options.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, option.trim())?;
    }
    loop {
        let Some(reply) = ask(input, out, "Choice (blank to skip): ")? else {
            return Ok(None);
        };
        if reply.is_empty() {
            return Ok(Some(None));
        }
        match reply.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(Some(n - 1))),
            _ => writeln!(out, "Please enter a number between 1 and {}.", options.len())?,
        }
    }
}

fn ask_question(
    input: &mut impl BufRead,
    out: &mut impl Write,
    number: usize,
    q: &QuestionSpec,
) -> Result<Option<Option<String>>> {
    writeln!(out, "\nQ{number}: {}", q.title)?;
    if !q.prompt.is_empty() {
        writeln!(out, "{}", q.prompt)?;
    }
    let options: Vec<&str> = q.options.iter().map(String::as_str).collect();
    Ok(ask_choice(input, out, &options)?.map(|choice| choice.map(|i| q.options[i].clone())))
}

/// Collects one answer set. `None` when the user types `exit` or input ends.
pub fn collect_answers(
    schema: &FeatureSchema,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<AnswerSet>> {
    let mut answers = AnswerSet::default();

    let Some(npi) = ask(input, out, "NPI ID (or 'exit'): ")? else {
        return Ok(None);
    };
    if npi.eq_ignore_ascii_case("exit") {
        return Ok(None);
    }
    answers.npi_id = npi;

    let mut text = |prompt: &str| -> Result<Option<String>> {
        Ok(ask(&mut *input, &mut *out, prompt)?.filter(|s| !s.is_empty()))
    };
    answers.first_name = text("HCP First Name: ")?;
    answers.last_name = text("HCP Last Name: ")?;
    answers.practicing_id = text("HCP Practicing ID: ")?.unwrap_or_default();

    writeln!(out, "HCP Practicing Site:")?;
    let sites: Vec<&str> = PracticingSite::ALL.iter().map(|s| s.label()).collect();
    let Some(site) = ask_choice(input, out, &sites)? else {
        return Ok(None);
    };
    answers.practicing_site = site.map(|i| PracticingSite::ALL[i]).unwrap_or_default();

    writeln!(
        out,
        "\nQ1: Treatment Drivers\nPrimary rationale for switching to gene therapies (select all that apply):"
    )?;
    for driver in schema.drivers.iter().map(|d| d.driver) {
        let Some(reply) = ask(input, out, &format!("  {} [y/N]: ", driver.title()))? else {
            return Ok(None);
        };
        answers
            .drivers
            .set(driver, matches!(reply.to_ascii_lowercase().as_str(), "y" | "yes"));
    }

    for (i, q) in schema.questions.iter().enumerate() {
        let Some(answer) = ask_question(input, out, i + 2, q)? else {
            return Ok(None);
        };
        answers.set_single_select(q.id, answer);
    }

    Ok(Some(answers))
}

pub fn print_categorization(out: &mut impl Write, result: &Categorization) -> Result<()> {
    writeln!(out, "\n✅ The HCP is categorized as: {}", result.label)?;
    writeln!(out, "Category confidence scores:")?;
    for (label, score) in result.scores.iter() {
        let filled = (score.clamp(0.0, 1.0) * 20.0).round() as usize;
        writeln!(
            out,
            "{:>16}: {:.2} {}{}",
            label.display_name(),
            score,
            "█".repeat(filled),
            "░".repeat(20 - filled)
        )?;
    }
    writeln!(out, "\nWhat this means: {}", result.label.description())?;
    Ok(())
}

/// Driver names for the response summary, e.g. "Efficacy, MOA".
pub fn selected_drivers(answers: &AnswerSet) -> String {
    answers
        .drivers
        .selected()
        .map(TreatmentDriver::short_label)
        .collect::<Vec<_>>()
        .join(", ")
}
