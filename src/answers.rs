//! Typed survey answers for one HCP.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the HCP practices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticingSite {
    #[default]
    Hospital,
    Clinic,
    PrivatePractice,
    Other,
}

impl PracticingSite {
    pub const ALL: [PracticingSite; 4] = [
        PracticingSite::Hospital,
        PracticingSite::Clinic,
        PracticingSite::PrivatePractice,
        PracticingSite::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PracticingSite::Hospital => "Hospital",
            PracticingSite::Clinic => "Clinic",
            PracticingSite::PrivatePractice => "Private Practice",
            PracticingSite::Other => "Other",
        }
    }
}

impl fmt::Display for PracticingSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The Q1 multi-select options: rationale for switching to gene therapy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentDriver {
    Efficacy,
    Safety,
    MechanismOfAction,
    DosingConvenience,
}

impl TreatmentDriver {
    pub const ALL: [TreatmentDriver; 4] = [
        TreatmentDriver::Efficacy,
        TreatmentDriver::Safety,
        TreatmentDriver::MechanismOfAction,
        TreatmentDriver::DosingConvenience,
    ];

    /// Option text shown to the respondent.
    pub fn title(self) -> &'static str {
        match self {
            TreatmentDriver::Efficacy => "Efficacy",
            TreatmentDriver::Safety => "Safety",
            TreatmentDriver::MechanismOfAction => "MOA (Mechanism of Action)",
            TreatmentDriver::DosingConvenience => "Dosing Convenience",
        }
    }

    /// Short label written to the response store.
    pub fn short_label(self) -> &'static str {
        match self {
            TreatmentDriver::Efficacy => "Efficacy",
            TreatmentDriver::Safety => "Safety",
            TreatmentDriver::MechanismOfAction => "MOA",
            TreatmentDriver::DosingConvenience => "Dosing",
        }
    }
}

/// Q1 selections. Any number of drivers may be checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatmentDrivers {
    pub efficacy: bool,
    pub safety: bool,
    pub mechanism_of_action: bool,
    pub dosing_convenience: bool,
}

impl TreatmentDrivers {
    pub fn is_selected(&self, driver: TreatmentDriver) -> bool {
        match driver {
            TreatmentDriver::Efficacy => self.efficacy,
            TreatmentDriver::Safety => self.safety,
            TreatmentDriver::MechanismOfAction => self.mechanism_of_action,
            TreatmentDriver::DosingConvenience => self.dosing_convenience,
        }
    }

    pub fn set(&mut self, driver: TreatmentDriver, selected: bool) {
        match driver {
            TreatmentDriver::Efficacy => self.efficacy = selected,
            TreatmentDriver::Safety => self.safety = selected,
            TreatmentDriver::MechanismOfAction => self.mechanism_of_action = selected,
            TreatmentDriver::DosingConvenience => self.dosing_convenience = selected,
        }
    }

    pub fn selected(&self) -> impl Iterator<Item = TreatmentDriver> + '_ {
        TreatmentDriver::ALL
            .into_iter()
            .filter(|d| self.is_selected(*d))
    }
}

/// Single-select questions a schema may ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionId {
    Agreement,
    Satisfaction,
    InstitutionalInfluence,
    KeyBarrier,
    ReferralNeed,
    ExperienceRole,
}

impl QuestionId {
    pub fn key(self) -> &'static str {
        match self {
            QuestionId::Agreement => "agreement",
            QuestionId::Satisfaction => "satisfaction",
            QuestionId::InstitutionalInfluence => "institutional_influence",
            QuestionId::KeyBarrier => "key_barrier",
            QuestionId::ReferralNeed => "referral_need",
            QuestionId::ExperienceRole => "experience_role",
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One respondent's answers, as handed over by the survey front end.
///
/// A single-select answer of `None` or a blank string means "unanswered".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub npi_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub practicing_id: String,
    #[serde(default)]
    pub practicing_site: PracticingSite,
    #[serde(default)]
    pub drivers: TreatmentDrivers,
    #[serde(default)]
    pub agreement: Option<String>,
    #[serde(default)]
    pub satisfaction: Option<String>,
    #[serde(default)]
    pub institutional_influence: Option<String>,
    #[serde(default)]
    pub key_barrier: Option<String>,
    #[serde(default)]
    pub referral_need: Option<String>,
    #[serde(default)]
    pub experience_role: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl AnswerSet {
    /// The trimmed answer to `question`, or `None` when unanswered.
    pub fn single_select(&self, question: QuestionId) -> Option<&str> {
        let value = match question {
            QuestionId::Agreement => self.agreement.as_ref(),
            QuestionId::Satisfaction => self.satisfaction.as_ref(),
            QuestionId::InstitutionalInfluence => self.institutional_influence.as_ref(),
            QuestionId::KeyBarrier => self.key_barrier.as_ref(),
            QuestionId::ReferralNeed => self.referral_need.as_ref(),
            QuestionId::ExperienceRole => self.experience_role.as_ref(),
        };
        non_blank(value)
    }

    pub fn set_single_select(&mut self, question: QuestionId, answer: Option<String>) {
        let slot = match question {
            QuestionId::Agreement => &mut self.agreement,
            QuestionId::Satisfaction => &mut self.satisfaction,
            QuestionId::InstitutionalInfluence => &mut self.institutional_influence,
            QuestionId::KeyBarrier => &mut self.key_barrier,
            QuestionId::ReferralNeed => &mut self.referral_need,
            QuestionId::ExperienceRole => &mut self.experience_role,
        };
        *slot = answer;
    }

    pub fn first_name(&self) -> Option<&str> {
        non_blank(self.first_name.as_ref())
    }

    pub fn last_name(&self) -> Option<&str> {
        non_blank(self.last_name.as_ref())
    }
}
