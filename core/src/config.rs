//! Session setup knobs and the content pack.
//!
//! The content pack is loaded from `data/content/*.json`. The core only
//! relies on each item's id, effects and (for scheduled items) trigger
//! day; the text fields are carried through for display.
//! In tests, use `ContentPack::default_test()`.

use crate::{
    effects::{BillEffect, Effects, PoliticalPatch},
    event_subsystem::{EventCategory, EventRecord},
    news_subsystem::NewsPool,
    prior_auth_subsystem::{DEFAULT_PROVIDER, NO_PROVIDER},
    state::{AcaStatus, FdaStatus},
    types::Day,
};
use serde::{Deserialize, Serialize};

// ── Session setup ──────────────────────────────────────────────────

/// Starting knobs for a new session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub starting_money:    f64,
    pub starting_coverage: f64,
    pub deductible:        f64,
    pub max_oop:           f64,
    pub provider:          String,
    pub plan:              String,
    pub diagnosis:         DiagnosisRoute,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_money:    25_000.0,
            starting_coverage: 80.0,
            deductible:        8_000.0,
            max_oop:           16_000.0,
            provider:          DEFAULT_PROVIDER.into(),
            plan:              "Silver".into(),
            diagnosis:         DiagnosisRoute::Screening,
        }
    }
}

impl SessionConfig {
    /// Take the four money/coverage knobs verbatim from a difficulty preset.
    /// A preset with no coverage has no insurer either.
    pub fn from_difficulty(difficulty: &Difficulty, diagnosis: DiagnosisRoute) -> Self {
        let mut config = Self {
            starting_money:    difficulty.starting_money,
            starting_coverage: difficulty.starting_coverage,
            deductible:        difficulty.deductible,
            max_oop:           difficulty.max_oop,
            diagnosis,
            ..Self::default()
        };
        if config.starting_coverage <= 0.0 {
            config.provider = NO_PROVIDER.into();
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Difficulty {
    pub id:                String,
    pub name:              String,
    pub description:       String,
    pub starting_money:    f64,
    pub starting_coverage: f64,
    pub deductible:        f64,
    pub max_oop:           f64,
}

/// How the cancer was found. Sets the starting health, hope and time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisRoute {
    Screening,
    Symptoms,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub health: f64,
    pub hope:   f64,
    pub time:   f64,
}

impl DiagnosisRoute {
    pub fn baseline(&self) -> Baseline {
        match self {
            Self::Screening => Baseline { health: 80.0, hope: 80.0, time: 400.0 },
            Self::Symptoms  => Baseline { health: 60.0, hope: 65.0, time: 300.0 },
            Self::Emergency => Baseline { health: 40.0, hope: 50.0, time: 180.0 },
        }
    }
}

impl std::str::FromStr for DiagnosisRoute {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "screening" => Ok(Self::Screening),
            "symptoms"  => Ok(Self::Symptoms),
            "emergency" => Ok(Self::Emergency),
            other => Err(anyhow::anyhow!("Unknown diagnosis route: {other}")),
        }
    }
}

// ── Content ────────────────────────────────────────────────────────

/// One entry of the treatment catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentEntry {
    pub name:        String,
    pub cost:        f64,
    pub sessions:    u32,
    pub health_gain: f64,
    /// Hope change per session (negative).
    pub hope_cost:   f64,
    /// Days one session takes.
    pub time_cost:   Day,
}

/// A pool item as authored. Category is assigned by the pool it sits in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventTemplate {
    pub id:          String,
    pub title:       String,
    pub description: String,
    #[serde(default)]
    pub effects:     Effects,
}

impl EventTemplate {
    pub fn to_record(&self, category: EventCategory) -> EventRecord {
        EventRecord {
            id:          self.id.clone(),
            category,
            title:       self.title.clone(),
            description: self.description.clone(),
            effects:     self.effects.clone(),
            trigger_day: None,
        }
    }
}

/// One breaking-news item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    pub id:          String,
    pub headline:    String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effects:     Effects,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewsPools {
    pub executive:   Vec<NewsItem>,
    pub agency:      Vec<NewsItem>,
    pub legislature: Vec<NewsItem>,
}

impl NewsPools {
    pub fn pool(&self, pool: NewsPool) -> &[NewsItem] {
        match pool {
            NewsPool::Executive   => &self.executive,
            NewsPool::Agency      => &self.agency,
            NewsPool::Legislature => &self.legislature,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventsFile {
    denial_reasons:         Vec<String>,
    denial_letter_template: String,
    insurance:              Vec<EventTemplate>,
    political:              Vec<EventTemplate>,
    hospital:               Vec<EventTemplate>,
    financial:              Vec<EventTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
struct TreatmentsFile {
    treatments: Vec<TreatmentEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct DifficultiesFile {
    difficulties: Vec<Difficulty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentPack {
    pub denial_reasons:         Vec<String>,
    pub denial_letter_template: String,
    pub insurance_events:       Vec<EventTemplate>,
    pub political_events:       Vec<EventTemplate>,
    pub hospital_events:        Vec<EventTemplate>,
    pub financial_events:       Vec<EventTemplate>,
    pub news:                   NewsPools,
    pub treatments:             Vec<TreatmentEntry>,
    pub difficulties:           Vec<Difficulty>,
}

impl ContentPack {
    /// Load from the data/ directory.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let events: EventsFile = read_json(&format!("{data_dir}/content/events.json"))?;
        let news: NewsPools = read_json(&format!("{data_dir}/content/news.json"))?;
        let treatments: TreatmentsFile = read_json(&format!("{data_dir}/content/treatments.json"))?;
        let difficulties: DifficultiesFile =
            read_json(&format!("{data_dir}/content/difficulties.json"))?;

        let pack = Self {
            denial_reasons:         events.denial_reasons,
            denial_letter_template: events.denial_letter_template,
            insurance_events:       events.insurance,
            political_events:       events.political,
            hospital_events:        events.hospital,
            financial_events:       events.financial,
            news,
            treatments:             treatments.treatments,
            difficulties:           difficulties.difficulties,
        };
        log::info!(
            "content loaded from {data_dir}: {} treatments, {} event templates, {} news items",
            pack.treatments.len(),
            pack.insurance_events.len()
                + pack.political_events.len()
                + pack.hospital_events.len()
                + pack.financial_events.len(),
            pack.news.executive.len() + pack.news.agency.len() + pack.news.legislature.len(),
        );
        Ok(pack)
    }

    pub fn treatment(&self, name: &str) -> Option<&TreatmentEntry> {
        self.treatments.iter().find(|t| t.name == name)
    }

    pub fn difficulty(&self, id: &str) -> Option<&Difficulty> {
        self.difficulties.iter().find(|d| d.id == id)
    }

    /// Minimal content for tests. Small pools so exhaustion is easy to reach.
    pub fn default_test() -> Self {
        fn template(id: &str, title: &str, effects: Effects) -> EventTemplate {
            EventTemplate {
                id:          id.into(),
                title:       title.into(),
                description: format!("{title} (test)"),
                effects,
            }
        }
        fn news(id: &str, effects: Effects) -> NewsItem {
            NewsItem {
                id:          id.into(),
                headline:    format!("Headline {id}"),
                description: String::new(),
                effects,
            }
        }
        let bill = |description: &str, amount: f64| Effects {
            bill: Some(BillEffect { description: description.into(), amount }),
            ..Effects::default()
        };
        let political = |patch: PoliticalPatch, hope: f64| Effects {
            hope: Some(hope),
            political: Some(patch),
            ..Effects::default()
        };

        Self {
            denial_reasons: vec![
                "Not medically necessary".into(),
                "Alternative treatments have not been exhausted".into(),
                "Documentation incomplete (missing form 47-B)".into(),
            ],
            denial_letter_template:
                "{DATE} {PROVIDER}: your claim for {TREATMENT} was DENIED. Reason: {REASON}. Appeal by {APPEAL_DEADLINE}."
                    .into(),
            insurance_events: vec![
                template("ins_1", "Review Delay", Effects { hope: Some(-15.0), time: Some(-14.0), ..Effects::default() }),
                template("ins_2", "Out-of-Network Surprise", bill("Out-of-network anesthesiologist", 12_400.0)),
                template("ins_3", "Policy Update", Effects { coverage: Some(-20.0), hope: Some(-15.0), ..Effects::default() }),
            ],
            political_events: vec![
                template("pol_1", "Marketplaces Defunded", political(
                    PoliticalPatch { aca_status: Some(AcaStatus::Repealed), ..PoliticalPatch::default() },
                    -20.0,
                )),
                template("pol_2", "Pre-Existing Conditions Loophole", Effects { coverage: Some(-20.0), ..Effects::default() }),
            ],
            hospital_events: vec![
                template("hosp_1", "Appointment Cancelled", Effects { hope: Some(-10.0), time: Some(-21.0), ..Effects::default() }),
                template("hosp_2", "Facility Fee", bill("Hospital facility fee", 3_400.0)),
            ],
            financial_events: vec![
                template("fin_1", "Collections Notice", Effects::hope(-20.0)),
                template("fin_2", "Wage Garnishment", Effects { hope: Some(-25.0), money: Some(-500.0), ..Effects::default() }),
            ],
            news: NewsPools {
                executive: vec![
                    news("exec_1", political(
                        PoliticalPatch { aca_status: Some(AcaStatus::Weakened), ..PoliticalPatch::default() },
                        -10.0,
                    )),
                    news("exec_2", Effects { coverage: Some(-10.0), ..Effects::default() }),
                ],
                agency: vec![
                    news("agency_1", political(
                        PoliticalPatch { fda_status: Some(FdaStatus::Compromised), ..PoliticalPatch::default() },
                        -10.0,
                    )),
                    news("agency_2", Effects::hope(-5.0)),
                ],
                legislature: vec![
                    news("leg_1", political(
                        PoliticalPatch { drug_price_caps: Some(false), ..PoliticalPatch::default() },
                        -15.0,
                    )),
                ],
            },
            treatments: vec![
                TreatmentEntry { name: "Chemotherapy (standard)".into(), cost: 12_000.0, sessions: 6, health_gain: 8.0, hope_cost: -5.0, time_cost: 7 },
                TreatmentEntry { name: "Surgery (tumor removal)".into(), cost: 85_000.0, sessions: 1, health_gain: 25.0, hope_cost: -10.0, time_cost: 30 },
                TreatmentEntry { name: "Radiation therapy".into(), cost: 35_000.0, sessions: 20, health_gain: 6.0, hope_cost: -4.0, time_cost: 28 },
            ],
            difficulties: vec![Difficulty {
                id:                "employed".into(),
                name:              "Employed (Full Benefits)".into(),
                description:       "Employer insurance with decent coverage.".into(),
                starting_money:    35_000.0,
                starting_coverage: 85.0,
                deductible:        6_000.0,
                max_oop:           12_000.0,
            }],
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
}
