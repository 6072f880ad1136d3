//! The simulation engine: one game session, advanced one day at a time.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   0. Day clock + passive decay       (ResourceLedger)
//!   1. Collections sweep + plan year   (BillingLedger, PriorAuthQueue)
//!   2. Prior authorization subsystem
//!   3. Event subsystem
//!   4. News subsystem
//!   5. Ending classification
//!
//! RULES:
//!   - Each subsystem gets its own RNG stream for the day.
//!   - Player commands draw from the Commands slot, salted by command count.
//!   - Every emitted event is recorded in the event log.
//!   - Once the classifier returns a terminal outcome, ticks and commands
//!     are refused.

use crate::{
    command::PlayerCommand,
    config::{ContentPack, SessionConfig},
    clock::Phase,
    ending::{self, Outcome},
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    event_subsystem::{EventRecord, EventSubsystem},
    news_subsystem::NewsSubsystem,
    prior_auth_subsystem::{check_network_status, AppealResult, PriorAuthSubsystem},
    relief::ReliefOutcome,
    resources::Meter,
    rng::{RngBank, SubsystemSlot},
    state::SessionState,
    store::SimStore,
    subsystem::SimSubsystem,
    treatment::TreatmentResult,
    types::{Day, SessionId},
};

/// Length of an insurance plan year in days.
pub const PLAN_YEAR_DAYS: Day = 365;
/// Paperwork cost of filing a prior authorization.
pub const SUBMIT_DAYS: Day = 1;
pub const SUBMIT_HOPE_COST: f64 = -5.0;

pub struct SimEngine {
    pub session_id: SessionId,
    pub state:      SessionState,
    pub rng_bank:   RngBank,
    seed:           u64,
    content:        ContentPack,
    prior_auth:     PriorAuthSubsystem,
    events:         EventSubsystem,
    news:           NewsSubsystem,
    store:          SimStore,
    command_seq:    u64,
}

impl SimEngine {
    /// Start a new session. Records the session row and a
    /// `SessionInitialized` event at day 0.
    pub fn new(
        session_id: SessionId,
        seed:       u64,
        config:     &SessionConfig,
        content:    ContentPack,
        store:      SimStore,
    ) -> SimResult<Self> {
        let engine = Self {
            state:      SessionState::new(config),
            rng_bank:   RngBank::new(seed),
            seed,
            prior_auth: PriorAuthSubsystem::new(content.denial_reasons.clone()),
            events:     EventSubsystem::new(
                content.insurance_events.clone(),
                content.political_events.clone(),
                content.hospital_events.clone(),
                content.financial_events.clone(),
            ),
            news:       NewsSubsystem::new(content.news.clone()),
            content,
            store,
            command_seq: 0,
            session_id,
        };

        engine
            .store
            .insert_session(&engine.session_id, seed, env!("CARGO_PKG_VERSION"))?;
        let init = SimEvent::SessionInitialized {
            session_id: engine.session_id.clone(),
            seed,
        };
        engine.persist(0, "engine", &init)?;
        log::info!(
            "session {} started (seed={seed}, diagnosis={:?}, money=${:.0})",
            engine.session_id,
            config.diagnosis,
            engine.state.resources.money
        );
        Ok(engine)
    }

    /// In-memory engine with the test content pack and default setup.
    pub fn build_test(seed: u64) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            seed,
            &SessionConfig::default(),
            ContentPack::default_test(),
            store,
        )
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn content(&self) -> &ContentPack {
        &self.content
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    /// Current verdict of the ending classifier.
    pub fn outcome(&self) -> Outcome {
        ending::classify(&self.state)
    }

    /// Advance one day. This is the core simulation step.
    pub fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        if self.outcome().is_terminal() {
            return Err(SimError::SessionEnded { day: self.state.day() });
        }

        let day = self.state.advance_day(1);
        let mut day_events = vec![SimEvent::DayStarted { day }];

        let swept = self.state.sweep_collections();
        if !swept.is_empty() {
            day_events.push(SimEvent::BillsSentToCollections { day, bill_ids: swept });
        }

        let plan_year = day / PLAN_YEAR_DAYS;
        if plan_year > self.state.insurance.plan_year {
            self.state.insurance.plan_year = plan_year;
            let previous_met = self.state.reset_deductible();
            log::debug!("day={day} plan year {plan_year} began, deductible reset");
            day_events.push(SimEvent::DeductibleReset { day, previous_met });
        }

        for event in &day_events {
            self.persist(day, "engine", event)?;
        }

        let subsystems: [(SubsystemSlot, &mut dyn SimSubsystem); 3] = [
            (SubsystemSlot::PriorAuth, &mut self.prior_auth),
            (SubsystemSlot::Events, &mut self.events),
            (SubsystemSlot::News, &mut self.news),
        ];
        for (slot, subsystem) in subsystems {
            let mut rng = self.rng_bank.for_subsystem(slot, day);
            let new_events = subsystem.update(day, &mut self.state, &mut rng)?;
            for event in &new_events {
                append(&self.store, &self.session_id, day, subsystem.name(), event)?;
            }
            day_events.extend(new_events);
        }

        let mut closing = vec![SimEvent::DayCompleted { day }];
        closing.extend(self.conclude(day));
        for event in &closing {
            self.persist(day, "engine", event)?;
        }
        day_events.extend(closing);

        Ok(day_events)
    }

    /// Tick until the session ends or `max_days` have passed.
    pub fn run_days(&mut self, max_days: Day) -> SimResult<Outcome> {
        for _ in 0..max_days {
            self.tick()?;
            if self.outcome().is_terminal() {
                break;
            }
        }
        Ok(self.outcome())
    }

    /// Queue a content event to fire on or after `day`.
    pub fn schedule_event(&mut self, event: EventRecord, day: Day) {
        self.events.schedule_event(event, day);
    }

    /// Carry out one player action.
    ///
    /// Actions the rules refuse come back as `CommandRejected` events.
    /// Naming a treatment outside the catalog is an error.
    pub fn apply_command(&mut self, command: PlayerCommand) -> SimResult<Vec<SimEvent>> {
        if self.outcome().is_terminal() {
            return Err(SimError::SessionEnded { day: self.state.day() });
        }

        let mut rng = self.rng_bank.stream(
            SubsystemSlot::Commands,
            self.state.day(),
            self.command_seq,
        );
        self.command_seq += 1;
        let name = command.name();
        let day = self.state.day();

        let mut out = match command {
            PlayerCommand::SubmitPriorAuth { treatment } => {
                let entry = self.catalog_entry(&treatment)?;
                if self.state.insurance.is_pending(&treatment)
                    || self.state.insurance.is_approved(&treatment)
                {
                    vec![rejected(day, name, "request already on file")]
                } else {
                    let request = self.state.submit_prior_auth(&entry);
                    self.state
                        .modify(Meter::Hope, SUBMIT_HOPE_COST, "Prior authorization paperwork");
                    self.state.advance_day(SUBMIT_DAYS);
                    vec![SimEvent::PriorAuthSubmitted {
                        day,
                        request_id: request.id,
                        treatment,
                    }]
                }
            }
            PlayerCommand::AppealDenial { request_id } => {
                match self.state.appeal_denial(request_id) {
                    AppealResult::Filed { request_id, appeal_number } => {
                        vec![SimEvent::AppealFiled { day, request_id, appeal_number }]
                    }
                    AppealResult::NotFound => {
                        vec![rejected(day, name, "no denied request with that id")]
                    }
                    AppealResult::LimitReached { .. } => {
                        vec![rejected(day, name, "appeal limit reached")]
                    }
                }
            }
            PlayerCommand::CheckNetwork { provider } => {
                match check_network_status(&provider, &mut rng) {
                    Some(notice) => {
                        self.state.insurance.network_status = "out-of-network".into();
                        vec![SimEvent::NetworkChanged { day, notice }]
                    }
                    None => vec![],
                }
            }
            PlayerCommand::StartTreatment { treatment, in_network } => {
                let entry = self.catalog_entry(&treatment)?;
                match self.state.start_treatment(&entry, in_network) {
                    TreatmentResult::Administered { patient_cost, .. } => {
                        vec![SimEvent::TreatmentAdministered { day, treatment, patient_cost }]
                    }
                    TreatmentResult::NotAuthorized => {
                        vec![rejected(day, name, "no approved prior authorization")]
                    }
                    TreatmentResult::InsufficientFunds { .. } => {
                        vec![rejected(day, name, "insufficient funds")]
                    }
                }
            }
            PlayerCommand::PayBill { bill_id, amount } => {
                if self.state.pay_bill(bill_id, amount) {
                    vec![SimEvent::BillPaid { day, bill_id, amount }]
                } else {
                    vec![rejected(day, name, "bill not payable")]
                }
            }
            PlayerCommand::StartCrowdfund => {
                relief_events(day, name, self.state.start_crowdfund(&mut rng))
            }
            PlayerCommand::ApplyCharityCare => {
                relief_events(day, name, self.state.apply_charity_care(&mut rng))
            }
            PlayerCommand::SetupPaymentPlan => {
                relief_events(day, name, self.state.setup_payment_plan())
            }
            PlayerCommand::ApplyMedicalCredit => {
                relief_events(day, name, self.state.apply_medical_credit())
            }
            PlayerCommand::FileBankruptcy => {
                relief_events(day, name, self.state.file_bankruptcy())
            }
            PlayerCommand::NegotiateBills => {
                relief_events(day, name, self.state.negotiate_bills(&mut rng))
            }
        };

        if !matches!(out.first(), Some(SimEvent::CommandRejected { .. }) | None) {
            self.enter_phase(command_phase(name));
        }

        // Commands may spend days; report the ending on the day it landed.
        let now = self.state.day();
        out.extend(self.conclude(now));
        for event in &out {
            self.persist(now, "commands", event)?;
        }
        Ok(out)
    }

    /// Write the current state to the save slot.
    pub fn save(&self) -> SimResult<()> {
        self.store.save_session(&self.state)
    }

    /// Replace the current state with the saved one. Returns false, leaving
    /// the state untouched, when there is no readable save.
    pub fn restore(&mut self) -> SimResult<bool> {
        match self.store.load_session()? {
            Some(state) => {
                log::info!("session restored at day {}", state.day());
                self.state = state;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Query events for a specific day from the store.
    /// Used by the determinism test and replay tooling.
    pub fn events_for_day(&self, day: Day) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_day(&self.session_id, day)
    }

    fn catalog_entry(&self, name: &str) -> SimResult<crate::config::TreatmentEntry> {
        self.content
            .treatment(name)
            .cloned()
            .ok_or_else(|| SimError::UnknownTreatment { name: name.to_string() })
    }

    fn enter_phase(&mut self, phase: Phase) {
        let clock = &mut self.state.clock;
        if clock.phase != phase && !clock.is_ended() {
            log::debug!("day={} phase {:?} -> {phase:?}", clock.day, clock.phase);
            clock.phase = phase;
        }
    }

    /// Classify and, if terminal, move to the Ending phase.
    fn conclude(&mut self, day: Day) -> Option<SimEvent> {
        let Outcome::Ended(ending) = self.outcome() else {
            return None;
        };
        self.state.flag_ending(ending);
        log::info!("day={day} session ended: {}", ending.title());
        Some(SimEvent::SessionEnded { day, ending })
    }

    fn persist(&self, day: Day, source: &str, event: &SimEvent) -> SimResult<()> {
        append(&self.store, &self.session_id, day, source, event)
    }
}

fn append(
    store:      &SimStore,
    session_id: &str,
    day:        Day,
    source:     &str,
    event:      &SimEvent,
) -> SimResult<()> {
    let entry = EventLogEntry {
        id:         None,
        session_id: session_id.to_string(),
        day,
        source:     source.to_string(),
        event_type: event.type_name().to_string(),
        payload:    serde_json::to_string(event)?,
    };
    store.append_event(&entry)
}

/// The screen a successful command leaves the player on.
fn command_phase(command: &str) -> Phase {
    match command {
        "submit_prior_auth" | "appeal_denial" | "check_network" => Phase::Insurance,
        "start_treatment" => Phase::Treatment,
        _ => Phase::Financial,
    }
}

fn rejected(day: Day, command: &str, reason: &str) -> SimEvent {
    log::debug!("day={day} {command} rejected: {reason}");
    SimEvent::CommandRejected {
        day,
        command: command.to_string(),
        reason:  reason.to_string(),
    }
}

fn relief_events(day: Day, action: &str, outcome: ReliefOutcome) -> Vec<SimEvent> {
    let amount = match outcome {
        ReliefOutcome::CrowdfundRaised { amount }          => amount,
        ReliefOutcome::CharityCare { reduction, .. }       => reduction,
        ReliefOutcome::PaymentPlan { monthly, .. }         => monthly,
        ReliefOutcome::MedicalCredit { credit }            => credit,
        ReliefOutcome::BankruptcyFiled { debt_discharged } => debt_discharged,
        ReliefOutcome::Negotiated { reduction, .. }        => reduction,
        ReliefOutcome::Unavailable { reason } => return vec![rejected(day, action, reason)],
    };
    vec![SimEvent::ReliefAction {
        day,
        action: action.to_string(),
        amount,
    }]
}
