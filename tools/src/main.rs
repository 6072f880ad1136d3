//! sim-runner: headless session runner.
//!
//! Usage:
//!   sim-runner --seed 12345 --days 365 --db run.db
//!   sim-runner --seed 12345 --difficulty gig --diagnosis emergency
//!   sim-runner --seed 12345 --ipc-mode        (JSON lines on stdin/stdout)

use anyhow::{anyhow, Result};
use priorauth_core::{
    command::PlayerCommand,
    config::{ContentPack, DiagnosisRoute, SessionConfig},
    ending::Outcome,
    engine::SimEngine,
    event::SimEvent,
    store::SimStore,
    treatment::TreatmentKind,
    types::Day,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick { count: Day },
    Command { command: PlayerCommand },
    Save,
    Load,
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    session_id: &'a str,
    day:        Day,
    outcome:    Outcome,
    state:      &'a priorauth_core::state::SessionState,
    events:     Vec<SimEvent>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 365u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = str_arg(&args, "--db", ":memory:");
    let data_dir = str_arg(&args, "--data-dir", "./data");
    let difficulty_id = str_arg(&args, "--difficulty", "employed");
    let diagnosis: DiagnosisRoute = str_arg(&args, "--diagnosis", "screening").parse()?;

    let content = ContentPack::load(data_dir)?;
    let difficulty = content
        .difficulty(difficulty_id)
        .ok_or_else(|| anyhow!("Unknown difficulty: {difficulty_id}"))?;
    let config = SessionConfig::from_difficulty(difficulty, diagnosis);

    if !ipc_mode {
        println!("American Cancer Experience: sim-runner");
        println!("  seed:       {seed}");
        println!("  days:       {days}");
        println!("  db:         {db}");
        println!("  data_dir:   {data_dir}");
        println!("  difficulty: {}", difficulty.name);
        println!("  diagnosis:  {diagnosis:?}");
        println!("  started:    {}", chrono::Utc::now().to_rfc3339());
        println!();
    }

    let store = SimStore::open(db)?;
    store.migrate()?;
    let session_id = uuid::Uuid::new_v4().to_string();
    let mut engine = SimEngine::new(session_id, seed, &config, content, store)?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        run_autopilot(&mut engine, days)?;
        print_summary(&engine)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        let result = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => Ok(Vec::new()),
            IpcCommand::Tick { count } => tick_n(engine, count),
            IpcCommand::Command { command } => engine.apply_command(command),
            IpcCommand::Save => engine.save().map(|_| Vec::new()),
            IpcCommand::Load => engine.restore().and_then(|found| {
                if !found {
                    log::warn!("load requested but no readable save exists");
                }
                Ok(Vec::new())
            }),
        };

        match result {
            Ok(events) => {
                let state = UiState {
                    session_id: &engine.session_id,
                    day:        engine.state.day(),
                    outcome:    engine.outcome(),
                    state:      &engine.state,
                    events,
                };
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            Err(e) => write_error(&mut stdout, &e.to_string())?,
        }
        stdout.flush()?;
    }
    Ok(())
}

fn tick_n(engine: &mut SimEngine, count: Day) -> priorauth_core::error::SimResult<Vec<SimEvent>> {
    let mut events = Vec::new();
    for _ in 0..count {
        events.extend(engine.tick()?);
        if engine.outcome().is_terminal() {
            break;
        }
    }
    Ok(events)
}

fn write_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{err_json}")?;
    stdout.flush()?;
    Ok(())
}

/// Play the session with a fixed, naive policy: file paperwork for
/// chemotherapy and surgery, appeal every denial, take approved treatment
/// when affordable, and reach for relief when the debt piles up.
fn run_autopilot(engine: &mut SimEngine, days: Day) -> Result<()> {
    let plan: Vec<_> = engine
        .content()
        .treatments
        .iter()
        .filter(|t| {
            matches!(
                TreatmentKind::from_name(&t.name),
                Some(TreatmentKind::Chemotherapy | TreatmentKind::Surgery)
            )
        })
        .cloned()
        .collect();

    for _ in 0..days {
        for command in autopilot_commands(engine, &plan) {
            if engine.outcome().is_terminal() {
                break;
            }
            for event in engine.apply_command(command)? {
                if let SimEvent::CommandRejected { command, reason, .. } = &event {
                    log::debug!("autopilot: {command} rejected ({reason})");
                }
            }
        }
        if engine.outcome().is_terminal() {
            break;
        }
        engine.tick()?;
        if engine.outcome().is_terminal() {
            break;
        }
    }
    Ok(())
}

fn autopilot_commands(
    engine: &SimEngine,
    plan:   &[priorauth_core::config::TreatmentEntry],
) -> Vec<PlayerCommand> {
    let state = &engine.state;
    let ins = &state.insurance;
    let mut commands = Vec::new();

    for entry in plan {
        let on_file = ins.all_requests().any(|r| r.treatment == entry.name);
        if !on_file {
            commands.push(PlayerCommand::SubmitPriorAuth { treatment: entry.name.clone() });
            continue;
        }
        if let Some(denied) = ins
            .denied
            .iter()
            .find(|r| r.treatment == entry.name && r.appeals_left() > 0)
        {
            commands.push(PlayerCommand::AppealDenial { request_id: denied.id });
            continue;
        }
        if !ins.is_approved(&entry.name) {
            continue;
        }
        let t = &state.treatment;
        let needed = match TreatmentKind::from_name(&entry.name) {
            Some(TreatmentKind::Chemotherapy) => t.chemo_completed < entry.sessions,
            Some(TreatmentKind::Surgery) => !t.surgery_completed,
            _ => false,
        };
        if needed {
            commands.push(PlayerCommand::StartTreatment {
                treatment:  entry.name.clone(),
                in_network: ins.network_status == "in-network",
            });
        }
    }

    let f = &state.finances;
    if f.total_owed > 0.0 && !f.crowdfund_started {
        commands.push(PlayerCommand::StartCrowdfund);
    }
    if f.in_collections && f.total_owed > 20_000.0 && !f.bankruptcy_filed {
        commands.push(PlayerCommand::FileBankruptcy);
    } else if f.in_collections {
        commands.push(PlayerCommand::NegotiateBills);
    }
    commands
}

fn print_summary(engine: &SimEngine) -> Result<()> {
    let state = &engine.state;
    let r = &state.resources;
    let store = engine.store();
    let sid = &engine.session_id;

    println!("=== SESSION SUMMARY ===");
    println!("  session_id:   {sid}");
    println!("  final day:    {} (week {})", state.day(), state.clock.week);
    match engine.outcome() {
        Outcome::Ended(ending) => println!("  ending:       {}", ending.title()),
        Outcome::Ongoing => println!("  ending:       (still fighting)"),
    }
    println!();
    println!("=== METERS ===");
    println!("  health:       {:.1}", r.health);
    println!("  money:        ${:.0}", r.money);
    println!("  coverage:     {:.1}", r.coverage);
    println!("  hope:         {:.1}", r.hope);
    println!("  time:         {:.0} days", r.time);
    println!();
    println!("=== PAPERWORK ===");
    println!("  submitted:    {}", store.event_count(sid, "prior_auth_submitted")?);
    println!("  approved:     {}", store.event_count(sid, "prior_auth_approved")?);
    println!("  denied:       {}", store.event_count(sid, "prior_auth_denied")?);
    println!("  appeals:      {}", store.event_count(sid, "appeal_filed")?);
    println!("  events:       {}", store.event_count(sid, "event_triggered")?);
    println!("  news:         {}", store.event_count(sid, "breaking_news")?);
    println!();
    println!("=== TREATMENT ===");
    println!("  sessions:     {}", state.treatment.sessions_received());
    println!("  completed:    {}", state.treatment.milestones_complete());
    println!();
    println!("=== BILLS ===");
    println!("  bills:        {}", state.finances.bills.len());
    println!("  owed:         ${:.0}", state.finances.total_owed);
    println!("  collections:  {}", state.finances.in_collections);
    println!("  bankruptcy:   {}", state.finances.bankruptcy_filed);
    println!("  oop spent:    ${:.0}", state.insurance.out_of_pocket_spent);
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str, default: &'a str) -> &'a str {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .unwrap_or(default)
}
