use std::io;

use clap::{Parser, ValueEnum};
use fern::FormatCallback;
use time::format_description::well_known::Iso8601;

use tennis_core::lifecycle::Shot;
use tennis_core::materials::{SurfaceCatalog, SurfaceLoader};
use tennis_core::player::{DefaultsResponder, ReturnShotResponder};
use tennis_core::types::{CourtType, ShotParameters};
use tennis_core::{ConfigError, CourtMode, ShotEvent, ShotEventKind, Simulation, SimulationConfig};

use crate::terminal::TerminalResponder;

mod terminal;

#[derive(Parser)]
#[command(about, long_about = None)]
struct Cli {
    /// Path to a YAML simulation configuration.
    #[arg(long, short, value_name = "PATH")]
    config: Option<String>,

    /// Folder holding `surfaces/*.yaml`. The built-in surfaces are used when absent.
    #[arg(long, short, value_name = "PATH")]
    materials: Option<String>,

    /// Rally on this court (clay, grass, hard, black or a file stem).
    ///
    /// Without it every surface gets the same drop test side by side.
    #[arg(long, short)]
    surface: Option<String>,

    /// Simulated seconds to run.
    #[arg(long, default_value_t = 20.0)]
    seconds: f64,

    /// Seed for net noise and random serves.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Override the served shot as `force,angle,spin`.
    #[arg(long, value_name = "F,A,S", value_parser = parse_serve)]
    serve: Option<ShotParameters>,

    /// Ask for return shots on stdin instead of replaying the default shot.
    #[arg(long, short)]
    interactive: bool,

    /// Set the most verbose level printed.
    #[arg(value_enum, long, short, default_value_t)]
    level: Level,

    /// Set where the printed logging is outputted.
    #[arg(value_enum, long, default_value_t)]
    console_channel: ConsoleChannel,
}

#[derive(Copy, Clone, ValueEnum, Default)]
enum ConsoleChannel {
    /// Print to stdout
    Out,
    /// Print to stderr
    #[default]
    Err,
}

#[derive(Copy, Clone, ValueEnum, Default)]
enum Level {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<Level> for log::LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Error => log::LevelFilter::Error,
            Level::Warn => log::LevelFilter::Warn,
            Level::Info => log::LevelFilter::Info,
            Level::Debug => log::LevelFilter::Debug,
            Level::Trace => log::LevelFilter::Trace,
        }
    }
}

fn parse_serve(s: &str) -> Result<ShotParameters, String> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    match values[..] {
        [force, angle, spin] => Ok(ShotParameters::new(force, angle, spin)),
        _ => Err(format!("expected force,angle,spin but got {} values", values.len())),
    }
}

/// Runs the fixed-step loop for the requested time. All errors are logged, the [`Result`]
/// returned is only given for command-line environments.
fn main() -> Result<(), ()> {
    let cli = Cli::parse();
    setup_logger(cli.level, cli.console_channel)
        .map_err(|e| eprintln!("Error while configuring logging : {e:?}"))?;

    let (config, catalog) = load(&cli).map_err(|e| log::error!("Could not load the configuration : {e}."))?;
    let mode = match cli.surface.as_deref() {
        None => CourtMode::Comparison,
        Some(name) => match CourtType::parse(name) {
            Some(court) => CourtMode::Rally(court),
            None => {
                log::error!("Unknown surface '{name}'.");
                return Err(());
            }
        },
    };

    let mut sim = Simulation::new(config, catalog, cli.seed);
    sim.set_mode(mode);
    match mode {
        CourtMode::Comparison => sim.drop_all(sim.config().drop_height),
        CourtMode::Rally(_) => {
            let serve = cli.serve.unwrap_or(sim.config().default_shot);
            sim.launch(&serve);
        }
    }

    let ticks = (cli.seconds.max(0.0) / sim.config().time_step).ceil() as usize;
    if cli.interactive {
        let stdin = io::stdin();
        let steps = sim.config().shot_steps();
        let mut responder = TerminalResponder::new(stdin.lock(), io::stdout(), steps);
        run(&mut sim, ticks, &mut responder);
    } else {
        run(&mut sim, ticks, &mut DefaultsResponder);
    }
    summarize(&sim);
    Ok(())
}

fn load(cli: &Cli) -> Result<(SimulationConfig, SurfaceCatalog), ConfigError> {
    let config = match &cli.config {
        Some(path) => SimulationConfig::from_yaml_file(path)?,
        None => SimulationConfig::default(),
    };
    let catalog = match &cli.materials {
        Some(path) => SurfaceCatalog::from_loader(&SurfaceLoader::new(path))?,
        None => SurfaceCatalog::standard(),
    };
    Ok((config, catalog))
}

fn run(sim: &mut Simulation, ticks: usize, responder: &mut dyn ReturnShotResponder) {
    let ticks_per_second = (1.0 / sim.config().time_step).round().max(1.0) as usize;
    for tick in 1..=ticks {
        for event in sim.step(responder) {
            log_event(&event);
        }
        if tick % ticks_per_second == 0 {
            for shot in sim.shots() {
                let ball = shot.ball();
                log::debug!(
                    "t={:.2}s {}: pos=({:.2}, {:.2}) vel=({:.2}, {:.2}) {:?}",
                    sim.elapsed(),
                    shot.surface().court.label(),
                    ball.pos.x,
                    ball.pos.y,
                    ball.vel.x,
                    ball.vel.y,
                    shot.phase()
                );
            }
        }
        if matches!(sim.mode(), CourtMode::Comparison) && sim.is_settled() {
            log::info!("All balls settled after {:.2}s.", sim.elapsed());
            break;
        }
    }
}

fn log_event(event: &ShotEvent) {
    let court = event.court.label();
    match event.kind {
        ShotEventKind::NetContact { height } => {
            log::info!("[{court}] t={:.2}s net contact at {height:.2} m", event.time)
        }
        ShotEventKind::Bounce { count, rebound_vy } => log::debug!(
            "[{court}] t={:.2}s bounce #{count}, rebound {rebound_vy:.2} m/s",
            event.time
        ),
        ShotEventKind::PlayerContact(contact) => {
            log::info!("[{court}] t={:.2}s player contact: {contact:?}", event.time)
        }
        ShotEventKind::CameToRest => log::info!("[{court}] t={:.2}s ball at rest", event.time),
        ShotEventKind::WentOutOfBounds => {
            log::info!("[{court}] t={:.2}s ball out of bounds", event.time)
        }
        ShotEventKind::Relaunched(params) => log::info!(
            "[{court}] t={:.2}s new serve {:.0} N {:.0}° {:.0} RPM",
            event.time,
            params.force,
            params.angle,
            params.spin
        ),
    }
}

fn summarize(sim: &Simulation) {
    for shot in sim.shots() {
        log::info!("{}", summary_line(shot));
    }
}

/// One line per shot: surface, outcome, bounce count, peak height and bounce times.
fn summary_line(shot: &Shot) -> String {
    let ball = shot.ball();
    let peak = ball
        .trajectory
        .iter()
        .map(|sample| sample.height)
        .fold(0.0_f64, f64::max);
    let marks = ball
        .bounces
        .iter()
        .map(|sample| format!("{:.2}", sample.time))
        .collect::<Vec<_>>()
        .join(", ");
    let state = match shot.phase().outcome() {
        Some(outcome) => format!("{outcome:?}"),
        None => format!("{:?}", shot.phase()),
    };
    format!(
        "{} (e={}): {}, {} bounces, peak {:.2} m, first bounces at t=[{}]s",
        shot.surface().name,
        shot.surface().restitution,
        state,
        ball.bounce_count,
        peak,
        marks
    )
}

/// Set up the global logger to log to stdout/stderr.
fn setup_logger(level: Level, console_channel: ConsoleChannel) -> Result<(), log::SetLoggerError> {
    let console_config = fern::Dispatch::new()
        .level(level.into())
        .format(format_log);
    let console_config = match console_channel {
        ConsoleChannel::Out => console_config.chain(io::stdout()),
        ConsoleChannel::Err => console_config.chain(io::stderr()),
    };
    console_config.apply()
}

/// The function given to the logging crate [`fern`] to format messages.
fn format_log(out: FormatCallback, message: &std::fmt::Arguments, record: &log::Record) {
    out.finish(format_args!(
        "[{} {} {}] {}",
        utc_now_wrapper(),
        record.level(),
        &record
            .target()
            .chars()
            .take_while(|&c| c != ':')
            .collect::<String>(),
        message
    ))
}

/// Create a [`String`] of the current time in the UTC timezone, with a default in case of error.
fn utc_now_wrapper() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Iso8601::DATE_TIME)
        .unwrap_or(String::from("invalid date"))
}
