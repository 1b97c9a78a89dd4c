use clap::Parser;
use embassy_executor::{Executor, Spawner};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::{Duration, Ticker};
use pid_core::utils::{config::ArchetypeConfig, RigConfig};
use static_cell::StaticCell;
use tracing::{error, info};

mod plant;
mod scenario;

use scenario::{Rig, ScenarioOptions, Telemetry};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// JSON rig configuration; overrides --archetype
    #[clap(long)]
    config: Option<std::path::PathBuf>,
    /// stock archetype to run when no config is given
    #[clap(long, default_value = "camera_follow")]
    archetype: String,
    /// number of fixed steps to simulate
    #[clap(long, default_value_t = 500)]
    ticks: usize,
    /// log every n-th tick
    #[clap(long, default_value_t = 25)]
    every: u64,
    /// pace ticks against the wall clock
    #[clap(long)]
    realtime: bool,
    /// emit telemetry as JSON lines instead of log records
    #[clap(long)]
    json: bool,
    /// hide the target from this time (s)...
    #[clap(long, requires = "regain_target")]
    lose_target: Option<f32>,
    /// ...until this time (s)
    #[clap(long, requires = "lose_target")]
    regain_target: Option<f32>,
    /// hover throttle, -1..=1
    #[clap(long, default_value_t = 0.0, allow_negative_numbers = true)]
    throttle: f32,
    /// hover turn input, -1..=1
    #[clap(long, default_value_t = 0.0, allow_negative_numbers = true)]
    turn: f32,
}

enum Event {
    Sample(Telemetry),
    Done,
}

/// Telemetry from the control task to the reporter task.
static TELEMETRY: Channel<CriticalSectionRawMutex, Event, 16> = Channel::new();

fn report(
    t: &Telemetry,
    json: bool,
) {
    if json {
        match serde_json::to_string(t) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("telemetry encoding failed: {e}"),
        }
    } else {
        info!(
            tick = t.tick,
            time = t.time,
            position = ?t.position,
            tilt = t.tilt,
            output = ?t.output,
            goal_distance = ?t.goal_distance,
            active = t.active,
            "tick"
        );
    }
}

#[embassy_executor::task]
async fn control_task(mut rig: Rig, ticks: usize, every: u64) {
    let period = Duration::from_micros((rig.step() * 1_000_000.0) as u64);
    let mut ticker = Ticker::every(period);
    for _ in 0..ticks {
        ticker.next().await;
        let t = rig.tick();
        if t.tick % every == 0 || t.finished {
            TELEMETRY.send(Event::Sample(t)).await;
        }
        if t.finished {
            break;
        }
    }
    TELEMETRY.send(Event::Done).await;
}

#[embassy_executor::task]
async fn report_task(json: bool) {
    loop {
        match TELEMETRY.receive().await {
            Event::Sample(t) => report(&t, json),
            Event::Done => {
                info!("simulation complete");
                std::process::exit(0);
            }
        }
    }
}

fn load_config(opts: &Opts) -> Result<RigConfig, Box<dyn std::error::Error>> {
    match &opts.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(RigConfig::from_json(&text)?)
        }
        None => RigConfig::preset(&opts.archetype).map_err(|e| -> Box<dyn std::error::Error> {
            format!("{e}; expected one of {:?}", ArchetypeConfig::NAMES).into()
        }),
    }
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts: Opts = Opts::parse();
    let config = load_config(&opts)?;
    let options = ScenarioOptions {
        dropout: opts.lose_target.zip(opts.regain_target),
        move_input: opts.throttle,
        turn_input: opts.turn,
    };
    let mut rig = Rig::build(&config, &options)?;
    let every = opts.every.max(1);
    info!(
        archetype = config.archetype.name(),
        step = config.step,
        gains = ?config.archetype.gains(),
        "starting simulation"
    );

    if !opts.realtime {
        for _ in 0..opts.ticks {
            let t = rig.tick();
            if t.tick % every == 0 || t.finished {
                report(&t, opts.json);
            }
            if t.finished {
                break;
            }
        }
        info!("simulation complete");
        return Ok(());
    }

    let (ticks, json) = (opts.ticks, opts.json);
    let executor = EXECUTOR.init(Executor::new());
    executor.run(move |spawner: Spawner| {
        spawner.spawn(report_task(json)).unwrap();
        spawner.spawn(control_task(rig, ticks, every)).unwrap();
    });
}
