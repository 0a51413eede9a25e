//! Silabario entry point
//!
//! Native builds run a headless demonstration: autoplay feeds the
//! fixed-rate loop until the summary, narration goes to the log, and the
//! final session snapshot is printed as JSON.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use silabario::Settings;
use silabario::consts::*;
use silabario::platform::ElapsedClock;
use silabario::sim::{GameSession, InputEvent, KeyCommand, Notifier, SessionPhase};
use silabario::speech::{LogNarrator, SpeechService};

/// Idle autoplay ticks tolerated beyond the longest scripted pause
const STALL_GRACE_TICKS: u32 = 5 * 60;

fn main() {
    env_logger::init();
    log::info!("Silabario (native) starting...");

    let settings = Settings::load();
    let seed = settings.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    log::info!(
        "Difficulty {}, seed {}",
        settings.difficulty.as_str(),
        seed
    );

    let mut clock = ElapsedClock::start(Duration::from_millis(settings.clock_period_ms));
    let mut speech = SpeechService::start(LogNarrator, settings.speech_queue_capacity);
    let mut notifier = Notifier::new();
    notifier.subscribe(Box::new(speech.handle()));

    let stall_limit =
        settings.reveal_ticks.max(settings.error_display_ticks) + STALL_GRACE_TICKS;
    let mut session = match GameSession::new(settings, seed, notifier, clock.reader()) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Invalid settings: {}", e);
            std::process::exit(1);
        }
    };

    // Fixed-rate loop: accumulate wall time, step the sim in SIM_DT slices
    let frame = Duration::from_secs_f32(SIM_DT);
    let mut accumulator = 0.0f32;
    let mut last = Instant::now();
    while session.phase() == SessionPhase::Playing {
        let now = Instant::now();
        let dt = (now - last).as_secs_f32().min(0.1);
        last = now;
        accumulator += dt;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            session.autoplay_tick(SIM_DT, stall_limit);
            accumulator -= SIM_DT;
            substeps += 1;
        }

        if let Some(elapsed) = frame.checked_sub(now.elapsed()) {
            std::thread::sleep(elapsed);
        }
    }

    let view = session.view();
    match serde_json::to_string_pretty(&view) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize session view: {}", e),
    }
    println!(
        "Score: {}  Time: {}",
        session.score(),
        session.elapsed_label()
    );

    session.tick(&[InputEvent::Key(KeyCommand::Quit)], SIM_DT);
    speech.stop();
    clock.stop();
}
