use std::time::Duration;

use anyhow::Result;
use log::info;

use factory_dash::engine::game_loop::GameLoop;
use factory_dash::engine::services::MemoryStore;
use factory_dash::game::progress::Progress;
use factory_dash::game::{GameEvent, Level, LevelConfig, LevelOutcome};

/// Wall-clock cap for the headless demo run
const DEMO_SECONDS: u64 = 30;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting Factory Dash...");

    let mut progress = Progress::new(Box::<MemoryStore>::default());
    let mut level = Level::new(LevelConfig::infinite());
    level.start_infinite(5);

    // Headless demo: drive the fixed-timestep loop until the hero runs
    // into something (nobody is swiping the hazards away)
    let mut game_loop = GameLoop::new();
    'run: loop {
        let steps = game_loop.begin_frame();
        for _ in 0..steps {
            level.tick();
            for event in level.take_events() {
                match event {
                    GameEvent::Won => info!("level won"),
                    GameEvent::Lost { message } => info!("level lost: {message}"),
                    GameEvent::Trigger { goodies, id } => {
                        info!("trigger {id} fired with {goodies} goodies")
                    }
                }
            }
            if level.outcome() != LevelOutcome::Playing {
                break 'run;
            }
        }
        if game_loop.elapsed() > Duration::from_secs(DEMO_SECONDS) {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    let survived = level.clock();
    let distance = level
        .last_hero()
        .and_then(|hero| level.position(hero))
        .map(|p| p.x)
        .unwrap_or(0.0);
    info!("run over: survived {survived:.1}s, distance {distance:.0}");
    if progress.record_score(survived as i64) {
        info!("new high score: {}s", survived as i64);
    }

    Ok(())
}
