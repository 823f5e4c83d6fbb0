//! Balloon Pop entry point
//!
//! The native build runs headless: it plays the selected level with the
//! auto-player and records the result, which is handy for balance checks.
//!
//! Usage: `balloon-pop [level] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use balloon_pop::feedback::LogFeedback;
    use balloon_pop::platform;
    use balloon_pop::sim::{AutoPlayer, SessionEvent, Viewport};
    use balloon_pop::{GameHost, Tuning};

    env_logger::init();
    log::info!("Balloon Pop (headless) starting...");

    let mut args = std::env::args().skip(1);
    let requested_level = args.next().and_then(|a| a.parse::<u32>().ok());
    let seed = args
        .next()
        .and_then(|a| a.parse::<u64>().ok())
        .unwrap_or_else(|| platform::now_ms() as u64);

    let tuning = match std::env::var("BALLOON_POP_TUNING") {
        Ok(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning file {}: {}", path, e);
                Tuning::default()
            }
        },
        Err(_) => Tuning::default(),
    };

    // Portrait phone layout: header, stats bar and controls reserved
    let viewport = Viewport::new(390.0, 844.0).with_bands(60.0, 50.0, 80.0);
    let mut host = GameHost::new(platform::default_store(), seed, tuning, viewport);
    if let Some(level) = requested_level {
        if !host.select_level(level) {
            log::warn!(
                "Level {} is locked, playing level {}",
                level,
                host.progression().selected_level()
            );
        }
    }
    if let Err(e) = host.play_selected() {
        log::error!(
            "Could not start level {}: {}",
            host.progression().selected_level(),
            e
        );
        return;
    }

    let mut bot = AutoPlayer::new(0.35);
    let mut sink = LogFeedback;
    let dt = 1.0 / 60.0;
    let outcome = loop {
        host.tick(dt);
        bot.update(host.engine_mut(), dt);

        if let Some(outcome) = host.drain_events(&mut sink).into_iter().find_map(|e| match e {
            SessionEvent::ResultReady(outcome) => Some(outcome),
            _ => None,
        }) {
            break outcome;
        }
    };

    host.apply_outcome();

    println!("Level {}: {}", outcome.level, outcome.message);
    println!(
        "  score {}/{}  popped {} (+{} / -{})  stars {}",
        outcome.score,
        outcome.points_needed,
        outcome.stats.total_popped,
        outcome.stats.positive_popped,
        outcome.stats.negative_popped,
        outcome.stars
    );
    let unlocked: Vec<String> = host
        .progression()
        .unlocked_levels()
        .iter()
        .map(|l| l.to_string())
        .collect();
    println!("  unlocked levels: {}", unlocked.join(", "));
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is `web::init`, exported from the library
}
