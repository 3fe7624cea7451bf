//! Beam Balance headless runner
//!
//! Plays the rules layer against the in-memory world with a lean-against-tilt
//! autopilot and prints a JSON snapshot every simulated second.
//!
//! Usage: `beam-balance [tuning.json] [--seed N] [--max-seconds N]`. The seed
//! can also come from `BEAM_SEED`.

#[cfg(not(target_arch = "wasm32"))]
#[derive(clap::Parser, Debug)]
#[command(name = "beam-balance")]
#[command(about = "Play Beam Balance headless with an autopilot and print JSON snapshots")]
struct Args {
    /// Tuning file (JSON); missing fields keep their defaults
    tuning: Option<std::path::PathBuf>,
    /// Run seed; defaults to the current time
    #[arg(long, env = "BEAM_SEED")]
    seed: Option<u64>,
    /// Give up after this much simulated time
    #[arg(long, default_value_t = 180)]
    max_seconds: u64,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use beam_balance::Tuning;
    use beam_balance::consts::SIM_HZ;
    use beam_balance::sim::{Game, GameEvent, MemoryWorld};
    use clap::Parser;

    env_logger::init();
    let args = Args::parse();
    log::info!("Beam Balance (headless) starting...");

    let tuning = match &args.tuning {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            log::info!("Loaded tuning from {}", path.display());
            Tuning::from_json(&json)?
        }
        None => Tuning::default(),
    };

    let seed = args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    });

    let mut game = Game::new(MemoryWorld::new(), seed, tuning)?;
    let ticks_per_second = u64::from(SIM_HZ);
    let mut snapshot = game.snapshot();

    for tick in 1..=args.max_seconds * ticks_per_second {
        let input = autopilot::input_for(&snapshot);
        snapshot = game.tick(&input);

        for event in game.drain_events() {
            match event {
                GameEvent::Merged { color, points, .. } => {
                    log::info!("Merge: {:?} +{}", color, points);
                }
                GameEvent::Detonated { affected, .. } => {
                    log::info!("Boom! {} bodies pushed", affected);
                }
                GameEvent::WarningChanged(true) => log::warn!("Beam tilting dangerously"),
                _ => {}
            }
        }

        if tick % ticks_per_second == 0 || snapshot.game_over {
            println!("{}", serde_json::to_string(&snapshot)?);
        }
        if snapshot.game_over {
            break;
        }
    }

    log::info!(
        "Run finished after {:.1}s with score {}",
        snapshot.elapsed_ms / 1000.0,
        snapshot.score
    );
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on the web; the host page drives `sim::Game` directly
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use beam_balance::sim::{Snapshot, TickInput};

    /// Tilt the autopilot ignores (radians)
    const DEADBAND: f32 = 0.05;

    /// Shift the weight against the tilt, like a player would
    pub fn input_for(snapshot: &Snapshot) -> TickInput {
        TickInput {
            left: snapshot.beam_angle > DEADBAND,
            right: snapshot.beam_angle < -DEADBAND,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use beam_balance::Tuning;
        use beam_balance::sim::{Game, MemoryWorld};

        #[test]
        fn test_autopilot_leans_against_tilt() {
            let mut game = Game::new(MemoryWorld::new(), 5, Tuning::default()).unwrap();
            let mut snapshot = game.snapshot();
            snapshot.beam_angle = 0.2;
            assert!(input_for(&snapshot).left);
            snapshot.beam_angle = -0.2;
            assert!(input_for(&snapshot).right);
            snapshot.beam_angle = 0.01;
            assert_eq!(input_for(&snapshot), TickInput::default());
            game.tick(&input_for(&snapshot));
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["beam-balance", "--seed", "9"]).unwrap();
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.max_seconds, 180);
        assert!(args.tuning.is_none());
    }

    #[test]
    fn test_args_tuning_path_and_cap() {
        let args =
            Args::try_parse_from(["beam-balance", "tuning.json", "--max-seconds", "30"]).unwrap();
        assert_eq!(args.tuning.as_deref(), Some(std::path::Path::new("tuning.json")));
        assert_eq!(args.max_seconds, 30);
    }

    #[test]
    fn test_args_reject_bad_seed() {
        assert!(Args::try_parse_from(["beam-balance", "--seed", "abc"]).is_err());
    }
}
