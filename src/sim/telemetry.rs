//! Read-only view of the game for renderers and UI
//!
//! Nothing here feeds back into the simulation.

use serde::{Deserialize, Serialize};

use super::state::{GamePhase, GameState, Label};

/// Per-tick state exposed to the rendering/UI collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Signed beam tilt in radians, 0 = level
    pub beam_angle: f32,
    /// Show the tilt warning overlay
    pub warning: bool,
    /// Show the game-over screen and offer restart
    pub game_over: bool,
    pub score: f64,
    pub phase: GamePhase,
    pub elapsed_ms: f64,
    pub blocks: usize,
    pub bombs: usize,
    pub spawn_interval_ms: f64,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        Self {
            beam_angle: state.beam_angle,
            warning: state.warning,
            game_over: state.is_game_over(),
            score: state.score.total(),
            phase: state.phase,
            elapsed_ms: state.clock_ms,
            blocks: state.registry.count(Label::Block),
            bombs: state.registry.count(Label::Bomb),
            spawn_interval_ms: state.spawn.interval_ms,
        }
    }

    pub fn beam_angle_deg(&self) -> f32 {
        self.beam_angle.to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MemoryWorld;
    use crate::tuning::Tuning;

    #[test]
    fn test_capture_reflects_state() {
        let mut world = MemoryWorld::new();
        let mut state = GameState::new(&mut world, 3, Tuning::default());
        state.beam_angle = 0.6;
        state.warning = true;
        state.score.credit(250.0);

        let snapshot = Snapshot::capture(&state);
        assert_eq!(snapshot.beam_angle, 0.6);
        assert!(snapshot.warning);
        assert!(!snapshot.game_over);
        assert_eq!(snapshot.score, 250.0);
        assert_eq!(snapshot.blocks, 0);
        assert!((snapshot.beam_angle_deg() - 34.377).abs() < 1e-2);
    }

    #[test]
    fn test_snapshot_serializes_for_ui() {
        let mut world = MemoryWorld::new();
        let mut state = GameState::new(&mut world, 3, Tuning::default());
        state.phase = GamePhase::GameOver;
        let json = serde_json::to_string(&Snapshot::capture(&state)).unwrap();
        assert!(json.contains("\"game_over\":true"));
        assert!(json.contains("\"phase\":\"GameOver\""));
    }
}
