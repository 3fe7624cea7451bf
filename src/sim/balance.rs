//! Balance controller
//!
//! Runs once per tick before the physics step. Drives the player base from the
//! latched input, pushes the beam back toward level with a PD torque, and
//! evaluates the warning and game-over tilt thresholds.

use glam::Vec2;

use super::state::{GameEvent, GamePhase, GameState};
use super::tick::TickInput;
use super::world::PhysicsWorld;
use crate::consts::PLAYER_WIDTH;
use crate::tuning::Tuning;

/// Horizontal intent from the latched keys: -1 left, +1 right, 0 idle.
/// Right wins when both are held.
pub fn move_direction(input: &TickInput) -> f32 {
    if input.right {
        1.0
    } else if input.left {
        -1.0
    } else {
        0.0
    }
}

/// PD torque that opposes the current tilt and tilt rate.
///
/// `torque = -(k * angle + b * angular_velocity) * inertia * scale`
pub fn stabilizing_torque(
    tuning: &Tuning,
    angle: f32,
    angular_velocity: f32,
    inertia: f32,
) -> f32 {
    -(tuning.stiffness * angle + tuning.damping * angular_velocity) * inertia * tuning.torque_scale
}

/// Hard-pin the player base: rest height, no rotation, horizontal velocity
/// from input (zero once the game is over). Keeps it inside the viewport.
pub fn pin_player(state: &GameState, world: &mut dyn PhysicsWorld, input: &TickInput) {
    let player = state.rig.player;
    let Some(pos) = world.position(player) else {
        return;
    };
    let tuning = &state.tuning;

    let half = PLAYER_WIDTH / 2.0;
    let (min_x, max_x) = if tuning.viewport_width > PLAYER_WIDTH {
        (half, tuning.viewport_width - half)
    } else {
        let mid = tuning.viewport_width / 2.0;
        (mid, mid)
    };
    let x = pos.x.clamp(min_x, max_x);

    let mut direction = if state.is_game_over() {
        0.0
    } else {
        move_direction(input)
    };
    if (x <= min_x && direction < 0.0) || (x >= max_x && direction > 0.0) {
        direction = 0.0;
    }

    world.set_velocity(player, Vec2::new(direction * tuning.player_speed, 0.0));
    world.set_position(player, Vec2::new(x, tuning.player_rest_y()));
    world.set_angle(player, 0.0);
    world.set_angular_velocity(player, 0.0);
}

/// Queue this tick's stabilizing torque on the beam. Skipped once the game is
/// over so the beam falls freely. Returns the torque applied.
pub fn apply_stabilization(state: &GameState, world: &mut dyn PhysicsWorld) -> Option<f32> {
    if state.is_game_over() {
        return None;
    }
    let beam = state.rig.beam;
    let angle = world.angle(beam)?;
    let angular_velocity = world.angular_velocity(beam)?;
    let inertia = world.inertia(beam)?;
    let torque = stabilizing_torque(&state.tuning, angle, angular_velocity, inertia);
    world.apply_torque(beam, torque);
    Some(torque)
}

/// Update the warning flag from the tilt, queuing an event on change
pub fn update_warning(state: &mut GameState, angle: f32) {
    let warning = angle.abs() > state.tuning.warning_angle();
    if warning != state.warning {
        state.warning = warning;
        state.events.push(GameEvent::WarningChanged(warning));
    }
}

/// Move to `GameOver` if the tilt is past the max angle. Idempotent.
/// Returns true only on the tick the transition happens.
pub fn check_game_over(state: &mut GameState, angle: f32) -> bool {
    if state.is_game_over() || angle.abs() <= state.tuning.max_angle() {
        return false;
    }
    state.phase = GamePhase::GameOver;
    log::info!(
        "Game over: beam tilted {:.1}° after {:.1}s, score {}",
        angle.to_degrees(),
        state.clock_ms / 1000.0,
        state.score.total()
    );
    state.events.push(GameEvent::GameOver {
        score: state.score.total(),
        angle,
    });
    true
}

/// Controller pass in its fixed order: pin, torque, warning, game over.
/// The spawn check that follows lives in the tick driver.
pub fn run_controller(state: &mut GameState, world: &mut dyn PhysicsWorld, input: &TickInput) {
    pin_player(state, world, input);
    apply_stabilization(state, world);

    let angle = world.angle(state.rig.beam).unwrap_or(state.beam_angle);
    state.beam_angle = angle;
    update_warning(state, angle);
    check_game_over(state, angle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MemoryWorld;
    use proptest::prelude::*;

    fn setup() -> (GameState, MemoryWorld) {
        let mut world = MemoryWorld::weightless();
        let state = GameState::new(&mut world, 1, Tuning::default());
        (state, world)
    }

    #[test]
    fn test_right_wins_tie() {
        let both = TickInput {
            left: true,
            right: true,
        };
        assert_eq!(move_direction(&both), 1.0);
        assert_eq!(move_direction(&TickInput::default()), 0.0);
        assert_eq!(
            move_direction(&TickInput {
                left: true,
                right: false
            }),
            -1.0
        );
    }

    #[test]
    fn test_pin_overrides_drift() {
        let (state, mut world) = setup();
        let player = state.rig.player;
        world.set_position(player, Vec2::new(300.0, 100.0));
        world.set_angle(player, 0.4);
        world.set_angular_velocity(player, 2.0);

        let input = TickInput {
            left: true,
            right: false,
        };
        pin_player(&state, &mut world, &input);
        assert_eq!(world.position(player), Some(Vec2::new(300.0, state.tuning.player_rest_y())));
        assert_eq!(world.angle(player), Some(0.0));
        assert_eq!(world.angular_velocity(player), Some(0.0));
        assert_eq!(world.velocity(player), Some(Vec2::new(-300.0, 0.0)));
    }

    #[test]
    fn test_pin_stops_at_viewport_edge() {
        let (state, mut world) = setup();
        let player = state.rig.player;
        world.set_position(player, Vec2::new(2000.0, 0.0));
        let input = TickInput {
            left: false,
            right: true,
        };
        pin_player(&state, &mut world, &input);
        assert_eq!(world.position(player).unwrap().x, 800.0 - PLAYER_WIDTH / 2.0);
        assert_eq!(world.velocity(player), Some(Vec2::ZERO));
    }

    #[test]
    fn test_torque_matches_control_law() {
        let (state, mut world) = setup();
        let beam = state.rig.beam;
        world.set_angle(beam, 0.2);
        world.set_angular_velocity(beam, -0.1);
        let inertia = world.inertia(beam).unwrap();

        let torque = apply_stabilization(&state, &mut world).unwrap();
        let expected = -(0.5 * 0.2 + 0.2 * -0.1) * inertia * 0.1;
        assert!((torque - expected).abs() < 1e-3 * inertia.max(1.0));
        assert_eq!(world.pending_torque(beam), torque);
    }

    #[test]
    fn test_torque_recomputed_each_tick() {
        let (state, mut world) = setup();
        let beam = state.rig.beam;
        world.set_angle(beam, 0.3);
        let first = apply_stabilization(&state, &mut world).unwrap();
        world.step(crate::consts::SIM_DT);
        assert_eq!(world.pending_torque(beam), 0.0);
        let second = apply_stabilization(&state, &mut world).unwrap();
        assert_eq!(world.pending_torque(beam), second);
        assert!(first < 0.0 && second < 0.0);
    }

    #[test]
    fn test_no_torque_after_game_over() {
        let (mut state, mut world) = setup();
        state.phase = GamePhase::GameOver;
        world.set_angle(state.rig.beam, 1.2);
        assert!(apply_stabilization(&state, &mut world).is_none());
        assert_eq!(world.pending_torque(state.rig.beam), 0.0);
    }

    #[test]
    fn test_warning_edges_emit_events() {
        let (mut state, _world) = setup();
        update_warning(&mut state, 0.6);
        update_warning(&mut state, 0.7);
        update_warning(&mut state, -0.1);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::WarningChanged(true), GameEvent::WarningChanged(false)]
        );
    }

    #[test]
    fn test_game_over_transition_is_one_way() {
        let (mut state, mut world) = setup();
        world.set_angle(state.rig.beam, 1.2);
        run_controller(&mut state, &mut world, &TickInput::default());
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.warning);

        world.set_angle(state.rig.beam, 0.0);
        run_controller(&mut state, &mut world, &TickInput::default());
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(!check_game_over(&mut state, 1.5));
        let game_overs = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_input_ignored_after_game_over() {
        let (mut state, mut world) = setup();
        state.phase = GamePhase::GameOver;
        let input = TickInput {
            left: false,
            right: true,
        };
        pin_player(&state, &mut world, &input);
        assert_eq!(world.velocity(state.rig.player), Some(Vec2::ZERO));
    }

    proptest! {
        #[test]
        fn prop_threshold_partition(angle in -3.0f32..3.0) {
            let (mut state, mut world) = setup();
            world.set_angle(state.rig.beam, angle);
            run_controller(&mut state, &mut world, &TickInput::default());
            let warning = 30.0f32.to_radians();
            let max = 60.0f32.to_radians();
            if angle.abs() <= warning {
                prop_assert!(!state.warning);
                prop_assert_eq!(state.phase, GamePhase::Running);
            } else if angle.abs() <= max {
                prop_assert!(state.warning);
                prop_assert_eq!(state.phase, GamePhase::Running);
            } else {
                prop_assert_eq!(state.phase, GamePhase::GameOver);
            }
        }

        #[test]
        fn prop_game_over_sticks(first in 1.1f32..3.0, later in -3.0f32..3.0) {
            let (mut state, mut world) = setup();
            world.set_angle(state.rig.beam, first);
            run_controller(&mut state, &mut world, &TickInput::default());
            world.set_angle(state.rig.beam, later);
            run_controller(&mut state, &mut world, &TickInput::default());
            prop_assert_eq!(state.phase, GamePhase::GameOver);
        }

        #[test]
        fn prop_torque_opposes_error(
            angle in -1.5f32..1.5,
            angular_velocity in -5.0f32..5.0,
            inertia in 0.1f32..1.0e6,
        ) {
            let tuning = Tuning::default();
            let error = tuning.stiffness * angle + tuning.damping * angular_velocity;
            prop_assume!(error.abs() > 1e-6);
            let torque = stabilizing_torque(&tuning, angle, angular_velocity, inertia);
            prop_assert_eq!(torque.signum(), -error.signum());
        }
    }
}
