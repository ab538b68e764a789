//! Per-frame simulation tick
//!
//! Advances every ball present at the start of the tick exactly once. The
//! next collection is built as "survivors + offspring" instead of mutating
//! the live one mid-pass.

use super::state::{SimState, TickReport};
use crate::audio::NoteTrigger;
use crate::consts::*;
use crate::settings::RuleConfig;

/// Advance the simulation by one tick
pub fn tick(state: &mut SimState, config: &RuleConfig, notes: &mut dyn NoteTrigger) -> TickReport {
    state.time_ticks += 1;

    if config.rotate {
        state.arena.rotate(ROTATION_STEP);
    }

    let repulsion = config.effective_repulsion();
    let reactions = state.policy.reactions(config);

    let mut report = TickReport::default();
    let current = std::mem::take(&mut state.balls);
    let had_balls = !current.is_empty();
    let mut next = Vec::with_capacity(current.len());
    let mut offspring = Vec::new();

    for mut ball in current {
        ball.advance(GRAVITY);

        if state.policy.resolve(&mut ball, &state.arena, repulsion) {
            report.collisions += 1;

            let note = state.note.current();
            ball.note = note;
            notes.play_note(note);

            reactions.apply(&mut ball, note, &mut state.rng, &mut offspring);

            // Once per colliding ball, not per reaction
            state.note.advance(config.note_mode);
        }

        if ball.has_exited(state.arena.height) {
            log::debug!("Ball {} left the playfield at {:?}", ball.id, ball.pos);
            report.pruned += 1;
            continue;
        }

        next.push(ball);
    }

    report.spawned = offspring.len() as u32;
    for mut ball in offspring {
        ball.id = state.next_entity_id();
        next.push(ball);
    }

    state.balls = next;
    state.total_collisions += report.collisions as u64;

    if had_balls && state.balls.is_empty() {
        report.population_empty = true;
        log::info!(
            "All balls gone after {} ticks ({} collisions)",
            state.time_ticks,
            state.total_collisions
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentNotes;
    use crate::settings::NoteMode;
    use crate::sim::{Arena, Ball, BoundaryPolicy, Color};
    use glam::Vec2;
    use proptest::prelude::*;

    fn state_with(ball: Ball) -> SimState {
        let mut state = SimState::new(12345);
        state.insert_ball(ball);
        state
    }

    fn ball(pos: Vec2, vel: Vec2, radius: f32) -> Ball {
        Ball::new(0, pos, vel, radius, BASE_NOTE)
    }

    /// Ball placed so the next tick puts it past the boundary, straight below center
    fn colliding_ball() -> Ball {
        ball(Vec2::new(400.0, 630.0), Vec2::new(0.0, 5.0), 20.0)
    }

    #[test]
    fn test_tick_integrates_without_collision() {
        let mut state = state_with(ball(Vec2::new(400.0, 400.0), Vec2::new(2.0, 2.0), 20.0));
        let report = tick(&mut state, &RuleConfig::default(), &mut SilentNotes);

        assert_eq!(report, TickReport::default());
        assert_eq!(state.balls[0].pos, Vec2::new(402.0, 402.0));
        assert_eq!(state.balls[0].vel, Vec2::new(2.0, 2.5));
    }

    #[test]
    fn test_two_quiet_ticks_accumulate_exactly() {
        let mut state = state_with(ball(Vec2::new(400.0, 300.0), Vec2::new(1.0, 0.0), 10.0));
        let mut played: Vec<f32> = Vec::new();
        for _ in 0..2 {
            let report = tick(&mut state, &RuleConfig::default(), &mut played);
            assert_eq!(report.collisions, 0);
        }

        let b = &state.balls[0];
        // y: 300 + 0 + 0.5
        assert_eq!(b.pos, Vec2::new(402.0, 300.5));
        assert_eq!(b.vel, Vec2::new(1.0, 1.0));
        assert!(played.is_empty());
        assert_eq!(state.note.current(), BASE_NOTE);
    }

    #[test]
    fn test_containment_collision_kicks_toward_center() {
        let mut state = state_with(colliding_ball());
        let config = RuleConfig {
            repulsion_force: 7.0,
            ..Default::default()
        };
        let report = tick(&mut state, &config, &mut SilentNotes);

        assert_eq!(report.collisions, 1);
        let b = &state.balls[0];
        let outward = (b.pos - state.arena.center).normalize();
        assert!((b.vel.length() - 7.0).abs() < 1e-4);
        assert!(b.vel.normalize().dot(outward) < -0.9999);
    }

    #[test]
    fn test_collision_plays_current_note() {
        let mut state = state_with(colliding_ball());
        let config = RuleConfig {
            note_mode: NoteMode::Increase,
            ..Default::default()
        };
        let mut played: Vec<f32> = Vec::new();
        tick(&mut state, &config, &mut played);

        assert_eq!(played, vec![BASE_NOTE]);
        assert_eq!(state.balls[0].note, BASE_NOTE);
        assert_eq!(state.note.current(), BASE_NOTE + NOTE_STEP);
    }

    #[test]
    fn test_multiply_grows_population_by_n() {
        let mut state = state_with(colliding_ball());
        let config = RuleConfig {
            multiply_count: 4,
            ..Default::default()
        };
        let report = tick(&mut state, &config, &mut SilentNotes);

        assert_eq!(report.spawned, 4);
        assert_eq!(state.population(), 5);

        // Offspring carry the parent's post-kick velocity, negated
        let parent = &state.balls[0];
        for kid in &state.balls[1..] {
            assert_eq!(kid.pos, parent.pos);
            assert_eq!(kid.vel, -parent.vel);
            assert!(kid.id > parent.id);
        }
    }

    #[test]
    fn test_offspring_not_updated_on_spawn_tick() {
        let mut state = state_with(colliding_ball());
        let config = RuleConfig {
            multiply_count: 1,
            ..Default::default()
        };
        tick(&mut state, &config, &mut SilentNotes);
        let kid_before = state.balls[1].clone();

        // Only the parent collided; the kid was never integrated
        assert_eq!(state.total_collisions, 1);
        assert_eq!(kid_before.pos, state.balls[0].pos);

        tick(&mut state, &RuleConfig::default(), &mut SilentNotes);
        let kid_after = &state.balls[1];
        assert_eq!(kid_after.pos, kid_before.pos + kid_before.vel);
    }

    #[test]
    fn test_grow_and_shrink_net_zero() {
        let mut state = state_with(colliding_ball());
        let config = RuleConfig {
            grow: true,
            shrink: true,
            ..Default::default()
        };
        tick(&mut state, &config, &mut SilentNotes);
        assert_eq!(state.balls[0].radius, 20.0);
    }

    #[test]
    fn test_grow_only() {
        let mut state = state_with(colliding_ball());
        let config = RuleConfig {
            grow: true,
            ..Default::default()
        };
        tick(&mut state, &config, &mut SilentNotes);
        assert_eq!(state.balls[0].radius, 21.0);
    }

    #[test]
    fn test_small_space_and_speed_change() {
        let mut state = state_with(colliding_ball());
        let config = RuleConfig {
            small_space: true,
            speed_change: true,
            recolor: true,
            repulsion_force: 10.0,
            ..Default::default()
        };
        tick(&mut state, &config, &mut SilentNotes);

        let b = &state.balls[0];
        let outward = (b.pos - state.arena.center).normalize();
        // Reversed: now heading outward, 10% faster
        assert!((b.vel.length() - 11.0).abs() < 1e-3);
        assert!(b.vel.normalize().dot(outward) > 0.9999);
        assert_ne!(b.color, Color::BLUE);
    }

    #[test]
    fn test_non_finite_repulsion_is_zero() {
        let mut state = state_with(colliding_ball());
        let config = RuleConfig {
            repulsion_force: f32::NAN,
            ..Default::default()
        };
        let report = tick(&mut state, &config, &mut SilentNotes);
        assert_eq!(report.collisions, 1);
        assert_eq!(state.balls[0].vel, Vec2::ZERO);
    }

    #[test]
    fn test_note_increase_three_collisions() {
        let mut state = SimState::new(1);
        let config = RuleConfig {
            note_mode: NoteMode::Increase,
            ..Default::default()
        };
        let mut played: Vec<f32> = Vec::new();
        for _ in 0..3 {
            state.balls.clear();
            state.insert_ball(colliding_ball());
            tick(&mut state, &config, &mut played);
        }
        assert_eq!(state.note.current(), BASE_NOTE + 30.0);
        assert_eq!(played, vec![440.0, 450.0, 460.0]);
    }

    #[test]
    fn test_note_decrease_per_colliding_ball() {
        let mut state = SimState::new(1);
        state.insert_ball(colliding_ball());
        state.insert_ball(colliding_ball());
        let config = RuleConfig {
            note_mode: NoteMode::Decrease,
            grow: true,
            multiply_count: 1,
            ..Default::default()
        };
        let report = tick(&mut state, &config, &mut SilentNotes);
        assert_eq!(report.collisions, 2);
        assert_eq!(state.note.current(), BASE_NOTE - 20.0);
    }

    #[test]
    fn test_prune_last_ball_signals_once() {
        let mut state = state_with(ball(Vec2::new(400.0, 830.0), Vec2::new(0.0, 5.0), 20.0));
        let report = tick(&mut state, &RuleConfig::default(), &mut SilentNotes);
        assert!(report.population_empty);
        assert_eq!(report.pruned, 1);
        assert!(state.balls.is_empty());

        let report = tick(&mut state, &RuleConfig::default(), &mut SilentNotes);
        assert!(!report.population_empty);
        assert_eq!(report.pruned, 0);
    }

    #[test]
    fn test_prune_keeps_other_balls() {
        let mut state = SimState::new(1);
        state.insert_ball(ball(Vec2::new(400.0, 830.0), Vec2::new(0.0, 5.0), 20.0));
        let keep = state.insert_ball(ball(Vec2::new(400.0, 400.0), Vec2::ZERO, 20.0));
        let report = tick(&mut state, &RuleConfig::default(), &mut SilentNotes);

        assert!(!report.population_empty);
        assert_eq!(state.population(), 1);
        assert_eq!(state.balls[0].id, keep);
    }

    #[test]
    fn test_empty_state_never_signals() {
        let mut state = SimState::new(1);
        let report = tick(&mut state, &RuleConfig::default(), &mut SilentNotes);
        assert!(!report.population_empty);
    }

    #[test]
    fn test_rotation_advances_only_when_enabled() {
        let mut state = SimState::new(1);
        tick(&mut state, &RuleConfig::default(), &mut SilentNotes);
        assert_eq!(state.arena.angle, 0.0);

        let config = RuleConfig {
            rotate: true,
            ..Default::default()
        };
        tick(&mut state, &config, &mut SilentNotes);
        tick(&mut state, &config, &mut SilentNotes);
        assert!((state.arena.angle - 2.0 * ROTATION_STEP).abs() < 1e-6);
    }

    #[test]
    fn test_all_rules_enabled_bounded_run() {
        let mut state = SimState::new(99);
        state.spawn_initial_ball();
        let config = RuleConfig {
            grow: true,
            shrink: true,
            small_space: true,
            recolor: true,
            speed_change: true,
            rotate: true,
            circle_layers: 3,
            repulsion_force: 5.0,
            multiply_count: 1,
            note_mode: NoteMode::Decrease,
        };
        // Offspring leave outward and collide again next tick, so the
        // population doubles per tick once the first hit happens
        let mut signals = 0;
        let mut spawned = 0;
        for _ in 0..32 {
            let report = tick(&mut state, &config, &mut SilentNotes);
            spawned += report.spawned as usize;
            if report.population_empty {
                signals += 1;
            }
        }

        assert!(state.total_collisions > 0);
        assert!(signals <= 1);
        assert_eq!(state.population(), 1 + spawned);
        assert!(state.population() <= 64);
        // Grow and shrink cancel on every hit
        assert!(state.balls.iter().all(|b| b.radius == INITIAL_BALL_RADIUS));
        let expected = BASE_NOTE - NOTE_STEP * state.total_collisions as f32;
        assert!((state.note.current() - expected).abs() < 1e-2);
    }

    #[test]
    fn test_same_seed_same_run() {
        let config = RuleConfig {
            recolor: true,
            small_space: true,
            ..Default::default()
        };
        let run = |seed: u64, multiply_count: u32, ticks: usize| {
            let config = RuleConfig {
                multiply_count,
                ..config.clone()
            };
            let mut state = SimState::new(seed);
            state.spawn_initial_ball();
            for _ in 0..ticks {
                tick(&mut state, &config, &mut SilentNotes);
            }
            (state.balls, state.total_collisions)
        };
        assert_eq!(run(5, 0, 300), run(5, 0, 300));
        // First hit lands around tick 27; keep the doubling short
        let (balls, collisions) = run(5, 1, 32);
        assert_eq!((balls.clone(), collisions), run(5, 1, 32));
        assert!(collisions > 0);
        assert!(balls.len() > 1);
    }

    #[test]
    fn test_wall_bounce_policy_tick() {
        let mut state =
            SimState::with_policy(3, BoundaryPolicy::WallBounce, Arena::default());
        state.insert_ball(ball(Vec2::new(400.0, 400.0), Vec2::new(1.0, 0.0), 10.0));
        let config = RuleConfig {
            recolor: true,
            speed_change: true,
            repulsion_force: 50.0,
            multiply_count: 1,
            ..Default::default()
        };
        let mut played: Vec<f32> = Vec::new();
        let report = tick(&mut state, &config, &mut played);

        // Inside the circle: rules fire, but no kick, recolor or speed change
        assert_eq!(report.collisions, 1);
        assert_eq!(played.len(), 1);
        assert_eq!(state.population(), 2);
        assert_eq!(state.balls[0].vel, Vec2::new(1.0, 0.5));
        assert_eq!(state.balls[0].color, Color::BLUE);
    }

    #[test]
    fn test_wall_bounce_outside_circle_is_quiet() {
        let mut state =
            SimState::with_policy(3, BoundaryPolicy::WallBounce, Arena::default());
        state.insert_ball(ball(Vec2::new(790.0, 100.0), Vec2::new(5.0, 0.0), 10.0));
        let report = tick(&mut state, &RuleConfig::default(), &mut SilentNotes);

        assert_eq!(report.collisions, 0);
        assert_eq!(state.balls[0].vel, Vec2::new(-5.0, 0.5));
    }

    proptest! {
        #[test]
        fn prop_quiet_tick_is_exact_integration(
            x in 300.0f32..500.0,
            y in 300.0f32..500.0,
            dx in -5.0f32..5.0,
            dy in -5.0f32..5.0,
        ) {
            let mut state = state_with(ball(Vec2::new(x, y), Vec2::new(dx, dy), 10.0));
            let report = tick(&mut state, &RuleConfig::default(), &mut SilentNotes);

            prop_assert_eq!(report.collisions, 0);
            let b = &state.balls[0];
            prop_assert_eq!(b.pos, Vec2::new(x, y) + Vec2::new(dx, dy));
            prop_assert_eq!(b.vel.x, dx);
            prop_assert_eq!(b.vel.y, dy + GRAVITY);
        }

        #[test]
        fn prop_containment_velocity_is_repulsion(
            theta in -std::f32::consts::PI..std::f32::consts::PI,
            force in 0.5f32..50.0,
        ) {
            let arena = Arena::default();
            // Start just past the boundary, at rest
            let pos = arena.center + Vec2::from_angle(theta) * (arena.radius - 5.0);
            let mut state = state_with(ball(pos, Vec2::ZERO, 10.0));
            let config = RuleConfig { repulsion_force: force, ..Default::default() };
            let report = tick(&mut state, &config, &mut SilentNotes);

            prop_assert_eq!(report.collisions, 1);
            let b = &state.balls[0];
            let outward = (b.pos - arena.center).normalize();
            prop_assert!((b.vel.length() - force).abs() < 1e-3 * force.max(1.0));
            prop_assert!(b.vel.normalize().dot(outward) < -0.999);
        }
    }
}
