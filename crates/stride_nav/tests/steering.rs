//! Integration tests for stride_nav: whole-tick behavior of the controller

use std::collections::HashMap;

use approx::assert_relative_eq;
use stride_nav::prelude::*;

fn registry() -> HashMap<String, ObstacleId> {
    ["Ped1", "Ped2", "Ped3"]
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), ObstacleId(i as u32 + 1)))
        .collect()
}

fn controller(config: NavConfig, goal: Vec2) -> NavController {
    NavController::new(config, goal, &registry()).expect("valid controller")
}

fn crossing_config() -> NavConfig {
    NavConfig::default()
        .with_obstacle(ObstacleSpec::new("Ped1", ObstacleClass::Crossing))
        .with_obstacle(ObstacleSpec::new("Ped2", ObstacleClass::Static))
        .with_crossing(CrossingFocus::default())
}

#[test]
fn test_directions_are_unit_or_zero() {
    let mut nav = controller(NavConfig::crossing_focus(), Vec2::new(-2.0, 0.0));
    let mut agent = Vec2::ZERO;
    let mut walkers = [
        (ObstacleId(1), Vec2::new(-3.0, 0.1), Vec2::new(0.015, 0.0)),
        (ObstacleId(2), Vec2::new(-0.8, -1.0), Vec2::new(0.0, 0.02)),
        (ObstacleId(3), Vec2::new(-0.3, -0.05), Vec2::new(-0.01, 0.0)),
    ];

    for tick in 0..600 {
        let mut snapshot = Snapshot::new(agent);
        snapshot.first_tick = tick == 0;
        for (id, position, _) in &walkers {
            snapshot = snapshot.with_obstacle(*id, *position);
        }

        let cmd = nav.tick(&snapshot);
        let length = cmd.direction.length();
        assert!(
            length == 0.0 || (length - 1.0).abs() < 1e-4,
            "tick {}: direction length {}",
            tick,
            length
        );
        assert!(cmd.displacement.length() <= 0.02 + 1e-6);
        assert!(cmd.yaw > -std::f32::consts::PI && cmd.yaw <= std::f32::consts::PI);
        if cmd.is_arrived() {
            break;
        }

        agent += cmd.displacement;
        for (_, position, velocity) in &mut walkers {
            *position += *velocity;
        }
    }
}

#[test]
fn test_arrival_is_idempotent() {
    let mut nav = controller(
        NavConfig::default().with_obstacle(ObstacleSpec::new("Ped1", ObstacleClass::HeadOn)),
        Vec2::new(-2.0, 0.0),
    );
    let snapshot = Snapshot::new(Vec2::new(-1.98, 0.01)).with_obstacle(ObstacleId(1), Vec2::new(-1.9, 0.0));

    for _ in 0..3 {
        let cmd = nav.tick(&snapshot);
        assert!(cmd.is_arrived());
        assert_eq!(cmd.direction, Vec2::ZERO);
        assert_eq!(cmd.displacement, Vec2::ZERO);
        assert_eq!(cmd.rule, None);
    }
    assert_eq!(nav.state().status, NavStatus::Arrived);
}

#[test]
fn test_tracker_velocity_from_consecutive_samples() {
    let mut nav = controller(crossing_config(), Vec2::new(-2.0, 0.0));
    let id = ObstacleId(1);

    nav.tick(&Snapshot::new(Vec2::ZERO).first_tick().with_obstacle(id, Vec2::new(2.0, 2.0)));
    assert_eq!(nav.tracker().velocity(id), Vec2::ZERO);

    nav.tick(&Snapshot::new(Vec2::ZERO).with_obstacle(id, Vec2::new(2.1, 1.95)));
    let velocity = nav.tracker().velocity(id);
    assert_relative_eq!(velocity.x, 0.1, epsilon = 1e-5);
    assert_relative_eq!(velocity.y, -0.05, epsilon = 1e-5);
}

#[test]
fn test_focus_cross_flees_once_lateral_threshold_reached() {
    let mut nav = controller(crossing_config(), Vec2::new(-2.0, 0.0));
    let ped = Vec2::new(0.3, 0.3);
    let snapshot = |agent: Vec2| Snapshot::new(agent).with_obstacle(ObstacleId(1), ped);

    let cmd = nav.tick(&snapshot(Vec2::ZERO).first_tick());
    assert_eq!(cmd.mode, ModeKind::FocusCross);
    // Obstacle above the agent: dodge downward
    assert_eq!(cmd.direction, Vec2::new(0.0, -1.0));

    let cmd = nav.tick(&snapshot(Vec2::new(0.0, -0.069)));
    assert_eq!(cmd.mode, ModeKind::FocusCross);
    assert_eq!(cmd.transition, None);

    let agent = Vec2::new(0.0, -0.0701);
    let cmd = nav.tick(&snapshot(agent));
    assert_eq!(cmd.mode, ModeKind::Flee);
    let change = cmd.transition.unwrap();
    assert_eq!((change.from, change.to), (ModeKind::FocusCross, ModeKind::Flee));

    let away = (agent - ped).normalize();
    assert_relative_eq!(cmd.direction.x, away.x, epsilon = 1e-5);
    assert_relative_eq!(cmd.direction.y, away.y, epsilon = 1e-5);
}

#[test]
fn test_flee_ends_once_focus_cleared() {
    let mut nav = controller(crossing_config(), Vec2::new(-2.0, 0.0));
    let id = ObstacleId(1);

    nav.tick(&Snapshot::new(Vec2::ZERO).first_tick().with_obstacle(id, Vec2::new(0.3, 0.3)));
    let cmd = nav.tick(&Snapshot::new(Vec2::new(0.0, -0.1)).with_obstacle(id, Vec2::new(0.3, 0.3)));
    assert_eq!(cmd.mode, ModeKind::Flee);

    // Still inside the cross radius
    let cmd = nav.tick(&Snapshot::new(Vec2::new(0.0, -0.1)).with_obstacle(id, Vec2::new(0.3, 0.2)));
    assert_eq!(cmd.mode, ModeKind::Flee);

    let cmd = nav.tick(&Snapshot::new(Vec2::new(0.0, -0.1)).with_obstacle(id, Vec2::new(0.3, 0.8)));
    assert_eq!(cmd.mode, ModeKind::Seeking);
    assert_eq!(cmd.transition.unwrap().reason, "focused obstacle cleared");
    let to_goal = (Vec2::new(-2.0, 0.0) - Vec2::new(0.0, -0.1)).normalize();
    assert_relative_eq!(cmd.direction.x, to_goal.x, epsilon = 1e-6);
    assert_relative_eq!(cmd.direction.y, to_goal.y, epsilon = 1e-6);
}

#[test]
fn test_intruder_aborts_flee_and_avoids_in_same_tick() {
    let mut nav = controller(crossing_config(), Vec2::new(-2.0, 0.0));
    let (ped1, ped2) = (ObstacleId(1), ObstacleId(2));
    let far = Vec2::new(5.0, 5.0);

    nav.tick(
        &Snapshot::new(Vec2::ZERO)
            .first_tick()
            .with_obstacle(ped1, Vec2::new(0.3, 0.3))
            .with_obstacle(ped2, far),
    );
    let cmd = nav.tick(
        &Snapshot::new(Vec2::new(0.0, -0.1))
            .with_obstacle(ped1, Vec2::new(0.3, 0.3))
            .with_obstacle(ped2, far),
    );
    assert_eq!(cmd.mode, ModeKind::Flee);

    let cmd = nav.tick(
        &Snapshot::new(Vec2::new(0.0, -0.15))
            .with_obstacle(ped1, Vec2::new(0.3, 0.3))
            .with_obstacle(ped2, Vec2::new(-0.2, -0.15)),
    );
    let change = cmd.transition.unwrap();
    assert_eq!((change.from, change.to), (ModeKind::Flee, ModeKind::Seeking));
    assert_eq!(cmd.mode, ModeKind::Seeking);
    assert_eq!(cmd.rule, Some(AvoidanceRule::StaticRepulsion));
}

#[test]
fn test_pause_holds_for_stop_duration() {
    let config = NavConfig::default()
        .with_obstacle(ObstacleSpec::new("Ped1", ObstacleClass::Crossing))
        .with_policies(PolicySet::default())
        .with_pause(PauseConfig {
            trigger: PauseTrigger::Proximity,
            stop_duration: 3,
        });
    let mut nav = controller(config, Vec2::new(-2.0, 0.0));
    let snapshot = Snapshot::new(Vec2::ZERO).with_obstacle(ObstacleId(1), Vec2::new(-0.3, 0.0));

    let cmd = nav.tick(&snapshot.clone().first_tick());
    assert_eq!(cmd.transition.map(|c| c.to), Some(ModeKind::Paused));

    let mut held = 1;
    loop {
        let cmd = nav.tick(&snapshot);
        if cmd.mode != ModeKind::Paused {
            // Leaving the pause consumes the tick's only transition
            assert_eq!(cmd.transition.map(|c| c.to), Some(ModeKind::Seeking));
            assert_eq!(cmd.direction, Vec2::new(-1.0, 0.0));
            break;
        }
        assert_eq!(cmd.direction, Vec2::ZERO);
        held += 1;
        assert!(held <= 3, "paused longer than the stop duration");
    }
    assert_eq!(held, 3);

    // Trigger still active: the next tick pauses again
    let cmd = nav.tick(&snapshot);
    assert_eq!(cmd.mode, ModeKind::Paused);
}

#[test]
fn test_first_qualifying_rule_wins() {
    let config = NavConfig::default()
        .with_obstacle(ObstacleSpec::new("Ped1", ObstacleClass::HeadOn))
        .with_obstacle(ObstacleSpec::new("Ped2", ObstacleClass::Static))
        .with_policies(PolicySet {
            static_repulsion: Some(StaticRepulsion::default()),
            perpendicular_dodge: Some(PerpendicularDodge::default()),
            velocity_dodge: Some(VelocityDodge::default()),
            ..Default::default()
        });
    let mut nav = controller(config, Vec2::new(-2.0, 0.0));

    let cmd = nav.tick(
        &Snapshot::new(Vec2::ZERO)
            .first_tick()
            .with_obstacle(ObstacleId(1), Vec2::new(-0.3, 0.1))
            .with_obstacle(ObstacleId(2), Vec2::new(-0.2, -0.2)),
    );
    assert_eq!(cmd.rule, Some(AvoidanceRule::StaticRepulsion));

    let cmd = nav.tick(
        &Snapshot::new(Vec2::ZERO)
            .with_obstacle(ObstacleId(1), Vec2::new(-0.3, 0.1))
            .with_obstacle(ObstacleId(2), Vec2::new(3.0, 3.0)),
    );
    assert_eq!(cmd.rule, Some(AvoidanceRule::PerpendicularDodge));
}

#[test]
fn test_dodge_side_follows_goal_y() {
    // A standing obstacle straight ahead on the x axis; only the goal's
    // y component can pick the side.
    for (goal, expected) in [(Vec2::new(-0.5, -2.0), -1.0), (Vec2::new(-0.5, 2.0), 1.0)] {
        let config = NavConfig::default()
            .with_obstacle(ObstacleSpec::new("Ped1", ObstacleClass::HeadOn))
            .with_policies(PolicySet {
                perpendicular_dodge: Some(PerpendicularDodge {
                    weights: BlendWeights::AVOID_ONLY,
                }),
                ..Default::default()
            });
        let mut nav = controller(config, goal);
        let cmd = nav.tick(
            &Snapshot::new(Vec2::ZERO)
                .first_tick()
                .with_obstacle(ObstacleId(1), Vec2::new(-0.3, 0.0)),
        );
        assert_eq!(cmd.rule, Some(AvoidanceRule::PerpendicularDodge));
        assert_relative_eq!(cmd.direction.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(cmd.direction.y, expected, epsilon = 1e-6);
    }
}

#[test]
fn test_turn_rate_limit() {
    let mut nav = controller(NavConfig::default().with_turn_speed(0.03), Vec2::new(-2.0, 0.0));
    let mut previous = 0.0;

    for k in 1..=20 {
        let mut snapshot = Snapshot::new(Vec2::ZERO);
        snapshot.first_tick = k == 1;
        let cmd = nav.tick(&snapshot);

        assert_relative_eq!(cmd.yaw, 0.03 * k as f32, epsilon = 1e-5);
        assert!((cmd.yaw - previous).abs() <= 0.03 + 1e-6);
        assert_relative_eq!(cmd.direction.x, cmd.yaw.cos(), epsilon = 1e-5);
        assert_relative_eq!(cmd.direction.y, cmd.yaw.sin(), epsilon = 1e-5);
        previous = cmd.yaw;
    }
}

#[test]
fn test_turn_limit_settles_on_goal_heading() {
    let mut nav = controller(NavConfig::default().with_turn_speed(0.03), Vec2::new(-2.0, 0.0));
    let mut cmd = nav.tick(&Snapshot::new(Vec2::ZERO).first_tick());
    for _ in 0..200 {
        cmd = nav.tick(&Snapshot::new(Vec2::ZERO));
    }
    // Either end of (-PI, PI] is the same heading
    assert_relative_eq!(cmd.yaw.abs(), std::f32::consts::PI, epsilon = 1e-4);
    assert_relative_eq!(cmd.direction.x, -1.0, epsilon = 1e-5);
    assert_relative_eq!(cmd.direction.y, 0.0, epsilon = 1e-4);
}

#[test]
fn test_turn_limited_vision_sidestep_is_not_delayed() {
    let mut nav = controller(NavConfig::vision_sidestep(), Vec2::new(0.0, -10.0))
        .with_initial_yaw(-std::f32::consts::FRAC_PI_2);
    // Right of the image center: step to the agent's left, +x when heading -y
    let detection = VisionDetection::new([170.0, 120.0], [40.0, 80.0], 1.0);
    let mut agent = Vec2::ZERO;

    for tick in 0..10 {
        let mut snapshot = Snapshot::new(agent).with_detection(detection);
        snapshot.first_tick = tick == 0;
        let cmd = nav.tick(&snapshot);

        assert_eq!(cmd.rule, Some(AvoidanceRule::VisionSidestep));
        assert!(
            cmd.displacement.x > 0.04,
            "tick {}: lateral step {}",
            tick,
            cmd.displacement.x
        );
        agent += cmd.displacement;
    }
    assert!(agent.x > 0.4, "drifted only {}", agent.x);
}

#[test]
fn test_static_repulsion_blends_both_goal_components() {
    let goal = Vec2::new(-1.2, -1.6);
    let config = NavConfig::default().with_obstacle(ObstacleSpec::new("Ped2", ObstacleClass::Static));
    let mut nav = controller(config, goal);

    let cmd = nav.tick(
        &Snapshot::new(Vec2::ZERO)
            .first_tick()
            .with_obstacle(ObstacleId(2), Vec2::new(0.1, 0.2)),
    );
    assert_eq!(cmd.rule, Some(AvoidanceRule::StaticRepulsion));

    let g = Vec2::new(-0.6, -0.8);
    let expected = (g * 0.5 + Vec2::NEG_Y * 0.5).normalize();
    assert_relative_eq!(cmd.direction.x, expected.x, epsilon = 1e-5);
    assert_relative_eq!(cmd.direction.y, expected.y, epsilon = 1e-5);

    let x_for_y = (Vec2::new(g.x, g.x) * 0.5 + Vec2::NEG_Y * 0.5).normalize();
    assert!(cmd.direction.distance(x_for_y) > 0.02);
}

#[test]
fn test_opposed_flow_dodge_blends_both_goal_components() {
    let mut nav = controller(NavConfig::dual_flow(), Vec2::new(-1.2, -1.6));
    let (ped1, ped2, ped3) = (ObstacleId(1), ObstacleId(2), ObstacleId(3));
    let far = Vec2::new(5.0, 5.0);

    nav.tick(
        &Snapshot::new(Vec2::ZERO)
            .first_tick()
            .with_obstacle(ped1, Vec2::new(-0.3, 0.2))
            .with_obstacle(ped2, Vec2::new(0.3, -0.3))
            .with_obstacle(ped3, far),
    );
    // Ped1 walks +y, Ped2 walks -y
    let cmd = nav.tick(
        &Snapshot::new(Vec2::ZERO)
            .with_obstacle(ped1, Vec2::new(-0.3, 0.23))
            .with_obstacle(ped2, Vec2::new(0.3, -0.33))
            .with_obstacle(ped3, far),
    );
    assert_eq!(cmd.rule, Some(AvoidanceRule::DualFlow));

    // Perpendicular to the line to Ped1, on the side it is walking away from
    let dodge = Vec2::new(-0.23, -0.3).normalize();
    let g = Vec2::new(-0.6, -0.8);
    let expected = (g * 0.6 + dodge * 0.4).normalize();
    assert_relative_eq!(cmd.direction.x, expected.x, epsilon = 1e-4);
    assert_relative_eq!(cmd.direction.y, expected.y, epsilon = 1e-4);

    let x_for_y = (Vec2::new(g.x, g.x) * 0.6 + dodge * 0.4).normalize();
    assert!(cmd.direction.distance(x_for_y) > 0.05);
}
