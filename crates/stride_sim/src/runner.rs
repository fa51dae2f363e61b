//! Closed-loop scenario runner
//!
//! Each tick: snapshot the world, let the controller steer, apply the command
//! to the agent body, then advance the obstacles.

use serde::Serialize;
use std::collections::BTreeMap;

use stride_math::Vec2;
use stride_nav::controller::{MotionActuator, NavController, SteeringCommand};
use stride_nav::mode::{ModeChange, ModeKind};
use stride_nav::policy::AvoidanceRule;

use crate::error::Result;
use crate::scenario::Scenario;
use crate::world::{AgentBody, KinematicActuator, World};

/// A mode change and the tick it happened on
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub tick: u64,
    #[serde(flatten)]
    pub change: ModeChange,
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub scenario: String,
    /// Controller ticks executed, the arrival tick included
    pub ticks: u64,
    pub arrived: bool,
    pub final_position: Vec2,
    pub distance_travelled: f32,
    /// Closest approach to any obstacle, sampled at each snapshot
    pub min_clearance: Option<f32>,
    pub paused_ticks: u64,
    pub transitions: Vec<TransitionRecord>,
    pub rule_usage: BTreeMap<AvoidanceRule, u64>,
}

impl RunReport {
    /// Ticks on which `rule` steered the agent
    pub fn rule_count(&self, rule: AvoidanceRule) -> u64 {
        self.rule_usage.get(&rule).copied().unwrap_or(0)
    }

    pub fn entered(&self, mode: ModeKind) -> usize {
        self.transitions.iter().filter(|t| t.change.to == mode).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Owns the world, the actuator and the controller of one scenario
#[derive(Debug)]
pub struct Runner {
    scenario: Scenario,
    world: World,
    actuator: KinematicActuator,
    controller: NavController,
    report: RunReport,
}

impl Runner {
    /// Build the world and a controller resolved against it
    pub fn new(scenario: Scenario) -> Result<Self> {
        let mut world = World::new();
        if let Some(camera) = scenario.camera {
            world = world.with_camera(camera);
        }
        for setup in &scenario.obstacles {
            world.spawn(setup.name.clone(), setup.position, setup.mover);
        }

        let controller = NavController::new(scenario.nav.clone(), scenario.goal, &world)?
            .with_initial_yaw(scenario.initial_yaw);
        let actuator = KinematicActuator::new(AgentBody {
            position: scenario.start,
            z: scenario.z,
            yaw: scenario.initial_yaw,
        });
        let report = RunReport {
            scenario: scenario.name.clone(),
            ticks: 0,
            arrived: false,
            final_position: scenario.start,
            distance_travelled: 0.0,
            min_clearance: None,
            paused_ticks: 0,
            transitions: Vec::new(),
            rule_usage: BTreeMap::new(),
        };

        log::info!("Scenario {}: {}", scenario.name, scenario.description);
        Ok(Self {
            scenario,
            world,
            actuator,
            controller,
            report,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn controller(&self) -> &NavController {
        &self.controller
    }

    pub fn body(&self) -> &AgentBody {
        self.actuator.body()
    }

    /// Run one closed-loop tick
    pub fn step(&mut self) -> SteeringCommand {
        let body = *self.actuator.body();
        let snapshot = self.world.snapshot(&body);
        if let Some(clearance) = self.world.clearance(body.position) {
            let closest = self.report.min_clearance.map_or(clearance, |c| c.min(clearance));
            self.report.min_clearance = Some(closest);
        }

        let command = self.controller.tick(&snapshot);
        self.actuator.apply(&command);
        self.world.step();
        self.record(&command);
        command
    }

    fn record(&mut self, command: &SteeringCommand) {
        let report = &mut self.report;
        report.ticks += 1;
        report.arrived = command.is_arrived();
        report.final_position = self.actuator.body().position;
        report.distance_travelled = self.actuator.travelled();
        if command.mode == ModeKind::Paused {
            report.paused_ticks += 1;
        }
        if let Some(change) = command.transition {
            report.transitions.push(TransitionRecord {
                tick: report.ticks,
                change,
            });
        }
        if let Some(rule) = command.rule {
            *report.rule_usage.entry(rule).or_insert(0) += 1;
        }
    }

    /// Step until arrival or the tick limit
    pub fn run(&mut self) -> RunReport {
        while self.report.ticks < self.scenario.max_ticks {
            if self.step().is_arrived() {
                break;
            }
        }
        if !self.report.arrived {
            log::warn!(
                "Scenario {} stopped after {} ticks without reaching the goal",
                self.scenario.name,
                self.report.ticks
            );
        }
        self.report.clone()
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }
}
