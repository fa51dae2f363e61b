//! Agent modes and their transition table
//!
//! The agent is always in exactly one [`Mode`]. Values a mode needs while it
//! is active (the lateral reference of a crossing dodge, the remaining pause
//! ticks) travel inside the variant and are dropped when the mode is left.

use serde::{Deserialize, Serialize};
use std::fmt;

use stride_math::Vec2;

use crate::config::{CrossingFocus, NavConfig, PauseConfig, PauseTrigger};
use crate::obstacle::{ObstacleClass, ObstacleId, ObstacleView};
use crate::state_machine::{Fired, StateMachine};
use crate::tracker::ObstacleTracker;

/// Mode without its context, the key of the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Seeking,
    FocusCross,
    Flee,
    Paused,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seeking => write!(f, "SEEKING"),
            Self::FocusCross => write!(f, "FOCUS_CROSS"),
            Self::Flee => write!(f, "FLEE"),
            Self::Paused => write!(f, "PAUSED"),
        }
    }
}

/// Committed lateral dodge against one crossing obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossFocus {
    pub obstacle: ObstacleId,
    /// Agent y when the dodge started
    pub reference_y: f32,
    /// Fixed dodge direction, `(0, 1)` or `(0, -1)`
    pub dodge: Vec2,
}

impl CrossFocus {
    /// Dodge away from the obstacle's side of the agent
    pub fn engage(obstacle: ObstacleId, obstacle_position: Vec2, agent: Vec2) -> Self {
        let dodge = if obstacle_position.y < agent.y {
            Vec2::Y
        } else {
            Vec2::NEG_Y
        };
        Self {
            obstacle,
            reference_y: agent.y,
            dodge,
        }
    }

    /// Lateral displacement since the dodge started
    pub fn lateral_offset(&self, agent: Vec2) -> f32 {
        (agent.y - self.reference_y).abs()
    }
}

/// Active mode and its context
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// Goal seeking with ordinary avoidance
    Seeking,
    /// Committed lateral dodge
    FocusCross(CrossFocus),
    /// Retreat from the focused obstacle
    Flee { obstacle: ObstacleId },
    /// Standing still
    Paused { remaining: u32 },
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Seeking => ModeKind::Seeking,
            Self::FocusCross(_) => ModeKind::FocusCross,
            Self::Flee { .. } => ModeKind::Flee,
            Self::Paused { .. } => ModeKind::Paused,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::Seeking
    }
}

/// What the transition conditions look at, computed once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModeFacts {
    /// Agent position at the start of the tick
    pub agent: Vec2,
    /// Nearest crossing obstacle inside the cross radius
    pub crossing: Option<(ObstacleId, Vec2)>,
    /// The pause trigger holds for some obstacle
    pub pause_triggered: bool,
    /// Lateral displacement of an active crossing dodge
    pub lateral_offset: Option<f32>,
    /// Last known position of the focused obstacle
    pub focus_position: Option<Vec2>,
    /// Distance to the focused obstacle, infinite if it was never seen
    pub focus_distance: f32,
    /// An obstacle other than the focused one is inside its react radius
    pub intruder: bool,
    /// Remaining pause ticks
    pub pause_remaining: u32,
}

/// A mode change reported by [`ModeMachine::evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeChange {
    pub from: ModeKind,
    pub to: ModeKind,
    pub reason: &'static str,
}

impl From<Fired<ModeKind>> for ModeChange {
    fn from(fired: Fired<ModeKind>) -> Self {
        Self {
            from: fired.from,
            to: fired.to,
            reason: fired.label,
        }
    }
}

/// Persistent mode state of one agent
#[derive(Debug)]
pub struct ModeMachine {
    mode: Mode,
    machine: StateMachine<ModeKind, ModeFacts>,
    crossing: Option<CrossingFocus>,
    pause: Option<PauseConfig>,
}

impl ModeMachine {
    /// Build the transition table for the features `config` enables
    pub fn new(config: &NavConfig) -> Self {
        let mut machine = StateMachine::new(ModeKind::Seeking);

        if let Some(crossing) = config.crossing {
            machine.add_transition(
                ModeKind::Seeking,
                ModeKind::FocusCross,
                2,
                "crossing obstacle inside cross radius",
                |facts: &ModeFacts| facts.crossing.is_some(),
            );
            let threshold = crossing.lateral_threshold;
            machine.add_transition(
                ModeKind::FocusCross,
                ModeKind::Flee,
                1,
                "lateral threshold reached",
                move |facts: &ModeFacts| facts.lateral_offset.map_or(false, |o| o >= threshold),
            );
            machine.add_transition(
                ModeKind::Flee,
                ModeKind::Seeking,
                2,
                "another obstacle inside its react radius",
                |facts: &ModeFacts| facts.intruder,
            );
            let cross_radius = crossing.cross_radius;
            machine.add_transition(
                ModeKind::Flee,
                ModeKind::Seeking,
                1,
                "focused obstacle cleared",
                move |facts: &ModeFacts| facts.focus_distance > cross_radius,
            );
        }

        if config.pause.is_some() {
            machine.add_transition(
                ModeKind::Seeking,
                ModeKind::Paused,
                1,
                "pause trigger",
                |facts: &ModeFacts| facts.pause_triggered,
            );
            machine.add_transition(
                ModeKind::Paused,
                ModeKind::Seeking,
                1,
                "pause elapsed",
                |facts: &ModeFacts| facts.pause_remaining == 0,
            );
        }

        Self {
            mode: Mode::Seeking,
            machine,
            crossing: config.crossing,
            pause: config.pause,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn kind(&self) -> ModeKind {
        self.mode.kind()
    }

    /// Gather the facts for this tick from the start-of-tick snapshot
    pub fn facts(&self, agent: Vec2, views: &[ObstacleView], tracker: &ObstacleTracker) -> ModeFacts {
        let mut facts = ModeFacts {
            agent,
            focus_distance: f32::INFINITY,
            ..Default::default()
        };

        if let Some(crossing) = &self.crossing {
            facts.crossing = views
                .iter()
                .filter(|v| v.class == ObstacleClass::Crossing && v.distance < crossing.cross_radius)
                .min_by(|a, b| a.distance.total_cmp(&b.distance))
                .map(|v| (v.id, v.position));
        }

        if let Some(pause) = &self.pause {
            facts.pause_triggered = views.iter().any(|v| {
                v.is_threat()
                    && match pause.trigger {
                        PauseTrigger::FastMotion { speed } => v.speed() > speed,
                        PauseTrigger::Proximity => true,
                    }
            });
        }

        match self.mode {
            Mode::FocusCross(focus) => {
                facts.lateral_offset = Some(focus.lateral_offset(agent));
                facts.focus_position = tracker.position(focus.obstacle);
            }
            Mode::Flee { obstacle } => {
                facts.focus_position = tracker.position(obstacle);
                facts.intruder = views.iter().any(|v| v.id != obstacle && v.is_threat());
                match facts.focus_position {
                    Some(position) => facts.focus_distance = agent.distance(position),
                    None => log::warn!("Lost track of focused obstacle {}", obstacle),
                }
            }
            Mode::Paused { remaining } => facts.pause_remaining = remaining,
            Mode::Seeking => {}
        }

        facts
    }

    /// Fire at most one transition and enter the resulting mode
    pub fn evaluate(&mut self, facts: &ModeFacts) -> Option<ModeChange> {
        let fired = self.machine.update(facts)?;
        let next = match fired.to {
            ModeKind::Seeking => Mode::Seeking,
            ModeKind::FocusCross => match facts.crossing {
                Some((id, position)) => Mode::FocusCross(CrossFocus::engage(id, position, facts.agent)),
                None => Mode::Seeking,
            },
            ModeKind::Flee => match self.mode {
                Mode::FocusCross(focus) => Mode::Flee {
                    obstacle: focus.obstacle,
                },
                _ => Mode::Seeking,
            },
            ModeKind::Paused => Mode::Paused {
                remaining: self.pause.map_or(0, |p| p.stop_duration),
            },
        };
        self.mode = next;
        if self.machine.current() != next.kind() {
            self.machine.force_transition(next.kind());
        }

        let change = ModeChange::from(fired);
        log::info!("Mode {} -> {} ({})", change.from, change.to, change.reason);
        Some(change)
    }

    /// Spend one paused tick; returns true while paused
    pub fn consume_pause_tick(&mut self) -> bool {
        match &mut self.mode {
            Mode::Paused { remaining } => {
                *remaining = remaining.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    /// Back to seeking with no context
    pub fn reset(&mut self) {
        self.mode = Mode::Seeking;
        if !self.machine.is_in(ModeKind::Seeking) {
            self.machine.force_transition(ModeKind::Seeking);
        }
    }
}
