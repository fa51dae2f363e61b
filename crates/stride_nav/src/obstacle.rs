//! Obstacle identities, classes and the resolved roster

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use stride_math::Vec2;

use crate::error::{NavError, Result};

/// Stable identifier of an obstacle in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

impl fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Classification of an obstacle, fixed at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleClass {
    /// Never moves
    Static,
    /// Crosses the agent's path laterally
    Crossing,
    /// Moves in the agent's direction, slower than the agent
    Overtake,
    /// Walks toward the agent
    HeadOn,
}

impl ObstacleClass {
    pub fn is_dynamic(self) -> bool {
        !matches!(self, ObstacleClass::Static)
    }
}

impl fmt::Display for ObstacleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Crossing => write!(f, "crossing"),
            Self::Overtake => write!(f, "overtake"),
            Self::HeadOn => write!(f, "head_on"),
        }
    }
}

/// Obstacle declaration in the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpec {
    /// Name the world knows the obstacle by
    pub name: String,
    /// Classification
    pub class: ObstacleClass,
    /// Per-obstacle react radius, overriding `NavConfig::avoid_radius`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_radius: Option<f32>,
}

impl ObstacleSpec {
    pub fn new(name: impl Into<String>, class: ObstacleClass) -> Self {
        Self {
            name: name.into(),
            class,
            avoid_radius: None,
        }
    }

    /// Set a dedicated react radius
    pub fn with_avoid_radius(mut self, radius: f32) -> Self {
        self.avoid_radius = Some(radius);
        self
    }
}

/// Lookup of named obstacles provided by the world
pub trait ObstacleRegistry {
    /// Resolve a name to an id, `None` if the world has no such obstacle
    fn resolve(&self, name: &str) -> Option<ObstacleId>;
}

impl ObstacleRegistry for HashMap<String, ObstacleId> {
    fn resolve(&self, name: &str) -> Option<ObstacleId> {
        self.get(name).copied()
    }
}

/// One per-tick position report from the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSample {
    pub id: ObstacleId,
    pub position: Vec2,
}

impl ObstacleSample {
    pub fn new(id: ObstacleId, position: Vec2) -> Self {
        Self { id, position }
    }
}

/// A resolved roster entry
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub id: ObstacleId,
    pub name: String,
    pub class: ObstacleClass,
    pub avoid_radius: f32,
}

/// Obstacles the controller knows about, resolved once at construction
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    index: HashMap<ObstacleId, usize>,
}

impl Roster {
    /// Resolve every declared obstacle against the world.
    ///
    /// Fails with [`NavError::MissingObstacle`] for the first name the
    /// registry does not know, before any tick can run.
    pub fn resolve<R>(specs: &[ObstacleSpec], default_radius: f32, registry: &R) -> Result<Self>
    where
        R: ObstacleRegistry + ?Sized,
    {
        let mut roster = Self::default();
        for spec in specs {
            let id = registry
                .resolve(&spec.name)
                .ok_or_else(|| NavError::MissingObstacle(spec.name.clone()))?;
            roster.insert(RosterEntry {
                id,
                name: spec.name.clone(),
                class: spec.class,
                avoid_radius: spec.avoid_radius.unwrap_or(default_radius),
            })?;
        }
        Ok(roster)
    }

    /// Add an entry, rejecting a second entry for the same id
    pub fn insert(&mut self, entry: RosterEntry) -> Result<()> {
        if self.index.contains_key(&entry.id) {
            return Err(NavError::DuplicateObstacle(entry.name));
        }
        self.index.insert(entry.id, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, id: ObstacleId) -> Option<&RosterEntry> {
        self.index.get(&id).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the engine knows about one obstacle during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleView {
    pub id: ObstacleId,
    pub class: ObstacleClass,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Distance from the agent
    pub distance: f32,
    /// React radius for this obstacle
    pub avoid_radius: f32,
}

impl ObstacleView {
    /// Inside the react zone
    pub fn is_threat(&self) -> bool {
        self.distance < self.avoid_radius
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> HashMap<String, ObstacleId> {
        let mut map = HashMap::new();
        map.insert("Ped1".to_string(), ObstacleId(1));
        map.insert("Ped2".to_string(), ObstacleId(2));
        map
    }

    #[test]
    fn test_resolve_roster() {
        let specs = vec![
            ObstacleSpec::new("Ped1", ObstacleClass::HeadOn),
            ObstacleSpec::new("Ped2", ObstacleClass::Crossing).with_avoid_radius(0.6),
        ];
        let roster = Roster::resolve(&specs, 0.35, &registry()).unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get(ObstacleId(1)).unwrap().avoid_radius, 0.35);
        assert_eq!(roster.get(ObstacleId(2)).unwrap().avoid_radius, 0.6);
        assert_eq!(roster.get(ObstacleId(2)).unwrap().class, ObstacleClass::Crossing);
    }

    #[test]
    fn test_missing_obstacle_is_fatal() {
        let specs = vec![ObstacleSpec::new("Ped3", ObstacleClass::Static)];
        let err = Roster::resolve(&specs, 0.5, &registry()).unwrap_err();
        assert!(matches!(err, NavError::MissingObstacle(name) if name == "Ped3"));
    }

    #[test]
    fn test_duplicate_obstacle_rejected() {
        let specs = vec![
            ObstacleSpec::new("Ped1", ObstacleClass::HeadOn),
            ObstacleSpec::new("Ped1", ObstacleClass::Static),
        ];
        let err = Roster::resolve(&specs, 0.5, &registry()).unwrap_err();
        assert!(matches!(err, NavError::DuplicateObstacle(_)));
    }

    #[test]
    fn test_class_serde_names() {
        let json = serde_json::to_string(&ObstacleClass::HeadOn).unwrap();
        assert_eq!(json, "\"head_on\"");
        assert!(!ObstacleClass::Static.is_dynamic());
        assert!(ObstacleClass::Overtake.is_dynamic());
    }
}
