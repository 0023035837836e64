use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One grid cell, addressed by signed integer coordinates.
///
/// Cell `(x, y)` covers world space `[x * cell_size, (x + 1) * cell_size)` on
/// each axis, so negative coordinates are ordinary cells left of / below the origin.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GridCoordinate {
    pub x: i32,
    pub y: i32,
}

impl GridCoordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing a world-space point.
    pub fn from_world(pos: Vec2, cell_size: f32) -> Self {
        Self {
            x: (pos.x / cell_size).floor() as i32,
            y: (pos.y / cell_size).floor() as i32,
        }
    }

    /// World-space center of this cell.
    pub fn center(self, cell_size: f32) -> Vec2 {
        Vec2::new(
            (self.x as f32 + 0.5) * cell_size,
            (self.y as f32 + 0.5) * cell_size,
        )
    }

    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
        }
    }
}

impl From<(i32, i32)> for GridCoordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Inclusive rectangle of cells, e.g. the playable extent of the loaded map.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GridBounds {
    pub min: GridCoordinate,
    pub max: GridCoordinate,
}

impl GridBounds {
    pub fn new(min: GridCoordinate, max: GridCoordinate) -> Self {
        Self { min, max }
    }

    /// Bounds of a `width` x `height` map anchored at cell (0, 0).
    pub fn from_size(width: i32, height: i32) -> Self {
        Self {
            min: GridCoordinate::new(0, 0),
            max: GridCoordinate::new(width - 1, height - 1),
        }
    }

    #[inline]
    pub fn contains(&self, coordinate: GridCoordinate) -> bool {
        coordinate.x >= self.min.x
            && coordinate.x <= self.max.x
            && coordinate.y >= self.min.y
            && coordinate.y <= self.max.y
    }
}

/// How a body takes part in the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BodyKind {
    Abstract,
    Static,
    Dynamic,
}

/// Closed set of gameplay categories that passability filters and weighted
/// heuristics match on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Walls, floors, blocks. Impassable for navigating entities.
    Solid,
    /// One-way platforms.
    Platform,
    /// Spikes, lava and anything else that hurts on contact.
    Hazard,
    /// Players, enemies, NPCs.
    Actor,
    Projectile,
    /// Triggers and other non-colliding volumes.
    Sensor,
}

impl Category {
    /// Categories the default passability filter refuses to route through.
    pub const BLOCKING: &'static [Category] = &[Category::Solid];
}

/// A body as handed over by the physics collaborator when the grid is populated.
#[derive(Clone, Debug)]
pub struct Body {
    pub entity: Entity,
    pub kind: BodyKind,
    pub category: Category,
    pub bounds: Rect,
}

/// A named collision shape attached to a body.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub body: Entity,
    pub name: Arc<str>,
    pub category: Category,
    pub bounds: Rect,
}

/// What a cell bucket stores for a body: identity plus the tags filters need.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BodyRef {
    pub entity: Entity,
    pub kind: BodyKind,
    pub category: Category,
}

/// What a cell bucket stores for a fixture. The name is shared, not copied,
/// when the container is duplicated.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FixtureRef {
    pub body: Entity,
    pub name: Arc<str>,
    pub category: Category,
}

impl Body {
    pub fn new(entity: Entity, kind: BodyKind, category: Category, bounds: Rect) -> Self {
        Self { entity, kind, category, bounds }
    }

    pub fn to_ref(&self) -> BodyRef {
        BodyRef {
            entity: self.entity,
            kind: self.kind,
            category: self.category,
        }
    }
}

impl Fixture {
    pub fn new(body: Entity, name: impl Into<Arc<str>>, category: Category, bounds: Rect) -> Self {
        Self {
            body,
            name: name.into(),
            category,
            bounds,
        }
    }

    pub fn to_ref(&self) -> FixtureRef {
        FixtureRef {
            body: self.body,
            name: Arc::clone(&self.name),
            category: self.category,
        }
    }
}
