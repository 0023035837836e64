use bevy::prelude::*;
use smallvec::SmallVec;
use std::sync::Arc;

use super::{BodyKind, Category};

/// Collision body as maintained by the physics collaborator.
///
/// `bounds` are world-space and must be current before `NavSet::PopulateWorld`
/// runs; the world grid is rebuilt from these every tick.
#[derive(Component, Debug, Clone)]
pub struct SimBody {
    pub kind: BodyKind,
    pub category: Category,
    pub bounds: Rect,
}

impl SimBody {
    pub fn new(kind: BodyKind, category: Category, bounds: Rect) -> Self {
        Self { kind, category, bounds }
    }

    /// Static body covering a `width` x `height` box with its bottom-left corner at `origin`.
    pub fn static_box(category: Category, origin: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            BodyKind::Static,
            category,
            Rect::from_corners(origin, origin + Vec2::new(width, height)),
        )
    }
}

/// One named shape attached to a [`SimBody`].
#[derive(Debug, Clone)]
pub struct FixtureShape {
    pub name: Arc<str>,
    pub category: Category,
    pub bounds: Rect,
}

impl FixtureShape {
    pub fn new(name: impl Into<Arc<str>>, category: Category, bounds: Rect) -> Self {
        Self {
            name: name.into(),
            category,
            bounds,
        }
    }
}

/// Fixtures of a body. Most bodies carry one or two.
#[derive(Component, Debug, Clone, Default)]
pub struct SimFixtures(pub SmallVec<[FixtureShape; 2]>);
