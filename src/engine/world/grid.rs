use bevy::prelude::*;
use super::{Body, Fixture, GridCoordinate, WorldContainer};

/// Objects covering more cells than this are treated as malformed input.
pub(super) const MAX_CELLS_PER_OBJECT: i64 = 1 << 20;

impl WorldContainer {
    /// Inclusive cell span covered by `bounds`, or `None` for bounds that
    /// cannot be quantized (NaN, infinite, absurdly large).
    pub fn cell_span(&self, bounds: Rect) -> Option<(GridCoordinate, GridCoordinate)> {
        if !bounds.min.is_finite() || !bounds.max.is_finite() {
            return None;
        }

        let lo = bounds.min.min(bounds.max);
        let hi = bounds.min.max(bounds.max);

        let min_x = self.quantize_min(lo.x);
        let min_y = self.quantize_min(lo.y);
        // A zero-size object sitting on a grid line must still occupy one cell.
        let max_x = self.quantize_max(hi.x).max(min_x);
        let max_y = self.quantize_max(hi.y).max(min_y);

        let width = max_x as i64 - min_x as i64 + 1;
        let height = max_y as i64 - min_y as i64 + 1;
        match width.checked_mul(height) {
            Some(cells) if cells <= MAX_CELLS_PER_OBJECT => {}
            _ => return None,
        }

        Some((GridCoordinate::new(min_x, min_y), GridCoordinate::new(max_x, max_y)))
    }

    #[inline]
    fn quantize_min(&self, value: f32) -> i32 {
        (value / self.cell_size).floor() as i32
    }

    /// A maximum edge exactly on a grid line belongs to the cell below it
    /// when exact-match adjustment is on.
    #[inline]
    fn quantize_max(&self, value: f32) -> i32 {
        let scaled = value / self.cell_size;
        if self.adjust_for_exact_grid_match && scaled == scaled.floor() {
            ((value - self.epsilon) / self.cell_size).floor() as i32
        } else {
            scaled.floor() as i32
        }
    }

    /// Insert a body into every cell its bounds overlap.
    ///
    /// Returns `false` and leaves the container untouched when the bounds are
    /// not finite or cover more than `MAX_CELLS_PER_OBJECT` cells. Re-adding a body already present in a cell is a no-op for
    /// that cell.
    pub fn add_body(&mut self, body: &Body) -> bool {
        let Some((min, max)) = self.cell_span(body.bounds) else {
            trace!("[WORLD_GRID] Ignoring body {:?} with unusable bounds {:?}", body.entity, body.bounds);
            return false;
        };

        let handle = body.to_ref();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                let bucket = self.bodies.entry(GridCoordinate::new(x, y)).or_default();
                if !bucket.contains(&handle) {
                    bucket.push(handle);
                }
            }
        }
        true
    }

    /// Insert a fixture into every cell its bounds overlap. Same contract as [`Self::add_body`].
    pub fn add_fixture(&mut self, fixture: &Fixture) -> bool {
        let Some((min, max)) = self.cell_span(fixture.bounds) else {
            trace!(
                "[WORLD_GRID] Ignoring fixture '{}' of {:?} with unusable bounds {:?}",
                fixture.name, fixture.body, fixture.bounds
            );
            return false;
        };

        let handle = fixture.to_ref();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                let bucket = self.fixtures.entry(GridCoordinate::new(x, y)).or_default();
                if !bucket.contains(&handle) {
                    bucket.push(handle.clone());
                }
            }
        }
        true
    }
}
