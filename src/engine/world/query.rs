use super::{BodyRef, FixtureRef, GridCoordinate, WorldContainer};

impl WorldContainer {
    /// Append every body overlapping cell `(x, y)` to `out`.
    ///
    /// `out` is caller-owned so hot paths can reuse one buffer across queries.
    /// It is not cleared first.
    pub fn get_bodies<E: Extend<BodyRef>>(&self, x: i32, y: i32, out: &mut E) {
        if let Some(bucket) = self.bodies.get(&GridCoordinate::new(x, y)) {
            out.extend(bucket.iter().copied());
        }
    }

    /// Append every body overlapping any cell in the inclusive rectangle.
    ///
    /// A body spanning several of the queried cells is appended once per cell;
    /// pass a set as `out` to collapse duplicates.
    pub fn get_bodies_in<E: Extend<BodyRef>>(&self, min_x: i32, min_y: i32, max_x: i32, max_y: i32, out: &mut E) {
        for_each_cell_in(&self.bodies, min_x, min_y, max_x, max_y, |bucket| {
            out.extend(bucket.iter().copied());
        });
    }

    pub fn get_fixtures<E: Extend<FixtureRef>>(&self, x: i32, y: i32, out: &mut E) {
        if let Some(bucket) = self.fixtures.get(&GridCoordinate::new(x, y)) {
            out.extend(bucket.iter().cloned());
        }
    }

    pub fn get_fixtures_in<E: Extend<FixtureRef>>(&self, min_x: i32, min_y: i32, max_x: i32, max_y: i32, out: &mut E) {
        for_each_cell_in(&self.fixtures, min_x, min_y, max_x, max_y, |bucket| {
            out.extend(bucket.iter().cloned());
        });
    }

    /// Borrowing view of one cell's bodies, for filters that only need to look.
    pub fn bodies_at(&self, coordinate: GridCoordinate) -> impl Iterator<Item = &BodyRef> + '_ {
        self.bodies.get(&coordinate).into_iter().flatten()
    }

    pub fn fixtures_at(&self, coordinate: GridCoordinate) -> impl Iterator<Item = &FixtureRef> + '_ {
        self.fixtures.get(&coordinate).into_iter().flatten()
    }
}

/// Visit the buckets of every occupied cell inside the rectangle. Walks the
/// rectangle cell by cell when it is small, and the occupied cells otherwise,
/// so a huge query over a sparse world stays cheap.
fn for_each_cell_in<T, F>(
    cells: &rustc_hash::FxHashMap<GridCoordinate, T>,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    mut visit: F,
) where
    F: FnMut(&T),
{
    if min_x > max_x || min_y > max_y {
        return;
    }

    let width = max_x as i64 - min_x as i64 + 1;
    let height = max_y as i64 - min_y as i64 + 1;
    // A full i32 square overflows i64; anything that large is walked sparsely.
    let dense = width
        .checked_mul(height)
        .is_some_and(|area| area <= cells.len() as i64);
    if dense {
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                if let Some(bucket) = cells.get(&GridCoordinate::new(x, y)) {
                    visit(bucket);
                }
            }
        }
    } else {
        for (cell, bucket) in cells {
            if cell.x >= min_x && cell.x <= max_x && cell.y >= min_y && cell.y <= max_y {
                visit(bucket);
            }
        }
    }
}
