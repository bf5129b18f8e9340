//! The vicinity grid.
//!
//! # Data layout
//!
//! The ground plane is cut into square cells of `cell_size` metres.  Two
//! hash maps are kept in sync:
//!
//! ```text
//! cells:   CellKey → { ActorId, … }      (only non-empty cells are stored)
//! members: ActorId → (CellKey, Location) (where each id was last bucketed)
//! ```
//!
//! `update` and `erase` touch at most two cells, so both are O(1) amortised.
//! A neighbor query covers the `(2r + 1)²` cells whose squares can hold a
//! point within `search_radius` of the query, where `r = ⌈radius / cell⌉`,
//! then filters each occupant by its stored location.  When that window is
//! larger than the number of occupied cells the query walks the occupied
//! cells instead, so its cost is `min((2r + 1)², occupied)` lookups.

use rustc_hash::{FxHashMap, FxHashSet};

use tm_core::{ActorId, CollisionConfig, Location};

use crate::{SpatialError, SpatialResult};

// ── CellKey ───────────────────────────────────────────────────────────────────

/// Integer coordinates of one grid cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
}

impl CellKey {
    #[inline]
    fn of(location: Location, cell_size: f64) -> Self {
        Self {
            x: (location.x / cell_size).floor() as i32,
            y: (location.y / cell_size).floor() as i32,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Member {
    cell:     CellKey,
    location: Location,
}

// ── VicinityGrid ──────────────────────────────────────────────────────────────

/// Uniform hash grid answering "which actors are near this point".
///
/// The grid is long-lived: it is mutated incrementally every tick and never
/// rebuilt.  It is not internally synchronised; the collision stage mutates
/// it only during its single-writer maintenance step and shares it
/// read-only with the workers afterwards.
pub struct VicinityGrid {
    cell_size:     f64,
    search_radius: f64,
    /// Cells on each side of the query cell that can intersect the radius.
    ring:          i32,
    cells:         FxHashMap<CellKey, FxHashSet<ActorId>>,
    members:       FxHashMap<ActorId, Member>,
}

impl VicinityGrid {
    /// Create an empty grid.
    ///
    /// # Errors
    ///
    /// [`SpatialError::InvalidConfig`] if either length is not a positive
    /// finite number, or if the radius spans more than
    /// [`CollisionConfig::MAX_CELLS_PER_RADIUS`] cells.
    pub fn new(cell_size: f64, search_radius: f64) -> SpatialResult<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SpatialError::InvalidConfig("cell_size must be positive"));
        }
        if !(search_radius.is_finite() && search_radius > 0.0) {
            return Err(SpatialError::InvalidConfig("search_radius must be positive"));
        }
        if search_radius / cell_size > CollisionConfig::MAX_CELLS_PER_RADIUS {
            return Err(SpatialError::InvalidConfig("cell_size is too small for search_radius"));
        }
        Ok(Self {
            cell_size,
            search_radius,
            ring: (search_radius / cell_size).ceil() as i32,
            cells: FxHashMap::default(),
            members: FxHashMap::default(),
        })
    }

    /// Grid sized from the collision configuration.
    pub fn from_config(config: &CollisionConfig) -> SpatialResult<Self> {
        Self::new(config.grid_cell_size, config.search_radius)
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Record `id` at `location`, moving it between cells if needed.
    ///
    /// Returns `true` if the id was inserted or changed cell, `false` if it
    /// stayed in the same cell (only the stored location is refreshed).
    ///
    /// # Errors
    ///
    /// [`SpatialError::NonFiniteLocation`]; the grid is left untouched.
    pub fn update(&mut self, id: ActorId, location: Location) -> SpatialResult<bool> {
        if !location.is_finite() {
            return Err(SpatialError::NonFiniteLocation(id));
        }
        let cell = CellKey::of(location, self.cell_size);

        match self.members.insert(id, Member { cell, location }) {
            Some(previous) if previous.cell == cell => Ok(false),
            Some(previous) => {
                self.remove_from_cell(previous.cell, id);
                self.cells.entry(cell).or_default().insert(id);
                Ok(true)
            }
            None => {
                self.cells.entry(cell).or_default().insert(id);
                Ok(true)
            }
        }
    }

    /// Remove every trace of `id`.  Returns `false` if it was not present.
    pub fn erase(&mut self, id: ActorId) -> bool {
        match self.members.remove(&id) {
            Some(member) => {
                self.remove_from_cell(member.cell, id);
                true
            }
            None => false,
        }
    }

    fn remove_from_cell(&mut self, cell: CellKey, id: ActorId) {
        if let Some(occupants) = self.cells.get_mut(&cell) {
            occupants.remove(&id);
            if occupants.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Ids whose last recorded location lies within `search_radius` of
    /// `location` on the ground plane.
    ///
    /// The result includes the querying actor's own id when it is in the
    /// grid; callers filter it out.  Iteration order is unspecified.
    pub fn neighbors(&self, location: Location) -> FxHashSet<ActorId> {
        let mut found = FxHashSet::default();
        if !location.is_finite() {
            return found;
        }
        let centre    = CellKey::of(location, self.cell_size);
        let radius_sq = self.search_radius * self.search_radius;
        let mut collect = |occupants: &FxHashSet<ActorId>| {
            found.extend(occupants.iter().copied().filter(|id| {
                self.members
                    .get(id)
                    .is_some_and(|m| m.location.distance_squared_2d(location) <= radius_sq)
            }));
        };

        if self.window_cells() > self.cells.len() {
            let ring = i64::from(self.ring);
            for (key, occupants) in &self.cells {
                let dx = (i64::from(key.x) - i64::from(centre.x)).abs();
                let dy = (i64::from(key.y) - i64::from(centre.y)).abs();
                if dx <= ring && dy <= ring {
                    collect(occupants);
                }
            }
        } else {
            for dx in -self.ring..=self.ring {
                for dy in -self.ring..=self.ring {
                    let key = CellKey { x: centre.x.saturating_add(dx), y: centre.y.saturating_add(dy) };
                    if let Some(occupants) = self.cells.get(&key) {
                        collect(occupants);
                    }
                }
            }
        }
        found
    }

    /// Cells in the square window around a query cell.
    fn window_cells(&self) -> usize {
        let side = 2 * self.ring as usize + 1;
        side * side
    }

    /// Cell lookups one neighbor query performs with the current occupancy.
    pub fn query_cost(&self) -> usize {
        self.window_cells().min(self.cells.len())
    }

    /// Neighbors of an id already in the grid, measured from its recorded
    /// location.  Empty if `id` is unknown.
    pub fn neighbors_of(&self, id: ActorId) -> FxHashSet<ActorId> {
        match self.members.get(&id) {
            Some(member) => self.neighbors(member.location),
            None         => FxHashSet::default(),
        }
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn contains(&self, id: ActorId) -> bool {
        self.members.contains_key(&id)
    }

    /// The cell `id` is currently bucketed in.
    pub fn cell_of(&self, id: ActorId) -> Option<CellKey> {
        self.members.get(&id).map(|m| m.cell)
    }

    /// Iterator over every id in the grid.
    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.members.keys().copied()
    }

    /// Number of ids in the grid.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn search_radius(&self) -> f64 {
        self.search_radius
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }
}
