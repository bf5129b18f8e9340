//! Collision-stage configuration.
//!
//! Typically built with `CollisionConfig::default()` and tweaked, or loaded
//! from a TOML file by the application (enable the `serde` feature).

use std::time::Duration;

use crate::{TmError, TmResult};

/// Tuning constants for hazard detection.
///
/// The defaults are the reference values the negotiation rule was tuned
/// with; changing them changes which vehicle yields.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CollisionConfig {
    /// Radius (m) around an ego actor within which others are negotiated.
    pub search_radius: f64,

    /// Actors whose elevations differ by at least this much (m) never
    /// interact (overpasses, stacked ramps).
    pub vertical_overlap_threshold: f64,

    /// Intersection sub-regions at or below this area (m²) are treated as
    /// touching, not overlapping.
    pub zero_area: f64,

    /// Lower bound (m) for each term of the corridor length.
    pub boundary_extension_minimum: f64,

    /// `k` in the `sqrt(k · v)` corridor term.
    pub extension_square_point: f64,

    /// Seconds of travel covered by the `v · T` corridor term.
    pub time_horizon: f64,

    /// Speed (m/s) above which the corridor switches to the highway horizon.
    pub highway_speed: f64,

    /// Seconds of travel covered by the corridor at highway speed.
    pub highway_time_horizon: f64,

    /// Minimum wall-clock time between two world scans for unregistered
    /// actors.
    #[cfg_attr(feature = "serde", serde(with = "duration_secs"))]
    pub discovery_interval: Duration,

    /// Edge length (m) of one vicinity-grid cell.
    pub grid_cell_size: f64,

    /// Type filter applied to world actors during discovery.
    pub actor_filter: String,

    /// Draw each ego's corridor through the debug-draw collaborator.
    pub draw_boundaries: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            search_radius:              20.0,
            vertical_overlap_threshold: 2.0,
            zero_area:                  1e-4,
            boundary_extension_minimum: 1.5,
            extension_square_point:     7.0,
            time_horizon:               0.5,
            highway_speed:              50.0 / 3.6,
            highway_time_horizon:       5.0,
            discovery_interval:         Duration::from_millis(500),
            grid_cell_size:             10.0,
            actor_filter:               "vehicle.*".to_string(),
            draw_boundaries:            false,
        }
    }
}

impl CollisionConfig {
    /// Upper bound on `search_radius / grid_cell_size`.  A neighbor query
    /// scans up to `(2·n + 1)²` cells for a ratio of `n`.
    pub const MAX_CELLS_PER_RADIUS: f64 = 256.0;

    /// Corridor length (m) for an actor moving at `speed` m/s.
    ///
    /// `max(m, sqrt(k·v)) + max(m, v·T) + m`, replaced by `v · T_highway`
    /// above highway speed.
    pub fn corridor_length(&self, speed: f64) -> f64 {
        if speed > self.highway_speed {
            return self.highway_time_horizon * speed;
        }
        let min = self.boundary_extension_minimum;
        (self.extension_square_point * speed).sqrt().max(min)
            + (speed * self.time_horizon).max(min)
            + min
    }

    /// Check every field for values the stage cannot work with.
    pub fn validate(&self) -> TmResult<()> {
        fn positive(name: &str, v: f64) -> TmResult<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(TmError::Config(format!("{name} must be positive and finite, got {v}")))
            }
        }
        fn non_negative(name: &str, v: f64) -> TmResult<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(TmError::Config(format!("{name} must be non-negative and finite, got {v}")))
            }
        }

        positive("search_radius", self.search_radius)?;
        positive("grid_cell_size", self.grid_cell_size)?;
        positive("vertical_overlap_threshold", self.vertical_overlap_threshold)?;
        non_negative("zero_area", self.zero_area)?;
        non_negative("boundary_extension_minimum", self.boundary_extension_minimum)?;
        non_negative("extension_square_point", self.extension_square_point)?;
        non_negative("time_horizon", self.time_horizon)?;
        non_negative("highway_speed", self.highway_speed)?;
        non_negative("highway_time_horizon", self.highway_time_horizon)?;

        let span = self.search_radius / self.grid_cell_size;
        if span > Self::MAX_CELLS_PER_RADIUS {
            return Err(TmError::Config(format!(
                "grid_cell_size {} is too small for search_radius {} (at most {} cells per radius)",
                self.grid_cell_size, self.search_radius, Self::MAX_CELLS_PER_RADIUS
            )));
        }

        if self.actor_filter.is_empty() {
            return Err(TmError::Config("actor_filter must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
