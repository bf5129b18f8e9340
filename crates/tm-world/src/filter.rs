//! Actor type-id filters.
//!
//! The backend's blueprint ids are dotted paths (`vehicle.audi.tt`,
//! `walker.pedestrian.0001`).  A filter is either an exact id, a prefix
//! ending in `*`, or `*` alone for everything.

/// A compiled type-id glob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActorFilter {
    /// Matches every actor.
    Any,
    /// Matches type ids starting with the stored prefix.
    Prefix(String),
    /// Matches exactly one type id.
    Exact(String),
}

impl ActorFilter {
    /// Parse a pattern.  Only a single trailing `*` is treated as a wildcard.
    pub fn new(pattern: &str) -> Self {
        match pattern {
            "" | "*" => ActorFilter::Any,
            p => match p.strip_suffix('*') {
                Some(prefix) => ActorFilter::Prefix(prefix.to_string()),
                None         => ActorFilter::Exact(p.to_string()),
            },
        }
    }

    pub fn matches(&self, type_id: &str) -> bool {
        match self {
            ActorFilter::Any            => true,
            ActorFilter::Prefix(prefix) => type_id.starts_with(prefix.as_str()),
            ActorFilter::Exact(id)      => type_id == id,
        }
    }
}

impl Default for ActorFilter {
    fn default() -> Self {
        ActorFilter::new("vehicle.*")
    }
}
