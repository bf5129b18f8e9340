//! CSV sink for hazard decisions.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use csv::Writer;

use tm_collision::HazardRecord;
use tm_core::Version;
use tm_world::Actor;

use crate::scenario::Vehicle;

/// Writes one `(version, actor_id, hazard)` row per vehicle per tick.
pub struct HazardWriter<W: Write> {
    writer: Writer<W>,
    rows:   u64,
}

impl HazardWriter<File> {
    pub fn create(path: &Path) -> csv::Result<Self> {
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> HazardWriter<W> {
    pub fn from_writer(inner: W) -> csv::Result<Self> {
        let mut writer = Writer::from_writer(inner);
        writer.write_record(["version", "actor_id", "hazard"])?;
        Ok(Self { writer, rows: 0 })
    }

    /// `records` is index-aligned with `vehicles`.
    pub fn write_frame(
        &mut self,
        version:  Version,
        vehicles: &[Vehicle],
        records:  &[HazardRecord],
    ) -> csv::Result<()> {
        for (vehicle, record) in vehicles.iter().zip(records) {
            self.writer.write_record(&[
                version.0.to_string(),
                vehicle.actor.id().0.to_string(),
                (record.hazard as u8).to_string(),
            ])?;
            self.rows += 1;
        }
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}
