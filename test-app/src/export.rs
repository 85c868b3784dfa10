// CSV logging of peak measurements taken by the `poll` command.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use tinysa::{Peak, dbm_to_dbuv};

const HEADER: [&str; 4] = ["timestamp", "dBm", "dBµV", "freq_Hz"];

/// File name for an export started at `at`.
pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("tinysa_export_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Append-only CSV log, one row per peak, flushed after every row.
pub struct PeakLog<W: Write> {
    writer: csv::Writer<W>,
}

impl PeakLog<File> {
    /// Create a new export file in `dir`, named after the current time.
    pub fn create(dir: &Path) -> Result<(Self, PathBuf)> {
        let path = dir.join(export_file_name(Local::now()));
        let file = File::create(&path)
            .with_context(|| format!("failed to create CSV file at {}", path.display()))?;
        Ok((Self::from_writer(file)?, path))
    }
}

impl<W: Write> PeakLog<W> {
    /// Start a log on `out`, writing the header row.
    pub fn from_writer(out: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(HEADER).context("failed to write CSV header")?;
        writer.flush().context("failed to flush CSV header")?;
        Ok(PeakLog { writer })
    }

    /// Append one measurement.
    pub fn append(&mut self, at: DateTime<Local>, peak: &Peak) -> Result<()> {
        self.writer
            .write_record([
                at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
                format!("{:.2}", peak.dbm),
                format!("{:.2}", dbm_to_dbuv(peak.dbm)),
                format!("{}", peak.freq_hz.trunc() as i64),
            ])
            .context("failed to write CSV row")?;
        self.writer.flush().context("failed to flush CSV row")
    }
}
