use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::sim::ReadoutLog;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing logged yet")]
    EmptyLog,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Write the readout history as CSV: one row per recompute, oldest first.
pub fn write_readout_csv(log: &ReadoutLog, path: &Path) -> Result<(), ExportError> {
    if log.is_empty() {
        return Err(ExportError::EmptyLog);
    }
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "time_s,reynolds,avg_velocity_ms,dynamic_pressure_kpa")?;
    for (t, r) in log.iter() {
        writeln!(
            out,
            "{:.3},{},{:.2},{:.3}",
            t, r.reynolds as i64, r.avg_velocity, r.dynamic_pressure
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Dump an RGBA frame as binary PPM (P6). Alpha is dropped.
pub fn write_frame_ppm(
    rgba: &[u8],
    width: usize,
    height: usize,
    path: &Path,
) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "P6\n{} {}\n255\n", width, height)?;
    for pixel in rgba.chunks_exact(4).take(width * height) {
        out.write_all(&pixel[..3])?;
    }
    out.flush()?;
    Ok(())
}
