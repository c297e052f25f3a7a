//! Console lines printed per imported file.
use std::io::{self, Write};

use crate::config::ApiKey;
use crate::importer::{Cleanup, ImportFailure, Imported, ZoneSource, import_zone};
use crate::remote::ZoneApi;

// Lazy colors
pub fn green(s: &str) -> String {
    format!("\x1b[0;32m{s}\x1b[0;m")
}

pub fn red(s: &str) -> String {
    format!("\x1b[0;31m{s}\x1b[0;m")
}

pub fn yellow(s: &str) -> String {
    format!("\x1b[0;33m{s}\x1b[0;m")
}

/// Printed (without newline) before the remote calls start.
pub fn status_line(source: &ZoneSource) -> String {
    format!("* {} ({} line(s)) ", source.name(), source.line_count())
}

pub fn success_line(imported: &Imported) -> String {
    format!(
        "{} (id={}, {} records)",
        green("OK"),
        imported.zone_id,
        imported.records
    )
}

pub fn failure_line(failure: &ImportFailure) -> String {
    format!("{} {}", red("FAILED"), failure.error)
}

/// Extra line when the rollback itself did not go through.
pub fn cleanup_warning(failure: &ImportFailure) -> Option<String> {
    match (&failure.cleanup, failure.zone_id) {
        (Cleanup::Failed(err), Some(zone)) => Some(format!(
            "  {} zone {} may be left half-configured ({} failed, delete failed: {})",
            yellow("WARNING"),
            zone,
            failure.step,
            err
        )),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub imported: usize,
    pub failed: usize,
}

impl Summary {
    pub fn record<T, E>(&mut self, outcome: &Result<T, E>) {
        match outcome {
            Ok(_) => self.imported += 1,
            Err(_) => self.failed += 1,
        }
    }

    pub fn line(&self) -> String {
        format!("{} zone(s) imported, {} failed", self.imported, self.failed)
    }
}

/// Imports every source in order, writing the per-file lines to `out`.
/// A failed file never stops the ones after it.
pub async fn import_and_report<A, W>(
    api: &A,
    key: &ApiKey,
    sources: &[ZoneSource],
    out: &mut W,
) -> io::Result<Summary>
where
    A: ZoneApi + ?Sized,
    W: Write,
{
    let mut summary = Summary::default();
    for source in sources {
        write!(out, "{}", status_line(source))?;
        out.flush()?;

        let outcome = import_zone(api, key, source).await;
        match &outcome {
            Ok(imported) => writeln!(out, "{}", success_line(imported))?,
            Err(failure) => {
                writeln!(out, "{}", failure_line(failure))?;
                if let Some(warning) = cleanup_warning(failure) {
                    writeln!(out, "{warning}")?;
                }
            }
        }
        summary.record(&outcome);
    }
    Ok(summary)
}
