//! One-shot import of a grade blueprint file into the selected clip.

use std::path::PathBuf;

use vibe_core::apply::workflow::{FileApplyOutcome, apply_file_grade};
use vibe_core::host::resolve_target;
use vibe_core::{GradeError, HostSession, LutInstaller};

/// How an import ended, short of an error.
#[derive(Debug)]
pub enum ImportOutcome {
    Applied(FileApplyOutcome),
    /// The user closed the picker without choosing a file.
    Cancelled,
}

/// Connect, check the clip selection, then ask `pick` for the grade file.
///
/// The clip is checked before the picker opens so the user is told to
/// select a clip instead of choosing a file that cannot be applied. The
/// session lock is not held while the picker is open.
pub fn run_import(
    session: &mut HostSession,
    installer: &dyn LutInstaller,
    pick: impl FnOnce() -> Option<PathBuf>,
) -> Result<ImportOutcome, GradeError> {
    let target = session.with_host(|host| resolve_target(host))?;
    tracing::debug!(clip = %target.name, "Clip selected");

    tracing::info!("Waiting for file selection...");
    let Some(path) = pick() else {
        return Ok(ImportOutcome::Cancelled);
    };
    session
        .with_host(|host| apply_file_grade(host, installer, &path))
        .map(ImportOutcome::Applied)
}

/// Native file dialog for a grade blueprint.
pub fn pick_blueprint() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select Vibe Blueprint")
        .add_filter("JSON Files", &["json"])
        .pick_file()
}

/// One-line summary for the terminal.
pub fn describe(outcome: &FileApplyOutcome) -> String {
    let via = match &outcome.lut {
        Some(lut) if outcome.result.skipped_cdl => format!("LUT {}", lut.relative_path),
        _ => "CDL".to_string(),
    };
    format!(
        "Applied {via} to '{}' on Node {}",
        outcome.clip, outcome.result.node_index
    )
}
