//! End-to-end grade application flows.
//!
//! Both flows resolve the target clip before touching anything else, and
//! install any LUT before the first host mutation, so a failed write never
//! leaves a half-applied grade behind.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::apply::policy::{
    self, ApplicationRequest, LutPolicy, MISSING_LUT_MESSAGE, NodeApplicationResult,
};
use crate::error::GradeError;
use crate::grade::cdl::{BakedCdl, bake};
use crate::grade::descriptor::GradeDescriptor;
use crate::host::{ProjectHandle, ResolveHost, resolve_target};
use crate::lut::{InstalledLut, LutAsset, LutInstaller};

/// Result of a live bridge request.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveApplyOutcome {
    pub clip: String,
    pub cdl: BakedCdl,
    pub lut: InstalledLut,
    pub result: NodeApplicationResult,
}

impl LiveApplyOutcome {
    pub fn message(&self) -> String {
        format!("Applied to Node {}", self.result.node_index)
    }
}

/// Result of a file-based import.
#[derive(Debug, Clone, PartialEq)]
pub struct FileApplyOutcome {
    pub clip: String,
    pub grade_path: PathBuf,
    pub cdl: BakedCdl,
    pub lut: Option<InstalledLut>,
    pub result: NodeApplicationResult,
}

/// Live bridge flow. The payload must carry `lutContent`; the LUT is
/// installed as the live-preview asset and applied with no CDL fallback.
pub fn apply_live_grade(
    host: &mut dyn ResolveHost,
    installer: &dyn LutInstaller,
    payload: &Value,
) -> Result<LiveApplyOutcome, GradeError> {
    let target = resolve_target(host)?;
    let grade = GradeDescriptor::from_payload(payload)?;

    tracing::info!(clip = %target.name, "Applying Vibe");
    let cdl = bake(&grade);
    tracing::debug!(?cdl, contrast = grade.contrast, pivot = grade.pivot, "Baked grade");

    let content = match payload.get("lutContent") {
        None | Some(Value::Null) => "",
        Some(Value::String(text)) => text.as_str(),
        Some(other) => {
            return Err(GradeError::Computation(format!(
                "'lutContent' must be .cube text, got {other}"
            )));
        }
    };
    let asset = LutAsset::live_preview(content)
        .ok_or_else(|| GradeError::Validation(MISSING_LUT_MESSAGE.into()))?;

    let lut = installer.install(&asset)?;
    refresh_catalog(host, &target.project)?;

    let result = policy::apply(
        host,
        &ApplicationRequest {
            item: &target.item,
            lut: Some(&lut),
            cdl: &cdl,
            lut_policy: LutPolicy::Required,
        },
    )?;

    Ok(LiveApplyOutcome {
        clip: target.name,
        cdl,
        lut,
        result,
    })
}

/// File import flow. A `.cube` sibling of the grade file is installed and
/// preferred; without one, or if the host rejects it, CDL is applied.
pub fn apply_file_grade(
    host: &mut dyn ResolveHost,
    installer: &dyn LutInstaller,
    grade_path: &Path,
) -> Result<FileApplyOutcome, GradeError> {
    let target = resolve_target(host)?;
    let grade = load_grade_file(grade_path)?;

    tracing::info!(clip = %target.name, "Applying Vibe");
    tracing::info!(contrast = grade.contrast, pivot = grade.pivot, "Baking contrast");
    let cdl = bake(&grade);

    let lut = match LutAsset::sibling_of(grade_path)? {
        Some(asset) => {
            let installed = installer.install(&asset)?;
            refresh_catalog(host, &target.project)?;
            Some(installed)
        }
        None => None,
    };

    let result = policy::apply(
        host,
        &ApplicationRequest {
            item: &target.item,
            lut: lut.as_ref(),
            cdl: &cdl,
            lut_policy: LutPolicy::Preferred,
        },
    )?;

    Ok(FileApplyOutcome {
        clip: target.name,
        grade_path: grade_path.to_path_buf(),
        cdl,
        lut,
        result,
    })
}

/// Read and validate a grade blueprint file.
pub fn load_grade_file(path: &Path) -> Result<GradeDescriptor, GradeError> {
    let text = fs::read_to_string(path).map_err(|e| GradeError::io(path, e))?;
    let payload: Value = serde_json::from_str(&text).map_err(|e| {
        GradeError::Validation(format!("Error reading JSON {}: {e}", path.display()))
    })?;
    GradeDescriptor::from_payload(&payload)
}

fn refresh_catalog(host: &mut dyn ResolveHost, project: &ProjectHandle) -> Result<(), GradeError> {
    if !host.refresh_lut_catalog(project)? {
        // The LUT may still resolve if the host already indexed the path.
        tracing::warn!("Host did not confirm LUT list refresh");
    }
    Ok(())
}
