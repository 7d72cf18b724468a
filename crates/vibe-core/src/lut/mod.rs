//! LUT assets: where `.cube` text lands on disk and how the host addresses it.
//!
//! LUT content is produced elsewhere (the client owns the sampling math) and
//! is carried here as an opaque string. This module only installs it under
//! the `VibeEngine` namespace of the host's LUT directory.

pub mod cube;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GradeError;

/// Sub-directory of the host LUT root that holds every installed asset.
pub const NAMESPACE: &str = "VibeEngine";
/// Sub-directory of [`NAMESPACE`] for live-preview assets.
pub const LIVE_PREVIEW_DIR: &str = "Temp";
/// File name reused (and overwritten) by every live-preview request.
pub const LIVE_PREVIEW_FILE: &str = "Vibe_Live_Preview.cube";

/// Install location class for a LUT asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutScope {
    /// `VibeEngine/<name>`, from file-based imports.
    Library,
    /// `VibeEngine/Temp/<name>`, overwritten by each live request.
    LivePreview,
}

impl LutScope {
    fn segments(self) -> &'static [&'static str] {
        match self {
            Self::Library => &[NAMESPACE],
            Self::LivePreview => &[NAMESPACE, LIVE_PREVIEW_DIR],
        }
    }
}

/// `.cube` text paired with its install name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LutAsset {
    pub file_name: String,
    pub content: String,
    pub scope: LutScope,
}

impl LutAsset {
    /// The fixed live-preview asset. Empty content counts as absent.
    pub fn live_preview(content: &str) -> Option<Self> {
        (!content.is_empty()).then(|| Self {
            file_name: LIVE_PREVIEW_FILE.to_string(),
            content: content.to_string(),
            scope: LutScope::LivePreview,
        })
    }

    /// Read the `.cube` sibling of a grade file (`look.json` → `look.cube`).
    ///
    /// Returns `Ok(None)` when no sibling exists; a sibling that exists but
    /// cannot be read is an I/O error.
    pub fn sibling_of(grade_path: &Path) -> Result<Option<Self>, GradeError> {
        let lut_path = grade_path.with_extension("cube");
        if !lut_path.is_file() {
            tracing::warn!(path = %lut_path.display(), "LUT file not found");
            return Ok(None);
        }

        let file_name = lut_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                GradeError::Validation(format!("invalid LUT path {}", lut_path.display()))
            })?;
        let content = fs::read_to_string(&lut_path).map_err(|e| GradeError::io(&lut_path, e))?;

        Ok(Some(Self {
            file_name,
            content,
            scope: LutScope::Library,
        }))
    }

    /// Host-side address: forward-slash path relative to the LUT root.
    pub fn relative_path(&self) -> String {
        let mut parts: Vec<&str> = self.scope.segments().to_vec();
        parts.push(&self.file_name);
        parts.join("/")
    }
}

/// Where an asset was written and how the host should refer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledLut {
    pub installed_path: PathBuf,
    pub relative_path: String,
}

/// Writes LUT assets where the host can find them.
pub trait LutInstaller: Send + Sync {
    fn install(&self, asset: &LutAsset) -> Result<InstalledLut, GradeError>;
}

/// Installs into a directory tree rooted at the host's LUT folder.
#[derive(Debug, Clone)]
pub struct FsLutInstaller {
    root: PathBuf,
}

impl FsLutInstaller {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LutInstaller for FsLutInstaller {
    fn install(&self, asset: &LutAsset) -> Result<InstalledLut, GradeError> {
        let dir = asset
            .scope
            .segments()
            .iter()
            .fold(self.root.clone(), |dir, seg| dir.join(seg));
        fs::create_dir_all(&dir).map_err(|e| GradeError::io(&dir, e))?;

        let installed_path = dir.join(&asset.file_name);
        fs::write(&installed_path, &asset.content)
            .map_err(|e| GradeError::io(&installed_path, e))?;

        let summary = cube::CubeSummary::scan(&asset.content);
        tracing::info!(
            path = %installed_path.display(),
            title = summary.title.as_deref().unwrap_or("-"),
            kind = %summary.kind,
            entries = summary.entries,
            complete = summary.is_complete(),
            "Installed LUT"
        );

        Ok(InstalledLut {
            installed_path,
            relative_path: asset.relative_path(),
        })
    }
}
