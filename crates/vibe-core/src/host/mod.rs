//! Host capability surface.
//!
//! The grading host (DaVinci Resolve) is reached through its scripting
//! object model. [`ResolveHost`] is the small slice of it this crate needs:
//! walk project → timeline → clip, refresh the LUT catalog, and push a LUT
//! or a CDL onto a node. Absence of an item (`Ok(None)`) is distinct from an
//! explicit rejection (`Ok(false)`); transport failures are `Err`.

pub mod memory;
pub mod script;
pub mod session;

use serde::{Deserialize, Serialize};

use crate::error::GradeError;
use crate::grade::cdl::CdlParameterMap;

/// Node the policy tries first: the grade node after an input CST node.
pub const PRIMARY_NODE: u32 = 2;
/// Fallback node when the primary node is rejected.
pub const SECONDARY_NODE: u32 = 1;

/// Host scripting API flavour, resolved once when connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostApi {
    /// `SetLUT(nodeIndex, path)`.
    NodeIndexed,
    /// Legacy `SetLUT(path)`; only the clip's first node is addressable.
    SingleArgument,
}

impl HostApi {
    /// Node indices to attempt, in order.
    pub const fn node_plan(self) -> &'static [u32] {
        match self {
            Self::NodeIndexed => &[PRIMARY_NODE, SECONDARY_NODE],
            Self::SingleArgument => &[SECONDARY_NODE],
        }
    }
}

/// Opaque reference to a host project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectHandle(pub String);

/// Opaque reference to a host timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineHandle(pub String);

/// Opaque reference to a timeline video item (clip).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemHandle(pub String);

/// Capabilities consumed from the grading host.
pub trait ResolveHost: Send {
    fn api(&self) -> HostApi;

    fn current_project(&mut self) -> Result<Option<ProjectHandle>, GradeError>;

    fn current_timeline(
        &mut self,
        project: &ProjectHandle,
    ) -> Result<Option<TimelineHandle>, GradeError>;

    fn current_video_item(
        &mut self,
        timeline: &TimelineHandle,
    ) -> Result<Option<ItemHandle>, GradeError>;

    fn item_name(&mut self, item: &ItemHandle) -> Result<String, GradeError>;

    fn refresh_lut_catalog(&mut self, project: &ProjectHandle) -> Result<bool, GradeError>;

    fn set_lut(
        &mut self,
        item: &ItemHandle,
        node_index: u32,
        relative_path: &str,
    ) -> Result<bool, GradeError>;

    fn set_cdl(&mut self, item: &ItemHandle, params: &CdlParameterMap)
    -> Result<bool, GradeError>;
}

/// Opens connections to the host.
pub trait HostConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn ResolveHost>, GradeError>;
}

/// The clip a grade will be applied to, with its owning project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipTarget {
    pub project: ProjectHandle,
    pub item: ItemHandle,
    pub name: String,
}

/// Walk project → timeline → current clip.
pub fn resolve_target(host: &mut dyn ResolveHost) -> Result<ClipTarget, GradeError> {
    use crate::error::MissingSelection;

    let project = host
        .current_project()?
        .ok_or(GradeError::State(MissingSelection::Project))?;
    let timeline = host
        .current_timeline(&project)?
        .ok_or(GradeError::State(MissingSelection::Timeline))?;
    let item = host
        .current_video_item(&timeline)?
        .ok_or(GradeError::State(MissingSelection::Clip))?;
    let name = host.item_name(&item)?;

    Ok(ClipTarget {
        project,
        item,
        name,
    })
}
