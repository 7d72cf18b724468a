//! In-memory host for offline runs and tests.
//!
//! Every call is recorded in a shared [`CallLog`] so the log survives the
//! host being boxed into a session.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::GradeError;
use crate::grade::cdl::CdlParameterMap;
use crate::host::{
    HostApi, HostConnector, ItemHandle, ProjectHandle, ResolveHost, TimelineHandle,
};

/// One recorded host mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    RefreshLutCatalog,
    SetLut {
        node_index: u32,
        relative_path: String,
        accepted: bool,
    },
    SetCdl {
        params: CdlParameterMap,
        accepted: bool,
    },
}

/// Shared, cloneable record of host calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<HostCall>>>);

impl CallLog {
    fn push(&self, call: HostCall) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.0.lock().clone()
    }

    pub fn set_lut_calls(&self) -> Vec<(u32, String, bool)> {
        self.0
            .lock()
            .iter()
            .filter_map(|c| match c {
                HostCall::SetLut {
                    node_index,
                    relative_path,
                    accepted,
                } => Some((*node_index, relative_path.clone(), *accepted)),
                _ => None,
            })
            .collect()
    }

    pub fn set_cdl_calls(&self) -> Vec<(CdlParameterMap, bool)> {
        self.0
            .lock()
            .iter()
            .filter_map(|c| match c {
                HostCall::SetCdl { params, accepted } => Some((params.clone(), *accepted)),
                _ => None,
            })
            .collect()
    }

    pub fn refresh_count(&self) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|c| matches!(c, HostCall::RefreshLutCatalog))
            .count()
    }
}

/// Scripted host. Accepts everything on every node unless told otherwise.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    api: HostApi,
    project: Option<String>,
    timeline: Option<String>,
    clip: Option<String>,
    rejected_lut_nodes: HashSet<u32>,
    rejected_cdl_nodes: HashSet<u32>,
    log: CallLog,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            api: HostApi::NodeIndexed,
            project: Some("Offline Project".to_string()),
            timeline: Some("Timeline 1".to_string()),
            clip: Some("Clip 1".to_string()),
            rejected_lut_nodes: HashSet::new(),
            rejected_cdl_nodes: HashSet::new(),
            log: CallLog::default(),
        }
    }

    pub fn with_api(mut self, api: HostApi) -> Self {
        self.api = api;
        self
    }

    pub fn with_clip_name(mut self, name: &str) -> Self {
        self.clip = Some(name.to_string());
        self
    }

    pub fn without_project(mut self) -> Self {
        self.project = None;
        self
    }

    pub fn without_timeline(mut self) -> Self {
        self.timeline = None;
        self
    }

    pub fn without_clip(mut self) -> Self {
        self.clip = None;
        self
    }

    pub fn reject_lut_on(mut self, nodes: &[u32]) -> Self {
        self.rejected_lut_nodes.extend(nodes);
        self
    }

    pub fn reject_cdl_on(mut self, nodes: &[u32]) -> Self {
        self.rejected_cdl_nodes.extend(nodes);
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl ResolveHost for MemoryHost {
    fn api(&self) -> HostApi {
        self.api
    }

    fn current_project(&mut self) -> Result<Option<ProjectHandle>, GradeError> {
        Ok(self.project.clone().map(ProjectHandle))
    }

    fn current_timeline(
        &mut self,
        _project: &ProjectHandle,
    ) -> Result<Option<TimelineHandle>, GradeError> {
        Ok(self.timeline.clone().map(TimelineHandle))
    }

    fn current_video_item(
        &mut self,
        _timeline: &TimelineHandle,
    ) -> Result<Option<ItemHandle>, GradeError> {
        Ok(self.clip.clone().map(ItemHandle))
    }

    fn item_name(&mut self, item: &ItemHandle) -> Result<String, GradeError> {
        Ok(item.0.clone())
    }

    fn refresh_lut_catalog(&mut self, _project: &ProjectHandle) -> Result<bool, GradeError> {
        self.log.push(HostCall::RefreshLutCatalog);
        Ok(true)
    }

    fn set_lut(
        &mut self,
        _item: &ItemHandle,
        node_index: u32,
        relative_path: &str,
    ) -> Result<bool, GradeError> {
        let accepted = !self.rejected_lut_nodes.contains(&node_index);
        self.log.push(HostCall::SetLut {
            node_index,
            relative_path: relative_path.to_string(),
            accepted,
        });
        Ok(accepted)
    }

    fn set_cdl(
        &mut self,
        _item: &ItemHandle,
        params: &CdlParameterMap,
    ) -> Result<bool, GradeError> {
        let accepted = params
            .node_index
            .parse::<u32>()
            .is_ok_and(|n| !self.rejected_cdl_nodes.contains(&n));
        self.log.push(HostCall::SetCdl {
            params: params.clone(),
            accepted,
        });
        Ok(accepted)
    }
}

/// Hands out clones of a template [`MemoryHost`], all sharing one call log.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    template: MemoryHost,
    reachable: Arc<Mutex<bool>>,
}

impl MemoryConnector {
    pub fn new(template: MemoryHost) -> Self {
        Self {
            template,
            reachable: Arc::new(Mutex::new(true)),
        }
    }

    /// A connector whose host is not running.
    pub fn unreachable(template: MemoryHost) -> Self {
        let connector = Self::new(template);
        connector.set_reachable(false);
        connector
    }

    pub fn set_reachable(&self, reachable: bool) {
        *self.reachable.lock() = reachable;
    }
}

impl HostConnector for MemoryConnector {
    fn connect(&self) -> Result<Box<dyn ResolveHost>, GradeError> {
        if !*self.reachable.lock() {
            return Err(GradeError::Connection("in-memory host is offline".into()));
        }
        Ok(Box::new(self.template.clone()))
    }
}
