//! Error taxonomy shared by every grade application path.

use std::fmt;
use std::path::PathBuf;

/// Which representation of a grade was being pushed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Lut,
    Cdl,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lut => write!(f, "LUT"),
            Self::Cdl => write!(f, "CDL"),
        }
    }
}

/// The piece of host state that was missing when resolving the target clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSelection {
    Project,
    Timeline,
    Clip,
}

impl fmt::Display for MissingSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "No active project in DaVinci Resolve"),
            Self::Timeline => write!(f, "No active timeline in DaVinci Resolve"),
            Self::Clip => write!(f, "No clip selected. Please select a clip in the Color page."),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GradeError {
    #[error("Could not connect to DaVinci Resolve: {0}")]
    Connection(String),

    #[error("{0}")]
    State(MissingSelection),

    #[error("{0}")]
    Validation(String),

    #[error("Could not set {representation} on Node {}", join_nodes(.nodes))]
    HostRejection {
        representation: Representation,
        /// Node indices that were attempted, in attempt order.
        nodes: Vec<u32>,
    },

    #[error("LUT I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("grade computation failed: {0}")]
    Computation(String),
}

/// Coarse classification used by callers that map errors onto a transport
/// (HTTP status codes, process exit codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeErrorKind {
    Connection,
    State,
    Validation,
    HostRejection,
    Io,
    Computation,
}

impl GradeError {
    pub const fn kind(&self) -> GradeErrorKind {
        match self {
            Self::Connection(_) => GradeErrorKind::Connection,
            Self::State(_) => GradeErrorKind::State,
            Self::Validation(_) => GradeErrorKind::Validation,
            Self::HostRejection { .. } => GradeErrorKind::HostRejection,
            Self::Io { .. } => GradeErrorKind::Io,
            Self::Computation(_) => GradeErrorKind::Computation,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Formats attempted nodes ascending, e.g. `[2, 1]` as `"1 or 2"`.
fn join_nodes(nodes: &[u32]) -> String {
    let mut sorted = nodes.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_lists_nodes_ascending() {
        let err = GradeError::HostRejection {
            representation: Representation::Lut,
            nodes: vec![2, 1],
        };
        assert_eq!(err.to_string(), "Could not set LUT on Node 1 or 2");
        assert_eq!(err.kind(), GradeErrorKind::HostRejection);
    }

    #[test]
    fn test_state_error_carries_actionable_message() {
        let err = GradeError::State(MissingSelection::Clip);
        assert_eq!(
            err.to_string(),
            "No clip selected. Please select a clip in the Color page."
        );
    }
}
