//! Vibe Core: grade baking and host application for DaVinci Resolve.
//!
//! Converts artist-facing primary grades into the representations a grading
//! host understands (a CDL tuple or an installed `.cube` LUT) and decides
//! which one to apply to which node. The host itself is an abstract
//! capability; see [`host::ResolveHost`].

pub mod apply;
pub mod error;
pub mod grade;
pub mod host;
pub mod lut;

// Re-exports for convenience.
pub use apply::policy::{AppliedVia, LutPolicy, NodeApplicationResult};
pub use error::{GradeError, GradeErrorKind, MissingSelection};
pub use grade::cdl::{BakedCdl, CdlParameterMap, bake};
pub use grade::descriptor::{GradeDescriptor, Rgb};
pub use host::session::{HostSession, SessionStatus};
pub use host::{HostApi, HostConnector, ResolveHost};
pub use lut::{FsLutInstaller, InstalledLut, LutAsset, LutInstaller, LutScope};
