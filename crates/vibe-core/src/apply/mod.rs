//! Applying a grade to the host: the node policy and the two end-to-end
//! flows (live bridge, file import) built on it.

pub mod policy;
pub mod workflow;
