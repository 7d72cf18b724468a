//! Primary grade description and CDL baking.

pub mod cdl;
pub mod descriptor;
