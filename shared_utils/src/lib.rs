//! Small helpers shared by the workspace crates: environment lookup and
//! tracing initialisation.

pub mod env;
pub mod logging;
