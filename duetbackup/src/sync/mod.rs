pub mod engine;
pub mod excludes;
pub mod marker;
mod mirror;
pub mod paths;
mod reclaim;
pub mod remote;
