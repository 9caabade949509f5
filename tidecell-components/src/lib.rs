//! Stages of the tidal forcing pipeline
//!
//! Forcing stages implement [`tidecell_core::component::ForcingTransform`]. The domain
//! and surface replicators work on generic [`tidecell_core::dataset::Dataset`]s read
//! from the one-cell templates.

pub mod components;
