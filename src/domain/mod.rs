//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - cosmological input parameters (`CosmoParams`)
//! - survey geometry (`SurveyConfig`)
//! - per-call Kaiser model overrides (`PowerOverrides`)
//! - run-level configuration (`RunConfig`, `TemplateConfig`, `CoordSource`)

pub mod types;

pub use types::*;
