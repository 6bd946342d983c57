//! Test Helper Utilities
//!
//! In-memory collaborators for pipeline-level tests

#![allow(dead_code)]

pub mod fakes;

pub use fakes::{
    catalog_track, pipeline_with, web_result, ScriptedCatalog, ScriptedCompletion,
    ScriptedWebSearch, StaticEmbeddings,
};
