//! Core pipeline orchestration and domain logic for ResearchPress.
//!
//! This crate ties together searching, prompt building, generation, and
//! block conversion into end-to-end workflows, and writes the results to disk.

pub mod display;
pub mod export;
pub mod pipeline;
pub mod prompt;
