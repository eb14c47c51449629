use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How candidate building is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateStrategy {
    /// One thread, one random stream, vertices in order.
    #[default]
    Serial,
    /// Graph rows split into `workers` contiguous partitions processed in
    /// parallel, each with its own forked random stream, followed by a
    /// per-row merge of the emitted edges.
    Partitioned { workers: usize },
}

/// Parameters of a descent run that concern candidate generation.
///
/// Defaults mirror the usual neighbor descent settings: 15 neighbors, at most
/// 50 candidates per point, seed 42, serial scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescentParams {
    pub n_neighbors: usize,
    pub max_candidates: usize,
    pub seed: u64,
    pub strategy: CandidateStrategy,
}

impl Default for DescentParams {
    fn default() -> Self {
        DescentParams {
            n_neighbors: 15,
            max_candidates: 50,
            seed: 42,
            strategy: CandidateStrategy::Serial,
        }
    }
}

impl DescentParams {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
