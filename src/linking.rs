//! Linking matched masks across more than two FOVs.
//!
//! Each chain starts at one mask of the first FOV and follows that hop's
//! assignment to the next FOV, until a hop has no match or its cost is above
//! `max_cost`. Chains are a greedy concatenation of the per-hop optimal
//! assignments; they are not re-optimized globally.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::matching::Matches;
use crate::{Error, Result};

/// Parameters of the chain linker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Maximum accepted cost (1 - IoU) of a hop.
    pub max_cost: f64,

    /// A chain is kept only if it visits more than this many FOVs.
    /// `None` means every hop must succeed.
    pub min_fov_present: Option<usize>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_cost: 0.6,
            min_fov_present: None,
        }
    }
}

impl LinkConfig {
    pub fn new(max_cost: f64) -> Self {
        Self {
            max_cost,
            ..Self::default()
        }
    }

    pub fn with_min_fov_present(mut self, min_fov_present: usize) -> Self {
        self.min_fov_present = Some(min_fov_present);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_cost.is_nan() {
            return Err(Error::InvalidInput("max_cost must not be NaN".to_string()));
        }
        Ok(())
    }
}

/// Identities tracked through a sequence of FOVs.
///
/// Chain `c` holds the index of the same region in FOV 0, 1, ... up to the
/// last FOV it reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chains {
    chains: Vec<Vec<usize>>,
    n_fovs: usize,
}

impl Chains {
    /// Number of chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Number of FOVs in the linked sequence.
    pub fn n_fovs(&self) -> usize {
        self.n_fovs
    }

    pub fn get(&self, idx: usize) -> Option<&[usize]> {
        self.chains.get(idx).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.chains.iter().map(Vec::as_slice)
    }

    pub fn into_inner(self) -> Vec<Vec<usize>> {
        self.chains
    }

    /// (FOVs x chains) index table; FOVs a chain never reached are `None`.
    pub fn to_table(&self) -> DMatrix<Option<usize>> {
        DMatrix::from_fn(self.n_fovs, self.chains.len(), |fov, chain| {
            self.chains[chain].get(fov).copied()
        })
    }
}

/// Link masks through consecutive assignments.
///
/// `matches[h]` is the assignment between FOV `h` and FOV `h + 1`. Every index
/// of FOV 0 seeds one chain.
///
/// # Errors
/// `Error::InvalidInput` if `matches` is empty, `max_cost` is NaN, an
/// assignment is malformed (ragged vectors, pairs outside its shape), or two
/// consecutive assignments disagree on the size of the FOV they share.
pub fn link_chains(matches: &[Matches], config: &LinkConfig) -> Result<Chains> {
    let first = matches.first().ok_or_else(|| {
        Error::InvalidInput("need at least one assignment to link".to_string())
    })?;
    config.validate()?;
    for (hop, assignment) in matches.iter().enumerate() {
        assignment.validate().map_err(|e| match e {
            Error::InvalidInput(msg) => Error::InvalidInput(format!("assignment {}: {}", hop, msg)),
            other => other,
        })?;
    }
    for (hop, pair) in matches.windows(2).enumerate() {
        if pair[0].shape.1 != pair[1].shape.0 {
            return Err(Error::InvalidInput(format!(
                "assignment {} ends with {} masks but assignment {} starts with {}",
                hop,
                pair[0].shape.1,
                hop + 1,
                pair[1].shape.0
            )));
        }
    }

    let min_fov_present = config.min_fov_present.unwrap_or(matches.len());
    let tables: Vec<Vec<Option<(usize, f64)>>> = matches.iter().map(Matches::row_table).collect();

    let mut chains = Vec::new();
    for seed in 0..first.shape.0 {
        let mut chain = vec![seed];
        let mut current = seed;

        for table in &tables {
            match table.get(current).copied().flatten() {
                Some((next, cost)) if cost <= config.max_cost => {
                    chain.push(next);
                    current = next;
                }
                _ => break,
            }
        }

        if chain.len() > min_fov_present {
            chains.push(chain);
        }
    }

    info!(num_chains = chains.len(), "linked masks across FOVs");

    Ok(Chains {
        chains,
        n_fovs: matches.len() + 1,
    })
}
