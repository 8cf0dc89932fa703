use std::collections::HashSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use thiserror::Error;

use crate::model::{Statement, StatementId, StatementPool};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SamplerError {
    #[error("pool has {available} {label} statement(s), ticket needs {required}")]
    PoolTooSmall {
        label: &'static str,
        required: usize,
        available: usize,
    },
}

/// Draws one ticket's worth of statements under true/false quotas.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sampler;

impl Sampler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check that `pool` can satisfy the given quotas.
    ///
    /// # Errors
    ///
    /// Returns `SamplerError::PoolTooSmall` naming the short category.
    pub fn ensure_capacity(
        &self,
        pool: &StatementPool,
        true_count: usize,
        false_count: usize,
    ) -> Result<(), SamplerError> {
        check("true", pool.true_statements(), true_count)?;
        check("false", pool.false_statements(), false_count)
    }

    /// Draw `true_count` true and `false_count` false statements with unique ids,
    /// returned in shuffled order.
    ///
    /// Each category is drawn uniformly with replacement and duplicates are
    /// rejected until its quota is met. Pool ids are unique, so the capacity
    /// check guarantees both loops terminate.
    ///
    /// # Errors
    ///
    /// Returns `SamplerError::PoolTooSmall` before drawing anything if either
    /// category is too small.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        pool: &StatementPool,
        true_count: usize,
        false_count: usize,
        rng: &mut R,
    ) -> Result<Vec<Statement>, SamplerError> {
        self.ensure_capacity(pool, true_count, false_count)?;

        let mut picked = Vec::with_capacity(true_count + false_count);
        let mut picked_ids: HashSet<StatementId> = HashSet::with_capacity(picked.capacity());

        for (candidates, quota) in [
            (pool.true_statements(), true_count),
            (pool.false_statements(), false_count),
        ] {
            let mut drawn = 0;
            while drawn < quota {
                let Some(candidate) = candidates.choose(rng) else {
                    break;
                };
                if picked_ids.insert(candidate.id().clone()) {
                    picked.push(candidate.clone());
                    drawn += 1;
                }
            }
        }

        picked.shuffle(rng);
        Ok(picked)
    }
}

fn check(label: &'static str, candidates: &[Statement], required: usize) -> Result<(), SamplerError> {
    if candidates.len() < required {
        return Err(SamplerError::PoolTooSmall {
            label,
            required,
            available: candidates.len(),
        });
    }
    Ok(())
}
