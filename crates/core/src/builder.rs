use rand::Rng;
use thiserror::Error;

use crate::model::{PoolError, PoolRecord, SessionConfig, StatementPool, Ticket};
use crate::sampler::{Sampler, SamplerError};

/// Configuration errors that prevent a session from being generated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Sampler(#[from] SamplerError),
}

/// Generates the full, ordered ticket list for a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionBuilder {
    config: SessionConfig,
    sampler: Sampler,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sampler: Sampler::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Validate raw pool records, then build the session.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Pool` if any record lacks a label, before any sampling.
    /// See `build_from_pool` for the remaining cases.
    pub fn build<R: Rng + ?Sized>(
        &self,
        records: impl IntoIterator<Item = PoolRecord>,
        rng: &mut R,
    ) -> Result<Vec<Ticket>, BuildError> {
        let pool = StatementPool::from_records(records)?;
        self.build_from_pool(&pool, rng)
    }

    /// Build `ticket_count` tickets against the full pool.
    ///
    /// Each ticket draws its true quota uniformly from the configured range. The
    /// same statement may appear in several tickets, never twice in one.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Sampler` if the pool cannot satisfy the most demanding
    /// quota in either category. Nothing is generated in that case.
    pub fn build_from_pool<R: Rng + ?Sized>(
        &self,
        pool: &StatementPool,
        rng: &mut R,
    ) -> Result<Vec<Ticket>, BuildError> {
        let quota = self.config.true_quota();
        let size = to_usize(self.config.ticket_size());
        let most_true = to_usize(quota.max());
        let most_false = size.saturating_sub(to_usize(quota.min()));
        self.sampler.ensure_capacity(pool, most_true, 0)?;
        self.sampler.ensure_capacity(pool, 0, most_false)?;

        let count = to_usize(self.config.ticket_count());
        let mut tickets = Vec::with_capacity(count);
        for _ in 0..count {
            let true_required = rng.random_range(quota.min()..=quota.max());
            let true_count = to_usize(true_required);
            let statements = self
                .sampler
                .draw(pool, true_count, size - true_count, rng)?;
            tickets.push(Ticket::fresh(statements, true_required));
        }
        Ok(tickets)
    }
}

fn to_usize(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StatementId, TrueQuota};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn records(trues: usize, falses: usize) -> Vec<PoolRecord> {
        (0..trues)
            .map(|i| PoolRecord::labeled(format!("t{i}"), "true", true))
            .chain((0..falses).map(|i| PoolRecord::labeled(format!("f{i}"), "false", false)))
            .collect()
    }

    fn config(tickets: u32, min: u32, max: u32) -> SessionConfig {
        SessionConfig::new(tickets, 3, TrueQuota::new(min, max).unwrap()).unwrap()
    }

    #[test]
    fn single_ticket_with_fixed_quota() {
        let builder = SessionBuilder::new(config(1, 1, 1));
        let tickets = builder
            .build(records(5, 5), &mut StdRng::seed_from_u64(42))
            .unwrap();

        assert_eq!(tickets.len(), 1);
        let ticket = &tickets[0];
        assert_eq!(ticket.true_required(), 1);
        assert_eq!(ticket.statements().iter().filter(|s| s.is_true()).count(), 1);
        assert_eq!(ticket.statements().iter().filter(|s| !s.is_true()).count(), 2);
        assert_eq!(ticket.selections(), &[false, false, false]);
        assert!(!ticket.is_revealed());
        assert_eq!(ticket.score(), None);
    }

    #[test]
    fn every_ticket_honors_its_quota() {
        let builder = SessionBuilder::new(SessionConfig::default());
        let tickets = builder
            .build(records(6, 6), &mut StdRng::seed_from_u64(9))
            .unwrap();

        assert_eq!(tickets.len(), 40);
        let mut quotas = HashSet::new();
        for ticket in &tickets {
            let trues = ticket.statements().iter().filter(|s| s.is_true()).count();
            assert_eq!(trues, ticket.true_required() as usize);
            assert_eq!(ticket.len(), 3);
            let ids: HashSet<&StatementId> = ticket.statements().iter().map(|s| s.id()).collect();
            assert_eq!(ids.len(), 3);
            quotas.insert(ticket.true_required());
        }
        assert_eq!(quotas, HashSet::from([1, 2]));
    }

    #[test]
    fn true_quota_is_drawn_uniformly() {
        let tickets = SessionBuilder::new(config(2000, 1, 2))
            .build(records(6, 6), &mut StdRng::seed_from_u64(31))
            .unwrap();

        let single = tickets.iter().filter(|t| t.true_required() == 1).count();
        // 1000 expected, standard deviation about 22
        assert!((900..=1100).contains(&single), "quota 1 drawn {single} times of 2000");
    }

    #[test]
    fn unlabeled_pool_is_rejected_before_sampling() {
        let mut pool = records(5, 5);
        pool.push(PoolRecord::unlabeled("odd", "no label"));

        let err = SessionBuilder::new(config(1, 1, 1))
            .build(pool, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, BuildError::Pool(PoolError::MissingLabel { .. })));
    }

    #[test]
    fn pool_too_small_for_max_quota_is_rejected() {
        // two true statements would be needed by a quota of 2
        let err = SessionBuilder::new(config(3, 1, 2))
            .build(records(1, 5), &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Sampler(SamplerError::PoolTooSmall { label: "true", .. })
        ));
    }

    #[test]
    fn pool_too_small_for_false_quota_is_rejected() {
        let err = SessionBuilder::new(config(3, 1, 2))
            .build(records(5, 1), &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Sampler(SamplerError::PoolTooSmall { label: "false", .. })
        ));
    }
}
