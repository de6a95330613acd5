//! Monte-Carlo estimates of stationary distributions.
//!
//! Two estimators of the long-run probability mass function of each
//! species' copy number:
//! - [`compute_stationary_distribution`] averages over an ensemble of
//!   independent realisations, looking at their terminal state only,
//! - [`compute_stationary_distribution_single_traj`] averages over time
//!   along one long realisation.
//!
//! Both bin copy numbers in `0..n_max`. Outcomes at or above `n_max` are
//! dropped, not redistributed: each species' probabilities sum to at most
//! `1`.
use std::path::Path;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::network::{ConfigurationError, ReactionNetwork};
use crate::resample::{resample_to_fixed_step, ResamplingError};
use crate::{simulate, write2file, NbIndividuals, Options};

#[derive(Error, Debug, PartialEq)]
pub enum StationaryError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Resampling(#[from] ResamplingError),
}

/// An empirical probability mass function per species over `0..n_max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationaryDistribution {
    /// The copy numbers `0, 1, ..., n_max - 1`.
    pub n: Vec<NbIndividuals>,
    /// `p[species][n]` is the probability of `n` copies of `species`.
    pub p: Vec<Vec<f64>>,
}

impl StationaryDistribution {
    /// Normalise the histograms `counts[species][n]` by `nb_samples`.
    fn from_counts(counts: Vec<Vec<u64>>, n_max: usize, nb_samples: usize) -> Self {
        let p = counts
            .into_iter()
            .map(|bins| {
                bins.into_iter()
                    .map(|count| count as f64 / nb_samples as f64)
                    .collect()
            })
            .collect();
        StationaryDistribution {
            n: (0..n_max as NbIndividuals).collect(),
            p,
        }
    }

    pub fn n_max(&self) -> usize {
        self.n.len()
    }

    /// Probability of `n` copies of `species`, `0` for `n >= n_max`.
    pub fn probability(&self, species: usize, n: NbIndividuals) -> f64 {
        self.p[species].get(n as usize).copied().unwrap_or(0.)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        write2file(self, path)
    }
}

/// Count the occurrences of each copy number below `n_max`, per species.
fn histogram<'a>(
    states: impl Iterator<Item = &'a [NbIndividuals]>,
    nb_species: usize,
    n_max: usize,
) -> Vec<Vec<u64>> {
    let mut counts = vec![vec![0u64; n_max]; nb_species];
    for state in states {
        for (species, &n) in state.iter().enumerate() {
            if let Some(bin) = counts[species].get_mut(n as usize) {
                *bin += 1;
            }
        }
    }
    counts
}

/// Estimate the stationary distribution from the terminal states of
/// `nb_trajectories` independent realisations started in `steady_state` and
/// run up to `t_run`.
///
/// Every realisation is simulated with
/// [`Options::final_only`](crate::Options::final_only) and the same horizon
/// `t_run`. Realisations run in parallel, each with its own generator
/// seeded from `rng`, so the estimate only depends on the state of `rng`.
pub fn compute_stationary_distribution(
    network: &ReactionNetwork,
    steady_state: &[NbIndividuals],
    n_max: usize,
    nb_trajectories: usize,
    t_run: f64,
    rng: &mut impl Rng,
) -> Result<StationaryDistribution, StationaryError> {
    network.check_state(steady_state)?;
    if nb_trajectories == 0 {
        return Err(ResamplingError::EmptyEnsemble.into());
    }
    info!(
        nb_trajectories,
        n_max, t_run, "estimating stationary distribution from an ensemble"
    );

    let options = Options {
        t_run,
        final_only: true,
        ..Options::default()
    };
    let seeds: Vec<u64> = (0..nb_trajectories).map(|_| rng.gen()).collect();
    let final_states = seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            simulate(network, steady_state.to_vec(), &options, &mut rng)
                .map(|trajectory| trajectory.final_state().to_vec())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let counts = histogram(
        final_states.iter().map(Vec::as_slice),
        network.nb_species(),
        n_max,
    );
    Ok(StationaryDistribution::from_counts(
        counts,
        n_max,
        nb_trajectories,
    ))
}

/// Estimate the stationary distribution from the time spent in each state
/// by one realisation started in `steady_state` and run up to `t_final`,
/// read every `time_step`.
pub fn compute_stationary_distribution_single_traj(
    network: &ReactionNetwork,
    steady_state: &[NbIndividuals],
    n_max: usize,
    t_final: f64,
    time_step: f64,
    rng: &mut impl Rng,
) -> Result<StationaryDistribution, StationaryError> {
    info!(
        n_max,
        t_final, time_step, "estimating stationary distribution from a single trajectory"
    );
    let options = Options {
        t_run: t_final,
        ..Options::default()
    };
    let trajectory = simulate(network, steady_state.to_vec(), &options, rng)?;
    let resampled = resample_to_fixed_step(&trajectory, time_step)?;

    let counts = histogram(
        resampled.states.iter().map(Vec::as_slice),
        network.nb_species(),
        n_max,
    );
    Ok(StationaryDistribution::from_counts(
        counts,
        n_max,
        resampled.times.len(),
    ))
}
