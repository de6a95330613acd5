//! Exact stochastic simulation ([SSA](https://en.wikipedia.org/wiki/Gillespie_algorithm#Algorithm))
//! of chemical reaction networks.
//!
//! A [`ReactionNetwork`] induces a continuous-time Markov jump process over
//! the copy numbers of its species. `crnsim` samples realisations of this
//! process with Gillespie's direct method, re-expresses the irregular jump
//! trajectories on uniform time grids so that they can be compared and
//! averaged, and estimates stationary distributions by Monte-Carlo.
//!
//! ## Example
//! Consider a species `A` produced from nothing at rate `1` and degraded at
//! rate `0.1` per molecule. Its stationary copy number is Poisson with mean
//! `10`.
//! ```
//! use crnsim::{simulate, Options, ReactionNetwork, StopReason};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! // columns: A, ∅ (the null species, index 1)
//! let network = ReactionNetwork::new(
//!     vec![vec![1, 0], vec![0, 1]],
//!     vec![vec![0, 1], vec![1, 0]],
//!     vec![0.1, 1.],
//!     1,
//! )
//! .unwrap();
//! let options = Options { t_run: 10., ..Options::default() };
//! let mut rng = ChaCha8Rng::seed_from_u64(5);
//!
//! let trajectory = simulate(&network, vec![0], &options, &mut rng).unwrap();
//! assert_eq!(trajectory.stop_reason(), Some(StopReason::HorizonReached));
//! assert!(trajectory.final_time() >= 10.);
//! ```
//!
//! Randomness is always passed explicitly: each simulation owns the
//! generator it is given, so seeded runs are reproducible and ensembles can
//! run in parallel on independent streams.

use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use rand::Rng;
use rand_distr::Open01;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod gillespie;
pub mod network;
pub mod propensity;
pub mod resample;
pub mod stationary;
pub mod trajectory;
pub mod transitions;

#[doc(inline)]
pub use crate::gillespie::{Gillespie, NextReaction};
#[doc(inline)]
pub use crate::network::{Coefficient, ConfigurationError, ReactionNetwork};
#[doc(inline)]
pub use crate::resample::{
    find_smallest_final_event_time, find_smallest_time_between_events, resample_ensemble,
    resample_to_fixed_step, GridStrategy, Resampled, ResampledEnsemble, ResamplingError,
};
#[doc(inline)]
pub use crate::stationary::{
    compute_stationary_distribution, compute_stationary_distribution_single_traj,
    StationaryDistribution, StationaryError,
};
#[doc(inline)]
pub use crate::trajectory::Trajectory;
#[doc(inline)]
pub use crate::transitions::{transitions, Transition};

/// Number of molecules of a species present in the system.
pub type NbIndividuals = u64;

/// Whether to stop or continue the simulation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SimState {
    /// A simulation is stopped when one of those conditions is met (see
    /// [`StopReason`]):
    ///
    /// 1. no reaction can fire anymore,
    /// 2. the run horizon has been reached,
    /// 3. the maximal number of iterations has been reached.
    ///
    Stop(StopReason),
    Continue,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum StopReason {
    /// The total propensity is zero: no reaction can fire from the current
    /// state.
    AbsorbingStateReached,
    /// The time is at or past the run horizon.
    HorizonReached,
    /// The maximal number of iterations has been reached.
    MaxItersReached,
}

/// Parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Simulate while the time is below `t_run`. The last event recorded is
    /// the first one at or past `t_run`.
    pub t_run: f64,
    /// Keep only the terminal `(time, state)` pair instead of every event.
    pub final_only: bool,
    /// Maximal number of events fired.
    pub max_iter: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            t_run: 1.,
            final_only: false,
            max_iter: usize::MAX,
        }
    }
}

/// The main loop running one realisation of the stochastic process induced
/// by `network`, starting at time `0` in `initial_state`.
pub fn simulate(
    network: &ReactionNetwork,
    initial_state: Vec<NbIndividuals>,
    options: &Options,
    rng: &mut impl Rng,
) -> Result<Trajectory, ConfigurationError> {
    if options.t_run.is_nan() || options.t_run.is_sign_negative() {
        return Err(ConfigurationError::InvalidHorizon(options.t_run));
    }
    let mut process = Gillespie::new(network, initial_state)?;
    let mut store = trajectory::TrajectoryStore::new(process.state(), options.final_only);

    let mut iter = 0;
    let reason = loop {
        if iter >= options.max_iter {
            break StopReason::MaxItersReached;
        }
        match process.step(options.t_run, rng) {
            SimState::Continue => {
                store.record(process.time(), process.state());
                iter += 1;
            }
            SimState::Stop(reason) => break reason,
        }
    };

    debug!(?reason, time = process.time(), events = iter, "simulation stopped");
    Ok(store.finish(process.time(), process.state(), reason))
}

pub fn exprand(lambda: f64, rng: &mut impl Rng) -> f64 {
    //! Sample the waiting time before the next event of a Poisson process
    //! with intensity `lambda`, by inversion of the exponential CDF:
    //! `-ln(u) / lambda` with `u` uniform in the open interval `(0, 1)`, so
    //! that the logarithm is always finite.
    //!
    //! ## Returns
    //! - a waiting time of `0` if `lambda` is infinity,
    //! - a random exponential waiting time if `lambda` [`f64::is_normal`],
    //! - infinity otherwise.
    //! ```
    //! use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
    //! # use crnsim::exprand;
    //!
    //! let mut rng = ChaCha8Rng::seed_from_u64(1u64);
    //!
    //! let lambda_gr_than_zero = 0.1_f64;
    //! assert!(exprand(lambda_gr_than_zero, &mut rng).is_sign_positive());
    //!
    //! let lambda_zero = 0_f64;
    //! assert!(exprand(lambda_zero, &mut rng).is_infinite());
    //!
    //! let lambda_inf = f64::INFINITY;
    //! assert!((exprand(lambda_inf, &mut rng) - 0.).abs() < f64::EPSILON);
    //! ```
    //!
    //! ## Panics
    //! When `lambda` is negative.
    //!
    //! ```should_panic
    //! use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
    //! # use crnsim::exprand;
    //!
    //! let mut rng = ChaCha8Rng::seed_from_u64(1u64);
    //!
    //! let lambda_neg = -0.1_f64;
    //! exprand(lambda_neg, &mut rng);
    //! ```
    assert!(!lambda.is_sign_negative());
    if lambda.is_normal() {
        // random number between (0, 1)
        let val: f64 = rng.sample(Open01);
        return -val.ln() / lambda;
    } else if lambda.is_infinite() {
        return 0.;
    }
    f64::INFINITY
}

pub fn write2file<T: Serialize>(data: &T, path: &Path) -> anyhow::Result<()> {
    //! Write `data` as pretty-printed JSON into a new file at `path`,
    //! creating the parent directories if needed.
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create dir {}", parent.display()))?;
    }
    let f = fs::File::create(path)
        .with_context(|| format!("Cannot open stream {}", path.display()))?;

    let mut buffer = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut buffer, data)
        .with_context(|| format!("Cannot serialise into {}", path.display()))?;
    writeln!(buffer)?;
    buffer.flush()?;

    Ok(())
}
