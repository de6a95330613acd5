//! Trajectories of the jump process.
use std::path::Path;

use serde::Serialize;

use crate::resample::{resample_to_fixed_step, Resampled, ResamplingError};
use crate::{write2file, NbIndividuals, StopReason};

/// The events of one realisation: the time of each jump paired with the
/// state entered at that time.
///
/// Times are strictly increasing and the first event is the initial state
/// at time `0`, except for trajectories simulated with
/// [`crate::Options::final_only`] which hold the terminal pair only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<Vec<NbIndividuals>>,
    /// Why the simulation stopped, `None` for trajectories built by hand.
    stop_reason: Option<StopReason>,
}

impl Trajectory {
    /// Build a trajectory from recorded events, e.g. to resample data that
    /// was not produced by [`crate::simulate`].
    pub fn new(
        times: Vec<f64>,
        states: Vec<Vec<NbIndividuals>>,
    ) -> Result<Self, ResamplingError> {
        if times.is_empty() {
            return Err(ResamplingError::EmptyTrajectory);
        }
        if times.len() != states.len() {
            return Err(ResamplingError::LengthMismatch {
                times: times.len(),
                states: states.len(),
            });
        }
        if times[0] != 0. {
            return Err(ResamplingError::NotFromOrigin(times[0]));
        }
        if let Some(index) = times.windows(2).position(|w| !(w[0] < w[1])) {
            return Err(ResamplingError::NotIncreasing { index: index + 1 });
        }
        let nb_species = states[0].len();
        if let Some(index) = states.iter().position(|s| s.len() != nb_species) {
            return Err(ResamplingError::SpeciesMismatch { index });
        }
        Ok(Trajectory {
            times,
            states,
            stop_reason: None,
        })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[Vec<NbIndividuals>] {
        &self.states
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn nb_events(&self) -> usize {
        self.times.len()
    }

    pub fn nb_species(&self) -> usize {
        self.states[0].len()
    }

    pub fn final_time(&self) -> f64 {
        *self.times.last().expect("trajectories are never empty")
    }

    pub fn final_state(&self) -> &[NbIndividuals] {
        self.states.last().expect("trajectories are never empty")
    }

    /// The copy numbers of species `species` at each event.
    pub fn species(&self, species: usize) -> Vec<NbIndividuals> {
        self.states.iter().map(|state| state[species]).collect()
    }

    /// See [`resample_to_fixed_step`].
    pub fn resample(&self, step: f64) -> Result<Resampled, ResamplingError> {
        resample_to_fixed_step(self, step)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        write2file(self, path)
    }
}

/// Accumulates the events of a running simulation, or only remembers the
/// last one when recording the final state only.
#[derive(Debug)]
pub(crate) struct TrajectoryStore {
    final_only: bool,
    times: Vec<f64>,
    states: Vec<Vec<NbIndividuals>>,
}

impl TrajectoryStore {
    /// Start recording at time `0` in `initial_state`.
    pub(crate) fn new(initial_state: &[NbIndividuals], final_only: bool) -> Self {
        let (times, states) = if final_only {
            (Vec::new(), Vec::new())
        } else {
            (vec![0.], vec![initial_state.to_vec()])
        };
        TrajectoryStore {
            final_only,
            times,
            states,
        }
    }

    pub(crate) fn record(&mut self, time: f64, state: &[NbIndividuals]) {
        if !self.final_only {
            self.times.push(time);
            self.states.push(state.to_vec());
        }
    }

    /// Close the recording with the terminal `(time, state)` pair of the
    /// process.
    pub(crate) fn finish(
        self,
        time: f64,
        state: &[NbIndividuals],
        reason: StopReason,
    ) -> Trajectory {
        let (times, states) = if self.final_only {
            (vec![time], vec![state.to_vec()])
        } else {
            (self.times, self.states)
        };
        Trajectory {
            times,
            states,
            stop_reason: Some(reason),
        }
    }
}
