//! Resampling of jump trajectories onto uniform time grids.
//!
//! Events of different realisations happen at different times. To compare
//! or average them, each trajectory is read on a shared uniform grid using
//! the step function it defines: at every grid time the value held is the
//! state entered at the latest event at or before that time.
//!
//! Two policies choose the grid:
//! - [`resample_to_fixed_step`] reads a single trajectory every `step`
//!   from `0` up to its last event,
//! - [`resample_ensemble`] reads many trajectories on one grid ending
//!   before the earliest last event of the ensemble, with either a given
//!   step or one derived from the smallest gap between events
//!   ([`GridStrategy`]).
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trajectory::Trajectory;
use crate::NbIndividuals;

#[derive(Error, Debug, PartialEq)]
pub enum ResamplingError {
    #[error("time step {0} must be positive and finite")]
    InvalidStep(f64),
    #[error("time step {step} exceeds the recorded span {span}")]
    StepExceedsSpan { step: f64, span: f64 },
    #[error("the shared horizon {0} of the ensemble is degenerate")]
    DegenerateHorizon(f64),
    #[error("cannot resample an empty ensemble")]
    EmptyEnsemble,
    #[error("trajectory {0} has fewer than two events")]
    TooFewEvents(usize),
    #[error("trajectory {trajectory} has a different number of species than the first one")]
    EnsembleSpeciesMismatch { trajectory: usize },
    #[error("a trajectory needs at least one event")]
    EmptyTrajectory,
    #[error("found {times} times but {states} states")]
    LengthMismatch { times: usize, states: usize },
    #[error("the first event is at time {0} instead of 0")]
    NotFromOrigin(f64),
    #[error("time of event {index} is not greater than the previous one")]
    NotIncreasing { index: usize },
    #[error("state of event {index} has a different number of species")]
    SpeciesMismatch { index: usize },
}

/// How [`resample_ensemble`] picks the step of the shared grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridStrategy {
    /// Use this step.
    FixedStep(f64),
    /// Use the smallest gap between two consecutive events across the whole
    /// ensemble, so that a grid interval rarely skips an event.
    EnsembleAuto,
}

/// A trajectory read on a uniform time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resampled {
    pub times: Vec<f64>,
    /// `states[i]` is the state held at `times[i]`.
    pub states: Vec<Vec<NbIndividuals>>,
}

impl Resampled {
    /// The values of species `species` on the grid.
    pub fn species(&self, species: usize) -> Vec<NbIndividuals> {
        self.states.iter().map(|state| state[species]).collect()
    }
}

/// Many trajectories read on the same uniform time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampledEnsemble {
    pub times: Vec<f64>,
    /// `states[j][i]` is the state of trajectory `j` held at `times[i]`.
    pub states: Vec<Vec<Vec<NbIndividuals>>>,
}

impl ResampledEnsemble {
    pub fn nb_trajectories(&self) -> usize {
        self.states.len()
    }

    /// The values of species `species` of trajectory `trajectory` on the
    /// grid.
    pub fn species(&self, trajectory: usize, species: usize) -> Vec<NbIndividuals> {
        self.states[trajectory]
            .iter()
            .map(|state| state[species])
            .collect()
    }
}

fn check_step(step: f64) -> Result<f64, ResamplingError> {
    if step > 0. && step.is_finite() {
        Ok(step)
    } else {
        Err(ResamplingError::InvalidStep(step))
    }
}

fn check_origin(trajectory: &Trajectory) -> Result<(), ResamplingError> {
    match trajectory.times()[0] {
        t if t == 0. => Ok(()),
        t => Err(ResamplingError::NotFromOrigin(t)),
    }
}

/// `ceil(horizon / step)` times `0, step, 2 step, ...`, all below `horizon`.
fn uniform_grid(horizon: f64, step: f64) -> Vec<f64> {
    let nb_samples = (horizon / step).ceil() as usize;
    (0..nb_samples).map(|i| i as f64 * step).collect()
}

/// The state held by `trajectory` at every time of the increasing `grid`.
fn hold_previous(trajectory: &Trajectory, grid: &[f64]) -> Vec<Vec<NbIndividuals>> {
    let times = trajectory.times();
    let states = trajectory.states();
    let mut last = 0;
    grid.iter()
        .map(|&time| {
            while last + 1 < times.len() && times[last + 1] <= time {
                last += 1;
            }
            states[last].clone()
        })
        .collect()
}

/// Read `trajectory` every `step`, from time `0` up to (excluded) its last
/// event, `ceil(t_final / step)` samples in total.
///
/// ## Returns
/// An error if `step` is not positive or is longer than the span of the
/// trajectory: nothing is extrapolated past the last event.
pub fn resample_to_fixed_step(
    trajectory: &Trajectory,
    step: f64,
) -> Result<Resampled, ResamplingError> {
    let step = check_step(step)?;
    check_origin(trajectory)?;
    let span = trajectory.final_time();
    if step > span {
        return Err(ResamplingError::StepExceedsSpan { step, span });
    }

    let times = uniform_grid(span, step);
    let states = hold_previous(trajectory, &times);
    Ok(Resampled { times, states })
}

/// The smallest time between two consecutive events over all
/// `trajectories`.
pub fn find_smallest_time_between_events(
    trajectories: &[Trajectory],
) -> Result<f64, ResamplingError> {
    if trajectories.is_empty() {
        return Err(ResamplingError::EmptyEnsemble);
    }
    let mut smallest = f64::INFINITY;
    for (idx, trajectory) in trajectories.iter().enumerate() {
        if trajectory.nb_events() < 2 {
            return Err(ResamplingError::TooFewEvents(idx));
        }
        smallest = trajectory
            .times()
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(smallest, f64::min);
    }
    Ok(smallest)
}

/// The earliest last event over all `trajectories`.
pub fn find_smallest_final_event_time(
    trajectories: &[Trajectory],
) -> Result<f64, ResamplingError> {
    if trajectories.is_empty() {
        return Err(ResamplingError::EmptyEnsemble);
    }
    Ok(trajectories
        .iter()
        .map(Trajectory::final_time)
        .fold(f64::INFINITY, f64::min))
}

/// Read all `trajectories` on one grid starting at `0` and ending before
/// the earliest last event of the ensemble, so that no trajectory is read
/// past its recorded events.
pub fn resample_ensemble(
    trajectories: &[Trajectory],
    strategy: GridStrategy,
) -> Result<ResampledEnsemble, ResamplingError> {
    let horizon = find_smallest_final_event_time(trajectories)?;
    if !(horizon > 0.) || !horizon.is_finite() {
        return Err(ResamplingError::DegenerateHorizon(horizon));
    }
    let nb_species = trajectories[0].nb_species();
    for (idx, trajectory) in trajectories.iter().enumerate() {
        check_origin(trajectory)?;
        if trajectory.nb_species() != nb_species {
            return Err(ResamplingError::EnsembleSpeciesMismatch { trajectory: idx });
        }
    }
    let step = match strategy {
        GridStrategy::FixedStep(step) => check_step(step)?,
        GridStrategy::EnsembleAuto => find_smallest_time_between_events(trajectories)?,
    };
    if step > horizon {
        return Err(ResamplingError::StepExceedsSpan {
            step,
            span: horizon,
        });
    }

    let times = uniform_grid(horizon, step);
    let states = trajectories
        .iter()
        .map(|trajectory| hold_previous(trajectory, &times))
        .collect();
    Ok(ResampledEnsemble { times, states })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{simulate, Options, ReactionNetwork};
    use quickcheck_macros::quickcheck;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn two_trajectories() -> Vec<Trajectory> {
        vec![
            Trajectory::new(
                vec![0., 1., 2., 3., 4.],
                vec![vec![0, 1], vec![1, 1], vec![0, 1], vec![1, 1], vec![2, 1]],
            )
            .unwrap(),
            Trajectory::new(
                vec![0., 1., 2., 4.1],
                vec![vec![0, 2], vec![2, 2], vec![1, 2], vec![2, 2]],
            )
            .unwrap(),
        ]
    }

    fn simulated(seed: u64, nb_trajectories: usize, t_run: f64) -> Vec<Trajectory> {
        let network = ReactionNetwork::new(
            vec![vec![1, 0], vec![0, 1]],
            vec![vec![0, 1], vec![1, 0]],
            vec![0.1, 1.],
            1,
        )
        .unwrap();
        let options = Options {
            t_run,
            ..Options::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..nb_trajectories)
            .map(|_| simulate(&network, vec![5], &options, &mut rng).unwrap())
            .collect()
    }

    #[test]
    fn fixed_step_holds_previous_value() {
        let trajectory = Trajectory::new(
            vec![0., 1., 2., 3., 4.],
            vec![vec![0], vec![1], vec![0], vec![1], vec![2]],
        )
        .unwrap();
        let resampled = resample_to_fixed_step(&trajectory, 0.5).unwrap();
        assert_eq!(resampled.times, vec![0., 0.5, 1., 1.5, 2., 2.5, 3., 3.5]);
        assert_eq!(resampled.species(0), vec![0, 0, 1, 1, 0, 0, 1, 1]);
    }

    #[test]
    fn fixed_step_between_events() {
        let trajectory = Trajectory::new(
            vec![0., 0.3, 1.7, 2.05],
            vec![vec![4, 0], vec![3, 1], vec![2, 2], vec![3, 2]],
        )
        .unwrap();
        let resampled = trajectory.resample(1.).unwrap();
        assert_eq!(resampled.times, vec![0., 1., 2.]);
        assert_eq!(resampled.states, vec![vec![4, 0], vec![3, 1], vec![2, 2]]);
    }

    #[test]
    fn resampling_a_uniform_grid_is_identity() {
        let times: Vec<f64> = (0..=8).map(|i| i as f64 * 0.5).collect();
        let states: Vec<Vec<NbIndividuals>> =
            vec![vec![3], vec![4], vec![4], vec![2], vec![7], vec![1], vec![0], vec![5], vec![6]];
        let trajectory = Trajectory::new(times.clone(), states.clone()).unwrap();
        let resampled = resample_to_fixed_step(&trajectory, 0.5).unwrap();
        // the grid stops before the last event
        assert_eq!(resampled.times, times[..8]);
        assert_eq!(resampled.states, states[..8]);

        let again = Trajectory::new(resampled.times.clone(), resampled.states.clone())
            .unwrap()
            .resample(0.5)
            .unwrap();
        assert_eq!(again.times, resampled.times[..7]);
        assert_eq!(again.states, resampled.states[..7]);
    }

    #[test]
    fn fixed_step_errors() {
        let trajectory = Trajectory::new(vec![0., 1., 2.], vec![vec![0], vec![1], vec![0]])
            .unwrap();
        assert_eq!(
            resample_to_fixed_step(&trajectory, 0.),
            Err(ResamplingError::InvalidStep(0.))
        );
        assert!(matches!(
            resample_to_fixed_step(&trajectory, f64::NAN),
            Err(ResamplingError::InvalidStep(_))
        ));
        assert_eq!(
            resample_to_fixed_step(&trajectory, 2.5),
            Err(ResamplingError::StepExceedsSpan {
                step: 2.5,
                span: 2.
            })
        );
        let single = Trajectory::new(vec![0.], vec![vec![3]]).unwrap();
        assert_eq!(
            resample_to_fixed_step(&single, 0.1),
            Err(ResamplingError::StepExceedsSpan {
                step: 0.1,
                span: 0.
            })
        );
    }

    #[test]
    fn smallest_gaps_and_final_times() {
        let trajectories = vec![
            Trajectory::new(
                vec![0., 1., 2., 3., 4.],
                vec![vec![0], vec![1], vec![0], vec![1], vec![2]],
            )
            .unwrap(),
            Trajectory::new(vec![0., 1., 2., 4.], vec![vec![0], vec![2], vec![1], vec![2]])
                .unwrap(),
        ];
        assert_eq!(find_smallest_time_between_events(&trajectories), Ok(1.));
        let single = Trajectory::new(vec![0.], vec![vec![1]]).unwrap();
        assert_eq!(find_smallest_final_event_time(&two_trajectories()), Ok(4.));
        assert_eq!(
            find_smallest_time_between_events(&[]),
            Err(ResamplingError::EmptyEnsemble)
        );
        assert_eq!(
            find_smallest_time_between_events(&[single]),
            Err(ResamplingError::TooFewEvents(0))
        );
    }

    #[test]
    fn ensemble_with_fixed_step() {
        let resampled =
            resample_ensemble(&two_trajectories(), GridStrategy::FixedStep(0.5)).unwrap();
        assert_eq!(resampled.times, vec![0., 0.5, 1., 1.5, 2., 2.5, 3., 3.5]);
        assert_eq!(resampled.nb_trajectories(), 2);
        assert_eq!(resampled.species(0, 0), vec![0, 0, 1, 1, 0, 0, 1, 1]);
        assert_eq!(resampled.species(0, 1), vec![1; 8]);
        assert_eq!(resampled.species(1, 0), vec![0, 0, 2, 2, 1, 1, 1, 1]);
        assert_eq!(resampled.species(1, 1), vec![2; 8]);
    }

    #[test]
    fn ensemble_with_derived_step() {
        let resampled = resample_ensemble(&two_trajectories(), GridStrategy::EnsembleAuto).unwrap();
        assert_eq!(resampled.times, vec![0., 1., 2., 3.]);
        assert_eq!(resampled.species(0, 0), vec![0, 1, 0, 1]);
        assert_eq!(resampled.species(1, 0), vec![0, 2, 1, 1]);
    }

    #[test]
    fn ensemble_errors() {
        assert_eq!(
            resample_ensemble(&[], GridStrategy::EnsembleAuto),
            Err(ResamplingError::EmptyEnsemble)
        );
        let mut trajectories = two_trajectories();
        trajectories.push(Trajectory::new(vec![0.], vec![vec![0, 0]]).unwrap());
        assert_eq!(
            resample_ensemble(&trajectories, GridStrategy::EnsembleAuto),
            Err(ResamplingError::DegenerateHorizon(0.))
        );
        let mut trajectories = two_trajectories();
        trajectories.push(Trajectory::new(vec![0., 5.], vec![vec![0], vec![1]]).unwrap());
        assert_eq!(
            resample_ensemble(&trajectories, GridStrategy::FixedStep(0.5)),
            Err(ResamplingError::EnsembleSpeciesMismatch { trajectory: 2 })
        );
        assert_eq!(
            resample_ensemble(&two_trajectories(), GridStrategy::FixedStep(4.5)),
            Err(ResamplingError::StepExceedsSpan {
                step: 4.5,
                span: 4.
            })
        );
    }

    #[test]
    fn final_only_trajectories_are_not_resampled() {
        let network = ReactionNetwork::new(
            vec![vec![1, 0], vec![0, 1]],
            vec![vec![0, 1], vec![1, 0]],
            vec![0.1, 1.],
            1,
        )
        .unwrap();
        let options = Options {
            t_run: 2.,
            final_only: true,
            ..Options::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7u64);
        let trajectory = simulate(&network, vec![5], &options, &mut rng).unwrap();
        assert!(matches!(
            resample_ensemble(&[trajectory], GridStrategy::FixedStep(0.1)),
            Err(ResamplingError::NotFromOrigin(_))
        ));
    }

    #[quickcheck]
    fn fixed_step_and_ensemble_agree_on_one_trajectory(seed: u64) -> bool {
        let trajectories = simulated(seed, 1, 10.);
        let single = resample_to_fixed_step(&trajectories[0], 0.1).unwrap();
        let ensemble = resample_ensemble(&trajectories, GridStrategy::FixedStep(0.1)).unwrap();
        single.times == ensemble.times && single.states == ensemble.states[0]
    }

    #[quickcheck]
    fn shared_grid_stops_before_earliest_final_event(seed: u64) -> bool {
        let trajectories = simulated(seed, 4, 3.);
        let horizon = find_smallest_final_event_time(&trajectories).unwrap();
        let resampled = resample_ensemble(&trajectories, GridStrategy::EnsembleAuto).unwrap();
        !resampled.times.is_empty()
            && resampled.times.iter().all(|&t| t < horizon)
            && resampled
                .states
                .iter()
                .all(|states| states.len() == resampled.times.len())
    }
}
