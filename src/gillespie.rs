//! Gillespie's direct method.
use rand::Rng;
use tracing::trace;

use crate::network::{ConfigurationError, ReactionNetwork};
use crate::transitions::{total_propensity, transitions, Transition};
use crate::{exprand, NbIndividuals, SimState, StopReason};

/// The next reaction sampled by the SSA.
#[derive(Debug, Clone, PartialEq)]
pub struct NextReaction {
    /// The waiting time before this reaction fires.
    pub time: f64,
    /// Index of the reaction in the network.
    pub event: usize,
    /// The state entered when the reaction fires.
    pub state: Vec<NbIndividuals>,
}

/// One realisation of the Markov jump process induced by a
/// [`ReactionNetwork`], advanced one event at a time.
#[derive(Debug, Clone)]
pub struct Gillespie<'a> {
    network: &'a ReactionNetwork,
    state: Vec<NbIndividuals>,
    time: f64,
    sim_state: SimState,
}

impl<'a> Gillespie<'a> {
    /// Start at time `0` in `initial_state`.
    pub fn new(
        network: &'a ReactionNetwork,
        initial_state: Vec<NbIndividuals>,
    ) -> Result<Self, ConfigurationError> {
        network.check_state(&initial_state)?;
        Ok(Gillespie {
            network,
            state: initial_state,
            time: 0.,
            sim_state: SimState::Continue,
        })
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> &[NbIndividuals] {
        &self.state
    }

    pub fn sim_state(&self) -> SimState {
        self.sim_state
    }

    pub fn network(&self) -> &ReactionNetwork {
        self.network
    }

    pub fn next_reaction(&self, rng: &mut impl Rng) -> (SimState, Option<NextReaction>) {
        //! Sample the waiting time and the next reaction from the current
        //! state, without modifying the process.
        //!
        //! The waiting time is `-ln(u1) / k` with `k` the total propensity,
        //! and the reaction is the first candidate (in network order) for
        //! which the running sum of propensities exceeds `u2 * k`.
        //!
        //! ## Returns
        //! [`StopReason::AbsorbingStateReached`] when no reaction can fire:
        //! in this case no random number is drawn.
        if let SimState::Stop(reason) = self.sim_state {
            return (SimState::Stop(reason), None);
        }
        let mut candidates = transitions(self.network, &self.state);
        let k = total_propensity(&candidates);
        if candidates.is_empty() || k <= 0. {
            return (SimState::Stop(StopReason::AbsorbingStateReached), None);
        }

        let time = exprand(k, rng);
        let u2: f64 = rng.gen();
        let chosen = select_transition(&candidates, u2 * k);
        let Transition {
            reaction, state, ..
        } = candidates.swap_remove(chosen);

        (
            SimState::Continue,
            Some(NextReaction {
                time,
                event: reaction,
                state,
            }),
        )
    }

    /// Jump to the state of `reaction` after its waiting time.
    pub fn advance_step(&mut self, reaction: NextReaction) {
        self.time += reaction.time;
        self.state = reaction.state;
        trace!(time = self.time, reaction = reaction.event, state = ?self.state, "fired");
    }

    /// Fire one event unless the process is stopped.
    ///
    /// Stops with [`StopReason::HorizonReached`] once the time is at or past
    /// `horizon`, and with [`StopReason::AbsorbingStateReached`] when the
    /// total propensity is zero. Once stopped, the process never moves again
    /// and further calls return the same [`SimState`] without touching `rng`.
    pub fn step(&mut self, horizon: f64, rng: &mut impl Rng) -> SimState {
        if let SimState::Stop(_) = self.sim_state {
            return self.sim_state;
        }
        if self.time >= horizon {
            self.sim_state = SimState::Stop(StopReason::HorizonReached);
            return self.sim_state;
        }
        match self.next_reaction(rng) {
            (SimState::Continue, Some(reaction)) => self.advance_step(reaction),
            (sim_state, _) => self.sim_state = sim_state,
        }
        self.sim_state
    }
}

/// Index of the first candidate whose running propensity sum is strictly
/// greater than `threshold`.
///
/// Rounding can leave the full sum a hair under `threshold` when `u2` is
/// close to `1`; the last candidate is picked in that case.
fn select_transition(candidates: &[Transition], threshold: f64) -> usize {
    let mut running = 0.;
    for (idx, candidate) in candidates.iter().enumerate() {
        running += candidate.propensity;
        if running > threshold {
            return idx;
        }
    }
    candidates.len() - 1
}
