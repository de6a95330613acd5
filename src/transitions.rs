//! The transitions available from a state.
use crate::network::ReactionNetwork;
use crate::propensity;
use crate::NbIndividuals;

/// A reaction that can fire from the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Index of the reaction in the network.
    pub reaction: usize,
    /// The state entered when the reaction fires.
    pub state: Vec<NbIndividuals>,
    pub propensity: f64,
}

/// All the reactions that can fire from `state`, in network order.
///
/// A reaction is kept only if its propensity is strictly positive and the
/// state it leads to has no negative copy number. The order matters: the
/// sampler scans this list with a running sum.
///
/// ## Panics
/// If `state` does not have one entry per species of `network`, see
/// [`ReactionNetwork::check_state`].
pub fn transitions(network: &ReactionNetwork, state: &[NbIndividuals]) -> Vec<Transition> {
    let augmented = propensity::with_null(state, network.null_index());

    network
        .reactants()
        .iter()
        .zip(network.rates().iter())
        .zip(network.stoichiometry().iter())
        .enumerate()
        .filter_map(|(reaction, ((exponents, &rate), change))| {
            let propensity =
                propensity::propensity(rate, exponents, &augmented, network.null_index());
            if propensity <= 0. {
                return None;
            }
            let state = state
                .iter()
                .zip(change.iter())
                .map(|(&n, &delta)| n.checked_add_signed(delta))
                .collect::<Option<Vec<NbIndividuals>>>()?;
            Some(Transition {
                reaction,
                state,
                propensity,
            })
        })
        .collect()
}

/// Sum of the propensities of `candidates`.
pub fn total_propensity(candidates: &[Transition]) -> f64 {
    candidates.iter().map(|t| t.propensity).sum()
}
