//! Stochastic mass-action propensities.
//!
//! The rate at which a reaction fires is its rate constant times the number
//! of distinct ways its reactants can be picked from the current copy
//! numbers. For a species with `n` copies consumed `e` times this is the
//! falling factorial `n (n - 1) ... (n - e + 1)`, not the power `n^e` of the
//! deterministic rate law: molecules are drawn without replacement.
use crate::network::Coefficient;
use crate::NbIndividuals;

/// The falling factorial `n (n - 1) ... (n - e + 1)`, `1` when `e` is `0`.
///
/// When `e > n` the product runs through a zero factor and the result is
/// `0`: the reaction cannot fire.
pub fn falling_factorial(n: NbIndividuals, e: Coefficient) -> f64 {
    let e = NbIndividuals::from(e);
    if e > n {
        return 0.;
    }
    (n - e + 1..=n).map(|factor| factor as f64).product()
}

/// Insert a `0` at `null_index`, so that `state` lines up with the columns
/// of the stoichiometry matrices.
pub fn with_null(state: &[NbIndividuals], null_index: usize) -> Vec<NbIndividuals> {
    let mut augmented = Vec::with_capacity(state.len() + 1);
    augmented.extend_from_slice(&state[..null_index]);
    augmented.push(0);
    augmented.extend_from_slice(&state[null_index..]);
    augmented
}

/// The combinatorial part of the propensity: the product over all real
/// species of [`falling_factorial`], with `exponents` the reactant row of
/// the reaction and `augmented_state` the state returned by [`with_null`].
/// The null column is skipped.
pub fn combinatorial_term(
    exponents: &[Coefficient],
    augmented_state: &[NbIndividuals],
    null_index: usize,
) -> f64 {
    exponents
        .iter()
        .zip(augmented_state.iter())
        .enumerate()
        .filter(|(species, _)| *species != null_index)
        .map(|(_, (&e, &n))| falling_factorial(n, e))
        .product()
}

pub fn propensity(
    rate: f64,
    exponents: &[Coefficient],
    augmented_state: &[NbIndividuals],
    null_index: usize,
) -> f64 {
    rate * combinatorial_term(exponents, augmented_state, null_index)
}
