//! The reaction network consumed by the simulator.
//!
//! A network with `N` reactions over `S` real species is described by two
//! `N x (S + 1)` stoichiometry matrices, one for the reactants and one for
//! the products. The extra column, found at [`ReactionNetwork::null_index`],
//! is the null species: it stands for "nothing" so that synthesis
//! (`∅ -> A`) and degradation (`A -> ∅`) reactions fit the same square
//! layout as every other reaction. The null column never shows up in the
//! state vector.
use thiserror::Error;
use tracing::debug;

use crate::propensity;
use crate::NbIndividuals;

/// Stoichiometric coefficient of a species in a reaction.
pub type Coefficient = u32;

/// A malformed network or simulation setup, detected before any event is
/// simulated.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigurationError {
    #[error("the network must have at least one reaction")]
    NoReactions,
    #[error("reactant matrix has {reactants} rows but product matrix has {products}")]
    ReactionCountMismatch { reactants: usize, products: usize },
    #[error("expected {expected} rates, one per reaction, found {found}")]
    RateCountMismatch { expected: usize, found: usize },
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("null index {null_index} out of range for {columns} columns")]
    NullIndexOutOfRange { null_index: usize, columns: usize },
    #[error("rate {rate} of reaction {reaction} is negative or not finite")]
    InvalidRate { reaction: usize, rate: f64 },
    #[error("state has {found} species but the network has {expected}")]
    StateLengthMismatch { expected: usize, found: usize },
    #[error("run horizon {0} must be a non-negative number")]
    InvalidHorizon(f64),
}

/// A chemical reaction network under mass-action kinetics.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionNetwork {
    reactants: Vec<Vec<Coefficient>>,
    products: Vec<Vec<Coefficient>>,
    rates: Vec<f64>,
    null_index: usize,
    /// `products - reactants` for the real species only (null column
    /// removed), one row per reaction.
    stoichiometry: Vec<Vec<i64>>,
}

impl ReactionNetwork {
    /// Build a network from its reactant and product matrices (one row per
    /// reaction, one column per species plus the null column), the rate of
    /// each reaction and the column of the null species.
    ///
    /// All the checks the simulation relies on happen here, once: matrices
    /// must agree in shape, the null index must address a column and every
    /// rate must be finite and non-negative.
    pub fn new(
        reactants: Vec<Vec<Coefficient>>,
        products: Vec<Vec<Coefficient>>,
        rates: Vec<f64>,
        null_index: usize,
    ) -> Result<Self, ConfigurationError> {
        if reactants.is_empty() {
            return Err(ConfigurationError::NoReactions);
        }
        if reactants.len() != products.len() {
            return Err(ConfigurationError::ReactionCountMismatch {
                reactants: reactants.len(),
                products: products.len(),
            });
        }
        if rates.len() != reactants.len() {
            return Err(ConfigurationError::RateCountMismatch {
                expected: reactants.len(),
                found: rates.len(),
            });
        }
        let columns = reactants[0].len();
        for (row, (r, p)) in reactants.iter().zip(products.iter()).enumerate() {
            for found in [r.len(), p.len()] {
                if found != columns {
                    return Err(ConfigurationError::RaggedRow {
                        row,
                        expected: columns,
                        found,
                    });
                }
            }
        }
        if null_index >= columns {
            return Err(ConfigurationError::NullIndexOutOfRange {
                null_index,
                columns,
            });
        }
        if let Some((reaction, &rate)) = rates
            .iter()
            .enumerate()
            .find(|(_, rate)| !rate.is_finite() || rate.is_sign_negative())
        {
            return Err(ConfigurationError::InvalidRate { reaction, rate });
        }

        let stoichiometry = reactants
            .iter()
            .zip(products.iter())
            .map(|(r, p)| {
                r.iter()
                    .zip(p.iter())
                    .enumerate()
                    .filter(|(col, _)| *col != null_index)
                    .map(|(_, (&r, &p))| i64::from(p) - i64::from(r))
                    .collect()
            })
            .collect();

        debug!(
            reactions = reactants.len(),
            species = columns - 1,
            null_index,
            "built reaction network"
        );

        Ok(ReactionNetwork {
            reactants,
            products,
            rates,
            null_index,
            stoichiometry,
        })
    }

    pub fn nb_reactions(&self) -> usize {
        self.rates.len()
    }

    /// Number of real species, the null species excluded.
    pub fn nb_species(&self) -> usize {
        self.reactants[0].len() - 1
    }

    pub fn null_index(&self) -> usize {
        self.null_index
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn reactants(&self) -> &[Vec<Coefficient>] {
        &self.reactants
    }

    pub fn products(&self) -> &[Vec<Coefficient>] {
        &self.products
    }

    /// The change in copy numbers caused by each reaction, real species only.
    pub fn stoichiometry(&self) -> &[Vec<i64>] {
        &self.stoichiometry
    }

    /// Ensure `state` has one copy number per real species.
    pub fn check_state(&self, state: &[NbIndividuals]) -> Result<(), ConfigurationError> {
        if state.len() != self.nb_species() {
            return Err(ConfigurationError::StateLengthMismatch {
                expected: self.nb_species(),
                found: state.len(),
            });
        }
        Ok(())
    }

    /// The propensity of every reaction in `state`, in reaction order.
    pub fn propensities(&self, state: &[NbIndividuals]) -> Vec<f64> {
        let augmented = propensity::with_null(state, self.null_index);
        self.reactants
            .iter()
            .zip(self.rates.iter())
            .map(|(exponents, &rate)| {
                propensity::propensity(rate, exponents, &augmented, self.null_index)
            })
            .collect()
    }
}
