// Counterfactual wins-above-replacement pipeline.
//
// baseline -> simulate -> aggregate, fronted by the scope query layer in
// `query`. Each stage is pure over the league facts; only the query layer
// touches the result cache.

pub mod aggregate;
pub mod baseline;
pub mod query;
pub mod scope;
pub mod simulate;

pub use aggregate::{Accumulator, WarRecord};
pub use baseline::{baseline, BaselineSet, NoBaselineData, ReplacementPool};
pub use query::{options, query, QueryOutcome};
pub use scope::{QueryFilter, Scope, ValidOptions};
pub use simulate::{simulate, Outcome, Simulation};
