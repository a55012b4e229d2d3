pub mod compile;
pub mod criterion;
pub mod dataset;
pub mod features;
pub mod fitness;
pub mod flags;
pub mod metadata;
pub mod runner;
pub mod strategies;
