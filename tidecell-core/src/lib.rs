pub mod component;
pub mod dataset;
pub mod spatial;
pub mod standard_variables;
pub mod timeseries;
pub mod variable;

pub mod errors;
