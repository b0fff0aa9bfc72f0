pub mod chain;
pub mod config;
pub mod error;
pub mod generator;
pub mod naming;
pub mod params;
pub mod script;
pub mod seed;
pub mod tool;

pub use crate::error::{PrepError, ToolFailure};
pub use crate::generator::{GenerationReport, Generator, GeneratorSettings};
pub use crate::params::{DerivedParameters, SystemParameters, Variant};
pub use crate::seed::SeedSource;
pub use crate::tool::{ProcessRunner, ToolCommand, ToolOutput, ToolRunner};

// shortest round-trip form, always with a decimal point or exponent
pub(crate) fn real(x: f64) -> String {
    format!("{:?}", x)
}
