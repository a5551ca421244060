//! Continuous Sample Generator
//!
//! Feeds the readings table with random height and flow samples on a fixed
//! interval, standing in for a field sensor.

mod generator;

pub use generator::{GeneratorConfig, SampleGenerator};
