//! Demo data sources.

pub mod synthetic;

pub use synthetic::{DemoConfig, DemoDataset, DemoSample, generate_demo, write_demo};
