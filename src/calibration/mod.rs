//! Standard curve: fitting and inversion.
//!
//! Responsibilities:
//!
//! - fit absorbance vs concentration by least squares (`fitter`)
//! - substitute the documented fallback model when standards are insufficient
//! - back-calculate concentrations from absorbance, floored at zero (`resolver`)

pub mod fitter;
pub mod resolver;

pub use fitter::*;
pub use resolver::*;
