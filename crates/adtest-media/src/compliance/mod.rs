//! Policy validation, ratio resolution and transform planning.
//!
//! Everything here is pure: no I/O, no subprocesses. The pipeline feeds it
//! metadata from the prober and hands the resulting plan to the transcoder.

pub mod plan;
pub mod resolver;
pub mod validator;

pub use plan::build_plan;
pub use resolver::{aspect_ratio_label, closest_ratio, gcd, reduce_ratio, scaled_resolution};
pub use validator::validate;
