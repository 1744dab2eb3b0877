//! Request handlers.

pub mod calls;
pub mod health;
pub mod responses;
pub mod search;
pub mod video;

pub use health::*;
pub use responses::*;
pub use search::*;
pub use video::*;
