pub mod building;
pub mod prediction;

pub use building::*;
pub use prediction::*;
