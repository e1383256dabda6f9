pub mod backup;
pub mod export;

pub use backup::*;
pub use export::*;
