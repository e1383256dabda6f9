pub mod error;
pub mod events;
pub mod service;

pub use error::*;
pub use events::*;
pub use service::*;
