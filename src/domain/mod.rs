//! Domain Layer - Core business logic and entities
//!
//! Market data entities, user identity and the value objects shared by the
//! application and presentation layers.

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use services::*;
pub use value_objects::*;
