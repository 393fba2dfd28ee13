//! Currencycloud Common Types
//!
//! Shared types used by the Currencycloud client crates: currency codes and
//! pairs, quote vocabulary, identifiers and the error type.

pub mod identifiers;
pub mod monetary;
pub mod error;

pub use identifiers::*;
pub use monetary::*;
pub use error::*;
