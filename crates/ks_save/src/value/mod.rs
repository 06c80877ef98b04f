//! The scalar leaf model: what counts as a "value" and as a map key.
//!
//! A [`Scalar`] is the engine's view of one typed leaf node in the backing
//! store; [`SaveValue`] is the capability of converting to and from exactly
//! one such leaf. [`SaveKey`] is the narrower capability of serving as a map
//! property name. Concrete store bindings translate `Scalar` into their own
//! leaf representation and never see the Rust value types themselves.

mod convert;
mod scalar;

pub use convert::{SaveKey, SaveValue};
pub use scalar::{Scalar, ScalarKind};
