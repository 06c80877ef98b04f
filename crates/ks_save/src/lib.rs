#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod saveable;
mod saver;
mod settings;

pub mod adapter;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use adapter::SaveAdapter;
pub use error::{AdapterDirection, SaverError};
pub use saveable::Saveable;
pub use saver::{Saver, strip_field_name};
pub use settings::{ErrorHandler, Handled, SaverSettings};
pub use value::{SaveKey, SaveValue, Scalar, ScalarKind};
