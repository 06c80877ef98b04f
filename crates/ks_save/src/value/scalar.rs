use alloc::string::String;
use core::fmt;

// -----------------------------------------------------------------------------
// Scalar

/// One typed scalar leaf of the backing store, as the engine sees it.
///
/// Integer leaves are widened to 64 bits with the sign preserved; store
/// bindings that read numbers back should prefer `I64`, then `U64`, then
/// `F64`, so that [`SaveValue`](super::SaveValue) conversions can narrow
/// losslessly.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
}

impl Scalar {
    /// The [kind](ScalarKind) of this leaf, for shape errors.
    #[inline]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::I64(_) => ScalarKind::I64,
            Self::U64(_) => ScalarKind::U64,
            Self::F64(_) => ScalarKind::F64,
            Self::Str(_) => ScalarKind::Str,
        }
    }
}

// -----------------------------------------------------------------------------
// ScalarKind

/// The shape of a [`Scalar`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    I64,
    U64,
    F64,
    Str,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("a boolean"),
            Self::I64 => f.write_str("a signed integer"),
            Self::U64 => f.write_str("an unsigned integer"),
            Self::F64 => f.write_str("a floating-point"),
            Self::Str => f.write_str("a string"),
        }
    }
}
