use alloc::string::{String, ToString};

use super::{Scalar, ScalarKind};
use crate::error::SaverError;

// -----------------------------------------------------------------------------
// SaveValue

/// The capability of being stored as exactly one scalar leaf node.
///
/// Implemented for booleans, every integer width, `f32`/`f64`, `char`
/// (a single-character string leaf) and `String`. Enumerations participate by
/// implementing the trait over their integer ordinal:
///
/// ```
/// use ks_save::{SaveValue, Scalar, SaverError};
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Quality { Poor, Decent, Great }
///
/// impl SaveValue for Quality {
///     fn to_scalar(&self) -> Scalar {
///         Scalar::I64(*self as i64)
///     }
///
///     fn from_scalar(scalar: Scalar) -> Result<Self, SaverError> {
///         match i64::from_scalar(scalar)? {
///             0 => Ok(Self::Poor),
///             1 => Ok(Self::Decent),
///             2 => Ok(Self::Great),
///             ordinal => Err(SaverError::custom(format_args!(
///                 "no Quality with ordinal {ordinal}"
///             ))),
///         }
///     }
/// }
/// ```
///
/// There is no absence concept at this level: a value field is always written
/// on save, and a load that finds no matching leaf leaves the field untouched.
pub trait SaveValue: Sized {
    /// Converts this value into its scalar leaf form.
    fn to_scalar(&self) -> Scalar;

    /// Reconstructs a value from its scalar leaf form.
    fn from_scalar(scalar: Scalar) -> Result<Self, SaverError>;
}

impl SaveValue for bool {
    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Bool(*self)
    }

    fn from_scalar(scalar: Scalar) -> Result<Self, SaverError> {
        match scalar {
            Scalar::Bool(value) => Ok(value),
            other => Err(SaverError::scalar("bool", other.kind())),
        }
    }
}

impl SaveValue for String {
    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Str(self.clone())
    }

    fn from_scalar(scalar: Scalar) -> Result<Self, SaverError> {
        match scalar {
            Scalar::Str(value) => Ok(value),
            other => Err(SaverError::scalar("String", other.kind())),
        }
    }
}

impl SaveValue for char {
    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Str(String::from(*self))
    }

    fn from_scalar(scalar: Scalar) -> Result<Self, SaverError> {
        match scalar {
            Scalar::Str(value) => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(SaverError::scalar("char", ScalarKind::Str)),
                }
            }
            other => Err(SaverError::scalar("char", other.kind())),
        }
    }
}

macro_rules! impl_save_value_int {
    ($variant:ident: $($ty:ty),* $(,)?) => {$(
        impl SaveValue for $ty {
            #[inline]
            fn to_scalar(&self) -> Scalar {
                Scalar::$variant(*self as _)
            }

            fn from_scalar(scalar: Scalar) -> Result<Self, SaverError> {
                match scalar {
                    Scalar::I64(value) => Self::try_from(value)
                        .map_err(|_| SaverError::scalar(stringify!($ty), ScalarKind::I64)),
                    Scalar::U64(value) => Self::try_from(value)
                        .map_err(|_| SaverError::scalar(stringify!($ty), ScalarKind::U64)),
                    other => Err(SaverError::scalar(stringify!($ty), other.kind())),
                }
            }
        }
    )*};
}

impl_save_value_int!(I64: i8, i16, i32, i64, isize);
impl_save_value_int!(U64: u8, u16, u32, u64, usize);

macro_rules! impl_save_value_float {
    ($($ty:ty),* $(,)?) => {$(
        impl SaveValue for $ty {
            #[inline]
            fn to_scalar(&self) -> Scalar {
                Scalar::F64(*self as f64)
            }

            fn from_scalar(scalar: Scalar) -> Result<Self, SaverError> {
                // Stores without a float/integer distinction hand back whole
                // floats as integer leaves; accept all three numeric kinds.
                match scalar {
                    Scalar::F64(value) => Ok(value as $ty),
                    Scalar::I64(value) => Ok(value as $ty),
                    Scalar::U64(value) => Ok(value as $ty),
                    other => Err(SaverError::scalar(stringify!($ty), other.kind())),
                }
            }
        }
    )*};
}

impl_save_value_float!(f32, f64);

// -----------------------------------------------------------------------------
// SaveKey

/// The capability of serving as a map property name.
///
/// Maps store their keys as the string form of the key; loading converts the
/// property name back. The supported key set is deliberately closed — strings,
/// integer widths and `char` — rather than a fully generic conversion path.
/// Enumeration keys opt in with a hand-written impl over their ordinal or
/// name.
pub trait SaveKey: Sized {
    /// The property-name form of this key.
    fn to_key(&self) -> String;

    /// Parses a key back from its property-name form.
    fn from_key(key: &str) -> Result<Self, SaverError>;
}

impl SaveKey for String {
    #[inline]
    fn to_key(&self) -> String {
        self.clone()
    }

    #[inline]
    fn from_key(key: &str) -> Result<Self, SaverError> {
        Ok(key.to_string())
    }
}

impl SaveKey for char {
    #[inline]
    fn to_key(&self) -> String {
        String::from(*self)
    }

    fn from_key(key: &str) -> Result<Self, SaverError> {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(SaverError::map_key(key, "char")),
        }
    }
}

macro_rules! impl_save_key_int {
    ($($ty:ty),* $(,)?) => {$(
        impl SaveKey for $ty {
            #[inline]
            fn to_key(&self) -> String {
                self.to_string()
            }

            fn from_key(key: &str) -> Result<Self, SaverError> {
                key.parse().map_err(|_| SaverError::map_key(key, stringify!($ty)))
            }
        }
    )*};
}

impl_save_key_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// -----------------------------------------------------------------------------
// Tests
