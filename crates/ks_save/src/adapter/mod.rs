//! Conversion adapters: the bridge for types that are neither saveable nor
//! primitive-convertible.
//!
//! An adapter maps a domain type into one of the two participating
//! categories — a saveable **stand-in** (the object direction) or a
//! [`SaveValue`] **repr** (the value direction) — once, at the declaration
//! call site. Adapters are pure and stateless; they own no data and must
//! round-trip every value the domain type can hold, except where the adapter
//! author intentionally discards state that is not meant to persist.
//!
//! Driving an adapter in a direction it does not support is a programming
//! error, not a data error: it raises [`SaverError::AdapterContract`], which
//! the error policy never swallows.

mod builtin;

pub use builtin::{DurationAdapter, UuidAdapter};

use core::marker::PhantomData;

use crate::error::{AdapterDirection, SaverError};
use crate::saveable::Saveable;
use crate::saver::Saver;
use crate::value::{SaveValue, Scalar};

// -----------------------------------------------------------------------------
// SaveAdapter

/// A stateless mapping that lets a non-participating domain type `T` take
/// part in a traversal.
///
/// The trait carries both capability directions; every method defaults to a
/// capability-contract failure, so an implementation only overrides the
/// direction it supports:
///
/// - **object direction**: [`create_stand_in`] / [`to_stand_in`] /
///   [`from_stand_in`], with [`StandIn`](Self::StandIn) naming the saveable
///   stand-in type ([`NoValue`] fills the unused `Repr`).
/// - **value direction**: [`to_value`] / [`from_value`], with
///   [`Repr`](Self::Repr) naming the scalar representation ([`NoStandIn`]
///   fills the unused `StandIn`).
///
/// For one-off adapters, [`FnObjectAdapter`] and [`FnValueAdapter`] wrap
/// plain closures.
///
/// [`create_stand_in`]: Self::create_stand_in
/// [`to_stand_in`]: Self::to_stand_in
/// [`from_stand_in`]: Self::from_stand_in
/// [`to_value`]: Self::to_value
/// [`from_value`]: Self::from_value
pub trait SaveAdapter<T> {
    /// The saveable stand-in produced by the object direction.
    type StandIn: Saveable;
    /// The scalar representation produced by the value direction.
    type Repr: SaveValue;

    /// Constructs a fresh stand-in for loading, keyed by the type tag.
    fn create_stand_in(&self, tag: &str) -> Result<Self::StandIn, SaverError> {
        let _ = tag;
        Err(SaverError::AdapterContract {
            direction: AdapterDirection::Object,
        })
    }

    /// Produces the stand-in that is saved in place of `value`.
    fn to_stand_in(&self, value: &T) -> Result<Self::StandIn, SaverError> {
        let _ = value;
        Err(SaverError::AdapterContract {
            direction: AdapterDirection::Object,
        })
    }

    /// Reconstructs a live instance from a loaded stand-in.
    fn from_stand_in(&self, stand_in: Self::StandIn) -> Result<T, SaverError> {
        let _ = stand_in;
        Err(SaverError::AdapterContract {
            direction: AdapterDirection::Object,
        })
    }

    /// Produces the scalar representation that is saved in place of `value`.
    fn to_value(&self, value: &T) -> Result<Self::Repr, SaverError> {
        let _ = value;
        Err(SaverError::AdapterContract {
            direction: AdapterDirection::Value,
        })
    }

    /// Reconstructs a live instance from a loaded scalar representation.
    fn from_value(&self, repr: Self::Repr) -> Result<T, SaverError> {
        let _ = repr;
        Err(SaverError::AdapterContract {
            direction: AdapterDirection::Value,
        })
    }
}

// -----------------------------------------------------------------------------
// Placeholder types

/// Uninhabited stand-in type for adapters that only support the value
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoStandIn {}

impl Saveable for NoStandIn {
    fn save_data(&mut self, _saver: &mut impl Saver) -> Result<(), SaverError> {
        match *self {}
    }
}

/// Uninhabited value representation for adapters that only support the object
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoValue {}

impl SaveValue for NoValue {
    fn to_scalar(&self) -> Scalar {
        match *self {}
    }

    fn from_scalar(_scalar: Scalar) -> Result<Self, SaverError> {
        Err(SaverError::AdapterContract {
            direction: AdapterDirection::Value,
        })
    }
}

// -----------------------------------------------------------------------------
// FnObjectAdapter

/// An object-direction adapter assembled from three closures.
///
/// # Examples
///
/// ```
/// use ks_save::adapter::FnObjectAdapter;
/// use ks_save::{SaveAdapter, SaverError, Saveable, Saver};
///
/// // `Instant`-like foreign type that cannot implement `Saveable` itself.
/// struct Stamp(u64);
///
/// #[derive(Default)]
/// struct StampData {
///     ticks: u64,
/// }
///
/// impl Saveable for StampData {
///     fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
///         saver.add_key("demo.Stamp")?;
///         saver.add_value(&mut self.ticks, "ticks")
///     }
/// }
///
/// let adapter = FnObjectAdapter::new(
///     |_tag: &str| Ok(StampData::default()),
///     |stamp: &Stamp| Ok(StampData { ticks: stamp.0 }),
///     |data: StampData| Ok(Stamp(data.ticks)),
/// );
///
/// let stand_in = adapter.to_stand_in(&Stamp(7))?;
/// assert_eq!(stand_in.ticks, 7);
/// let live = adapter.from_stand_in(stand_in)?;
/// assert_eq!(live.0, 7);
/// # Ok::<(), SaverError>(())
/// ```
pub struct FnObjectAdapter<S, Create, To, From> {
    create: Create,
    to: To,
    from: From,
    marker: PhantomData<fn() -> S>,
}

impl<S, Create, To, From> FnObjectAdapter<S, Create, To, From> {
    #[inline]
    pub fn new(create: Create, to: To, from: From) -> Self {
        Self {
            create,
            to,
            from,
            marker: PhantomData,
        }
    }
}

impl<T, S, Create, To, From> SaveAdapter<T> for FnObjectAdapter<S, Create, To, From>
where
    S: Saveable,
    Create: Fn(&str) -> Result<S, SaverError>,
    To: Fn(&T) -> Result<S, SaverError>,
    From: Fn(S) -> Result<T, SaverError>,
{
    type StandIn = S;
    type Repr = NoValue;

    fn create_stand_in(&self, tag: &str) -> Result<S, SaverError> {
        (self.create)(tag)
    }

    fn to_stand_in(&self, value: &T) -> Result<S, SaverError> {
        (self.to)(value)
    }

    fn from_stand_in(&self, stand_in: S) -> Result<T, SaverError> {
        (self.from)(stand_in)
    }
}

// -----------------------------------------------------------------------------
// FnValueAdapter

/// A value-direction adapter assembled from two closures.
pub struct FnValueAdapter<R, To, From> {
    to: To,
    from: From,
    marker: PhantomData<fn() -> R>,
}

impl<R, To, From> FnValueAdapter<R, To, From> {
    #[inline]
    pub fn new(to: To, from: From) -> Self {
        Self {
            to,
            from,
            marker: PhantomData,
        }
    }
}

impl<T, R, To, From> SaveAdapter<T> for FnValueAdapter<R, To, From>
where
    R: SaveValue,
    To: Fn(&T) -> Result<R, SaverError>,
    From: Fn(R) -> Result<T, SaverError>,
{
    type StandIn = NoStandIn;
    type Repr = R;

    fn to_value(&self, value: &T) -> Result<R, SaverError> {
        (self.to)(value)
    }

    fn from_value(&self, repr: R) -> Result<T, SaverError> {
        (self.from)(repr)
    }
}

// -----------------------------------------------------------------------------
// Tests
