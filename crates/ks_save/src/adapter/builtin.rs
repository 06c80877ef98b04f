use alloc::format;
use alloc::string::{String, ToString};
use core::time::Duration;

use uuid::Uuid;

use super::{NoStandIn, SaveAdapter};
use crate::error::SaverError;

// -----------------------------------------------------------------------------
// UuidAdapter

/// Built-in value adapter storing a [`Uuid`] as its hyphenated string form,
/// e.g. `"67e55044-10b1-426f-9247-bb680e5fe0c8"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidAdapter;

impl SaveAdapter<Uuid> for UuidAdapter {
    type StandIn = NoStandIn;
    type Repr = String;

    fn to_value(&self, value: &Uuid) -> Result<String, SaverError> {
        Ok(value.as_hyphenated().to_string())
    }

    fn from_value(&self, repr: String) -> Result<Uuid, SaverError> {
        Uuid::try_parse(&repr)
            .map_err(|error| SaverError::custom(format_args!("invalid uuid `{repr}`: {error}")))
    }
}

// -----------------------------------------------------------------------------
// DurationAdapter

/// Built-in value adapter storing a [`Duration`] as `"<secs>.<nanos>"` with
/// the nanosecond part always nine digits, e.g. `"90.500000000"`.
///
/// The fixed-width fraction keeps the encoding culture-independent and
/// unambiguous to parse back.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationAdapter;

impl SaveAdapter<Duration> for DurationAdapter {
    type StandIn = NoStandIn;
    type Repr = String;

    fn to_value(&self, value: &Duration) -> Result<String, SaverError> {
        Ok(format!("{}.{:09}", value.as_secs(), value.subsec_nanos()))
    }

    fn from_value(&self, repr: String) -> Result<Duration, SaverError> {
        let invalid = || SaverError::custom(format_args!("invalid duration `{repr}`"));

        let (secs, nanos) = repr.split_once('.').ok_or_else(invalid)?;
        if nanos.len() != 9 {
            return Err(invalid());
        }

        let secs: u64 = secs.parse().map_err(|_| invalid())?;
        let nanos: u32 = nanos.parse().map_err(|_| invalid())?;
        Ok(Duration::new(secs, nanos))
    }
}

// -----------------------------------------------------------------------------
// Tests
