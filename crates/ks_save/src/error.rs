use alloc::boxed::Box;
use alloc::string::ToString;
use core::{error, fmt};

use crate::value::ScalarKind;

// -----------------------------------------------------------------------------
// AdapterDirection

/// The two conversion directions a [`SaveAdapter`](crate::adapter::SaveAdapter)
/// may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterDirection {
    /// Conversion to and from a saveable stand-in.
    Object,
    /// Conversion to and from a primitive value representation.
    Value,
}

impl fmt::Display for AdapterDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => f.write_str("object"),
            Self::Value => f.write_str("value"),
        }
    }
}

// -----------------------------------------------------------------------------
// SaverError

/// An enumeration of all error outcomes that might happen during a traversal
/// run (one save or one load pass).
///
/// Failures raised while processing a single field are wrapped into
/// [`Field`](Self::Field) by the engine and routed through the installed
/// [`SaverSettings`](crate::settings::SaverSettings) policy before they
/// propagate. [`Key`](Self::Key) and [`AdapterContract`](Self::AdapterContract)
/// failures are [fatal](Self::is_fatal) and bypass that policy entirely.
#[derive(Debug)]
pub enum SaverError {
    /// Failed while declaring the type tag itself, before any field was
    /// processed. Always fatal to the current run.
    Key {
        source: Box<SaverError>,
    },
    /// Failed while processing a single field operation.
    Field {
        name: Box<str>,
        source: Box<SaverError>,
    },
    /// A tag-to-factory mapping was asked to construct an instance for a tag
    /// it does not recognize.
    UnknownTag {
        tag: Box<str>,
    },
    /// An adapter was driven in a conversion direction it does not support.
    ///
    /// This is a programming error, not a data error: it is never swallowed,
    /// regardless of the installed handler or the ignore flag.
    AdapterContract {
        direction: AdapterDirection,
    },
    /// A scalar leaf could not be converted into the requested value type.
    Scalar {
        expected: &'static str,
        found: ScalarKind,
    },
    /// A store node had the wrong shape for the requested operation.
    Node {
        expected: &'static str,
        found: &'static str,
    },
    /// A map property name could not be parsed back into the key type.
    MapKey {
        key: Box<str>,
        target: &'static str,
    },
    /// A custom failure raised by user code (factories, adapters, declarations).
    Message {
        message: Box<str>,
    },
}

impl SaverError {
    /// Wraps a failure that occurred while declaring the type tag.
    #[inline]
    pub fn key(source: SaverError) -> Self {
        Self::Key {
            source: Box::new(source),
        }
    }

    /// Wraps a failure that occurred while processing the field `name`.
    #[inline]
    pub fn field(name: &str, source: SaverError) -> Self {
        Self::Field {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Creates the failure a factory raises for an unrecognized type tag.
    ///
    /// An empty `tag` means the store node carried no tag entry at all.
    #[inline]
    pub fn unknown_tag(tag: &str) -> Self {
        Self::UnknownTag { tag: tag.into() }
    }

    #[inline]
    pub fn scalar(expected: &'static str, found: ScalarKind) -> Self {
        Self::Scalar { expected, found }
    }

    #[inline]
    pub fn node(expected: &'static str, found: &'static str) -> Self {
        Self::Node { expected, found }
    }

    #[inline]
    pub fn map_key(key: &str, target: &'static str) -> Self {
        Self::MapKey {
            key: key.into(),
            target,
        }
    }

    /// Creates a custom failure from any displayable message.
    pub fn custom(message: impl fmt::Display) -> Self {
        Self::Message {
            message: message.to_string().into_boxed_str(),
        }
    }

    /// Whether this failure must propagate unconditionally.
    ///
    /// Fatal failures are type-tag failures and adapter capability-contract
    /// violations; fatality is transitive through [`Field`](Self::Field)
    /// wrapping, so a nested contract violation cannot be swallowed by an
    /// outer field's policy either.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Key { .. } | Self::AdapterContract { .. } => true,
            Self::Field { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}

impl fmt::Display for SaverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key { .. } => f.write_str("failed to declare the type tag"),
            Self::Field { name, .. } => {
                write!(f, "failed to save or load field `{name}`")
            }
            Self::UnknownTag { tag } if tag.is_empty() => {
                f.write_str("store node carries no type tag")
            }
            Self::UnknownTag { tag } => write!(f, "unknown type tag `{tag}`"),
            Self::AdapterContract { direction } => {
                write!(f, "adapter does not support the {direction} direction")
            }
            Self::Scalar { expected, found } => {
                write!(f, "cannot convert {found} leaf into `{expected}`")
            }
            Self::Node { expected, found } => {
                write!(f, "expected {expected} node, found {found} node")
            }
            Self::MapKey { key, target } => {
                write!(f, "cannot parse map key `{key}` as `{target}`")
            }
            Self::Message { message } => f.write_str(message),
        }
    }
}

impl error::Error for SaverError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Key { source } | Self::Field { source, .. } => Some(source),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
