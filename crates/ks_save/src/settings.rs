use alloc::borrow::Cow;
use alloc::boxed::Box;
use core::fmt;

use crate::error::SaverError;

// -----------------------------------------------------------------------------
// Handled

/// The verdict an [error handler](SaverSettings::with_handler) returns for a
/// field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The failure was dealt with; the run continues and the field is left in
    /// its pre-operation state.
    Handled,
    /// The failure was not dealt with; whether it propagates now depends only
    /// on [`ignore_unhandled`](SaverSettings::with_ignore_unhandled).
    Unhandled,
}

/// A user-installable callback consulted for every field failure.
pub type ErrorHandler = dyn Fn(&SaverError) -> Handled;

// -----------------------------------------------------------------------------
// SaverSettings

/// Per-run configuration for a traversal.
///
/// Settings are supplied by reference when a save or load run begins and stay
/// immutable for that run's duration; nested bindings share the same borrow.
/// There is no ambient global state.
///
/// # Examples
///
/// ```
/// use ks_save::{Handled, SaverSettings};
///
/// let settings = SaverSettings::default()
///     .with_key_name("!kind")
///     .with_handler(|error| {
///         log_somewhere(error);
///         Handled::Unhandled
///     })
///     .with_ignore_unhandled(true);
///
/// assert_eq!(settings.key_name(), "!kind");
/// # fn log_somewhere(_: &ks_save::SaverError) {}
/// ```
pub struct SaverSettings {
    handler: Option<Box<ErrorHandler>>,
    ignore_unhandled: bool,
    key_name: Cow<'static, str>,
}

impl SaverSettings {
    /// The property name the type tag is stored under unless
    /// [customized](Self::with_key_name).
    pub const DEFAULT_KEY_NAME: &'static str = "$type";

    /// Installs a handler that is consulted before any field failure
    /// propagates.
    ///
    /// Returning [`Handled::Handled`] swallows the failure regardless of the
    /// ignore flag. Capability-contract violations and type-tag failures are
    /// fatal and never reach the handler.
    pub fn with_handler(mut self, handler: impl Fn(&SaverError) -> Handled + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Sets whether field failures the handler leaves unhandled are swallowed
    /// instead of propagated.
    ///
    /// Off by default: one field's failure should not silently corrupt the
    /// rest of the traversal. Turn it on for best-effort loading of
    /// partially drifted data, accepting that unpopulated fields retain
    /// their pre-load state.
    pub fn with_ignore_unhandled(mut self, ignore: bool) -> Self {
        self.ignore_unhandled = ignore;
        self
    }

    /// Sets the property name the type tag is stored under.
    pub fn with_key_name(mut self, key_name: impl Into<Cow<'static, str>>) -> Self {
        self.key_name = key_name.into();
        self
    }

    /// The property name the type tag is stored under.
    #[inline]
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Routes a single field operation's outcome through the error policy.
    ///
    /// Failures are wrapped with the field `name`, then: fatal failures
    /// propagate unconditionally; otherwise the installed handler may swallow
    /// them; otherwise the ignore flag decides. This is the only place the
    /// policy lives — every public `add_*` operation funnels through it.
    pub fn resolve_field(&self, name: &str, result: Result<(), SaverError>) -> Result<(), SaverError> {
        let Err(source) = result else {
            return Ok(());
        };

        let error = SaverError::field(name, source);
        if error.is_fatal() {
            return Err(error);
        }

        if let Some(handler) = &self.handler
            && handler(&error) == Handled::Handled
        {
            return Ok(());
        }

        if self.ignore_unhandled {
            return Ok(());
        }

        Err(error)
    }
}

impl Default for SaverSettings {
    fn default() -> Self {
        Self {
            handler: None,
            ignore_unhandled: false,
            key_name: Cow::Borrowed(Self::DEFAULT_KEY_NAME),
        }
    }
}

impl fmt::Debug for SaverSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaverSettings")
            .field("handler", &self.handler.as_ref().map(|_| ".."))
            .field("ignore_unhandled", &self.ignore_unhandled)
            .field("key_name", &self.key_name)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
