use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::time::Duration;

use uuid::Uuid;

use crate::adapter::{DurationAdapter, SaveAdapter, UuidAdapter};
use crate::error::SaverError;
use crate::saveable::Saveable;
use crate::settings::SaverSettings;
use crate::value::{SaveKey, SaveValue};

// -----------------------------------------------------------------------------
// Saver

/// The traversal engine contract: the operation set a [`Saveable`]
/// declaration calls into.
///
/// A saver instance is fixed to one direction (save or load) for its whole
/// lifetime; the declaration body never branches on it. Each operation hands
/// the engine a field's `&mut` borrow together with its store name — in save
/// mode the engine reads through the borrow into a store node, in load mode it
/// assigns through the borrow from the store node, leaving the field untouched
/// when the node carries no matching entry.
///
/// # Implementing a backing store
///
/// A concrete store binding implements exactly the seven primitive operations
/// ([`type_tag`], [`object_field`], [`value_field`], [`object_seq_field`],
/// [`value_seq_field`], [`object_map_field`], [`value_map_field`]) plus the
/// [`settings`] and [`is_loading`] queries. Everything else is a provided
/// convenience expressed strictly in terms of those primitives — bindings
/// must not override them.
///
/// # Calling from a declaration
///
/// Declarations call the `add_*` layer, never the primitives directly: the
/// `add_*` operations are what route every field failure through the
/// [error policy](SaverSettings::resolve_field) before it propagates.
///
/// # Absence
///
/// An object, collection or map field is declared as `&mut Option<..>`.
/// `None` means the field is omitted from the store entirely on save and left
/// at its prior value on load. Collection *elements* and map *values* are
/// themselves `Option`s: an element-level `None` is stored as an explicit
/// null child, preserving its index or key. Value fields have no absence
/// concept and are always written.
///
/// [`type_tag`]: Self::type_tag
/// [`object_field`]: Self::object_field
/// [`value_field`]: Self::value_field
/// [`object_seq_field`]: Self::object_seq_field
/// [`value_seq_field`]: Self::value_seq_field
/// [`object_map_field`]: Self::object_map_field
/// [`value_map_field`]: Self::value_map_field
/// [`settings`]: Self::settings
/// [`is_loading`]: Self::is_loading
pub trait Saver {
    /// The settings of the current traversal run.
    fn settings(&self) -> &SaverSettings;

    /// Whether this run is loading (`true`) or saving (`false`).
    fn is_loading(&self) -> bool;

    /// Primitive 1: declares the type tag of the saveable being traversed.
    ///
    /// Save mode records the tag under the settings'
    /// [key name](SaverSettings::key_name); load mode is a no-op, because the
    /// tag was already consumed to select the factory before this traversal
    /// began.
    fn type_tag(&mut self, tag: &str) -> Result<(), SaverError>;

    /// Primitive 2: a nested-object field.
    fn object_field<T, F>(
        &mut self,
        field: &mut Option<T>,
        create: F,
        name: &str,
    ) -> Result<(), SaverError>
    where
        T: Saveable,
        F: Fn(&str) -> Result<T, SaverError>;

    /// Primitive 3: a scalar value field.
    fn value_field<T>(&mut self, field: &mut T, name: &str) -> Result<(), SaverError>
    where
        T: SaveValue;

    /// Primitive 4: an ordered collection of nested objects.
    fn object_seq_field<T, C, F, M>(
        &mut self,
        field: &mut Option<C>,
        create: F,
        make: M,
        name: &str,
    ) -> Result<(), SaverError>
    where
        T: Saveable,
        C: Extend<Option<T>>,
        for<'a> &'a mut C: IntoIterator<Item = &'a mut Option<T>>,
        F: Fn(&str) -> Result<T, SaverError>,
        M: FnOnce() -> C;

    /// Primitive 5: an ordered collection of scalar values.
    fn value_seq_field<T, C, M>(
        &mut self,
        field: &mut Option<C>,
        make: M,
        name: &str,
    ) -> Result<(), SaverError>
    where
        T: SaveValue,
        C: Extend<Option<T>>,
        for<'a> &'a mut C: IntoIterator<Item = &'a mut Option<T>>,
        M: FnOnce() -> C;

    /// Primitive 6: a map from [keys](SaveKey) to nested objects.
    fn object_map_field<K, V, D, F, M>(
        &mut self,
        field: &mut Option<D>,
        create: F,
        make: M,
        name: &str,
    ) -> Result<(), SaverError>
    where
        K: SaveKey,
        V: Saveable,
        D: Extend<(K, Option<V>)>,
        for<'a> &'a mut D: IntoIterator<Item = (&'a K, &'a mut Option<V>)>,
        F: Fn(&str) -> Result<V, SaverError>,
        M: FnOnce() -> D;

    /// Primitive 7: a map from [keys](SaveKey) to scalar values.
    fn value_map_field<K, V, D, M>(
        &mut self,
        field: &mut Option<D>,
        make: M,
        name: &str,
    ) -> Result<(), SaverError>
    where
        K: SaveKey,
        V: SaveValue,
        D: Extend<(K, Option<V>)>,
        for<'a> &'a mut D: IntoIterator<Item = (&'a K, &'a mut Option<V>)>,
        M: FnOnce() -> D;

    // -------------------------------------------------------------------------
    // Provided layer

    /// Declares the type tag; failures here are fatal to the whole run.
    fn add_key(&mut self, tag: &str) -> Result<(), SaverError> {
        self.type_tag(tag).map_err(SaverError::key)
    }

    /// Adds a nested-object field, reconstructing through `create` on load.
    fn add_object<T, F>(
        &mut self,
        field: &mut Option<T>,
        create: F,
        name: &str,
    ) -> Result<(), SaverError>
    where
        T: Saveable,
        F: Fn(&str) -> Result<T, SaverError>,
    {
        let result = self.object_field(field, create, name);
        self.settings().resolve_field(name, result)
    }

    /// Adds a nested-object field whose loads construct via `Default`,
    /// ignoring the type tag at this call site.
    fn add_default_object<T>(&mut self, field: &mut Option<T>, name: &str) -> Result<(), SaverError>
    where
        T: Saveable + Default,
    {
        self.add_object(field, |_| Ok(T::default()), name)
    }

    /// Adds a scalar value field.
    fn add_value<T>(&mut self, field: &mut T, name: &str) -> Result<(), SaverError>
    where
        T: SaveValue,
    {
        let result = self.value_field(field, name);
        self.settings().resolve_field(name, result)
    }

    /// Adds an object collection field with an explicit collection
    /// constructor.
    fn add_objects_with<T, C, F, M>(
        &mut self,
        field: &mut Option<C>,
        create: F,
        make: M,
        name: &str,
    ) -> Result<(), SaverError>
    where
        T: Saveable,
        C: Extend<Option<T>>,
        for<'a> &'a mut C: IntoIterator<Item = &'a mut Option<T>>,
        F: Fn(&str) -> Result<T, SaverError>,
        M: FnOnce() -> C,
    {
        let result = self.object_seq_field(field, create, make, name);
        self.settings().resolve_field(name, result)
    }

    /// Adds an object collection field backed by a `Vec`.
    fn add_objects<T, F>(
        &mut self,
        field: &mut Option<Vec<Option<T>>>,
        create: F,
        name: &str,
    ) -> Result<(), SaverError>
    where
        T: Saveable,
        F: Fn(&str) -> Result<T, SaverError>,
    {
        self.add_objects_with(field, create, Vec::new, name)
    }

    /// Adds a `Vec`-backed object collection whose loads construct elements
    /// via `Default`.
    fn add_default_objects<T>(
        &mut self,
        field: &mut Option<Vec<Option<T>>>,
        name: &str,
    ) -> Result<(), SaverError>
    where
        T: Saveable + Default,
    {
        self.add_objects(field, |_| Ok(T::default()), name)
    }

    /// Adds a value collection field with an explicit collection constructor.
    fn add_values_with<T, C, M>(
        &mut self,
        field: &mut Option<C>,
        make: M,
        name: &str,
    ) -> Result<(), SaverError>
    where
        T: SaveValue,
        C: Extend<Option<T>>,
        for<'a> &'a mut C: IntoIterator<Item = &'a mut Option<T>>,
        M: FnOnce() -> C,
    {
        let result = self.value_seq_field(field, make, name);
        self.settings().resolve_field(name, result)
    }

    /// Adds a value collection field backed by a `Vec`.
    fn add_values<T>(
        &mut self,
        field: &mut Option<Vec<Option<T>>>,
        name: &str,
    ) -> Result<(), SaverError>
    where
        T: SaveValue,
    {
        self.add_values_with(field, Vec::new, name)
    }

    /// Adds an object map field with an explicit map constructor.
    fn add_object_map_with<K, V, D, F, M>(
        &mut self,
        field: &mut Option<D>,
        create: F,
        make: M,
        name: &str,
    ) -> Result<(), SaverError>
    where
        K: SaveKey,
        V: Saveable,
        D: Extend<(K, Option<V>)>,
        for<'a> &'a mut D: IntoIterator<Item = (&'a K, &'a mut Option<V>)>,
        F: Fn(&str) -> Result<V, SaverError>,
        M: FnOnce() -> D,
    {
        let result = self.object_map_field(field, create, make, name);
        self.settings().resolve_field(name, result)
    }

    /// Adds an object map field backed by a `BTreeMap`.
    fn add_object_map<K, V, F>(
        &mut self,
        field: &mut Option<BTreeMap<K, Option<V>>>,
        create: F,
        name: &str,
    ) -> Result<(), SaverError>
    where
        K: SaveKey + Ord,
        V: Saveable,
        F: Fn(&str) -> Result<V, SaverError>,
    {
        self.add_object_map_with(field, create, BTreeMap::new, name)
    }

    /// Adds a value map field with an explicit map constructor.
    fn add_value_map_with<K, V, D, M>(
        &mut self,
        field: &mut Option<D>,
        make: M,
        name: &str,
    ) -> Result<(), SaverError>
    where
        K: SaveKey,
        V: SaveValue,
        D: Extend<(K, Option<V>)>,
        for<'a> &'a mut D: IntoIterator<Item = (&'a K, &'a mut Option<V>)>,
        M: FnOnce() -> D,
    {
        let result = self.value_map_field(field, make, name);
        self.settings().resolve_field(name, result)
    }

    /// Adds a value map field backed by a `BTreeMap`.
    fn add_value_map<K, V>(
        &mut self,
        field: &mut Option<BTreeMap<K, Option<V>>>,
        name: &str,
    ) -> Result<(), SaverError>
    where
        K: SaveKey + Ord,
        V: SaveValue,
    {
        self.add_value_map_with(field, BTreeMap::new, name)
    }

    /// Adds an object field mapped through an [object adapter](SaveAdapter).
    fn add_adapted_object<T, A>(
        &mut self,
        field: &mut Option<T>,
        adapter: &A,
        name: &str,
    ) -> Result<(), SaverError>
    where
        Self: Sized,
        A: SaveAdapter<T>,
    {
        let result = adapted_object(self, field, adapter, name);
        self.settings().resolve_field(name, result)
    }

    /// Adds a value field mapped through a [value adapter](SaveAdapter).
    fn add_adapted_value<T, A>(
        &mut self,
        field: &mut T,
        adapter: &A,
        name: &str,
    ) -> Result<(), SaverError>
    where
        Self: Sized,
        A: SaveAdapter<T>,
    {
        let result = adapted_value(self, field, adapter, name);
        self.settings().resolve_field(name, result)
    }

    /// Adds a `Vec`-backed collection whose elements are mapped through an
    /// [object adapter](SaveAdapter).
    fn add_adapted_objects<T, A>(
        &mut self,
        field: &mut Option<Vec<Option<T>>>,
        adapter: &A,
        name: &str,
    ) -> Result<(), SaverError>
    where
        Self: Sized,
        A: SaveAdapter<T>,
    {
        let result = adapted_object_seq(self, field, adapter, name);
        self.settings().resolve_field(name, result)
    }

    /// Adds a `BTreeMap`-backed map whose values are mapped through an
    /// [object adapter](SaveAdapter).
    fn add_adapted_object_map<K, T, A>(
        &mut self,
        field: &mut Option<BTreeMap<K, Option<T>>>,
        adapter: &A,
        name: &str,
    ) -> Result<(), SaverError>
    where
        Self: Sized,
        K: SaveKey + Ord + Clone,
        A: SaveAdapter<T>,
    {
        let result = adapted_object_map(self, field, adapter, name);
        self.settings().resolve_field(name, result)
    }

    /// Adds a [`Uuid`] value field, stored as its hyphenated string form.
    fn add_uuid(&mut self, field: &mut Uuid, name: &str) -> Result<(), SaverError>
    where
        Self: Sized,
    {
        self.add_adapted_value(field, &UuidAdapter, name)
    }

    /// Adds a [`Duration`] value field, stored as `"<secs>.<nanos>"`.
    fn add_duration(&mut self, field: &mut Duration, name: &str) -> Result<(), SaverError>
    where
        Self: Sized,
    {
        self.add_adapted_value(field, &DurationAdapter, name)
    }
}

// -----------------------------------------------------------------------------
// Adapter glue
//
// The adapter conveniences run the mapping around a temporary and delegate to
// the matching primitive, so they add no store semantics of their own.

fn adapted_object<S, T, A>(
    saver: &mut S,
    field: &mut Option<T>,
    adapter: &A,
    name: &str,
) -> Result<(), SaverError>
where
    S: Saver,
    A: SaveAdapter<T>,
{
    let mut stand_in = match field.as_ref() {
        Some(value) if !saver.is_loading() => Some(adapter.to_stand_in(value)?),
        _ => None,
    };
    saver.object_field(&mut stand_in, |tag| adapter.create_stand_in(tag), name)?;
    if saver.is_loading()
        && let Some(stand_in) = stand_in
    {
        *field = Some(adapter.from_stand_in(stand_in)?);
    }
    Ok(())
}

fn adapted_value<S, T, A>(
    saver: &mut S,
    field: &mut T,
    adapter: &A,
    name: &str,
) -> Result<(), SaverError>
where
    S: Saver,
    A: SaveAdapter<T>,
{
    // The load seed comes from the current value, so a store without this
    // entry leaves the field observationally untouched.
    let mut repr = adapter.to_value(field)?;
    saver.value_field(&mut repr, name)?;
    if saver.is_loading() {
        *field = adapter.from_value(repr)?;
    }
    Ok(())
}

fn adapted_object_seq<S, T, A>(
    saver: &mut S,
    field: &mut Option<Vec<Option<T>>>,
    adapter: &A,
    name: &str,
) -> Result<(), SaverError>
where
    S: Saver,
    A: SaveAdapter<T>,
{
    let mut stand_ins: Option<Vec<Option<A::StandIn>>> = match field.as_ref() {
        Some(items) if !saver.is_loading() => Some(
            items
                .iter()
                .map(|item| item.as_ref().map(|value| adapter.to_stand_in(value)).transpose())
                .collect::<Result<_, _>>()?,
        ),
        _ => None,
    };
    saver.object_seq_field(&mut stand_ins, |tag| adapter.create_stand_in(tag), Vec::new, name)?;
    if saver.is_loading()
        && let Some(stand_ins) = stand_ins
    {
        let mut items = Vec::with_capacity(stand_ins.len());
        for stand_in in stand_ins {
            items.push(stand_in.map(|s| adapter.from_stand_in(s)).transpose()?);
        }
        *field = Some(items);
    }
    Ok(())
}

fn adapted_object_map<S, K, T, A>(
    saver: &mut S,
    field: &mut Option<BTreeMap<K, Option<T>>>,
    adapter: &A,
    name: &str,
) -> Result<(), SaverError>
where
    S: Saver,
    K: SaveKey + Ord + Clone,
    A: SaveAdapter<T>,
{
    let mut stand_ins: Option<BTreeMap<K, Option<A::StandIn>>> = match field.as_ref() {
        Some(entries) if !saver.is_loading() => {
            let mut stand_ins = BTreeMap::new();
            for (key, value) in entries {
                let stand_in = value.as_ref().map(|v| adapter.to_stand_in(v)).transpose()?;
                stand_ins.insert(key.clone(), stand_in);
            }
            Some(stand_ins)
        }
        _ => None,
    };
    saver.object_map_field(&mut stand_ins, |tag| adapter.create_stand_in(tag), BTreeMap::new, name)?;
    if saver.is_loading()
        && let Some(stand_ins) = stand_ins
    {
        let mut entries = BTreeMap::new();
        for (key, stand_in) in stand_ins {
            entries.insert(key, stand_in.map(|s| adapter.from_stand_in(s)).transpose()?);
        }
        *field = Some(entries);
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Field naming

/// Strips the leading `self.` qualifier from a stringified field access.
///
/// This backs the [`field_name!`](crate::field_name) macro; call sites rarely
/// need it directly.
#[inline]
pub fn strip_field_name(name: &str) -> &str {
    name.strip_prefix("self.").unwrap_or(name)
}

/// Expands to the textual name of a field access, with a leading `self.`
/// stripped.
///
/// This is the default-naming convenience for declaration sites: the store
/// name of a field is simply the field's own name.
///
/// ```
/// use ks_save::field_name;
///
/// struct Obj { value: f32 }
/// let this = Obj { value: 1.0 };
/// # let _ = this.value;
/// assert_eq!(field_name!(this.value), "this.value");
/// assert_eq!(ks_save::strip_field_name("self.value"), "value");
/// ```
#[macro_export]
macro_rules! field_name {
    ($field:expr) => {
        $crate::strip_field_name(stringify!($field))
    };
}

// -----------------------------------------------------------------------------
// Tests
