use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::iter;

use ks_save::{SaveKey, SaveValue, Saveable, Saver, SaverError, SaverSettings, Scalar};
use serde_json::{Map, Value};

// -----------------------------------------------------------------------------
// JsonSaver

/// A [`Saver`] over one `serde_json` object node.
///
/// One instance handles exactly one node and one direction; nested objects get
/// their own instance sharing the same settings borrow. Loading owns the node
/// and consumes entries as the declaration visits them, so a field name is
/// resolved at most once per run.
///
/// # Examples
///
/// ```
/// use ks_json::JsonSaver;
/// use ks_save::{SaverError, Saveable, Saver, field_name};
///
/// #[derive(Default, PartialEq, Debug)]
/// struct Counter {
///     count: u32,
/// }
///
/// impl Saveable for Counter {
///     fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
///         saver.add_key("demo.Counter")?;
///         saver.add_value(&mut self.count, field_name!(self.count))
///     }
/// }
///
/// let mut counter = Counter { count: 3 };
/// let stored = JsonSaver::save(&mut counter)?;
///
/// let loaded: Counter = JsonSaver::load(stored, |tag| match tag {
///     "demo.Counter" => Ok(Counter::default()),
///     _ => Err(SaverError::unknown_tag(tag)),
/// })?;
/// assert_eq!(loaded, counter);
/// # Ok::<(), SaverError>(())
/// ```
pub struct JsonSaver<'set> {
    settings: &'set SaverSettings,
    mode: Mode,
    object: Map<String, Value>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Save,
    Load,
}

impl JsonSaver<'_> {
    /// Saves `value` into a fresh JSON object node with default settings.
    pub fn save<T: Saveable>(value: &mut T) -> Result<Value, SaverError> {
        Self::save_with(value, &SaverSettings::default())
    }

    /// Saves `value` into a fresh JSON object node.
    pub fn save_with<T: Saveable>(
        value: &mut T,
        settings: &SaverSettings,
    ) -> Result<Value, SaverError> {
        save_nested(settings, value)
    }

    /// Loads an instance from a JSON object node with default settings.
    ///
    /// `create` receives the node's type tag and produces the fresh instance
    /// the declaration then populates. A node without a tag entry hands the
    /// factory an empty string; strict factories reject it with
    /// [`SaverError::unknown_tag`], lenient ones construct a default.
    pub fn load<T, F>(stored: Value, create: F) -> Result<T, SaverError>
    where
        T: Saveable,
        F: Fn(&str) -> Result<T, SaverError>,
    {
        Self::load_with(stored, create, &SaverSettings::default())
    }

    /// Loads an instance from a JSON object node.
    pub fn load_with<T, F>(
        stored: Value,
        create: F,
        settings: &SaverSettings,
    ) -> Result<T, SaverError>
    where
        T: Saveable,
        F: Fn(&str) -> Result<T, SaverError>,
    {
        load_nested(settings, stored, &create)
    }
}

impl Saver for JsonSaver<'_> {
    fn settings(&self) -> &SaverSettings {
        self.settings
    }

    fn is_loading(&self) -> bool {
        self.mode == Mode::Load
    }

    fn type_tag(&mut self, tag: &str) -> Result<(), SaverError> {
        // The load direction consumed the tag before this traversal began,
        // when the factory was selected.
        if self.mode == Mode::Save {
            self.object
                .insert(self.settings.key_name().to_string(), Value::String(tag.into()));
        }
        Ok(())
    }

    fn object_field<T, F>(
        &mut self,
        field: &mut Option<T>,
        create: F,
        name: &str,
    ) -> Result<(), SaverError>
    where
        T: Saveable,
        F: Fn(&str) -> Result<T, SaverError>,
    {
        match self.mode {
            Mode::Save => {
                if let Some(value) = field.as_mut() {
                    let node = save_nested(self.settings, value)?;
                    self.object.insert(name.into(), node);
                }
            }
            Mode::Load => {
                if let Some(node) = self.take(name) {
                    *field = Some(load_nested(self.settings, node, &create)?);
                }
            }
        }
        Ok(())
    }

    fn value_field<T>(&mut self, field: &mut T, name: &str) -> Result<(), SaverError>
    where
        T: SaveValue,
    {
        match self.mode {
            Mode::Save => {
                let node = scalar_to_json(field.to_scalar())?;
                self.object.insert(name.into(), node);
            }
            Mode::Load => {
                if let Some(node) = self.take(name) {
                    *field = T::from_scalar(json_to_scalar(node)?)?;
                }
            }
        }
        Ok(())
    }

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
        M: FnOnce() -> C,
    {
        match self.mode {
            Mode::Save => {
                if let Some(items) = field.as_mut() {
                    let mut elements = Vec::new();
                    for item in &mut *items {
                        elements.push(match item.as_mut() {
                            Some(value) => save_nested(self.settings, value)?,
                            None => Value::Null,
                        });
                    }
                    self.object.insert(name.into(), Value::Array(elements));
                }
            }
            Mode::Load => {
                if let Some(node) = self.take(name) {
                    let mut items = make();
                    for element in into_array(node)? {
                        let item = match element {
                            Value::Null => None,
                            other => Some(load_nested(self.settings, other, &create)?),
                        };
                        items.extend(iter::once(item));
                    }
                    *field = Some(items);
                }
            }
        }
        Ok(())
    }

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
        M: FnOnce() -> C,
    {
        match self.mode {
            Mode::Save => {
                if let Some(items) = field.as_mut() {
                    let mut elements = Vec::new();
                    for item in &mut *items {
                        elements.push(match item.as_ref() {
                            Some(value) => scalar_to_json(value.to_scalar())?,
                            None => Value::Null,
                        });
                    }
                    self.object.insert(name.into(), Value::Array(elements));
                }
            }
            Mode::Load => {
                if let Some(node) = self.take(name) {
                    let mut items = make();
                    for element in into_array(node)? {
                        let item = match element {
                            Value::Null => None,
                            other => Some(T::from_scalar(json_to_scalar(other)?)?),
                        };
                        items.extend(iter::once(item));
                    }
                    *field = Some(items);
                }
            }
        }
        Ok(())
    }

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
        M: FnOnce() -> D,
    {
        match self.mode {
            Mode::Save => {
                if let Some(entries) = field.as_mut() {
                    let mut node = Map::new();
                    for (key, value) in &mut *entries {
                        let child = match value.as_mut() {
                            Some(value) => save_nested(self.settings, value)?,
                            None => Value::Null,
                        };
                        node.insert(key.to_key(), child);
                    }
                    self.object.insert(name.into(), Value::Object(node));
                }
            }
            Mode::Load => {
                if let Some(node) = self.take(name) {
                    let mut entries = make();
                    for (key, child) in into_object(node)? {
                        let key = K::from_key(&key)?;
                        let value = match child {
                            Value::Null => None,
                            other => Some(load_nested(self.settings, other, &create)?),
                        };
                        entries.extend(iter::once((key, value)));
                    }
                    *field = Some(entries);
                }
            }
        }
        Ok(())
    }

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
        M: FnOnce() -> D,
    {
        match self.mode {
            Mode::Save => {
                if let Some(entries) = field.as_mut() {
                    let mut node = Map::new();
                    for (key, value) in &mut *entries {
                        let child = match value.as_ref() {
                            Some(value) => scalar_to_json(value.to_scalar())?,
                            None => Value::Null,
                        };
                        node.insert(key.to_key(), child);
                    }
                    self.object.insert(name.into(), Value::Object(node));
                }
            }
            Mode::Load => {
                if let Some(node) = self.take(name) {
                    let mut entries = make();
                    for (key, child) in into_object(node)? {
                        let key = K::from_key(&key)?;
                        let value = match child {
                            Value::Null => None,
                            other => Some(V::from_scalar(json_to_scalar(other)?)?),
                        };
                        entries.extend(iter::once((key, value)));
                    }
                    *field = Some(entries);
                }
            }
        }
        Ok(())
    }
}

impl JsonSaver<'_> {
    /// Consumes a field entry, treating an explicit field-level null like an
    /// absent entry so the field keeps its pre-load state.
    fn take(&mut self, name: &str) -> Option<Value> {
        self.object.remove(name).filter(|node| !node.is_null())
    }
}

// -----------------------------------------------------------------------------
// Nested runs

fn save_nested<T: Saveable>(settings: &SaverSettings, value: &mut T) -> Result<Value, SaverError> {
    let mut saver = JsonSaver {
        settings,
        mode: Mode::Save,
        object: Map::new(),
    };
    value.save_data(&mut saver)?;
    Ok(Value::Object(saver.object))
}

fn load_nested<T, F>(settings: &SaverSettings, stored: Value, create: &F) -> Result<T, SaverError>
where
    T: Saveable,
    F: Fn(&str) -> Result<T, SaverError>,
{
    let object = into_object(stored)?;
    let tag = object
        .get(settings.key_name())
        .and_then(Value::as_str)
        .unwrap_or("");
    let mut value = create(tag)?;

    let mut saver = JsonSaver {
        settings,
        mode: Mode::Load,
        object,
    };
    value.save_data(&mut saver)?;
    Ok(value)
}

// -----------------------------------------------------------------------------
// Leaf conversion

fn scalar_to_json(scalar: Scalar) -> Result<Value, SaverError> {
    Ok(match scalar {
        Scalar::Bool(value) => Value::Bool(value),
        Scalar::I64(value) => Value::from(value),
        Scalar::U64(value) => Value::from(value),
        Scalar::F64(value) => serde_json::Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| SaverError::custom("non-finite float has no JSON number form"))?,
        Scalar::Str(value) => Value::String(value),
    })
}

fn json_to_scalar(node: Value) -> Result<Scalar, SaverError> {
    match node {
        Value::Bool(value) => Ok(Scalar::Bool(value)),
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                Ok(Scalar::I64(value))
            } else if let Some(value) = number.as_u64() {
                Ok(Scalar::U64(value))
            } else if let Some(value) = number.as_f64() {
                Ok(Scalar::F64(value))
            } else {
                Err(SaverError::node("leaf", "number"))
            }
        }
        Value::String(value) => Ok(Scalar::Str(value)),
        other => Err(SaverError::node("leaf", json_kind(&other))),
    }
}

fn into_object(node: Value) -> Result<Map<String, Value>, SaverError> {
    match node {
        Value::Object(object) => Ok(object),
        other => Err(SaverError::node("object", json_kind(&other))),
    }
}

fn into_array(node: Value) -> Result<Vec<Value>, SaverError> {
    match node {
        Value::Array(elements) => Ok(elements),
        other => Err(SaverError::node("array", json_kind(&other))),
    }
}

fn json_kind(node: &Value) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::collections::BTreeMap;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use core::time::Duration;

    use ks_save::adapter::{FnObjectAdapter, FnValueAdapter};
    use ks_save::{
        Handled, SaveAdapter, Saveable, Saver, SaverError, SaverSettings, field_name,
    };
    use serde_json::{Value, json};
    use uuid::Uuid;

    use super::JsonSaver;

    // -------------------------------------------------------------------------
    // A full object graph, exercising every field shape at once.

    #[derive(Default, Clone, PartialEq, Debug)]
    struct Obj {
        nested: Option<Box<Obj>>,
        value: f32,
        label: String,
        others: Option<Vec<Option<Obj>>>,
        strings: Option<Vec<Option<String>>>,
        by_name: Option<BTreeMap<String, Option<Obj>>>,
        weights: Option<BTreeMap<i32, Option<f64>>>,
    }

    impl Obj {
        const TAG: &'static str = "demo.Obj";

        fn create(tag: &str) -> Result<Self, SaverError> {
            match tag {
                Self::TAG => Ok(Self::default()),
                other => Err(SaverError::unknown_tag(other)),
            }
        }

        fn leaf(label: &str, value: f32) -> Self {
            Self {
                label: label.into(),
                value,
                ..Self::default()
            }
        }
    }

    impl Saveable for Obj {
        fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
            saver.add_key(Self::TAG)?;
            saver.add_default_object(&mut self.nested, field_name!(self.nested))?;
            saver.add_value(&mut self.value, field_name!(self.value))?;
            saver.add_value(&mut self.label, field_name!(self.label))?;
            saver.add_default_objects(&mut self.others, field_name!(self.others))?;
            saver.add_values(&mut self.strings, field_name!(self.strings))?;
            saver.add_object_map(&mut self.by_name, Obj::create, field_name!(self.by_name))?;
            saver.add_value_map(&mut self.weights, field_name!(self.weights))?;
            Ok(())
        }
    }

    fn sample() -> Obj {
        Obj {
            nested: Some(Box::new(Obj::leaf("inner", 0.25))),
            value: 1.5,
            label: "outer".into(),
            others: Some(vec![
                Some(Obj::leaf("first", 1.0)),
                None,
                Some(Obj::leaf("third", 3.0)),
            ]),
            strings: Some(vec![Some("a".into()), None, Some("b".into())]),
            by_name: Some(BTreeMap::from([
                (String::from("left"), Some(Obj::leaf("l", -1.0))),
                (String::from("right"), None),
            ])),
            weights: Some(BTreeMap::from([(7, Some(0.5)), (-3, None)])),
        }
    }

    #[test]
    fn round_trip_preserves_the_graph() {
        let mut original = sample();
        let stored = JsonSaver::save(&mut original).unwrap();
        let loaded: Obj = JsonSaver::load(stored, Obj::create).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn stored_tree_has_the_expected_shape() {
        let mut original = sample();
        let stored = JsonSaver::save(&mut original).unwrap();

        let leaf = |label: &str, value: f64| {
            json!({
                "$type": "demo.Obj",
                "value": value,
                "label": label,
            })
        };
        assert_eq!(
            stored,
            json!({
                "$type": "demo.Obj",
                "nested": leaf("inner", 0.25),
                "value": 1.5,
                "label": "outer",
                "others": [leaf("first", 1.0), null, leaf("third", 3.0)],
                "strings": ["a", null, "b"],
                "by_name": { "left": leaf("l", -1.0), "right": null },
                "weights": { "-3": null, "7": 0.5 },
            })
        );
    }

    #[test]
    fn absent_fields_leave_the_target_untouched() {
        let stored = json!({ "$type": "demo.Obj", "value": 9.0 });
        let loaded: Obj = JsonSaver::load(stored, |_| {
            let mut sentinel = Obj::leaf("sentinel", 2.0);
            sentinel.strings = Some(vec![Some("kept".into())]);
            Ok(sentinel)
        })
        .unwrap();

        assert_eq!(loaded.value, 9.0);
        assert_eq!(loaded.label, "sentinel");
        assert_eq!(loaded.strings, Some(vec![Some("kept".into())]));
        assert_eq!(loaded.nested, None);
    }

    #[test]
    fn absent_object_fields_are_omitted_entirely() {
        let mut original = Obj::leaf("bare", 0.0);
        let stored = JsonSaver::save(&mut original).unwrap();
        let object = stored.as_object().unwrap();
        for name in ["nested", "others", "strings", "by_name", "weights"] {
            assert!(!object.contains_key(name), "`{name}` should be omitted");
        }
    }

    // -------------------------------------------------------------------------
    // Tag-dispatched polymorphism

    #[derive(Clone, PartialEq, Debug)]
    enum Shape {
        Circle { radius: f64 },
        Rect { width: f64, height: f64 },
    }

    impl Shape {
        fn create(tag: &str) -> Result<Self, SaverError> {
            match tag {
                "demo.Circle" => Ok(Self::Circle { radius: 0.0 }),
                "demo.Rect" => Ok(Self::Rect {
                    width: 0.0,
                    height: 0.0,
                }),
                other => Err(SaverError::unknown_tag(other)),
            }
        }
    }

    impl Saveable for Shape {
        fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
            match self {
                Self::Circle { radius } => {
                    saver.add_key("demo.Circle")?;
                    saver.add_value(radius, "radius")
                }
                Self::Rect { width, height } => {
                    saver.add_key("demo.Rect")?;
                    saver.add_value(width, "width")?;
                    saver.add_value(height, "height")
                }
            }
        }
    }

    #[test]
    fn tags_select_the_loaded_variant() {
        let mut rect = Shape::Rect {
            width: 4.0,
            height: 3.0,
        };
        let stored = JsonSaver::save(&mut rect).unwrap();
        assert_eq!(stored["$type"], "demo.Rect");
        let loaded: Shape = JsonSaver::load(stored, Shape::create).unwrap();
        assert_eq!(loaded, rect);
    }

    #[test]
    fn unrecognized_tags_surface_from_the_factory() {
        let stored = json!({ "$type": "demo.Blob" });
        let error = JsonSaver::load::<Shape, _>(stored, Shape::create).unwrap_err();
        assert!(matches!(error, SaverError::UnknownTag { ref tag } if &**tag == "demo.Blob"));
    }

    #[test]
    fn missing_tags_reach_the_factory_as_empty() {
        let stored = json!({ "radius": 2.0 });
        let error = JsonSaver::load::<Shape, _>(stored, Shape::create).unwrap_err();
        assert!(matches!(error, SaverError::UnknownTag { ref tag } if tag.is_empty()));

        // A lenient factory can still construct something for a tagless node.
        let stored = json!({ "radius": 2.0 });
        let loaded: Shape = JsonSaver::load(stored, |_| Ok(Shape::Circle { radius: 0.0 })).unwrap();
        assert_eq!(loaded, Shape::Circle { radius: 2.0 });
    }

    #[derive(Default, Clone, PartialEq, Debug)]
    struct Scene {
        shapes: Option<Vec<Option<Shape>>>,
    }

    impl Saveable for Scene {
        fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
            saver.add_key("demo.Scene")?;
            saver.add_objects(&mut self.shapes, Shape::create, field_name!(self.shapes))
        }
    }

    #[test]
    fn heterogeneous_collections_reconstruct_per_element() {
        let mut scene = Scene {
            shapes: Some(vec![
                Some(Shape::Circle { radius: 1.0 }),
                None,
                Some(Shape::Rect {
                    width: 2.0,
                    height: 5.0,
                }),
            ]),
        };
        let stored = JsonSaver::save(&mut scene).unwrap();
        let loaded: Scene = JsonSaver::load(stored, |_| Ok(Scene::default())).unwrap();
        assert_eq!(loaded, scene);
    }

    #[test]
    fn unrecognized_element_tags_fail_the_collection_field() {
        let stored = json!({
            "$type": "demo.Scene",
            "shapes": [{ "$type": "demo.Blob" }],
        });
        let error = JsonSaver::load::<Scene, _>(stored, |_| Ok(Scene::default())).unwrap_err();
        let SaverError::Field { name, source } = error else {
            panic!("expected a field failure, got {error:?}");
        };
        assert_eq!(&*name, "shapes");
        assert!(matches!(*source, SaverError::UnknownTag { ref tag } if &**tag == "demo.Blob"));
    }

    #[test]
    fn key_name_is_configurable() {
        let settings = SaverSettings::default().with_key_name("!kind");
        let mut circle = Shape::Circle { radius: 1.0 };
        let stored = JsonSaver::save_with(&mut circle, &settings).unwrap();
        assert_eq!(stored, json!({ "!kind": "demo.Circle", "radius": 1.0 }));

        let loaded: Shape = JsonSaver::load_with(stored, Shape::create, &settings).unwrap();
        assert_eq!(loaded, circle);
    }

    #[test]
    fn mismatched_key_names_look_like_missing_tags() {
        let mut circle = Shape::Circle { radius: 1.0 };
        let stored = JsonSaver::save(&mut circle).unwrap();

        let settings = SaverSettings::default().with_key_name("!kind");
        let error = JsonSaver::load_with::<Shape, _>(stored, Shape::create, &settings).unwrap_err();
        assert!(matches!(error, SaverError::UnknownTag { ref tag } if tag.is_empty()));
    }

    // -------------------------------------------------------------------------
    // Error policy

    #[test]
    fn field_failures_name_the_field() {
        let stored = json!({ "$type": "demo.Circle", "radius": "wide" });
        let error = JsonSaver::load::<Shape, _>(stored, Shape::create).unwrap_err();
        assert!(matches!(error, SaverError::Field { ref name, .. } if &**name == "radius"));
    }

    #[test]
    fn ignored_failures_keep_the_prior_value() {
        let stored = json!({ "$type": "demo.Circle", "radius": "wide" });
        let settings = SaverSettings::default().with_ignore_unhandled(true);
        let loaded: Shape = JsonSaver::load_with(stored, Shape::create, &settings).unwrap();
        assert_eq!(loaded, Shape::Circle { radius: 0.0 });
    }

    #[test]
    fn handlers_observe_and_swallow_failures() {
        let seen = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&seen);
        let settings = SaverSettings::default().with_handler(move |error| {
            assert!(matches!(error, SaverError::Field { .. }));
            counter.set(counter.get() + 1);
            Handled::Handled
        });

        let stored = json!({ "$type": "demo.Circle", "radius": "wide" });
        let loaded: Shape = JsonSaver::load_with(stored, Shape::create, &settings).unwrap();
        assert_eq!(loaded, Shape::Circle { radius: 0.0 });
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn non_finite_floats_fail_to_save() {
        let mut circle = Shape::Circle { radius: f64::NAN };
        let error = JsonSaver::save(&mut circle).unwrap_err();
        assert!(matches!(error, SaverError::Field { ref name, .. } if &**name == "radius"));
    }

    #[test]
    fn nested_failures_report_the_outer_field_first() {
        let stored = json!({
            "$type": "demo.Obj",
            "nested": { "$type": "demo.Obj", "value": "broken" },
        });
        let error = JsonSaver::load::<Obj, _>(stored, Obj::create).unwrap_err();
        let SaverError::Field { name, source } = error else {
            panic!("expected a field failure, got {error:?}");
        };
        assert_eq!(&*name, "nested");
        assert!(matches!(*source, SaverError::Field { ref name, .. } if &**name == "value"));
    }

    // -------------------------------------------------------------------------
    // Adapted fields

    struct Tank {
        id: Uuid,
        uptime: Duration,
        pressure: Bar,
    }

    /// A foreign unit type bridged by a value adapter.
    struct Bar(u32);

    fn bar_adapter() -> impl SaveAdapter<Bar, Repr = u32> {
        FnValueAdapter::new(|bar: &Bar| Ok(bar.0), |repr: u32| Ok(Bar(repr)))
    }

    impl Saveable for Tank {
        fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
            saver.add_key("demo.Tank")?;
            saver.add_uuid(&mut self.id, field_name!(self.id))?;
            saver.add_duration(&mut self.uptime, field_name!(self.uptime))?;
            saver.add_adapted_value(&mut self.pressure, &bar_adapter(), field_name!(self.pressure))
        }
    }

    #[test]
    fn adapted_values_round_trip_through_their_repr() {
        let mut tank = Tank {
            id: Uuid::from_u128(0x67e55044_10b1_426f_9247_bb680e5fe0c8),
            uptime: Duration::new(90, 500_000_000),
            pressure: Bar(12),
        };
        let stored = JsonSaver::save(&mut tank).unwrap();
        assert_eq!(
            stored,
            json!({
                "$type": "demo.Tank",
                "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                "uptime": "90.500000000",
                "pressure": 12,
            })
        );

        let loaded: Tank = JsonSaver::load(stored, |_| {
            Ok(Tank {
                id: Uuid::nil(),
                uptime: Duration::ZERO,
                pressure: Bar(0),
            })
        })
        .unwrap();
        assert_eq!(loaded.id, tank.id);
        assert_eq!(loaded.uptime, tank.uptime);
        assert_eq!(loaded.pressure.0, 12);
    }

    /// A foreign timestamp type bridged by an object adapter.
    struct Stamp(u64);

    #[derive(Default)]
    struct StampData {
        ticks: u64,
    }

    impl Saveable for StampData {
        fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
            saver.add_key("demo.Stamp")?;
            saver.add_value(&mut self.ticks, field_name!(self.ticks))
        }
    }

    #[derive(Default)]
    struct Clock {
        stamp: Option<Stamp>,
    }

    impl Saveable for Clock {
        fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
            saver.add_key("demo.Clock")?;
            let adapter = FnObjectAdapter::new(
                |_tag: &str| Ok(StampData::default()),
                |stamp: &Stamp| Ok(StampData { ticks: stamp.0 }),
                |data: StampData| Ok(Stamp(data.ticks)),
            );
            saver.add_adapted_object(&mut self.stamp, &adapter, field_name!(self.stamp))
        }
    }

    #[test]
    fn adapted_objects_round_trip_through_their_stand_in() {
        let mut clock = Clock {
            stamp: Some(Stamp(88)),
        };
        let stored = JsonSaver::save(&mut clock).unwrap();
        assert_eq!(
            stored,
            json!({
                "$type": "demo.Clock",
                "stamp": { "$type": "demo.Stamp", "ticks": 88 },
            })
        );

        let loaded: Clock = JsonSaver::load(stored, |_| Ok(Clock::default())).unwrap();
        assert_eq!(loaded.stamp.map(|stamp| stamp.0), Some(88));

        let mut bare = Clock::default();
        let stored = JsonSaver::save(&mut bare).unwrap();
        assert_eq!(stored, json!({ "$type": "demo.Clock" }));
    }

    // -------------------------------------------------------------------------
    // Store shape failures

    #[test]
    fn loading_a_non_object_is_a_node_failure() {
        let error = JsonSaver::load::<Obj, _>(json!([1, 2]), Obj::create).unwrap_err();
        assert!(matches!(
            error,
            SaverError::Node {
                expected: "object",
                found: "array",
            }
        ));
    }

    #[test]
    fn map_keys_parse_back_into_their_type() {
        let stored = json!({
            "$type": "demo.Obj",
            "weights": { "many": 0.5 },
        });
        let error = JsonSaver::load::<Obj, _>(stored, Obj::create).unwrap_err();
        let SaverError::Field { name, source } = error else {
            panic!("expected a field failure, got {error:?}");
        };
        assert_eq!(&*name, "weights");
        assert!(matches!(*source, SaverError::MapKey { target: "i32", .. }));
    }

    #[test]
    fn large_unsigned_leaves_survive() {
        #[derive(Default)]
        struct Big {
            count: u64,
        }

        impl Saveable for Big {
            fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
                saver.add_key("demo.Big")?;
                saver.add_value(&mut self.count, field_name!(self.count))
            }
        }

        let mut big = Big { count: u64::MAX };
        let stored = JsonSaver::save(&mut big).unwrap();
        assert_eq!(stored["count"], Value::from(u64::MAX));
        let loaded: Big = JsonSaver::load(stored, |_| Ok(Big::default())).unwrap();
        assert_eq!(loaded.count, u64::MAX);
    }
}
