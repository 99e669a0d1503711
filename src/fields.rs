//! Field extraction: logical JSON name -> mutable handle into a record.
//!
//! A record exposes its fields by implementing [`Extract`], usually through
//! the [`extract_fields!`](crate::extract_fields) macro. Extraction hands out
//! one disjoint `&mut` borrow per field, erased to [`FieldSlot`], so the
//! filtered reader can assign fragments without knowing the record's type.
//!
//! ```text
//!   Outer { ..inner, a }            FieldMap
//!   ├── inner: Inner { b }    →     "b" → &mut outer.inner.b
//!   └── a: String                   "a" → &mut outer.a
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use crate::types::{Error, Result};

/// Storage location that can be overwritten from a JSON fragment.
pub trait FieldSlot {
    /// Deserialize `fragment` into a fresh value and store it.
    ///
    /// On failure the slot keeps its previous value.
    fn assign(&mut self, fragment: &RawValue) -> serde_json::Result<()>;
}

impl<T: DeserializeOwned> FieldSlot for T {
    fn assign(&mut self, fragment: &RawValue) -> serde_json::Result<()> {
        *self = serde_json::from_str(fragment.get())?;
        Ok(())
    }
}

/// Logical JSON name -> mutable handle, built fresh for every read.
#[derive(Default)]
pub struct FieldMap<'a> {
    slots: HashMap<&'a str, &'a mut dyn FieldSlot>,
    wanted: Option<HashSet<String>>,
}

impl<'a> FieldMap<'a> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            wanted: None,
        }
    }

    /// Map for a read that will only assign `names`. Optional embedded
    /// records that hold none of them stay unallocated.
    pub fn wanting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: HashMap::new(),
            wanted: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether a field called `name` may be assigned through this map.
    pub fn wants(&self, name: &str) -> bool {
        self.wanted
            .as_ref()
            .map_or(true, |wanted| wanted.contains(name))
    }

    /// Register a field. A later registration under the same name replaces
    /// the earlier one.
    pub fn insert(&mut self, name: &'a str, slot: &'a mut dyn FieldSlot) {
        if self.slots.insert(name, slot).is_some() {
            tracing::trace!(field = name, "field name registered twice, keeping the later one");
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn FieldSlot + 'a)> {
        self.slots.get_mut(name).map(|slot| &mut **slot)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.slots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for FieldMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("FieldMap").field("names", &names).finish()
    }
}

/// A record whose fields can be addressed by logical JSON name.
///
/// Implementations register every addressable field into `fields` in
/// declaration order and flatten embedded records by calling their own
/// `extract` on the same map. See [`extract_fields!`](crate::extract_fields).
pub trait Extract {
    fn extract<'a>(&'a mut self, fields: &mut FieldMap<'a>) -> Result<()>;
}

impl<T: Extract + ?Sized> Extract for Box<T> {
    fn extract<'a>(&'a mut self, fields: &mut FieldMap<'a>) -> Result<()> {
        (**self).extract(fields)
    }
}

/// An absent optional embedded record is allocated on extraction so that
/// assigned fields have somewhere to live, but only when the map wants at
/// least one of its fields.
impl<T: Extract + Default> Extract for Option<T> {
    fn extract<'a>(&'a mut self, fields: &mut FieldMap<'a>) -> Result<()> {
        if self.is_none() {
            let mut blank = T::default();
            let needed = {
                let mut names = FieldMap::new();
                blank.extract(&mut names)?;
                let needed = names.names().any(|name| fields.wants(name));
                needed
            };
            if !needed {
                return Ok(());
            }
            *self = Some(T::default());
        }
        match self {
            Some(inner) => inner.extract(fields),
            None => Ok(()),
        }
    }
}

/// Every existing key of the object is a field. Keys the object does not
/// already hold are unknown to it.
impl Extract for Map<String, Value> {
    fn extract<'a>(&'a mut self, fields: &mut FieldMap<'a>) -> Result<()> {
        for (name, value) in self.iter_mut() {
            fields.insert(name.as_str(), value);
        }
        Ok(())
    }
}

impl Extract for Value {
    fn extract<'a>(&'a mut self, fields: &mut FieldMap<'a>) -> Result<()> {
        match self {
            Value::Object(map) => map.extract(fields),
            other => Err(Error::type_mismatch(format!(
                "destination must be a JSON object, found {}",
                kind(other)
            ))),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build the complete field map of `record`, embedded fields flattened.
pub fn extract<T: Extract + ?Sized>(record: &mut T) -> Result<FieldMap<'_>> {
    extract_into(record, FieldMap::new())
}

/// Like [`extract`], but absent optional embedded records are only
/// allocated when they hold one of `names`.
pub fn extract_wanted<T, I, S>(record: &mut T, names: I) -> Result<FieldMap<'_>>
where
    T: Extract + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    extract_into(record, FieldMap::wanting(names))
}

fn extract_into<'a, T: Extract + ?Sized>(
    record: &'a mut T,
    mut fields: FieldMap<'a>,
) -> Result<FieldMap<'a>> {
    record.extract(&mut fields)?;
    Ok(fields)
}

/// Implement [`Extract`] for a struct from a list of its fields.
///
/// Entry forms, visited left to right:
/// - `field` registers the field under its declared name;
/// - `field => "name"` registers it under `name`;
/// - `..field` flattens an embedded record (`T`, `Box<T>` or `Option<T>`).
///
/// An embedded `Option<T>` that is `None` gets `T::default()` only when a
/// read is about to assign one of its fields; otherwise it stays `None`.
///
/// Fields that are not listed are skipped. Names should agree with the
/// struct's serde attributes so that reads and writes see the same keys.
///
/// ```
/// use json_body::extract_fields;
///
/// #[derive(Default)]
/// struct Audit { created_by: String }
///
/// #[derive(Default)]
/// struct User { audit: Audit, name: String, password_hash: String }
///
/// extract_fields!(Audit { created_by => "createdBy" });
/// extract_fields!(User { ..audit, name });
///
/// let mut user = User::default();
/// let fields = json_body::extract(&mut user).unwrap();
/// assert!(fields.contains("createdBy"));
/// assert!(fields.contains("name"));
/// assert!(!fields.contains("password_hash"));
/// ```
#[macro_export]
macro_rules! extract_fields {
    (@entries $this:ident, $fields:ident; ) => {};
    (@entries $this:ident, $fields:ident; .. $field:ident $(, $($rest:tt)*)?) => {
        $crate::Extract::extract(&mut $this.$field, $fields)?;
        $crate::extract_fields!(@entries $this, $fields; $($($rest)*)?);
    };
    (@entries $this:ident, $fields:ident; $field:ident => $name:literal $(, $($rest:tt)*)?) => {
        $fields.insert($name, &mut $this.$field);
        $crate::extract_fields!(@entries $this, $fields; $($($rest)*)?);
    };
    (@entries $this:ident, $fields:ident; $field:ident $(, $($rest:tt)*)?) => {
        $fields.insert(stringify!($field), &mut $this.$field);
        $crate::extract_fields!(@entries $this, $fields; $($($rest)*)?);
    };
    ($ty:ty { $($entries:tt)* }) => {
        impl $crate::Extract for $ty {
            fn extract<'a>(
                &'a mut self,
                fields: &mut $crate::FieldMap<'a>,
            ) -> $crate::Result<()> {
                $crate::extract_fields!(@entries self, fields; $($entries)*);
                Ok(())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Inner {
        b: String,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Outer {
        inner: Inner,
        a: String,
        secret: String,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Lazy {
        inner: Option<Box<Inner>>,
        count: i64,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Shadowed {
        inner: Inner,
        b: String,
    }

    extract_fields!(Inner { b });
    extract_fields!(Outer { ..inner, a => "alpha" });
    extract_fields!(Lazy { ..inner, count });
    extract_fields!(Shadowed { ..inner, b });

    fn fragment(json: &str) -> Box<RawValue> {
        RawValue::from_string(json.to_string()).unwrap()
    }

    fn sorted_names(fields: &FieldMap<'_>) -> Vec<String> {
        let mut names: Vec<String> = fields.names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_extract_renames_and_skips() {
        let mut outer = Outer::default();
        let fields = extract(&mut outer).unwrap();
        assert_eq!(sorted_names(&fields), vec!["alpha", "b"]);
        assert!(!fields.contains("a"));
        assert!(!fields.contains("secret"));
    }

    #[test]
    fn test_embedded_field_not_registered_itself() {
        let mut outer = Outer::default();
        let fields = extract(&mut outer).unwrap();
        assert!(!fields.contains("inner"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_assign_through_flattened_handle() {
        let mut outer = Outer::default();
        {
            let mut fields = extract(&mut outer).unwrap();
            let slot = fields.get_mut("b").unwrap();
            slot.assign(&fragment(r#""y""#)).unwrap();
        }
        assert_eq!(outer.inner.b, "y");
        assert_eq!(outer.a, "");
        assert_eq!(outer.secret, "");
    }

    #[test]
    fn test_optional_embedded_is_allocated() {
        let mut lazy = Lazy::default();
        assert!(lazy.inner.is_none());
        {
            let mut fields = extract(&mut lazy).unwrap();
            assert_eq!(sorted_names(&fields), vec!["b", "count"]);
            fields.get_mut("b").unwrap().assign(&fragment(r#""z""#)).unwrap();
        }
        assert_eq!(lazy.inner.as_deref(), Some(&Inner { b: "z".into() }));
        assert_eq!(lazy.count, 0);
    }

    #[test]
    fn test_optional_embedded_left_alone_when_not_wanted() {
        let mut lazy = Lazy::default();
        {
            let fields = extract_wanted(&mut lazy, ["count"]).unwrap();
            assert_eq!(sorted_names(&fields), vec!["count"]);
        }
        assert!(lazy.inner.is_none());

        {
            let fields = extract_wanted(&mut lazy, ["b"]).unwrap();
            assert_eq!(sorted_names(&fields), vec!["b", "count"]);
        }
        assert_eq!(lazy.inner.as_deref(), Some(&Inner::default()));
    }

    #[test]
    fn test_present_optional_embedded_always_registered() {
        let mut lazy = Lazy {
            inner: Some(Box::new(Inner { b: "set".into() })),
            count: 1,
        };
        let fields = extract_wanted(&mut lazy, ["count"]).unwrap();
        assert_eq!(sorted_names(&fields), vec!["b", "count"]);
    }

    #[test]
    fn test_later_field_wins_on_collision() {
        let mut shadowed = Shadowed::default();
        {
            let mut fields = extract(&mut shadowed).unwrap();
            assert_eq!(fields.len(), 1);
            fields.get_mut("b").unwrap().assign(&fragment(r#""outer""#)).unwrap();
        }
        assert_eq!(shadowed.b, "outer");
        assert_eq!(shadowed.inner.b, "");
    }

    #[test]
    fn test_failed_assign_keeps_previous_value() {
        let mut value = String::from("before");
        let err = value.assign(&fragment("123"));
        assert!(err.is_err());
        assert_eq!(value, "before");
    }

    #[test]
    fn test_value_object_exposes_existing_keys() {
        let mut value = json!({"a": 1, "b": 2});
        let fields = extract(&mut value).unwrap();
        assert_eq!(sorted_names(&fields), vec!["a", "b"]);
    }

    #[test]
    fn test_value_non_object_is_type_mismatch() {
        let mut value = json!([1, 2]);
        let err = extract(&mut value).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_debug_lists_sorted_names() {
        let mut outer = Outer::default();
        let fields = extract(&mut outer).unwrap();
        assert_eq!(format!("{fields:?}"), r#"FieldMap { names: ["alpha", "b"] }"#);
    }
}
