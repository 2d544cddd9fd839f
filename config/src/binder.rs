//! # Structured Binding
//!
//! Projects a subtree of the merged snapshot onto a `Deserialize` type.
//!
//! Keys below the section prefix are split on the path delimiter to rebuild
//! a tree. Struct fields and enum variants match case-insensitively. Leaf
//! strings convert to the requested scalar type; children with numeric
//! segments (`Hosts:0`, `Hosts:1`) become sequences ordered by index.
//!
//! Fields missing from the tree are reported by serde as missing; put
//! `#[serde(default)]` on the target type to keep its defaults instead.

use crate::parse;
use errors::BindError;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Visitor,
};
use sources::{ConfigKey, FlatMap, combine, eq_ignore_case};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Node {
    value: Option<String>,
    children: BTreeMap<ConfigKey, Node>,
}

impl Node {
    /// Rebuilds the tree of every key under `prefix`.
    pub(crate) fn from_snapshot(snapshot: &FlatMap, prefix: &str) -> Self {
        let mut root = Node::default();
        for (key, value) in snapshot {
            if !prefix.is_empty() && eq_ignore_case(key.as_str(), prefix) {
                root.value = Some(value.clone());
                continue;
            }
            let Some(rest) = key.strip_section(prefix) else {
                continue;
            };
            let mut node = &mut root;
            for segment in rest.split(sources::KEY_DELIMITER) {
                node = node.children.entry(ConfigKey::from(segment)).or_default();
            }
            node.value = Some(value.clone());
        }
        root
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }
}

/// Deserializes `T` from the subtree at `prefix` (empty for the root).
pub(crate) fn bind_snapshot<T: DeserializeOwned>(
    snapshot: &FlatMap,
    prefix: &str,
) -> Result<T, BindError> {
    let root = Node::from_snapshot(snapshot, prefix);
    T::deserialize(NodeDeserializer {
        node: &root,
        path: prefix.to_string(),
    })
}

struct NodeDeserializer<'a> {
    node: &'a Node,
    path: String,
}

impl<'a> NodeDeserializer<'a> {
    fn child(&self, key: &ConfigKey, node: &'a Node) -> Self {
        Self {
            node,
            path: combine(&self.path, key.as_str()),
        }
    }

    fn leaf(&self) -> Result<&'a str, BindError> {
        match &self.node.value {
            Some(value) if self.node.children.is_empty() => Ok(value),
            _ => Err(BindError::ExpectedValue {
                path: self.path.clone(),
            }),
        }
    }

    fn parsed<T: FromStr>(&self, expected: &str) -> Result<T, BindError> {
        let raw = self.leaf()?;
        parse::parse_value(raw).ok_or_else(|| self.invalid(raw, expected))
    }

    fn invalid(&self, value: &str, expected: impl Display) -> BindError {
        BindError::InvalidValue {
            path: self.path.clone(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Children with numeric segments, ordered by index.
    fn elements(&self) -> Result<Vec<(usize, &'a ConfigKey, &'a Node)>, BindError> {
        let mut elements = self
            .node
            .children
            .iter()
            .map(|(key, node)| {
                key.as_str()
                    .parse::<usize>()
                    .map(|index| (index, key, node))
                    .map_err(|_| BindError::InvalidValue {
                        path: combine(&self.path, key.as_str()),
                        value: key.to_string(),
                        expected: "sequence index".to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        elements.sort_by_key(|(index, _, _)| *index);
        Ok(elements)
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
                visitor.$visit(self.parsed::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for NodeDeserializer<'_> {
    type Error = BindError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        if self.node.children.is_empty() {
            match &self.node.value {
                Some(value) => visitor.visit_string(value.clone()),
                None => visitor.visit_unit(),
            }
        } else {
            self.deserialize_map(visitor)
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let raw = self.leaf()?;
        match parse::parse_bool(raw) {
            Some(value) => visitor.visit_bool(value),
            None => Err(self.invalid(raw, "bool")),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
        deserialize_char => visit_char: char,
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_str(self.leaf()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_string(self.leaf()?.to_string())
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_bytes(self.leaf()?.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_byte_buf(self.leaf()?.as_bytes().to_vec())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        if self.node.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        if self.node.children.is_empty() {
            // An empty array flattens to "".
            return match self.node.value.as_deref() {
                None | Some("") => visitor.visit_seq(Elements {
                    parent: &self,
                    items: Vec::new().into_iter(),
                }),
                Some(raw) => Err(self.invalid(raw, "sequence")),
            };
        }
        let items = self.elements()?;
        visitor.visit_seq(Elements {
            parent: &self,
            items: items.into_iter(),
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_map(Entries {
            parent: &self,
            fields: &[],
            iter: self.node.children.iter(),
            pending: None,
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        if self.node.children.is_empty() {
            match self.node.value.as_deref() {
                Some(raw) if !raw.is_empty() => return Err(self.invalid(raw, "section")),
                _ => {}
            }
        }
        visitor.visit_map(Entries {
            parent: &self,
            fields,
            iter: self.node.children.iter(),
            pending: None,
        })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        let raw = self.leaf()?;
        let variant = variants
            .iter()
            .find(|variant| eq_ignore_case(variant, raw.trim()))
            .ok_or_else(|| BindError::UnknownVariant {
                path: self.path.clone(),
                value: raw.to_string(),
            })?;
        visitor.visit_enum((*variant).into_deserializer())
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }
}

struct Elements<'p, 'a> {
    parent: &'p NodeDeserializer<'a>,
    items: std::vec::IntoIter<(usize, &'a ConfigKey, &'a Node)>,
}

impl<'de> SeqAccess<'de> for Elements<'_, '_> {
    type Error = BindError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, BindError> {
        match self.items.next() {
            Some((_, key, node)) => seed.deserialize(self.parent.child(key, node)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct Entries<'p, 'a> {
    parent: &'p NodeDeserializer<'a>,
    /// Declared struct fields; empty for plain maps.
    fields: &'static [&'static str],
    iter: std::collections::btree_map::Iter<'a, ConfigKey, Node>,
    pending: Option<(&'a ConfigKey, &'a Node)>,
}

impl<'de> MapAccess<'de> for Entries<'_, '_> {
    type Error = BindError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, BindError> {
        let Some((key, node)) = self.iter.next() else {
            return Ok(None);
        };
        self.pending = Some((key, node));

        let name = self
            .fields
            .iter()
            .find(|field| eq_ignore_case(field, key.as_str()))
            .map_or_else(|| key.to_string(), |field| (*field).to_string());
        seed.deserialize(name.into_deserializer()).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, BindError> {
        match self.pending.take() {
            Some((key, node)) => seed.deserialize(self.parent.child(key, node)),
            None => Err(de::Error::custom("value requested before key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}
