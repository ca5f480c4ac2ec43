//! Typed model of the declaration file.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// One declared template variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Unique key, used verbatim as the placeholder token.
    pub name: String,
    /// Human prompt/description shown when collecting a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Optional validation rule: a regex the collected value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl VariableSpec {
    /// A bare spec with only a name, no description/default/pattern.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None, default: None, pattern: None }
    }
}

/// Error returned when a variable name is declared twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate variable declaration: {0}")]
pub struct DuplicateVariable(pub String);

/// The declared variables, in declaration order, with unique names.
///
/// The declaration file maps each variable name to its spec object. This
/// container keeps that mapping's insertion order so reporting and file
/// rewriting stay deterministic, and rejects duplicate names eagerly instead
/// of silently overwriting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableSet {
    entries: Vec<VariableSpec>,
    index: HashMap<String, usize>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration at the end. Fails if the name is already declared.
    pub fn insert(&mut self, spec: VariableSpec) -> Result<(), DuplicateVariable> {
        if self.index.contains_key(&spec.name) {
            return Err(DuplicateVariable(spec.name.clone()));
        }
        self.index.insert(spec.name.clone(), self.entries.len());
        self.entries.push(spec);
        Ok(())
    }

    /// Remove a declaration by name, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<VariableSpec> {
        let pos = self.index.remove(name)?;
        let spec = self.entries.remove(pos);
        for idx in self.index.values_mut() {
            if *idx > pos {
                *idx -= 1;
            }
        }
        Some(spec)
    }

    pub fn get(&self, name: &str) -> Option<&VariableSpec> {
        self.index.get(name).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Specs in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, VariableSpec> {
        self.entries.iter()
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|spec| spec.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a VariableSet {
    type Item = &'a VariableSpec;
    type IntoIter = std::slice::Iter<'a, VariableSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Spec object as written in the file; `name` may be omitted there because
/// the map key already carries it.
#[derive(Deserialize)]
struct VariableSpecBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
}

impl<'de> Deserialize<'de> for VariableSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = VariableSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of variable name to variable spec")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut set = VariableSet::new();
                while let Some((key, body)) =
                    access.next_entry::<String, VariableSpecBody>()?
                {
                    if let Some(ref name) = body.name
                        && *name != key
                    {
                        return Err(de::Error::custom(format!(
                            "variable `{key}` declares mismatching name `{name}`"
                        )));
                    }
                    let spec = VariableSpec {
                        name: key,
                        description: body.description,
                        default: body.default,
                        pattern: body.pattern,
                    };
                    set.insert(spec).map_err(de::Error::custom)?;
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(SetVisitor)
    }
}

/// Serialized counterpart of [`VariableSpecBody`]: the map key carries the
/// name, so rewrites stay in the file's usual shape.
#[derive(Serialize)]
struct VariableSpecBodyRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<&'a str>,
}

impl Serialize for VariableSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for spec in &self.entries {
            let body = VariableSpecBodyRef {
                description: spec.description.as_deref(),
                default: spec.default.as_deref(),
                pattern: spec.pattern.as_deref(),
            };
            map.serialize_entry(&spec.name, &body)?;
        }
        map.end()
    }
}

/// The `template` section of the declaration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSection {
    #[serde(default)]
    pub variables: VariableSet,
    /// Keys this engine does not interpret, preserved across rewrites.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The parsed declaration file.
///
/// Only `template.variables` is interpreted; everything else (version-control
/// policy, hook lists, ...) passes through rewrites untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default)]
    pub template: TemplateSection,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TemplateConfig {
    pub fn variables(&self) -> &VariableSet {
        &self.template.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableSet {
        &mut self.template.variables
    }
}
