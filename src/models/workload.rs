use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::error::Error;

/// A named unit of deployment intent, as parsed from an application spec.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
pub struct Workload {
    pub kind: String,
    pub name: String,

    #[serde(default)]
    pub bindings: BTreeMap<String, BindingDeclaration>,

    // order matters: lookups resolve to the first trait of a kind
    #[serde(default)]
    pub traits: Vec<TraitDeclaration>,

    /// Workload-kind specific configuration, decoded by the matching renderer.
    #[serde(default)]
    pub properties: Value,
}

impl Workload {
    /// Finds the first trait of the given kind and decodes its payload.
    ///
    /// Returns `Ok(None)` when no trait of that kind is declared. A trait that is
    /// present but has the wrong shape is an `Error::TraitSchema`.
    pub fn find_trait<T: DeserializeOwned>(&self, kind: &str) -> Result<Option<T>, Error> {
        match self.traits.iter().find(|declaration| declaration.kind == kind) {
            Some(declaration) => declaration.decode().map(Some),
            None => Ok(None),
        }
    }

    /// Decodes the workload's properties into the renderer's typed shape.
    pub fn decode_properties<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(self.properties.clone()).map_err(|source| Error::WorkloadSchema {
            workload: self.name.clone(),
            source,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
pub struct BindingDeclaration {
    pub kind: String,

    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl BindingDeclaration {
    pub fn decode<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        serde_json::from_value(Value::Object(self.properties.clone().into_iter().collect()))
            .map_err(|source| Error::BindingSchema {
                binding: name.to_string(),
                kind: self.kind.clone(),
                source,
            })
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
pub struct TraitDeclaration {
    pub kind: String,

    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl TraitDeclaration {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(Value::Object(self.properties.clone().into_iter().collect()))
            .map_err(|source| Error::TraitSchema {
                kind: self.kind.clone(),
                source,
            })
    }
}

/// A workload bound to the identifiers needed to name its generated resources.
#[derive(Debug, PartialEq, Clone)]
pub struct InstantiatedWorkload {
    pub application: String,
    pub name: String,
    pub namespace: String,
    pub workload: Workload,
}

impl InstantiatedWorkload {
    pub fn new(application: &str, namespace: &str, workload: Workload) -> Self {
        InstantiatedWorkload {
            application: application.to_string(),
            name: workload.name.clone(),
            namespace: namespace.to_string(),
            workload,
        }
    }
}
