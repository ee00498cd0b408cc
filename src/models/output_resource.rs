use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::core::DynamicObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource family an output resource belongs to.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash, JsonSchema)]
pub enum ResourceKind {
    Kubernetes,
    #[serde(rename = "dapr.statestore.azurestorage")]
    DaprStateStoreAzureStorage,
    #[serde(rename = "azure.servicebus.queue")]
    AzureServiceBusQueue,
    #[serde(rename = "azure.cosmosdb.mongo")]
    AzureCosmosDbMongo,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Kubernetes => "Kubernetes",
            ResourceKind::DaprStateStoreAzureStorage => "dapr.statestore.azurestorage",
            ResourceKind::AzureServiceBusQueue => "azure.servicebus.queue",
            ResourceKind::AzureCosmosDbMongo => "azure.cosmosdb.mongo",
        };
        f.write_str(name)
    }
}

/// Native payload of an output resource. Strongly typed objects and schemaless
/// documents share no common base, so shape-sensitive code matches on this.
#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum ResourcePayload {
    Deployment(Box<Deployment>),
    Service(Box<Service>),
    Dynamic(Box<DynamicObject>),
    Json(Value),
}

impl From<Deployment> for ResourcePayload {
    fn from(deployment: Deployment) -> Self {
        ResourcePayload::Deployment(Box::new(deployment))
    }
}

impl From<Service> for ResourcePayload {
    fn from(service: Service) -> Self {
        ResourcePayload::Service(Box::new(service))
    }
}

impl From<DynamicObject> for ResourcePayload {
    fn from(object: DynamicObject) -> Self {
        ResourcePayload::Dynamic(Box::new(object))
    }
}

impl From<Value> for ResourcePayload {
    fn from(value: Value) -> Self {
        ResourcePayload::Json(value)
    }
}

/// One concrete deployable unit produced by rendering.
///
/// The kind and payload shape are fixed at creation; later pipeline stages may
/// still mutate fields inside the payload.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OutputResource {
    pub local_id: String,
    pub kind: ResourceKind,
    pub resource: ResourcePayload,

    /// Physical properties, filled in once the resource has been deployed.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl OutputResource {
    pub fn new(local_id: &str, kind: ResourceKind, resource: impl Into<ResourcePayload>) -> Self {
        OutputResource {
            local_id: local_id.to_string(),
            kind,
            resource: resource.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn kubernetes(local_id: &str, resource: impl Into<ResourcePayload>) -> Self {
        OutputResource::new(local_id, ResourceKind::Kubernetes, resource)
    }
}
