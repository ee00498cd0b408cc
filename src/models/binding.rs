use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::output_resource::ResourceKind;

/// The resolved value of one binding, made available to dependent workloads.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
pub struct BindingState {
    pub component: String,
    pub binding: String,
    pub kind: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

/// Physical properties of an already deployed resource a workload depends on.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadResourceProperties {
    pub kind: ResourceKind,
    pub local_id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}
