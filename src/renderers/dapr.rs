use std::collections::BTreeMap;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::annotations::{get_property_bag, set_property_bag};
use super::{RenderContext, RenderOutput, WorkloadRenderer};
use crate::models::binding::{BindingState, WorkloadResourceProperties};
use crate::models::output_resource::ResourceKind;
use crate::models::workload::InstantiatedWorkload;
use crate::utils::error::Error;

pub const TRAIT_KIND: &str = "dapr.io/App@v1alpha1";
pub const BINDING_KIND: &str = "dapr.io/Invoke";

pub const ANNOTATION_ENABLED: &str = "dapr.io/enabled";
pub const ANNOTATION_APP_ID: &str = "dapr.io/app-id";
pub const ANNOTATION_APP_PORT: &str = "dapr.io/app-port";
pub const ANNOTATION_CONFIG: &str = "dapr.io/config";
pub const ANNOTATION_PROTOCOL: &str = "dapr.io/protocol";

/// The `dapr.io/App@v1alpha1` trait. Every field is optional.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DaprTrait {
    pub app_id: String,
    pub app_port: u16,
    pub config: String,
    pub protocol: String,
}

impl DaprTrait {
    /// The app id, defaulting to the workload's own name.
    pub fn app_id_or(&self, workload_name: &str) -> String {
        if self.app_id.is_empty() {
            workload_name.to_string()
        } else {
            self.app_id.clone()
        }
    }
}

/// Decorates the inner renderer's output with the dapr sidecar annotations and
/// resolves `dapr.io/Invoke` bindings.
pub struct DaprRenderer<R> {
    inner: R,
}

impl<R> DaprRenderer<R> {
    pub fn new(inner: R) -> Self {
        DaprRenderer { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: WorkloadRenderer> WorkloadRenderer for DaprRenderer<R> {
    async fn allocate_bindings(
        &self,
        ctx: &RenderContext,
        workload: &InstantiatedWorkload,
        resources: &[WorkloadResourceProperties],
    ) -> Result<BTreeMap<String, BindingState>, Error> {
        let mut bindings = self
            .inner
            .allocate_bindings(ctx, workload, resources)
            .await?;

        // invoke bindings are resolved here so that other components can depend on them
        let invoke_bindings: Vec<_> = workload
            .workload
            .bindings
            .iter()
            .filter(|(_, binding)| binding.kind == BINDING_KIND)
            .collect();
        if invoke_bindings.is_empty() {
            return Ok(bindings);
        }

        let dapr: DaprTrait =
            workload
                .workload
                .find_trait(TRAIT_KIND)?
                .ok_or_else(|| Error::MissingTrait {
                    trait_kind: TRAIT_KIND.to_string(),
                    binding_kind: BINDING_KIND.to_string(),
                })?;
        let app_id = dapr.app_id_or(&workload.workload.name);

        for (name, binding) in invoke_bindings {
            debug!("{} binding={}: allocated dapr invoke binding", ctx, name);

            let mut properties = BTreeMap::new();
            properties.insert("appId".to_string(), Value::String(app_id.clone()));

            bindings.insert(
                name.clone(),
                BindingState {
                    component: workload.name.clone(),
                    binding: name.clone(),
                    kind: binding.kind.clone(),
                    properties,
                },
            );
        }

        Ok(bindings)
    }

    async fn render(&self, ctx: &RenderContext, workload: &InstantiatedWorkload) -> RenderOutput {
        let output = self.inner.render(ctx, workload).await;
        if !output.is_ok() {
            return output;
        }

        let dapr: DaprTrait = match workload.workload.find_trait(TRAIT_KIND) {
            Ok(Some(dapr)) => dapr,
            Ok(None) => return output,
            Err(err) => return RenderOutput::failed(output.resources, err),
        };

        let app_id = dapr.app_id_or(&workload.workload.name);
        let mut resources = output.resources;

        for resource in resources.iter_mut() {
            if resource.kind != ResourceKind::Kubernetes {
                continue;
            }

            let mut annotations = match get_property_bag(&mut resource.resource) {
                Some(annotations) => annotations,
                None => {
                    debug!(
                        "{}: {} cannot carry dapr annotations, skipping",
                        ctx, resource.local_id
                    );
                    continue;
                }
            };

            annotations.insert(ANNOTATION_ENABLED.to_string(), "true".to_string());
            annotations.insert(ANNOTATION_APP_ID.to_string(), app_id.clone());
            if dapr.app_port != 0 {
                annotations.insert(ANNOTATION_APP_PORT.to_string(), dapr.app_port.to_string());
            }
            if !dapr.config.is_empty() {
                annotations.insert(ANNOTATION_CONFIG.to_string(), dapr.config.clone());
            }
            if !dapr.protocol.is_empty() {
                annotations.insert(ANNOTATION_PROTOCOL.to_string(), dapr.protocol.clone());
            }

            set_property_bag(annotations);
            debug!("{}: added dapr annotations to {}", ctx, resource.local_id);
        }

        RenderOutput::ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::Ordering;

    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::Service;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::core::DynamicObject;
    use serde_json::{json, Value};

    use super::{DaprRenderer, BINDING_KIND, TRAIT_KIND};
    use crate::models::binding::BindingState;
    use crate::models::output_resource::{OutputResource, ResourceKind, ResourcePayload};
    use crate::models::workload::{InstantiatedWorkload, Workload};
    use crate::renderers::testing::StubRenderer;
    use crate::renderers::{RenderContext, WorkloadRenderer};
    use crate::utils::error::Error;

    fn instantiate(workload: Value) -> InstantiatedWorkload {
        let workload: Workload = serde_json::from_value(workload).unwrap();
        InstantiatedWorkload::new("shop", "default", workload)
    }

    fn deployment(name: &str) -> OutputResource {
        OutputResource::kubernetes(
            "Deployment",
            Deployment {
                metadata: ObjectMeta {
                    name: Some(name.to_string()),
                    ..ObjectMeta::default()
                },
                ..Deployment::default()
            },
        )
    }

    fn component() -> OutputResource {
        let object: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "dapr.io/v1alpha1",
            "kind": "Component",
            "metadata": { "name": "statestore" },
            "spec": { "type": "state.azure.tablestorage" }
        }))
        .unwrap();
        OutputResource::kubernetes("Component", object)
    }

    fn inner_resources() -> Vec<OutputResource> {
        vec![
            deployment("frontend"),
            OutputResource::kubernetes("Service", Service::default()),
            component(),
            OutputResource::new(
                "StorageAccount",
                ResourceKind::DaprStateStoreAzureStorage,
                json!({ "type": "Microsoft.Storage/storageAccounts" }),
            ),
        ]
    }

    fn annotations(resource: &OutputResource) -> Option<BTreeMap<String, String>> {
        match &resource.resource {
            ResourcePayload::Deployment(deployment) => deployment
                .spec
                .as_ref()
                .and_then(|spec| spec.template.metadata.as_ref())
                .and_then(|metadata| metadata.annotations.clone()),
            ResourcePayload::Dynamic(object) => object.metadata.annotations.clone(),
            _ => None,
        }
    }

    #[test]
    fn invoke_binding_defaults_app_id_to_workload_name() {
        let workload = instantiate(json!({
            "kind": "radius.dev/Container@v1alpha1",
            "name": "frontend",
            "bindings": { "invoke": { "kind": BINDING_KIND } },
            "traits": [ { "kind": TRAIT_KIND } ]
        }));
        let renderer = DaprRenderer::new(StubRenderer::default());

        let bindings = tokio_test::block_on(renderer.allocate_bindings(
            &RenderContext::default(),
            &workload,
            &[],
        ))
        .unwrap();

        let invoke = &bindings["invoke"];
        assert_eq!(invoke.component, "frontend");
        assert_eq!(invoke.binding, "invoke");
        assert_eq!(invoke.kind, BINDING_KIND);
        assert_eq!(invoke.properties["appId"], json!("frontend"));
    }

    #[test]
    fn invoke_binding_uses_declared_app_id_and_keeps_inner_bindings() {
        let workload = instantiate(json!({
            "kind": "radius.dev/Container@v1alpha1",
            "name": "frontend",
            "bindings": {
                "invoke": { "kind": BINDING_KIND },
                "web": { "kind": "http" }
            },
            "traits": [ { "kind": TRAIT_KIND, "appId": "storefront" } ]
        }));
        let mut inner_bindings = BTreeMap::new();
        inner_bindings.insert(
            "web".to_string(),
            BindingState {
                component: "frontend".to_string(),
                binding: "web".to_string(),
                kind: "http".to_string(),
                properties: BTreeMap::new(),
            },
        );
        let renderer = DaprRenderer::new(StubRenderer {
            bindings: inner_bindings,
            ..StubRenderer::default()
        });

        let bindings = tokio_test::block_on(renderer.allocate_bindings(
            &RenderContext::default(),
            &workload,
            &[],
        ))
        .unwrap();

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings["web"].kind, "http");
        assert_eq!(bindings["invoke"].properties["appId"], json!("storefront"));
    }

    #[test]
    fn invoke_binding_without_trait_fails() {
        let workload = instantiate(json!({
            "kind": "radius.dev/Container@v1alpha1",
            "name": "frontend",
            "bindings": { "invoke": { "kind": BINDING_KIND } }
        }));
        let renderer = DaprRenderer::new(StubRenderer::default());

        let result = tokio_test::block_on(renderer.allocate_bindings(
            &RenderContext::default(),
            &workload,
            &[],
        ));

        match result {
            Err(err @ Error::MissingTrait { .. }) => {
                let message = err.to_string();
                assert!(message.contains(TRAIT_KIND));
                assert!(message.contains(BINDING_KIND));
            }
            other => panic!("expected missing trait error, got {:?}", other),
        }
    }

    #[test]
    fn inner_binding_failure_is_forwarded() {
        let workload = instantiate(json!({
            "kind": "radius.dev/Container@v1alpha1",
            "name": "frontend",
            "bindings": { "invoke": { "kind": BINDING_KIND } },
            "traits": [ { "kind": TRAIT_KIND } ]
        }));
        let renderer = DaprRenderer::new(StubRenderer {
            fail_bindings: true,
            ..StubRenderer::default()
        });

        let result = tokio_test::block_on(renderer.allocate_bindings(
            &RenderContext::default(),
            &workload,
            &[],
        ));

        assert!(matches!(result, Err(Error::InvalidResourceName(_))));
    }

    #[tokio::test]
    async fn render_without_trait_is_transparent() {
        let workload = instantiate(json!({
            "kind": "radius.dev/Container@v1alpha1",
            "name": "frontend"
        }));
        let resources = inner_resources();
        let renderer = DaprRenderer::new(StubRenderer {
            resources: resources.clone(),
            ..StubRenderer::default()
        });

        let output = renderer.render(&RenderContext::default(), &workload).await;

        assert!(output.is_ok());
        assert_eq!(
            serde_json::to_value(&output.resources).unwrap(),
            serde_json::to_value(&resources).unwrap()
        );
    }

    #[tokio::test]
    async fn render_annotates_supported_kubernetes_resources_in_place() {
        let workload = instantiate(json!({
            "kind": "radius.dev/Container@v1alpha1",
            "name": "frontend",
            "traits": [ {
                "kind": TRAIT_KIND,
                "appPort": 3000,
                "config": "tracing",
                "protocol": "grpc"
            } ]
        }));
        let renderer = DaprRenderer::new(StubRenderer {
            resources: inner_resources(),
            ..StubRenderer::default()
        });

        let output = renderer.render(&RenderContext::default(), &workload).await;
        assert!(output.is_ok());

        let ids: Vec<&str> = output.resources.iter().map(|r| r.local_id.as_str()).collect();
        assert_eq!(ids, vec!["Deployment", "Service", "Component", "StorageAccount"]);

        for index in &[0, 2] {
            let annotations = annotations(&output.resources[*index]).unwrap();
            assert_eq!(annotations["dapr.io/enabled"], "true");
            assert_eq!(annotations["dapr.io/app-id"], "frontend");
            assert_eq!(annotations["dapr.io/app-port"], "3000");
            assert_eq!(annotations["dapr.io/config"], "tracing");
            assert_eq!(annotations["dapr.io/protocol"], "grpc");
        }

        let untouched = inner_resources();
        for index in &[1, 3] {
            assert_eq!(
                serde_json::to_value(&output.resources[*index]).unwrap(),
                serde_json::to_value(&untouched[*index]).unwrap()
            );
        }
    }

    #[tokio::test]
    async fn render_omits_optional_annotations() {
        let workload = instantiate(json!({
            "kind": "radius.dev/Container@v1alpha1",
            "name": "frontend",
            "traits": [ { "kind": TRAIT_KIND, "appId": "storefront" } ]
        }));
        let renderer = DaprRenderer::new(StubRenderer {
            resources: vec![deployment("frontend")],
            ..StubRenderer::default()
        });

        let output = renderer.render(&RenderContext::default(), &workload).await;

        let annotations = annotations(&output.resources[0]).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations["dapr.io/app-id"], "storefront");
    }

    #[tokio::test]
    async fn inner_render_failure_short_circuits_decoration() {
        let workload = instantiate(json!({
            "kind": "radius.dev/Container@v1alpha1",
            "name": "frontend",
            "traits": [ { "kind": TRAIT_KIND } ]
        }));
        let renderer = DaprRenderer::new(StubRenderer {
            resources: vec![deployment("frontend"), component()],
            fail_render: true,
            ..StubRenderer::default()
        });

        let output = renderer.render(&RenderContext::default(), &workload).await;

        assert!(matches!(output.error, Some(Error::InvalidResourceName(_))));
        assert_eq!(output.resources.len(), 2);
        assert!(output.resources.iter().all(|r| annotations(r).is_none()));
    }

    #[tokio::test]
    async fn misshapen_trait_fails_render_with_inner_resources() {
        let workload = instantiate(json!({
            "kind": "radius.dev/Container@v1alpha1",
            "name": "frontend",
            "traits": [ { "kind": TRAIT_KIND, "appPort": "http" } ]
        }));
        let renderer = DaprRenderer::new(StubRenderer {
            resources: vec![deployment("frontend")],
            ..StubRenderer::default()
        });

        let output = renderer.render(&RenderContext::default(), &workload).await;

        assert!(matches!(output.error, Some(Error::TraitSchema { .. })));
        assert_eq!(output.resources.len(), 1);
        assert!(annotations(&output.resources[0]).is_none());
    }

    #[tokio::test]
    async fn decorators_chain_and_repeat_identically() {
        let workload = instantiate(json!({
            "kind": "radius.dev/Container@v1alpha1",
            "name": "frontend",
            "bindings": { "invoke": { "kind": BINDING_KIND } },
            "traits": [ { "kind": TRAIT_KIND } ]
        }));
        let renderer = DaprRenderer::new(DaprRenderer::new(StubRenderer {
            resources: inner_resources(),
            ..StubRenderer::default()
        }));
        let ctx = RenderContext::default();

        let first = renderer.render(&ctx, &workload).await;
        let second = renderer.render(&ctx, &workload).await;
        assert_eq!(
            serde_json::to_value(&first.resources).unwrap(),
            serde_json::to_value(&second.resources).unwrap()
        );

        let first = renderer.allocate_bindings(&ctx, &workload, &[]).await.unwrap();
        let second = renderer.allocate_bindings(&ctx, &workload, &[]).await.unwrap();
        assert_eq!(first, second);

        assert_eq!(renderer.inner().inner().calls.load(Ordering::SeqCst), 4);
    }
}
