use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{RenderContext, RenderOutput, WorkloadRenderer};
use crate::models::binding::{BindingState, WorkloadResourceProperties};
use crate::models::output_resource::OutputResource;
use crate::models::workload::InstantiatedWorkload;
use crate::utils::error::Error;
use crate::utils::labels::{make_descriptive_labels, make_selector_labels, normalize_resource_name};

pub const WORKLOAD_KIND: &str = "radius.dev/Container@v1alpha1";
pub const RESOURCE_TYPE: &str = "Applications.Core/containers";
pub const HTTP_BINDING_KIND: &str = "http";

pub const LOCAL_ID_DEPLOYMENT: &str = "Deployment";
pub const LOCAL_ID_SERVICE: &str = "Service";

const DEFAULT_HTTP_PORT: u16 = 80;

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
pub struct ContainerProperties {
    pub container: ContainerSpec,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
pub struct ContainerSpec {
    pub image: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpBinding {
    pub port: Option<u16>,
    pub target_port: Option<u16>,
}

impl HttpBinding {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_HTTP_PORT)
    }

    pub fn target_port(&self) -> u16 {
        self.target_port.unwrap_or_else(|| self.port())
    }
}

/// Base renderer for `radius.dev/Container@v1alpha1` workloads: a Deployment,
/// followed by a Service when the workload exposes http bindings.
#[derive(Debug, Default, Clone)]
pub struct ContainerRenderer;

impl ContainerRenderer {
    pub fn new() -> Self {
        ContainerRenderer
    }

    fn http_bindings(
        &self,
        workload: &InstantiatedWorkload,
    ) -> Result<Vec<(String, HttpBinding)>, Error> {
        let mut bindings = Vec::new();
        for (name, binding) in workload.workload.bindings.iter() {
            if binding.kind == HTTP_BINDING_KIND {
                bindings.push((name.clone(), binding.decode(name)?));
            }
        }
        Ok(bindings)
    }

    fn make_deployment(
        &self,
        workload: &InstantiatedWorkload,
        name: &str,
        properties: &ContainerProperties,
        http: &[(String, HttpBinding)],
    ) -> Deployment {
        let labels = make_descriptive_labels(&workload.application, name, RESOURCE_TYPE);

        let env: Vec<EnvVar> = properties
            .container
            .env
            .iter()
            .map(|(key, value)| EnvVar {
                name: key.clone(),
                value: Some(value.clone()),
                ..EnvVar::default()
            })
            .collect();

        let ports: Vec<ContainerPort> = http
            .iter()
            .map(|(binding_name, binding)| ContainerPort {
                name: Some(binding_name.clone()),
                container_port: i32::from(binding.target_port()),
                protocol: Some("TCP".to_string()),
                ..ContainerPort::default()
            })
            .collect();

        let container = Container {
            name: name.to_string(),
            image: Some(properties.container.image.clone()),
            env: if env.is_empty() { None } else { Some(env) },
            ports: if ports.is_empty() { None } else { Some(ports) },
            ..Container::default()
        };

        Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(workload.namespace.clone()),
                labels: Some(labels.clone()),
                ..ObjectMeta::default()
            },
            spec: Some(DeploymentSpec {
                selector: LabelSelector {
                    match_labels: Some(make_selector_labels(&workload.application, name)),
                    ..LabelSelector::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        ..ObjectMeta::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![container],
                        ..PodSpec::default()
                    }),
                },
                ..DeploymentSpec::default()
            }),
            ..Deployment::default()
        }
    }

    fn make_service(
        &self,
        workload: &InstantiatedWorkload,
        name: &str,
        http: &[(String, HttpBinding)],
    ) -> Service {
        let ports = http
            .iter()
            .map(|(binding_name, binding)| ServicePort {
                name: Some(binding_name.clone()),
                port: i32::from(binding.port()),
                target_port: Some(IntOrString::Int(i32::from(binding.target_port()))),
                protocol: Some("TCP".to_string()),
                ..ServicePort::default()
            })
            .collect();

        Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(workload.namespace.clone()),
                labels: Some(make_descriptive_labels(
                    &workload.application,
                    name,
                    RESOURCE_TYPE,
                )),
                ..ObjectMeta::default()
            },
            spec: Some(ServiceSpec {
                selector: Some(make_selector_labels(&workload.application, name)),
                type_: Some("ClusterIP".to_string()),
                ports: Some(ports),
                ..ServiceSpec::default()
            }),
            ..Service::default()
        }
    }
}

#[async_trait]
impl WorkloadRenderer for ContainerRenderer {
    async fn allocate_bindings(
        &self,
        ctx: &RenderContext,
        workload: &InstantiatedWorkload,
        _resources: &[WorkloadResourceProperties],
    ) -> Result<BTreeMap<String, BindingState>, Error> {
        ctx.check_cancelled()?;

        let name = normalize_resource_name(&workload.name)?;
        let mut bindings = BTreeMap::new();

        for (binding_name, binding) in self.http_bindings(workload)? {
            let host = format!("{}.{}.svc.cluster.local", name, workload.namespace);
            let port = binding.port();

            let mut properties = BTreeMap::new();
            properties.insert("host".to_string(), Value::from(host.clone()));
            properties.insert("port".to_string(), Value::from(port));
            properties.insert("scheme".to_string(), Value::from("http"));
            properties.insert(
                "uri".to_string(),
                Value::from(format!("http://{}:{}", host, port)),
            );

            bindings.insert(
                binding_name.clone(),
                BindingState {
                    component: workload.name.clone(),
                    binding: binding_name,
                    kind: HTTP_BINDING_KIND.to_string(),
                    properties,
                },
            );
        }

        Ok(bindings)
    }

    async fn render(&self, ctx: &RenderContext, workload: &InstantiatedWorkload) -> RenderOutput {
        let mut resources = Vec::new();

        if let Err(err) = ctx.check_cancelled() {
            return RenderOutput::failed(resources, err);
        }

        let name = match normalize_resource_name(&workload.name) {
            Ok(name) => name,
            Err(err) => return RenderOutput::failed(resources, err),
        };
        let properties: ContainerProperties = match workload.workload.decode_properties() {
            Ok(properties) => properties,
            Err(err) => return RenderOutput::failed(resources, err),
        };
        let http = match self.http_bindings(workload) {
            Ok(http) => http,
            Err(err) => return RenderOutput::failed(resources, err),
        };

        let deployment = self.make_deployment(workload, &name, &properties, &http);
        resources.push(OutputResource::kubernetes(LOCAL_ID_DEPLOYMENT, deployment));

        if !http.is_empty() {
            let service = self.make_service(workload, &name, &http);
            resources.push(OutputResource::kubernetes(LOCAL_ID_SERVICE, service));
        }

        debug!("{}: rendered {} resources", ctx, resources.len());
        RenderOutput::ok(resources)
    }
}
