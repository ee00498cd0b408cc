use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::binding::{BindingState, WorkloadResourceProperties};
use crate::models::output_resource::OutputResource;
use crate::models::workload::InstantiatedWorkload;
use crate::utils::error::Error;

pub mod annotations;
pub mod container;
pub mod context;
pub mod dapr;

pub use context::RenderContext;

/// Outcome of a render call. On failure `resources` still holds everything that
/// was constructed before the failure point, so callers can clean it up.
#[derive(Debug)]
pub struct RenderOutput {
    pub resources: Vec<OutputResource>,
    pub error: Option<Error>,
}

impl RenderOutput {
    pub fn ok(resources: Vec<OutputResource>) -> Self {
        RenderOutput {
            resources,
            error: None,
        }
    }

    pub fn failed(resources: Vec<OutputResource>, error: Error) -> Self {
        RenderOutput {
            resources,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_parts(self) -> (Vec<OutputResource>, Option<Error>) {
        (self.resources, self.error)
    }
}

/// Turns an instantiated workload into deployable resources and binding values.
///
/// Decorators implement this too and wrap another `WorkloadRenderer`, so chains
/// of any depth are just nested renderers.
#[async_trait]
pub trait WorkloadRenderer: Send + Sync {
    /// Computes the `BindingState` of every binding the workload declares, given
    /// the deployed properties of the resources it depends on. Must be a pure
    /// function of its inputs.
    async fn allocate_bindings(
        &self,
        ctx: &RenderContext,
        workload: &InstantiatedWorkload,
        resources: &[WorkloadResourceProperties],
    ) -> Result<BTreeMap<String, BindingState>, Error>;

    /// Produces the resources to deploy, in creation order.
    async fn render(&self, ctx: &RenderContext, workload: &InstantiatedWorkload) -> RenderOutput;
}

#[async_trait]
impl<R: WorkloadRenderer + ?Sized> WorkloadRenderer for Box<R> {
    async fn allocate_bindings(
        &self,
        ctx: &RenderContext,
        workload: &InstantiatedWorkload,
        resources: &[WorkloadResourceProperties],
    ) -> Result<BTreeMap<String, BindingState>, Error> {
        (**self).allocate_bindings(ctx, workload, resources).await
    }

    async fn render(&self, ctx: &RenderContext, workload: &InstantiatedWorkload) -> RenderOutput {
        (**self).render(ctx, workload).await
    }
}

#[async_trait]
impl<R: WorkloadRenderer + ?Sized> WorkloadRenderer for Arc<R> {
    async fn allocate_bindings(
        &self,
        ctx: &RenderContext,
        workload: &InstantiatedWorkload,
        resources: &[WorkloadResourceProperties],
    ) -> Result<BTreeMap<String, BindingState>, Error> {
        (**self).allocate_bindings(ctx, workload, resources).await
    }

    async fn render(&self, ctx: &RenderContext, workload: &InstantiatedWorkload) -> RenderOutput {
        (**self).render(ctx, workload).await
    }
}
