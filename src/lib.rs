//! Renders workload declarations into deployable resources and resolves the
//! bindings that connect workloads to each other.
//!
//! Base renderers such as [`renderers::container::ContainerRenderer`] produce
//! resources for one workload kind. Decorators such as
//! [`renderers::dapr::DaprRenderer`] wrap any other renderer and augment its
//! output:
//!
//! ```rust,ignore
//! let renderer = DaprRenderer::new(ContainerRenderer::new());
//! let bindings = renderer.allocate_bindings(&ctx, &workload, &[]).await?;
//! let (resources, error) = renderer.render(&ctx, &workload).await.into_parts();
//! ```

pub mod models;
pub mod renderers;
pub mod utils;

pub use renderers::{RenderContext, RenderOutput, WorkloadRenderer};
pub use utils::error::Error;
