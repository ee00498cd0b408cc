use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::models::output_resource::ResourcePayload;

/// Mutable annotations of a resource payload.
///
/// Typed objects hand out a live reference into their metadata. Schemaless
/// objects hand out a copy that only takes effect once passed to
/// [`set_property_bag`].
#[derive(Debug)]
pub enum PropertyBag<'a> {
    Live(&'a mut BTreeMap<String, String>),
    Detached {
        target: &'a mut ObjectMeta,
        values: BTreeMap<String, String>,
    },
}

impl<'a> Deref for PropertyBag<'a> {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target {
        match self {
            PropertyBag::Live(values) => &**values,
            PropertyBag::Detached { values, .. } => values,
        }
    }
}

impl<'a> DerefMut for PropertyBag<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            PropertyBag::Live(values) => &mut **values,
            PropertyBag::Detached { values, .. } => values,
        }
    }
}

/// Returns the annotation bag of a payload, or `None` when the payload shape is
/// not one this adapter knows how to annotate.
///
/// For a `Deployment` these are the pod template annotations, created on demand.
pub fn get_property_bag(resource: &mut ResourcePayload) -> Option<PropertyBag<'_>> {
    match resource {
        ResourcePayload::Deployment(deployment) => {
            let template_metadata = deployment
                .spec
                .get_or_insert_with(Default::default)
                .template
                .metadata
                .get_or_insert_with(Default::default);
            let annotations = template_metadata
                .annotations
                .get_or_insert_with(BTreeMap::new);

            Some(PropertyBag::Live(annotations))
        }
        ResourcePayload::Dynamic(object) => {
            let values = object.metadata.annotations.clone().unwrap_or_default();

            Some(PropertyBag::Detached {
                target: &mut object.metadata,
                values,
            })
        }
        ResourcePayload::Service(_) | ResourcePayload::Json(_) => None,
    }
}

/// Commits a bag obtained from [`get_property_bag`]. A no-op for live bags.
pub fn set_property_bag(bag: PropertyBag<'_>) {
    if let PropertyBag::Detached { target, values } = bag {
        target.annotations = if values.is_empty() {
            None
        } else {
            Some(values)
        };
    }
}
