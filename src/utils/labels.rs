use std::collections::BTreeMap;

use crate::utils::error::Error;

pub const LABEL_RADIUS_APPLICATION: &str = "radius.dev/application";
pub const LABEL_RADIUS_RESOURCE: &str = "radius.dev/resource";
pub const LABEL_RADIUS_RESOURCE_TYPE: &str = "radius.dev/resource-type";

pub const LABEL_NAME: &str = "app.kubernetes.io/name";
pub const LABEL_PART_OF: &str = "app.kubernetes.io/part-of";
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_MANAGED_BY_RADIUS_RP: &str = "radius-rp";

/// Labels attached to every object generated for a resource.
pub fn make_descriptive_labels(
    application: &str,
    resource: &str,
    resource_type: &str,
) -> BTreeMap<String, String> {
    let mut labels = make_selector_labels(application, resource);
    labels.insert(
        LABEL_RADIUS_RESOURCE_TYPE.to_string(),
        convert_resource_type_to_label_value(resource_type),
    );
    labels.insert(LABEL_NAME.to_string(), resource.to_string());
    labels.insert(LABEL_PART_OF.to_string(), application.to_string());
    labels.insert(
        LABEL_MANAGED_BY.to_string(),
        LABEL_MANAGED_BY_RADIUS_RP.to_string(),
    );
    labels
}

/// The stable subset of labels used in selectors. Must not change once deployed.
pub fn make_selector_labels(application: &str, resource: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(
        LABEL_RADIUS_APPLICATION.to_string(),
        application.to_string(),
    );
    labels.insert(LABEL_RADIUS_RESOURCE.to_string(), resource.to_string());
    labels
}

/// Converts `Namespace.Group/kind` into the label-safe `Namespace.Group-kind`.
/// Anything without exactly one slash is returned unchanged.
pub fn convert_resource_type_to_label_value(resource_type: &str) -> String {
    match split_exactly_once(resource_type, '/') {
        Some((namespace, kind)) => format!("{}-{}", namespace, kind),
        None => resource_type.to_string(),
    }
}

/// Inverse of [`convert_resource_type_to_label_value`]: splits on exactly one hyphen.
pub fn convert_label_to_resource_type(label_value: &str) -> String {
    match split_exactly_once(label_value, '-') {
        Some((namespace, kind)) => format!("{}/{}", namespace, kind),
        None => label_value.to_string(),
    }
}

pub fn normalize_resource_name(name: &str) -> Result<String, Error> {
    if name.is_empty() {
        return Err(Error::InvalidResourceName(name.to_string()));
    }

    Ok(name.to_lowercase())
}

fn split_exactly_once(value: &str, delimiter: char) -> Option<(&str, &str)> {
    let (head, tail) = value.split_once(delimiter)?;
    if tail.contains(delimiter) {
        return None;
    }

    Some((head, tail))
}
