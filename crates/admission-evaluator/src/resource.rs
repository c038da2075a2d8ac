use kube::core::{DynamicObject, TypeMeta};
use serde_json::{Map, Value};
use tracing::debug;

use crate::admission_request::AdmissionRequest;
use crate::errors::{json_type_name, ConversionError};

/// Schema-free view of the object carried by an admission request.
///
/// Missing fields are not an error: the decision engine is in charge of
/// handling them.
#[derive(Clone, Debug)]
pub struct ResourceView {
    type_meta: Option<TypeMeta>,
    name: Option<String>,
    namespace: Option<String>,
    object: Map<String, Value>,
}

impl ResourceView {
    /// Build the view of the object embedded inside of the given request.
    pub fn from_request(request: &AdmissionRequest) -> Result<Self, ConversionError> {
        let raw = request
            .object
            .as_ref()
            .ok_or(ConversionError::MissingObject)?;
        Self::from_raw(&raw.0)
    }

    /// Build the view from a raw object.
    ///
    /// When the object carries `apiVersion` and `kind` it is first decoded as a
    /// typed Kubernetes object, which gives access to its metadata. Objects
    /// without a type hint, or that cannot be decoded that way, are inspected
    /// without any schema.
    pub fn from_raw(raw: &Value) -> Result<Self, ConversionError> {
        let object = match raw {
            Value::Object(map) => map.clone(),
            Value::Null => return Err(ConversionError::MissingObject),
            other => return Err(ConversionError::NotAnObject(json_type_name(other))),
        };

        let type_meta = type_hint(&object);
        let (name, namespace) = match &type_meta {
            Some(tm) => match serde_json::from_value::<DynamicObject>(raw.clone()) {
                Ok(typed) => (typed.metadata.name, typed.metadata.namespace),
                Err(error) => {
                    debug!(
                        %error,
                        api_version = tm.api_version.as_str(),
                        kind = tm.kind.as_str(),
                        "cannot decode typed object, falling back to schema-free decode"
                    );
                    untyped_metadata(&object)
                }
            },
            None => untyped_metadata(&object),
        };

        Ok(ResourceView {
            type_meta,
            name,
            namespace,
            object,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.object.get(key)
    }

    pub fn object(&self) -> &Map<String, Value> {
        &self.object
    }

    pub fn type_meta(&self) -> Option<&TypeMeta> {
        self.type_meta.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

fn type_hint(object: &Map<String, Value>) -> Option<TypeMeta> {
    let api_version = object.get("apiVersion")?.as_str()?;
    let kind = object.get("kind")?.as_str()?;

    Some(TypeMeta {
        api_version: api_version.to_owned(),
        kind: kind.to_owned(),
    })
}

fn untyped_metadata(object: &Map<String, Value>) -> (Option<String>, Option<String>) {
    let metadata = object.get("metadata").and_then(Value::as_object);
    let field = |key: &str| {
        metadata
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .map(str::to_owned)
    };

    (field("name"), field("namespace"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn typed_object() {
        let raw = json!({
            "apiVersion": "example.com/v1",
            "kind": "Widget",
            "metadata": {"name": "w1", "namespace": "team-a"},
            "spec": {"fail_validation": false}
        });

        let view = ResourceView::from_raw(&raw).expect("conversion should work");

        let type_meta = view.type_meta().expect("type hint should be set");
        assert_eq!(type_meta.api_version, "example.com/v1");
        assert_eq!(type_meta.kind, "Widget");
        assert_eq!(view.name(), Some("w1"));
        assert_eq!(view.namespace(), Some("team-a"));
        assert_eq!(view.get("spec"), Some(&json!({"fail_validation": false})));
    }

    #[test]
    fn schema_free_object() {
        let raw = json!({"metadata": {"name": "no-type"}, "spec": {}});

        let view = ResourceView::from_raw(&raw).expect("conversion should work");

        assert!(view.type_meta().is_none());
        assert_eq!(view.name(), Some("no-type"));
        assert_eq!(view.namespace(), None);
        assert_eq!(view.object(), raw.as_object().unwrap());
    }

    #[test]
    fn typed_decode_failure_falls_back() {
        // metadata must be an object for the typed decode to succeed
        let raw = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": "broken",
            "spec": {}
        });

        let view = ResourceView::from_raw(&raw).expect("conversion should work");

        assert!(view.type_meta().is_some());
        assert_eq!(view.name(), None);
        assert_eq!(view.get("spec"), Some(&json!({})));
    }

    #[test]
    fn absent_fields_are_not_an_error() {
        let view = ResourceView::from_raw(&json!({})).expect("conversion should work");

        assert!(view.get("spec").is_none());
        assert!(view.object().is_empty());
    }

    #[rstest]
    #[case::array(json!([1, 2]), ConversionError::NotAnObject("an array"))]
    #[case::string(json!("not-an-object"), ConversionError::NotAnObject("a string"))]
    #[case::number(json!(42), ConversionError::NotAnObject("a number"))]
    #[case::null(json!(null), ConversionError::MissingObject)]
    fn not_an_object(#[case] raw: Value, #[case] expected: ConversionError) {
        let err = ResourceView::from_raw(&raw).expect_err("conversion should fail");
        assert_eq!(err, expected);
    }

    #[test]
    fn request_without_object() {
        let request = AdmissionRequest {
            uid: "u1".to_string(),
            ..Default::default()
        };

        let err = ResourceView::from_request(&request).expect_err("conversion should fail");
        assert_eq!(err, ConversionError::MissingObject);
    }

    #[test]
    fn request_with_object() {
        let request = AdmissionRequest {
            uid: "u1".to_string(),
            object: Some(RawExtension(json!({"spec": {"replicas": 3}}))),
            ..Default::default()
        };

        let view = ResourceView::from_request(&request).expect("conversion should work");
        assert_eq!(view.get("spec"), Some(&json!({"replicas": 3})));
    }
}
