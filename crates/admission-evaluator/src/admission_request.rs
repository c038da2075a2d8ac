use k8s_openapi::api::authentication::v1::UserInfo;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;

/// This models the admission/v1/AdmissionRequest object of Kubernetes.
///
/// Only `uid` is mandatory: callers other than the Kubernetes API server
/// are allowed to send a trimmed down request made only of the
/// correlation identifier and the object.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    #[serde(alias = "UID")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<GroupVersionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<GroupVersionResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_kind: Option<GroupVersionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_resource: Option<GroupVersionResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_sub_resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<RawExtension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_object: Option<RawExtension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<RawExtension>,
}

impl AdmissionRequest {
    /// Kind of the resource under review, empty when the caller did not
    /// provide it.
    pub fn kind_name(&self) -> &str {
        self.kind
            .as_ref()
            .map(|gvk| gvk.kind.as_str())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroupVersionResource {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub resource: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn full_request() {
        let input = r#"
            {
                "uid": "hello",
                "kind": {"group":"autoscaling","version":"v1","kind":"Scale"},
                "resource": {"group":"apps","version":"v1","resource":"deployments"},
                "subResource": "scale",
                "requestKind": {"group":"autoscaling","version":"v1","kind":"Scale"},
                "requestResource": {"group":"apps","version":"v1","resource":"deployments"},
                "requestSubResource": "scale",
                "name": "my-deployment",
                "namespace": "my-namespace",
                "operation": "UPDATE",
                "userInfo": {
                  "username": "admin",
                  "uid": "014fbff9a07c",
                  "groups": ["system:authenticated","my-admin-group"],
                  "extra": {
                    "some-key":["some-value1", "some-value2"]
                  }
                },
                "object": {"apiVersion":"autoscaling/v1","kind":"Scale"},
                "oldObject": {"apiVersion":"autoscaling/v1","kind":"Scale"},
                "options": {"apiVersion":"meta.k8s.io/v1","kind":"UpdateOptions"},
                "dryRun": false
            }
        "#;

        let request: AdmissionRequest =
            serde_json::from_str(input).expect("deserialization should work");

        assert_eq!(request.uid, "hello");
        assert_eq!(request.kind_name(), "Scale");
        assert_eq!(request.name.as_deref(), Some("my-deployment"));
        assert_eq!(request.namespace.as_deref(), Some("my-namespace"));
        assert_eq!(request.operation, "UPDATE");
        assert_eq!(request.sub_resource.as_deref(), Some("scale"));

        let resource = request.resource.expect("resource should be set");
        assert_eq!(resource.group, "apps");
        assert_eq!(resource.version, "v1");
        assert_eq!(resource.resource, "deployments");

        let user_info = request.user_info.expect("userInfo should be set");
        assert_eq!(user_info.username.as_deref(), Some("admin"));
        let mut expected_extra_values = BTreeMap::new();
        expected_extra_values.insert(
            String::from("some-key"),
            vec![String::from("some-value1"), String::from("some-value2")],
        );
        assert_eq!(user_info.extra, Some(expected_extra_values));

        let object = request.object.expect("object should be set");
        assert_eq!(object.0["kind"], "Scale");
        assert!(request.old_object.is_some());
        assert_eq!(request.dry_run, Some(false));
    }

    #[test]
    fn trimmed_down_request() {
        let request: AdmissionRequest =
            serde_json::from_str(r#"{"UID": "u1", "object": {"spec": {}}}"#)
                .expect("deserialization should work");

        assert_eq!(request.uid, "u1");
        assert_eq!(request.kind_name(), "");
        assert!(request.operation.is_empty());
        assert!(request.user_info.is_none());
        assert!(request.object.is_some());
    }

    #[test]
    fn uid_is_mandatory() {
        let result = serde_json::from_str::<AdmissionRequest>(r#"{"object": {}}"#);
        assert!(result.is_err());
    }
}
