use std::fmt;

use json_patch::jsonptr::PointerBuf;
use json_patch::{AddOperation, Patch, PatchOperation};
use serde_json::Value;

use crate::admission_response::{
    AdmissionResponseStatus, AdmissionResponseStatusValue, PatchType, StatusReason,
};
use crate::errors::{json_type_name, PatchConstructionError, PolicyEvaluationError};
use crate::resource::ResourceView;

/// Field of `spec` consulted by the validation policy.
pub const FAIL_VALIDATION_FIELD: &str = "fail_validation";
/// Location of the field added by the mutation policy.
pub const MUTATED_DEFAULT_PATH: &str = "/spec/mutated_default";
/// Value assigned by the mutation policy.
pub const MUTATED_DEFAULT_VALUE: &str = "default_value";

/// Admission policy applied to a request. Each admission endpoint is
/// bound to one of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Validate,
    Mutate,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::Validate => write!(f, "validate"),
            Mode::Mutate => write!(f, "mutate"),
        }
    }
}

/// Outcome of the admission policy.
///
/// The patch type is derived from the patch, so the two of them cannot get
/// out of sync.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub allowed: bool,
    pub result: Option<AdmissionResponseStatus>,
    patch: Option<Patch>,
}

impl Decision {
    pub fn allow() -> Self {
        Decision {
            allowed: true,
            result: None,
            patch: None,
        }
    }

    pub fn deny(result: AdmissionResponseStatus) -> Self {
        Decision {
            allowed: false,
            result: Some(result),
            patch: None,
        }
    }

    /// Allow the request, reporting why it could not be mutated.
    pub fn allow_with_failure(result: AdmissionResponseStatus) -> Self {
        Decision {
            allowed: true,
            result: Some(result),
            patch: None,
        }
    }

    pub fn mutate(patch: Patch) -> Self {
        Decision {
            allowed: true,
            result: None,
            patch: Some(patch),
        }
    }

    /// The patch to apply, `None` when it would be empty.
    pub fn patch(&self) -> Option<&Patch> {
        self.patch.as_ref().filter(|patch| !patch.0.is_empty())
    }

    pub fn patch_type(&self) -> Option<PatchType> {
        self.patch().map(|_| PatchType::JSONPatch)
    }

    pub fn is_mutation(&self) -> bool {
        self.patch().is_some()
    }
}

/// Apply the admission policy selected by `mode` to the given resource.
///
/// This function never fails: policy evaluation problems are turned into a
/// denial, patch construction problems into an allowed request carrying a
/// failure reason.
pub fn decide(view: &ResourceView, mode: Mode) -> Decision {
    match mode {
        Mode::Validate => validate(view),
        Mode::Mutate => mutate(view),
    }
}

/// Read `spec.fail_validation`.
///
/// `Ok(None)` means the resource has no `spec` section, hence it is not
/// concerned by the policy.
pub fn fail_validation_flag(view: &ResourceView) -> Result<Option<bool>, PolicyEvaluationError> {
    let spec = match view.get("spec") {
        None | Some(Value::Null) => return Ok(None),
        Some(spec) => spec,
    };
    let spec = spec
        .as_object()
        .ok_or_else(|| PolicyEvaluationError::WrongType {
            path: "spec".to_string(),
            expected: "an object",
            found: json_type_name(spec),
        })?;

    let path = format!("spec.{FAIL_VALIDATION_FIELD}");
    match spec.get(FAIL_VALIDATION_FIELD) {
        None => Err(PolicyEvaluationError::MissingField { path }),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(other) => Err(PolicyEvaluationError::WrongType {
            path,
            expected: "a boolean",
            found: json_type_name(other),
        }),
    }
}

/// Build the mutation patch and make sure it can be applied to the resource.
pub fn mutation_patch(view: &ResourceView) -> Result<Patch, PatchConstructionError> {
    let path = PointerBuf::parse(MUTATED_DEFAULT_PATH).map_err(|e| {
        PatchConstructionError::InvalidPointer {
            pointer: MUTATED_DEFAULT_PATH.to_string(),
            message: e.to_string(),
        }
    })?;
    let patch = Patch(vec![PatchOperation::Add(AddOperation {
        path,
        value: Value::String(MUTATED_DEFAULT_VALUE.to_string()),
    })]);

    let mut dry_run = Value::Object(view.object().clone());
    json_patch::patch(&mut dry_run, &patch.0)
        .map_err(|e| PatchConstructionError::NotApplicable(e.to_string()))?;

    Ok(patch)
}

fn validate(view: &ResourceView) -> Decision {
    match fail_validation_flag(view) {
        Ok(None) | Ok(Some(false)) => Decision::allow(),
        Ok(Some(true)) => Decision::deny(failure(
            format!("resource rejected: spec.{FAIL_VALIDATION_FIELD} is set to true"),
            StatusReason::Forbidden,
            Some(403),
        )),
        Err(error) => Decision::deny(failure(
            format!("cannot evaluate validation policy: {error}"),
            StatusReason::Invalid,
            Some(422),
        )),
    }
}

fn mutate(view: &ResourceView) -> Decision {
    if matches!(view.get("spec"), None | Some(Value::Null)) {
        return Decision::allow();
    }

    match mutation_patch(view) {
        Ok(patch) => Decision::mutate(patch),
        Err(error) => Decision::allow_with_failure(failure(
            format!("could not produce the mutation patch: {error}"),
            StatusReason::InternalError,
            None,
        )),
    }
}

fn failure(message: String, reason: StatusReason, code: Option<u16>) -> AdmissionResponseStatus {
    AdmissionResponseStatus {
        status: Some(AdmissionResponseStatusValue::Failure),
        message: Some(message),
        reason: Some(reason),
        code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use rstest::rstest;
    use serde_json::json;

    fn view(raw: Value) -> ResourceView {
        ResourceView::from_raw(&raw).expect("conversion should work")
    }

    #[rstest]
    #[case::no_spec(json!({}), Ok(None))]
    #[case::null_spec(json!({"spec": null}), Ok(None))]
    #[case::flag_true(json!({"spec": {"fail_validation": true}}), Ok(Some(true)))]
    #[case::flag_false(json!({"spec": {"fail_validation": false}}), Ok(Some(false)))]
    #[case::flag_missing(
        json!({"spec": {}}),
        Err(PolicyEvaluationError::MissingField { path: "spec.fail_validation".to_string() })
    )]
    #[case::flag_string(
        json!({"spec": {"fail_validation": "true"}}),
        Err(PolicyEvaluationError::WrongType {
            path: "spec.fail_validation".to_string(),
            expected: "a boolean",
            found: "a string",
        })
    )]
    #[case::flag_null(
        json!({"spec": {"fail_validation": null}}),
        Err(PolicyEvaluationError::WrongType {
            path: "spec.fail_validation".to_string(),
            expected: "a boolean",
            found: "null",
        })
    )]
    #[case::spec_not_an_object(
        json!({"spec": [true]}),
        Err(PolicyEvaluationError::WrongType {
            path: "spec".to_string(),
            expected: "an object",
            found: "an array",
        })
    )]
    fn lookup_fail_validation(
        #[case] raw: Value,
        #[case] expected: Result<Option<bool>, PolicyEvaluationError>,
    ) {
        assert_eq!(fail_validation_flag(&view(raw)), expected);
    }

    #[rstest]
    #[case::no_spec(json!({"metadata": {"name": "a"}}), true)]
    #[case::flag_false(json!({"spec": {"fail_validation": false}}), true)]
    #[case::flag_true(json!({"spec": {"fail_validation": true}}), false)]
    #[case::flag_missing(json!({"spec": {"replicas": 1}}), false)]
    #[case::flag_wrong_type(json!({"spec": {"fail_validation": 1}}), false)]
    fn validation(#[case] raw: Value, #[case] expected_allowed: bool) {
        let decision = decide(&view(raw), Mode::Validate);

        assert_eq!(decision.allowed, expected_allowed);
        assert_eq!(decision.result.is_some(), !expected_allowed);
        assert!(decision.patch().is_none());
        assert!(decision.patch_type().is_none());
    }

    #[test]
    fn validation_denial_carries_a_reason() {
        let decision = decide(
            &view(json!({"spec": {"fail_validation": true}})),
            Mode::Validate,
        );

        let result = decision.result.expect("result should be set");
        assert_eq!(result.code, Some(403));
        assert_eq!(result.reason, Some(StatusReason::Forbidden));
        assert!(!result.message.unwrap_or_default().is_empty());
    }

    #[test]
    fn validation_of_malformed_field_is_a_denial() {
        let decision = decide(
            &view(json!({"spec": {"fail_validation": "nope"}})),
            Mode::Validate,
        );

        assert!(!decision.allowed);
        let result = decision.result.expect("result should be set");
        assert_eq!(result.reason, Some(StatusReason::Invalid));
        assert!(result
            .message
            .expect("message should be set")
            .contains("spec.fail_validation"));
    }

    #[rstest]
    #[case::empty_spec(json!({"spec": {}}))]
    #[case::flag_true(json!({"spec": {"fail_validation": true}}))]
    #[case::already_mutated(json!({"spec": {"mutated_default": "custom"}}))]
    fn mutation(#[case] raw: Value) {
        let decision = decide(&view(raw), Mode::Mutate);

        assert!(decision.allowed);
        assert!(decision.result.is_none());
        assert_eq!(decision.patch_type(), Some(PatchType::JSONPatch));

        let patch = serde_json::to_value(decision.patch().expect("patch should be set")).unwrap();
        assert_json_eq!(
            patch,
            json!([{"op": "add", "path": "/spec/mutated_default", "value": "default_value"}])
        );
    }

    #[test]
    fn mutation_without_spec_does_not_patch() {
        let decision = decide(&view(json!({"metadata": {"name": "a"}})), Mode::Mutate);

        assert!(decision.allowed);
        assert!(decision.result.is_none());
        assert!(!decision.is_mutation());
        assert!(decision.patch_type().is_none());
    }

    #[rstest]
    #[case::spec_is_a_string(json!({"spec": "hello"}))]
    #[case::spec_is_an_array(json!({"spec": [1, 2, 3]}))]
    fn mutation_fails_open(#[case] raw: Value) {
        let decision = decide(&view(raw), Mode::Mutate);

        assert!(decision.allowed);
        assert!(decision.patch().is_none());
        assert!(decision.patch_type().is_none());
        let result = decision.result.expect("failure reason should be set");
        assert!(result
            .message
            .expect("message should be set")
            .starts_with("could not produce the mutation patch"));
    }

    #[test]
    fn patch_round_trip_only_touches_mutated_default() {
        let original = json!({
            "apiVersion": "example.com/v1",
            "kind": "Widget",
            "metadata": {"name": "w1", "labels": {"app": "demo"}},
            "spec": {"replicas": 2, "fail_validation": false}
        });
        let decision = decide(&view(original.clone()), Mode::Mutate);

        let mut patched = original.clone();
        json_patch::patch(&mut patched, &decision.patch().unwrap().0).unwrap();

        let mut expected = original;
        expected["spec"]["mutated_default"] = json!("default_value");
        assert_json_eq!(patched, expected);
    }

    #[test]
    fn empty_patch_is_not_a_mutation() {
        let decision = Decision::mutate(Patch(Vec::new()));

        assert!(decision.patch().is_none());
        assert!(decision.patch_type().is_none());
    }

    #[test]
    fn mode_display() {
        assert_eq!(Mode::Validate.to_string(), "validate");
        assert_eq!(Mode::Mutate.to_string(), "mutate");
    }
}
