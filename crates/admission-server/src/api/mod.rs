pub(crate) mod api_error;
pub(crate) mod handlers;
pub(crate) mod state;

pub const VALIDATION_PATH: &str = "/k8s/admission/validation";
pub const MUTATION_PATH: &str = "/k8s/admission/mutation";
pub const READINESS_PATH: &str = "/readiness";
