extern crate k8s_openapi;
extern crate kube;

pub mod admission_request;
pub mod admission_response;
pub mod admission_review;
pub mod decision;
pub mod errors;
pub mod evaluation;
pub mod resource;

pub use decision::{Decision, Mode};
pub use evaluation::{evaluate, Evaluation};
