/// Read-only settings shared by all the request handlers.
pub(crate) struct ApiServerState {
    pub(crate) metrics_enabled: bool,
}
