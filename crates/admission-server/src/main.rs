use admission_server::{
    cli, config::Config, metrics::setup_metrics, tracing::setup_tracing, AdmissionServer,
};
use anyhow::{anyhow, Result};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("cannot install the rustls crypto provider"))?;

    let tracer_provider = setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;
    let meter_provider = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting admission server"
    );
    let result = match AdmissionServer::new_from_config(config).await {
        Ok(server) => server.run().await,
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        error!(error = %e, "admission server failed");
    }

    if let Some(meter_provider) = meter_provider {
        if let Err(e) = meter_provider.shutdown() {
            eprintln!("cannot flush metrics: {e}");
        }
    }
    if let Some(tracer_provider) = tracer_provider {
        if let Err(e) = tracer_provider.shutdown() {
            eprintln!("cannot flush traces: {e}");
        }
    }

    result
}
