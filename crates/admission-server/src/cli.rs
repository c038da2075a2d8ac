use clap::builder::PossibleValue;
use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("ADMISSION_SERVER_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("ADMISSION_SERVER_LOG_FMT")
            .default_value("text")
            .value_parser([
                PossibleValue::new("text"),
                PossibleValue::new("json"),
                PossibleValue::new("otlp"),
            ])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("ADMISSION_SERVER_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("3000")
            .env("ADMISSION_SERVER_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("ADMISSION_SERVER_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("ADMISSION_SERVER_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("enable-metrics")
            .long("enable-metrics")
            .env("ADMISSION_SERVER_ENABLE_METRICS")
            .action(ArgAction::SetTrue)
            .help("Export metrics to an OpenTelemetry collector"),
        Arg::new("request-timeout")
            .long("request-timeout")
            .value_name("SECONDS")
            .env("ADMISSION_SERVER_REQUEST_TIMEOUT")
            .default_value("10")
            .help("Abort the evaluation of an admission request after the given time"),
        Arg::new("max-request-body-bytes")
            .long("max-request-body-bytes")
            .value_name("BYTES")
            .env("ADMISSION_SERVER_MAX_REQUEST_BODY_BYTES")
            .default_value("3145728")
            .help("Reject admission requests whose body is bigger than BYTES"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
