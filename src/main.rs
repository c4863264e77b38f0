#![deny(warnings)]
#![deny(clippy::unwrap_used)]

use std::process::ExitCode;

use check_ssh_auth_methods::probe::report::render_unknown;
use check_ssh_auth_methods::probe::{
    OpenSshProbe, OutputFormat, ProbeConfig, ProbeError, ProbeParams, Severity, UserEvaluator,
};
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = "\
Policy states:
  allow:  authentication method must be allowed
  forbid: authentication method must not be allowed (default if not stated otherwise)
  ignore: authentication method is not checked

Example:
  check_ssh_auth_methods --host <host> -u root -u admin --password a";

#[derive(Parser, Debug)]
#[command(
    name = "check_ssh_auth_methods",
    version,
    about = "Check which SSH authentication methods a server offers per user",
    after_help = AFTER_HELP
)]
struct Cli {
    /// Host to connect to (required, env: CHECK_SSH_HOST)
    #[arg(long)]
    host: Option<String>,

    /// SSH port (default: 22, env: CHECK_SSH_PORT)
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// SSH users to check, repeat argument for multiple users (default: root)
    #[arg(short = 'u', long = "user", value_name = "USER")]
    users: Vec<String>,

    /// SSH timeout in seconds (default: 10, env: CHECK_SSH_TIMEOUT)
    #[arg(short = 't', long)]
    timeout: Option<u64>,

    /// SSH client binary (default: ssh, env: CHECK_SSH_BINARY)
    #[arg(long, value_name = "PATH")]
    ssh_binary: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// None authentication, set to a[llow], f[orbid], i[gnore] (default: forbid)
    #[arg(long, value_name = "STATE")]
    none: Option<String>,

    /// Hostbased authentication, set to a[llow], f[orbid], i[gnore] (default: forbid)
    #[arg(long, value_name = "STATE")]
    hostbased: Option<String>,

    /// Password authentication, set to a[llow], f[orbid], i[gnore] (default: forbid)
    #[arg(long, value_name = "STATE")]
    password: Option<String>,

    /// KeyboardInteractive authentication, set to a[llow], f[orbid], i[gnore] (default: forbid).
    /// Matched literally, so OpenSSH's "keyboard-interactive" is never seen as offered
    #[arg(long, value_name = "STATE")]
    keyboardinteractive: Option<String>,

    /// PublicKey authentication, set to a[llow], f[orbid], i[gnore] (default: allow)
    #[arg(long, value_name = "STATE")]
    publickey: Option<String>,

    /// GssapiKeyex authentication, set to a[llow], f[orbid], i[gnore] (default: ignore).
    /// Matched literally, so OpenSSH's "gssapi-keyex" is never seen as offered
    #[arg(long, value_name = "STATE")]
    gssapikeyex: Option<String>,

    /// GssapiWithMic authentication, set to a[llow], f[orbid], i[gnore] (default: ignore).
    /// Matched literally, so OpenSSH's "gssapi-with-mic" is never seen as offered
    #[arg(long, value_name = "STATE")]
    gssapiwithmic: Option<String>,
}

impl Cli {
    fn into_params(self) -> ProbeParams {
        let overrides = [
            ("none", self.none),
            ("hostbased", self.hostbased),
            ("password", self.password),
            ("keyboardinteractive", self.keyboardinteractive),
            ("publickey", self.publickey),
            ("gssapikeyex", self.gssapikeyex),
            ("gssapiwithmic", self.gssapiwithmic),
        ]
        .into_iter()
        .filter_map(|(name, token)| token.map(|t| (name.to_string(), t)))
        .collect();

        ProbeParams {
            host: self.host,
            port: self.port,
            timeout_secs: self.timeout,
            users: self.users,
            ssh_binary: self.ssh_binary,
            overrides,
        }
    }
}

/// Map a command line parse failure to an UNKNOWN error.
///
/// Returns `None` for `--help` and `--version`, which are not failures.
fn argument_error(e: &clap::Error) -> Option<ProbeError> {
    if !e.use_stderr() {
        return None;
    }
    let message = e.to_string();
    let first_line = message.lines().next().unwrap_or("invalid arguments");
    Some(ProbeError::InvalidArgument(
        first_line.trim_start_matches("error: ").to_string(),
    ))
}

async fn run(cli: Cli) -> Result<(Severity, String), ProbeError> {
    let format = cli.format;
    let config = ProbeConfig::resolve(cli.into_params())?;

    info!(
        "Checking user(s) {} on {}:{}",
        config.users.join(", "),
        config.target.host,
        config.target.port
    );

    let evaluator = UserEvaluator::new(
        OpenSshProbe::new(config.ssh_binary.clone()),
        config.target.clone(),
        config.template.clone(),
    );
    let report = evaluator.evaluate_all(&config.users).await?;
    let output = report.render(format, &config.target, chrono::Utc::now().to_rfc3339())?;

    Ok((report.severity(), output))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    // Logs go to stderr; stdout is the plugin output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match argument_error(&e) {
                Some(err) => {
                    println!("{}", render_unknown(&err));
                    ExitCode::from(err.severity().exit_code())
                }
                None => ExitCode::SUCCESS,
            };
        }
    };

    match run(cli).await {
        Ok((severity, output)) => {
            println!("{}", output);
            ExitCode::from(severity.exit_code())
        }
        Err(err) => {
            if err.is_configuration() {
                warn!("Invalid configuration: {}", err);
            } else {
                error!("Probe aborted: {}", err);
            }
            println!("{}", render_unknown(&err));
            ExitCode::from(err.severity().exit_code())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(
            std::iter::once("check_ssh_auth_methods").chain(args.iter().copied()),
        )
    }

    mod overrides {
        use super::*;

        #[test]
        fn test_every_method_flag_maps_to_registry_name() {
            let params = parse(&[
                "--host",
                "example.com",
                "--none",
                "a",
                "--hostbased",
                "i",
                "--password",
                "allow",
                "--keyboardinteractive",
                "f",
                "--publickey",
                "forbid",
                "--gssapikeyex",
                "a",
                "--gssapiwithmic",
                "f",
            ])
            .unwrap()
            .into_params();

            let expected: Vec<(String, String)> = [
                ("none", "a"),
                ("hostbased", "i"),
                ("password", "allow"),
                ("keyboardinteractive", "f"),
                ("publickey", "forbid"),
                ("gssapikeyex", "a"),
                ("gssapiwithmic", "f"),
            ]
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect();
            assert_eq!(params.overrides, expected);
        }

        #[test]
        fn test_override_names_exist_in_registry() {
            let params = parse(&[
                "--none",
                "i",
                "--hostbased",
                "i",
                "--password",
                "i",
                "--keyboardinteractive",
                "i",
                "--publickey",
                "i",
                "--gssapikeyex",
                "i",
                "--gssapiwithmic",
                "i",
            ])
            .unwrap()
            .into_params();

            let mut registry = check_ssh_auth_methods::probe::PolicyRegistry::defaults();
            assert_eq!(params.overrides.len(), registry.len());
            for (name, token) in &params.overrides {
                registry.apply_override(name, token).unwrap();
            }
        }

        #[test]
        fn test_unset_flags_produce_no_overrides() {
            let params = parse(&["--host", "example.com"]).unwrap().into_params();
            assert!(params.overrides.is_empty());
            assert_eq!(params.host.as_deref(), Some("example.com"));
            assert_eq!(params.port, None);
            assert_eq!(params.timeout_secs, None);
        }
    }

    mod arguments {
        use super::*;

        #[test]
        fn test_repeated_users_keep_order() {
            let params = parse(&["-u", "root", "--user", "admin", "-u", "deploy"])
                .unwrap()
                .into_params();
            assert_eq!(params.users, vec!["root", "admin", "deploy"]);
        }

        #[test]
        fn test_port_and_timeout() {
            let params = parse(&["-p", "2222", "-t", "5"]).unwrap().into_params();
            assert_eq!(params.port, Some(2222));
            assert_eq!(params.timeout_secs, Some(5));
        }

        #[test]
        fn test_json_format() {
            let cli = parse(&["--format", "json"]).unwrap();
            assert_eq!(cli.format, OutputFormat::Json);
        }
    }

    mod parse_errors {
        use super::*;

        #[test]
        fn test_out_of_range_port_is_unknown() {
            let e = parse(&["--host", "example.com", "-p", "70000"]).unwrap_err();
            let err = argument_error(&e).unwrap();

            assert!(err.is_configuration());
            assert_eq!(err.severity(), Severity::Unknown);
            assert_eq!(err.severity().exit_code(), 3);
            let line = render_unknown(&err);
            assert!(line.starts_with("UNKNOWN: "));
            assert!(line.contains("70000"));
            assert!(!line.contains('\n'));
        }

        #[test]
        fn test_unknown_flag_is_unknown() {
            let e = parse(&["--kerberos", "a"]).unwrap_err();
            let err = argument_error(&e).unwrap();
            assert_eq!(err.severity().exit_code(), 3);
        }

        #[test]
        fn test_help_is_not_an_error() {
            let e = parse(&["--help"]).unwrap_err();
            assert!(argument_error(&e).is_none());
        }

        #[test]
        fn test_version_is_not_an_error() {
            let e = parse(&["--version"]).unwrap_err();
            assert!(argument_error(&e).is_none());
        }
    }
}
