use anyhow::Context;
use camref_axxon::{Client, Error, Resolution};
use chrono::NaiveDateTime;
use log::debug;

use crate::config::{ConnectionConfig, ExportConfig, Password};

/// Connection settings that take precedence over the configuration file.
#[derive(Clone, Debug, clap::Args)]
pub struct ConnectionArgs {
    /// IP address or hostname of the VMS server.
    #[arg(long, global = true, env = "AXXON_HOST")]
    host: Option<String>,
    #[arg(long, global = true, env = "AXXON_PORT")]
    port: Option<u16>,
    #[arg(long, global = true, env = "AXXON_USER")]
    username: Option<String>,
    #[arg(long, global = true, env = "AXXON_PASS", hide_env_values = true)]
    password: Option<String>,
    /// Use HTTPS instead of HTTP.
    #[arg(long, global = true)]
    https: bool,
}

impl ConnectionArgs {
    pub fn apply(self, connection: &mut ConnectionConfig) {
        let Self {
            host,
            port,
            username,
            password,
            https,
        } = self;
        if let Some(host) = host {
            connection.host = host;
        }
        if let Some(port) = port {
            connection.port = port;
        }
        if let Some(username) = username {
            connection.username = username;
        }
        if let Some(password) = password {
            connection.password = Password::new(password);
        }
        connection.use_https |= https;
    }
}

pub fn connect(connection: &ConnectionConfig) -> anyhow::Result<Client> {
    let ConnectionConfig {
        host,
        port,
        username,
        password,
        use_https,
    } = connection;
    if host.is_empty() {
        return Err(Error::InvalidInput(
            "no host configured, use --host or `camref connect --save`".to_string(),
        )
        .into());
    }
    debug!("Connecting to {host}:{port} as {username}");
    Client::connect(host, *port, username, password.dangerous_reveal(), *use_https)
}

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a local time given as `YYYY-MM-DD HH:MM:SS`.
pub fn parse_archive_time(s: &str) -> anyhow::Result<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s.trim(), f).ok())
        .ok_or_else(|| {
            Error::InvalidInput(format!("time {s:?}, expected YYYY-MM-DD HH:MM:SS")).into()
        })
}

/// The resolution given on the command line, else the one in the configuration.
pub fn resolution(arg: Option<&str>, export: &ExportConfig) -> anyhow::Result<Option<Resolution>> {
    match arg {
        Some(arg) => Resolution::parse_optional(arg).context("Invalid --resolution"),
        None => export.resolution(),
    }
}
