// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::sampler::{SamplerError, SamplerResult, STATE};
use clap::{builder::BoolishValueParser, ArgAction, Parser};
use core::time::Duration;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tracing::debug;

// Long flags which may also be spelled with a single dash (`-pub`), as the
// container commands do.
const SINGLE_DASH_LONG: &[&str] = &[
    "pub", "sub", "creds", "server", "subject", "interval", "help", "version",
];

/// ngssampl - publish timestamp samples over NATS and report the delivery
/// latency observed by subscribers.
#[derive(Parser, Debug)]
#[command(name = "ngssampl", version)]
pub struct Cli {
    /// Continuous publish mode
    #[arg(
        long = "pub",
        env = "NGSSAMPL_PUB",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    publish: bool,

    /// Subscribe to the test subject
    #[arg(
        long = "sub",
        env = "NGSSAMPL_SUB",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    subscribe: bool,

    /// Path to user credentials for nats
    #[arg(long, env = "NGSSAMPL_CREDS")]
    creds: Option<PathBuf>,

    /// NATS server url
    #[arg(long, env = "NGSSAMPL_SERVER", default_value = STATE.default_server)]
    server: String,

    /// Subject samples are published to and read from
    #[arg(long, env = "NGSSAMPL_SUBJECT", default_value = STATE.subject)]
    subject: String,

    /// Time between published samples
    #[arg(
        long,
        env = "NGSSAMPL_INTERVAL",
        value_parser = humantime::parse_duration,
        default_value = STATE.publish_interval
    )]
    interval: Duration,
}

impl Cli {
    pub fn parse_normalized() -> Self {
        Cli::parse_from(normalize_args(std::env::args_os()))
    }

    // Perform sanity checks on user input
    pub fn into_config(self) -> SamplerResult<SamplerConfig> {
        let mode = Mode {
            publish: self.publish,
            subscribe: self.subscribe,
        };
        if !mode.publish && !mode.subscribe {
            return Err(SamplerError::Init {
                dbg: "at least one of pub or sub must be set".to_string(),
            });
        }

        let creds = self
            .creds
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(SamplerError::Init {
                dbg: "nats creds are required, please set the creds value to the credentials path"
                    .to_string(),
            })?;
        if !creds.is_file() {
            return Err(SamplerError::Init {
                dbg: format!("nats creds file not found: {:?}", creds),
            });
        }

        if self.interval.is_zero() {
            return Err(SamplerError::Init {
                dbg: "interval must be greater than zero".to_string(),
            });
        }

        let config = SamplerConfig {
            mode,
            creds,
            server: self.server,
            subject: self.subject,
            interval: self.interval,
        };
        debug!("{:?}", config);
        Ok(config)
    }
}

/// Rewrite `-name` into `--name` for the known long flags.
///
/// Arguments after a literal `--` are left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split('=').next().unwrap_or(rest);
                    if SINGLE_DASH_LONG.contains(&name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mode {
    pub publish: bool,
    pub subscribe: bool,
}

#[derive(Clone, Debug)]
pub struct SamplerConfig {
    mode: Mode,
    creds: PathBuf,
    server: String,
    subject: String,
    interval: Duration,
}

impl SamplerConfig {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn creds(&self) -> &Path {
        &self.creds
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[cfg(test)]
    pub fn testing(mode: Mode, interval: Duration) -> Self {
        SamplerConfig {
            mode,
            creds: PathBuf::from("sampler.creds"),
            server: STATE.default_server.to_string(),
            subject: STATE.subject.to_string(),
            interval,
        }
    }
}
