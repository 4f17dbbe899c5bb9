// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::sampler::{Cli, SamplerResult, STATE};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod sampler;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(STATE.default_log_filter)),
        )
        .with_writer(non_blocking)
        .init();

    match exec().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("{:?}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn exec() -> SamplerResult<()> {
    let config = Cli::parse_normalized().into_config()?;
    let summary = sampler::run(&config).await?;
    info!("{}", summary);
    Ok(())
}
