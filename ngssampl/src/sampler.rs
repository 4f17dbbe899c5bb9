// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use tracing::info;

mod cli;
mod error;
mod payload;
mod publisher;
mod report;
mod shutdown;
mod state;
mod subscriber;
mod transport;

pub use cli::{Cli, SamplerConfig};
pub use error::{SamplerError, SamplerResult};
pub use report::RunSummary;
pub use state::STATE;

use shutdown::Shutdown;
use transport::{NatsTransport, Transport};

pub async fn run(config: &SamplerConfig) -> SamplerResult<RunSummary> {
    info!("starting");
    let transport = NatsTransport::connect(config).await?;

    let (trigger, shutdown) = shutdown::channel();
    tokio::spawn(shutdown::on_signal(trigger));

    let summary = execute(&transport, config, shutdown).await;
    info!("done");
    summary
}

/// Drive the enabled modes against `transport` until shutdown.
///
/// The subscription is registered and flushed before the first publish so a
/// process running both modes observes its own samples.
pub async fn execute<T: Transport + ?Sized>(
    transport: &T,
    config: &SamplerConfig,
    shutdown: Shutdown,
) -> SamplerResult<RunSummary> {
    let mode = config.mode();

    let samples = if mode.subscribe {
        info!("-sub provided. starting listener");
        let samples = transport.subscribe(config.subject()).await?;
        transport.flush().await?;
        Some(samples)
    } else {
        None
    };

    let listener = async {
        match samples {
            Some(samples) => Some(subscriber::listen(samples, shutdown.clone()).await),
            None => None,
        }
    };
    let publisher = async {
        if mode.publish {
            info!("-pub provided. starting publish loop");
            publisher::publish_loop(
                transport,
                config.subject(),
                config.interval(),
                shutdown.clone(),
            )
            .await
            .map(Some)
        } else {
            Ok(None)
        }
    };

    let (latency, published) = tokio::join!(listener, publisher);
    info!("exiting Exec");

    Ok(RunSummary {
        published: published?,
        latency,
    })
}
