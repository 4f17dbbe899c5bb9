// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::sampler::{payload, shutdown::Shutdown, transport::Transport, SamplerResult};
use core::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Publish a timestamp sample every `period` until shutdown.
///
/// The first sample goes out one full period after the loop starts. Returns
/// the number of samples the transport accepted.
pub async fn publish_loop<T: Transport + ?Sized>(
    transport: &T,
    subject: &str,
    period: Duration,
    mut shutdown: Shutdown,
) -> SamplerResult<u64> {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut published = 0;
    loop {
        tokio::select! {
            biased;

            _ = shutdown.recv() => {
                info!("publish loop stopping after {} samples", published);
                return Ok(published);
            }
            _ = ticker.tick() => {
                let sent = payload::now_millis();
                match transport.publish(subject, payload::encode(sent)).await {
                    Ok(()) => {
                        published += 1;
                        debug!("published sample {} to {}", sent, subject);
                    }
                    Err(err) if !err.is_fatal() => warn!("{}", err),
                    Err(err) => return Err(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{shutdown, transport::testing::LoopbackTransport};
    use std::sync::Arc;

    const PERIOD: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn publishes_once_per_period() {
        let bus = Arc::new(LoopbackTransport::new());
        let (trigger, shutdown) = shutdown::channel();

        let task = {
            let bus = bus.clone();
            tokio::spawn(async move { publish_loop(&*bus, "sample.event", PERIOD, shutdown).await })
        };

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(bus.published().is_empty(), "first tick waits a full period");

        tokio::time::sleep(Duration::from_secs(12)).await;
        trigger.trigger();

        assert_eq!(task.await.unwrap().unwrap(), 3);
        let published = bus.published();
        assert_eq!(published.len(), 3);
        for (subject, sample) in published {
            assert_eq!(subject, "sample.event");
            assert_eq!(sample.len(), payload::SAMPLE_LEN);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn publish_failures_do_not_stop_the_loop() {
        let bus = Arc::new(LoopbackTransport::failing());
        let (trigger, shutdown) = shutdown::channel();

        let task = {
            let bus = bus.clone();
            tokio::spawn(async move { publish_loop(&*bus, "sample.event", PERIOD, shutdown).await })
        };

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!task.is_finished());
        trigger.trigger();

        assert_eq!(task.await.unwrap().unwrap(), 0);
    }

    #[tokio::test]
    async fn stops_immediately_when_already_shut_down() {
        let bus = LoopbackTransport::new();
        let (trigger, shutdown) = shutdown::channel();
        trigger.trigger();

        let published = publish_loop(&bus, "sample.event", PERIOD, shutdown)
            .await
            .unwrap();
        assert_eq!(published, 0);
    }
}
