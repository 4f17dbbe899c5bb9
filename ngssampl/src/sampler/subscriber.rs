// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::sampler::{
    payload, report::LatencyReport, shutdown::Shutdown, transport::SampleStream, SamplerResult,
};
use tokio_stream::StreamExt;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    pub received_ms: u64,
    pub sent_ms: u64,
    pub diff_ms: i64,
}

pub fn observe(sample: &[u8], received_ms: u64) -> SamplerResult<Observation> {
    let sent_ms = payload::decode(sample)?;
    Ok(Observation {
        received_ms,
        sent_ms,
        diff_ms: payload::latency_ms(received_ms, sent_ms),
    })
}

/// Consume samples until shutdown or until the subscription closes.
pub async fn listen(mut samples: SampleStream, mut shutdown: Shutdown) -> LatencyReport {
    let mut report = LatencyReport::default();
    loop {
        tokio::select! {
            biased;

            _ = shutdown.recv() => break,
            sample = samples.next() => {
                let Some(sample) = sample else {
                    warn!("subscription closed");
                    break;
                };
                match observe(&sample, payload::now_millis()) {
                    Ok(obs) => {
                        info!(
                            "---> received ( {} ) sent ( {} ) - diff {} ms",
                            obs.received_ms, obs.sent_ms, obs.diff_ms
                        );
                        report.record(obs.diff_ms);
                    }
                    Err(err) => warn!("dropping sample: {}", err),
                }
            }
        }
    }

    info!(
        samples = report.count(),
        min_ms = ?report.min_ms(),
        max_ms = ?report.max_ms(),
        "listener stopping: {}",
        report
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{
        shutdown,
        transport::{testing::LoopbackTransport, Transport},
    };
    use bytes::Bytes;

    #[test]
    fn observation_from_sample() {
        let sample = payload::encode(1_700_000_000_000);
        let obs = observe(&sample, 1_700_000_000_042).unwrap();
        assert_eq!(
            obs,
            Observation {
                received_ms: 1_700_000_000_042,
                sent_ms: 1_700_000_000_000,
                diff_ms: 42,
            }
        );
    }

    #[test]
    fn sample_from_the_far_future_does_not_overflow() {
        let obs = observe(&payload::encode(1u64 << 63), 1_700_000_000_000).unwrap();
        assert_eq!(obs.sent_ms, 1u64 << 63);
        assert_eq!(obs.diff_ms, i64::MIN);

        let mut report = LatencyReport::default();
        report.record(obs.diff_ms);
        report.record(i64::MAX);
        assert_eq!(report.count(), 2);
    }

    #[tokio::test]
    async fn bad_samples_are_skipped() {
        let bus = LoopbackTransport::new();
        let samples = bus.subscribe("sample.event").await.unwrap();
        let (_trigger, shutdown) = shutdown::channel();

        let now = payload::now_millis();
        bus.inject("sample.event", payload::encode(now));
        bus.inject("sample.event", Bytes::from_static(b"short"));
        bus.inject("sample.event", payload::encode(now));
        // closes the stream once the queued samples drain
        drop(bus);

        let report = listen(samples, shutdown).await;
        assert_eq!(report.count(), 2);
    }

    #[tokio::test]
    async fn shutdown_stops_an_idle_listener() {
        let bus = LoopbackTransport::new();
        let samples = bus.subscribe("sample.event").await.unwrap();
        let (trigger, shutdown) = shutdown::channel();

        let task = tokio::spawn(listen(samples, shutdown));
        trigger.trigger();

        assert_eq!(task.await.unwrap(), LatencyReport::default());
    }
}
