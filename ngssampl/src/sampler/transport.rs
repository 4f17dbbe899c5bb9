// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::sampler::{SamplerConfig, SamplerError, SamplerResult, STATE};
use async_trait::async_trait;
use bytes::Bytes;
use core::pin::Pin;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

/// Payloads delivered to a subscription, in arrival order.
pub type SampleStream = Pin<Box<dyn Stream<Item = Bytes> + Send>>;

/// The message bus the sampler publishes to and listens on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, subject: &str, payload: Bytes) -> SamplerResult<()>;

    async fn subscribe(&self, subject: &str) -> SamplerResult<SampleStream>;

    /// Round trip to the server so that earlier commands (subscriptions in
    /// particular) have been processed.
    async fn flush(&self) -> SamplerResult<()>;
}

pub struct NatsTransport {
    client: async_nats::Client,
}

impl NatsTransport {
    pub async fn connect(config: &SamplerConfig) -> SamplerResult<Self> {
        let unique_id = uuid::Uuid::new_v4().to_string();
        let options = async_nats::ConnectOptions::with_credentials_file(config.creds())
            .await
            .map_err(|err| SamplerError::Init {
                dbg: format!("Failed to load creds {:?}: {err}", config.creds()),
            })?
            .name(&STATE.connection_name(&unique_id));

        let client = options
            .connect(config.server())
            .await
            .map_err(|err| SamplerError::Connect {
                dbg: format!("Failed to connect to {}: {err}", config.server()),
            })?;
        info!("connected to {}", config.server());

        Ok(NatsTransport { client })
    }
}

#[async_trait]
impl Transport for NatsTransport {
    async fn publish(&self, subject: &str, payload: Bytes) -> SamplerResult<()> {
        self.client
            .publish(subject.to_string(), payload)
            .await
            .map_err(|err| SamplerError::Publish {
                dbg: format!("Failed to publish to {subject}: {err}"),
            })
    }

    async fn subscribe(&self, subject: &str) -> SamplerResult<SampleStream> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|err| SamplerError::Subscribe {
                dbg: format!("Failed to subscribe to {subject}: {err}"),
            })?;
        debug!("subscribed to {}", subject);

        Ok(Box::pin(subscriber.map(|msg| msg.payload)))
    }

    async fn flush(&self) -> SamplerResult<()> {
        self.client
            .flush()
            .await
            .map_err(|err| SamplerError::Connect {
                dbg: format!("Failed to flush: {err}"),
            })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    };
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    /// In-process bus: every publish is delivered to the subscribers of the
    /// exact same subject.
    #[derive(Default)]
    pub struct LoopbackTransport {
        subscribers: Mutex<Vec<(String, mpsc::UnboundedSender<Bytes>)>>,
        published: Mutex<Vec<(String, Bytes)>>,
        fail_publish: AtomicBool,
        flushes: AtomicUsize,
    }

    impl LoopbackTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let transport = Self::default();
            transport.fail_publish.store(true, Ordering::SeqCst);
            transport
        }

        // Deliver raw bytes without recording a publish.
        pub fn inject(&self, subject: &str, payload: Bytes) {
            let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
            for (sub_subject, tx) in subscribers.iter() {
                if sub_subject == subject {
                    let _ = tx.send(payload.clone());
                }
            }
        }

        pub fn published(&self) -> Vec<(String, Bytes)> {
            self.published
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }

        pub fn subscriptions(&self) -> Vec<String> {
            self.subscribers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .map(|(subject, _)| subject.clone())
                .collect()
        }

        pub fn flushes(&self) -> usize {
            self.flushes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for LoopbackTransport {
        async fn publish(&self, subject: &str, payload: Bytes) -> SamplerResult<()> {
            if self.fail_publish.load(Ordering::SeqCst) {
                return Err(SamplerError::Publish {
                    dbg: "loopback publish disabled".to_string(),
                });
            }
            self.published
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((subject.to_string(), payload.clone()));
            self.inject(subject, payload);
            Ok(())
        }

        async fn subscribe(&self, subject: &str) -> SamplerResult<SampleStream> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.subscribers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((subject.to_string(), tx));
            Ok(Box::pin(UnboundedReceiverStream::new(rx)))
        }

        async fn flush(&self) -> SamplerResult<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn loopback_delivers_by_exact_subject() {
        let bus = LoopbackTransport::new();
        let mut sample = bus.subscribe("sample.event").await.unwrap();
        let mut other = bus.subscribe("other").await.unwrap();

        bus.publish("sample.event", Bytes::from_static(b"abc"))
            .await
            .unwrap();

        assert_eq!(sample.next().await.unwrap(), Bytes::from_static(b"abc"));
        assert_eq!(bus.published().len(), 1);
        assert_eq!(bus.subscriptions(), vec!["sample.event", "other"]);
        drop(bus);
        assert!(other.next().await.is_none());
    }
}
