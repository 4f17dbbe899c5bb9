// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Running summary of observed publish-to-receive latencies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LatencyReport {
    count: u64,
    min_ms: i64,
    max_ms: i64,
    total_ms: i128,
}

impl LatencyReport {
    pub fn record(&mut self, diff_ms: i64) {
        if self.count == 0 {
            self.min_ms = diff_ms;
            self.max_ms = diff_ms;
        } else {
            self.min_ms = self.min_ms.min(diff_ms);
            self.max_ms = self.max_ms.max(diff_ms);
        }
        self.count += 1;
        self.total_ms += diff_ms as i128;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min_ms(&self) -> Option<i64> {
        (self.count > 0).then_some(self.min_ms)
    }

    pub fn max_ms(&self) -> Option<i64> {
        (self.count > 0).then_some(self.max_ms)
    }

    pub fn mean_ms(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total_ms as f64 / self.count as f64)
    }
}

impl std::fmt::Display for LatencyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mean_ms() {
            Some(mean) => write!(
                f,
                "samples: {} min: {} ms max: {} ms mean: {:.1} ms",
                self.count, self.min_ms, self.max_ms, mean
            ),
            None => write!(f, "samples: 0"),
        }
    }
}

// What a single run produced, per enabled mode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub published: Option<u64>,
    pub latency: Option<LatencyReport>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(published) = self.published {
            parts.push(format!("published: {published}"));
        }
        if let Some(latency) = &self.latency {
            parts.push(latency.to_string());
        }
        write!(f, "{}", parts.join(", "))
    }
}
