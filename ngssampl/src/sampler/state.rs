// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub const STATE: State = State {
    app_name: "ngssampl",

    // nats
    default_server: "nats://connect.ngs.global",
    subject: "sample.event",

    // sampler
    // humantime syntax, parsed by the cli
    publish_interval: "5s",
    default_log_filter: "info",
};

pub struct State {
    pub app_name: &'static str,

    // nats
    pub default_server: &'static str,
    pub subject: &'static str,

    // sampler
    pub publish_interval: &'static str,
    pub default_log_filter: &'static str,
}

impl State {
    // Name reported to the NATS server for a single process.
    pub fn connection_name(&self, unique_id: &str) -> String {
        format!("{}-{}", self.app_name, unique_id)
    }
}
