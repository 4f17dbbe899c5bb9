// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub type SamplerResult<T, E = SamplerError> = Result<T, E>;

#[derive(Debug)]
pub enum SamplerError {
    Init { dbg: String },
    Connect { dbg: String },
    Publish { dbg: String },
    Subscribe { dbg: String },
    Payload { dbg: String },
}

impl std::fmt::Display for SamplerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplerError::Init { dbg } => write!(f, "{}", dbg),
            SamplerError::Connect { dbg } => write!(f, "{}", dbg),
            SamplerError::Publish { dbg } => write!(f, "{}", dbg),
            SamplerError::Subscribe { dbg } => write!(f, "{}", dbg),
            SamplerError::Payload { dbg } => write!(f, "{}", dbg),
        }
    }
}

impl std::error::Error for SamplerError {}

impl SamplerError {
    // A bad sample should not stop the listener.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_fatal(&self) -> bool {
        match self {
            SamplerError::Payload { dbg: _ } | SamplerError::Publish { dbg: _ } => false,
            _ => true,
        }
    }
}
