// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub type StackResult<T, E = StackError> = Result<T, E>;

#[derive(Debug)]
pub enum StackError {
    Props { dbg: String },
    Render { dbg: String },
    Output { dbg: String },
}

impl std::fmt::Display for StackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackError::Props { dbg } => write!(f, "{}", dbg),
            StackError::Render { dbg } => write!(f, "{}", dbg),
            StackError::Output { dbg } => write!(f, "{}", dbg),
        }
    }
}

impl std::error::Error for StackError {}
