// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::stack::{networking::MAX_SUPPORTED_AZS, StackError, StackResult};
use serde::Deserialize;
use std::{fs::File, path::Path};

/// Knobs for the deployed stack.
///
/// The two deployed variants differ only in `logging` and
/// `outbound_security_group`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all(deserialize = "camelCase"))]
pub struct StackProps {
    // Subnets are spread over exactly this many AZs; the target region
    // must have at least this many.
    pub max_azs: u8,
    // Docker build context for both containers
    pub image_asset: String,
    // Credentials file baked into the image
    pub creds: String,
    pub logging: bool,
    pub outbound_security_group: bool,
}

impl Default for StackProps {
    fn default() -> Self {
        StackProps {
            max_azs: 3,
            image_asset: "../".to_owned(),
            creds: "sampler.creds".to_owned(),
            logging: true,
            outbound_security_group: true,
        }
    }
}

impl StackProps {
    /// The variant without a log driver or an extra security group.
    pub fn into_minimal(self) -> Self {
        StackProps {
            logging: false,
            outbound_security_group: false,
            ..self
        }
    }

    pub fn from_file(props_file: &Path) -> StackResult<Self> {
        let file = File::open(props_file).map_err(|_err| StackError::Props {
            dbg: format!("Props file not found: {:?}", props_file),
        })?;
        let props: StackProps = serde_json::from_reader(file).map_err(|err| StackError::Props {
            dbg: format!("Failed to parse props file. {err}"),
        })?;
        Ok(props)
    }

    pub fn validate(&self) -> StackResult<()> {
        if self.max_azs == 0 || self.max_azs > MAX_SUPPORTED_AZS {
            return Err(StackError::Props {
                dbg: format!(
                    "max_azs must be between 1 and {}, got {}",
                    MAX_SUPPORTED_AZS, self.max_azs
                ),
            });
        }
        if self.image_asset.is_empty() {
            return Err(StackError::Props {
                dbg: "image_asset must not be empty".to_string(),
            });
        }
        if self.creds.is_empty() {
            return Err(StackError::Props {
                dbg: "creds must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
