// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::stack::{NgssamplStack, StackError, StackProps, StackResult, DEFAULT_STACK_NAME};
use clap::Parser;
use std::{path::PathBuf, process::ExitCode};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod stack;

/// Render the sampler deployment stack into a JSON template.
///
/// The template is handed to an external provisioning tool; nothing is
/// deployed by this utility.
#[derive(Parser, Debug)]
#[command(name = "ngssampl_stack", version)]
struct Opt {
    /// Name of the stack; also prefixes asset and security group names.
    #[arg(long, default_value = DEFAULT_STACK_NAME)]
    stack_name: String,

    /// Path to a JSON file overriding the default stack properties
    #[arg(long)]
    props_file: Option<PathBuf>,

    /// Render the variant without log drivers or the outbound security group
    #[arg(long)]
    minimal: bool,

    /// Write the template here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let opt = Opt::parse();

    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .init();

    debug!("{:?}", opt);
    match exec(opt).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn exec(opt: Opt) -> StackResult<()> {
    let mut props = match &opt.props_file {
        Some(path) => StackProps::from_file(path)?,
        None => StackProps::default(),
    };
    if opt.minimal {
        props = props.into_minimal();
    }

    let stack = NgssamplStack::new(&opt.stack_name, &props)?;
    let rendered = stack.synth()?.to_json_pretty()?;

    match &opt.output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .map_err(|err| StackError::Output {
                    dbg: format!("Failed to write template to {:?}: {err}", path),
                })?;
            info!("wrote {} template to {:?}", stack.name(), path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempdir::TempDir;

    fn opt(props_file: Option<PathBuf>, minimal: bool, output: Option<PathBuf>) -> Opt {
        Opt {
            stack_name: DEFAULT_STACK_NAME.to_owned(),
            props_file,
            minimal,
            output,
        }
    }

    fn read_template(path: &std::path::Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn writes_template_to_output() {
        let dir = TempDir::new("ngssampl_stack").unwrap();
        let output = dir.path().join("template.json");

        exec(opt(None, false, Some(output.clone()))).await.unwrap();

        let template = read_template(&output);
        let resources = template["Resources"].as_object().unwrap();
        assert!(resources.contains_key("OutboundSecGroup"));
        assert!(resources.contains_key("TaskDefLogGroup"));
        assert_eq!(template["Assets"][0]["Path"], "../");
    }

    #[tokio::test]
    async fn minimal_overrides_props_file() {
        let dir = TempDir::new("ngssampl_stack").unwrap();
        let props = dir.path().join("props.json");
        std::fs::write(
            &props,
            r#"{ "maxAzs": 2, "logging": true, "outboundSecurityGroup": true }"#,
        )
        .unwrap();
        let output = dir.path().join("template.json");

        exec(opt(Some(props), true, Some(output.clone())))
            .await
            .unwrap();

        let template = read_template(&output);
        let resources = template["Resources"].as_object().unwrap();
        assert!(!resources.contains_key("OutboundSecGroup"));
        assert!(!resources.contains_key("TaskDefLogGroup"));
        // max_azs still comes from the file
        assert!(resources.contains_key("VpcPrivateSubnet2"));
        assert!(!resources.contains_key("VpcPrivateSubnet3"));
    }

    #[tokio::test]
    async fn bad_props_and_output_paths_fail() {
        let dir = TempDir::new("ngssampl_stack").unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            exec(opt(Some(missing), false, None)).await,
            Err(StackError::Props { .. })
        ));

        let unwritable = dir.path().join("no_such_dir").join("template.json");
        assert!(matches!(
            exec(opt(None, false, Some(unwritable))).await,
            Err(StackError::Output { .. })
        ));
    }
}
