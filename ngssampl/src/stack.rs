// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use tracing::debug;

mod error;
mod iam;
mod networking;
mod props;
mod service;
mod template;
mod types;

pub use error::{StackError, StackResult};
pub use props::StackProps;
pub use template::Template;

use networking::{SecurityGroup, Vpc};
use service::{AwsLogDriver, Cluster, ContainerDefinition, FargateService, FargateTaskDefinition};
use template::Asset;
use types::{AssetId, LogicalId};

pub const DEFAULT_STACK_NAME: &str = "NgssamplStack";

// Path of the sampler binary inside the image.
const APP_PATH: &str = "./app";

/// The sampler deployment: one Fargate task running a publisher and a
/// subscriber container side by side.
#[derive(Clone, Debug)]
pub struct NgssamplStack {
    name: String,
    image: Asset,
    vpc: Vpc,
    cluster: Cluster,
    task_definition: FargateTaskDefinition,
    security_groups: Vec<SecurityGroup>,
    service: FargateService,
}

impl NgssamplStack {
    pub fn new(name: &str, props: &StackProps) -> StackResult<Self> {
        props.validate()?;

        let vpc = Vpc::new(LogicalId::from("Vpc"), props.max_azs);
        let cluster = Cluster::new(LogicalId::from("Cluster"));

        let image = Asset {
            id: AssetId::from(format!("{}ContainerImage", name)),
            kind: "docker-image".to_owned(),
            path: props.image_asset.clone(),
        };

        let mut task_definition = FargateTaskDefinition::new(LogicalId::from("TaskDef"));
        for (container, flag, prefix) in [("Pub", "-pub", "pub"), ("Sub", "-sub", "sub")] {
            task_definition.add_container(ContainerDefinition {
                name: container.to_owned(),
                image: image.id.clone(),
                command: container_command(flag, &props.creds),
                logging: props.logging.then(|| AwsLogDriver {
                    stream_prefix: prefix.to_owned(),
                }),
            })?;
        }

        let mut service = FargateService::new(
            LogicalId::from("Service"),
            &cluster,
            &task_definition,
            &vpc,
        );

        let mut security_groups = vec![SecurityGroup::new(
            LogicalId::from("ServiceSecurityGroup"),
            &vpc,
            &format!("{}/Service/SecurityGroup", name),
            true,
        )];
        if props.outbound_security_group {
            security_groups.push(SecurityGroup::new(
                LogicalId::from("OutboundSecGroup"),
                &vpc,
                &format!("{}/OutboundSecGroup", name),
                true,
            ));
        }
        for sg in security_groups.iter() {
            service.add_security_group(sg.id());
        }

        let stack = NgssamplStack {
            name: name.to_owned(),
            image,
            vpc,
            cluster,
            task_definition,
            security_groups,
            service,
        };
        debug!("{:?}", stack);
        Ok(stack)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn synth(&self) -> StackResult<Template> {
        let mut template = Template::default();
        template.add_asset(self.image.clone());

        self.vpc.render(&mut template)?;
        self.cluster.render(&mut template)?;
        self.task_definition.render(&mut template)?;
        for sg in self.security_groups.iter() {
            sg.render(&mut template)?;
        }
        self.service.render(&mut template)?;

        debug!(
            "synthesized {} with {} resources",
            self.name,
            template.resource_count()
        );
        Ok(template)
    }
}

/// `./app <flag> -creds <creds>`, as understood by the sampler CLI.
pub fn container_command(mode_flag: &str, creds: &str) -> Vec<String> {
    [APP_PATH, mode_flag, "-creds", creds]
        .into_iter()
        .map(str::to_owned)
        .collect()
}
