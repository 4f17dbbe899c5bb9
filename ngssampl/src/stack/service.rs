// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::stack::{
    iam::{ecr_pull_statements, PolicyStatement, Role},
    networking::{SubnetType, Vpc},
    template::{get_att, reference, Template},
    types::{AssetId, LogicalId},
    StackError, StackResult,
};
use serde_json::{json, Value};

#[derive(Clone, Debug)]
pub struct Cluster {
    id: LogicalId,
}

impl Cluster {
    pub fn new(id: LogicalId) -> Self {
        Cluster { id }
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn render(&self, template: &mut Template) -> StackResult<()> {
        template.add_resource(&self.id, "AWS::ECS::Cluster", json!({}))
    }
}

/// Ships container stdout/stderr to CloudWatch Logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AwsLogDriver {
    pub stream_prefix: String,
}

#[derive(Clone, Debug)]
pub struct ContainerDefinition {
    pub name: String,
    pub image: AssetId,
    pub command: Vec<String>,
    pub logging: Option<AwsLogDriver>,
}

#[derive(Clone, Debug)]
pub struct FargateTaskDefinition {
    id: LogicalId,
    cpu: u16,
    memory_mib: u32,
    containers: Vec<ContainerDefinition>,
    // used by Fargate to pull the image and ship logs
    execution_role: Role,
    // assumed by the containers themselves
    task_role: Role,
}

impl FargateTaskDefinition {
    pub fn new(id: LogicalId) -> Self {
        let mut execution_role = Role::for_ecs_tasks(id.child("ExecutionRole"));
        for statement in ecr_pull_statements() {
            execution_role.add_to_policy(statement);
        }
        let task_role = Role::for_ecs_tasks(id.child("TaskRole"));

        FargateTaskDefinition {
            id,
            cpu: 256,
            memory_mib: 512,
            containers: Vec::new(),
            execution_role,
            task_role,
        }
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn add_container(&mut self, container: ContainerDefinition) -> StackResult<()> {
        if self.containers.iter().any(|c| c.name == container.name) {
            return Err(StackError::Render {
                dbg: format!(
                    "Container {} already defined in {}",
                    container.name, self.id
                ),
            });
        }
        self.containers.push(container);
        Ok(())
    }

    #[cfg(test)]
    pub fn containers(&self) -> &[ContainerDefinition] {
        &self.containers
    }

    // Shared by every container with a log driver.
    pub fn log_group_id(&self) -> LogicalId {
        self.id.child("LogGroup")
    }

    fn uses_logging(&self) -> bool {
        self.containers.iter().any(|c| c.logging.is_some())
    }

    pub fn render(&self, template: &mut Template) -> StackResult<()> {
        let log_group = self.log_group_id();
        let mut execution_role = self.execution_role.clone();
        if self.uses_logging() {
            template.add_resource(
                &log_group,
                "AWS::Logs::LogGroup",
                json!({ "RetentionInDays": 30 }),
            )?;
            execution_role.add_to_policy(PolicyStatement {
                actions: vec!["logs:CreateLogStream", "logs:PutLogEvents"],
                resource: get_att(&log_group, "Arn"),
            });
        }
        execution_role.render(template)?;
        self.task_role.render(template)?;

        let containers: Vec<Value> = self
            .containers
            .iter()
            .map(|c| {
                let mut def = json!({
                    "Name": c.name,
                    "Image": { "Asset": c.image },
                    "Command": c.command,
                    "Essential": true,
                });
                if let Some(driver) = &c.logging {
                    def["LogConfiguration"] = json!({
                        "LogDriver": "awslogs",
                        "Options": {
                            "awslogs-group": reference(&log_group),
                            "awslogs-stream-prefix": driver.stream_prefix,
                            "awslogs-region": { "Ref": "AWS::Region" },
                        },
                    });
                }
                def
            })
            .collect();

        template.add_resource(
            &self.id,
            "AWS::ECS::TaskDefinition",
            json!({
                "ContainerDefinitions": containers,
                "Cpu": self.cpu.to_string(),
                "ExecutionRoleArn": get_att(execution_role.id(), "Arn"),
                "Memory": self.memory_mib.to_string(),
                "NetworkMode": "awsvpc",
                "RequiresCompatibilities": ["FARGATE"],
                "TaskRoleArn": get_att(self.task_role.id(), "Arn"),
            }),
        )?;
        // the task can only start once its execution role may pull and log
        template.add_dependency(&self.id, &execution_role.default_policy_id())
    }
}

/// Keeps one copy of the task definition running on Fargate.
#[derive(Clone, Debug)]
pub struct FargateService {
    id: LogicalId,
    cluster: LogicalId,
    task_definition: LogicalId,
    subnets: Vec<LogicalId>,
    // routes out of the service subnets
    egress: Vec<LogicalId>,
    security_groups: Vec<LogicalId>,
    desired_count: u32,
}

impl FargateService {
    pub fn new(
        id: LogicalId,
        cluster: &Cluster,
        task_definition: &FargateTaskDefinition,
        vpc: &Vpc,
    ) -> Self {
        FargateService {
            id,
            cluster: cluster.id().clone(),
            task_definition: task_definition.id().clone(),
            subnets: vpc
                .subnets(SubnetType::Private)
                .map(|s| s.id.clone())
                .collect(),
            egress: vpc.egress_dependencies(SubnetType::Private),
            security_groups: Vec::new(),
            desired_count: 1,
        }
    }

    pub fn add_security_group(&mut self, security_group: &LogicalId) {
        if !self.security_groups.contains(security_group) {
            self.security_groups.push(security_group.clone());
        }
    }

    #[cfg(test)]
    pub fn security_groups(&self) -> &[LogicalId] {
        &self.security_groups
    }

    pub fn render(&self, template: &mut Template) -> StackResult<()> {
        let security_groups: Vec<Value> = self
            .security_groups
            .iter()
            .map(|sg| get_att(sg, "GroupId"))
            .collect();
        let subnets: Vec<Value> = self.subnets.iter().map(reference).collect();

        template.add_resource(
            &self.id,
            "AWS::ECS::Service",
            json!({
                "Cluster": reference(&self.cluster),
                "DesiredCount": self.desired_count,
                "LaunchType": "FARGATE",
                "NetworkConfiguration": {
                    "AwsvpcConfiguration": {
                        "AssignPublicIp": "DISABLED",
                        "SecurityGroups": security_groups,
                        "Subnets": subnets,
                    },
                },
                "TaskDefinition": reference(&self.task_definition),
            }),
        )?;
        // the sampler must reach the NATS server as soon as the task starts
        for dep in self.egress.iter() {
            template.add_dependency(&self.id, dep)?;
        }
        Ok(())
    }
}
