// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::stack::{
    template::{reference, Template},
    types::LogicalId,
    StackResult,
};
use serde_json::{json, Value};

const POLICY_VERSION: &str = "2012-10-17";
const ECS_TASKS_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";

#[derive(Clone, Debug, PartialEq)]
pub struct PolicyStatement {
    pub actions: Vec<&'static str>,
    pub resource: Value,
}

impl PolicyStatement {
    fn to_json(&self) -> Value {
        let action = match self.actions.as_slice() {
            [single] => json!(single),
            many => json!(many),
        };
        json!({
            "Action": action,
            "Effect": "Allow",
            "Resource": self.resource,
        })
    }
}

// Permissions Fargate itself needs to pull an image from the asset repository.
pub fn ecr_pull_statements() -> Vec<PolicyStatement> {
    vec![
        PolicyStatement {
            actions: vec![
                "ecr:BatchCheckLayerAvailability",
                "ecr:GetDownloadUrlForLayer",
                "ecr:BatchGetImage",
            ],
            resource: json!({
                "Fn::Sub": "arn:${AWS::Partition}:ecr:${AWS::Region}:${AWS::AccountId}:repository/*"
            }),
        },
        PolicyStatement {
            actions: vec!["ecr:GetAuthorizationToken"],
            resource: json!("*"),
        },
    ]
}

/// A role assumed by ECS tasks, with an optional inline default policy.
#[derive(Clone, Debug)]
pub struct Role {
    id: LogicalId,
    statements: Vec<PolicyStatement>,
}

impl Role {
    pub fn for_ecs_tasks(id: LogicalId) -> Self {
        Role {
            id,
            statements: Vec::new(),
        }
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn default_policy_id(&self) -> LogicalId {
        self.id.child("DefaultPolicy")
    }

    pub fn add_to_policy(&mut self, statement: PolicyStatement) {
        if !self.statements.contains(&statement) {
            self.statements.push(statement);
        }
    }

    pub fn render(&self, template: &mut Template) -> StackResult<()> {
        template.add_resource(
            &self.id,
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": {
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": ECS_TASKS_PRINCIPAL },
                    }],
                    "Version": POLICY_VERSION,
                },
            }),
        )?;

        if self.statements.is_empty() {
            return Ok(());
        }
        let policy = self.default_policy_id();
        let statements: Vec<Value> = self.statements.iter().map(|s| s.to_json()).collect();
        template.add_resource(
            &policy,
            "AWS::IAM::Policy",
            json!({
                "PolicyDocument": {
                    "Statement": statements,
                    "Version": POLICY_VERSION,
                },
                "PolicyName": policy,
                "Roles": [reference(&self.id)],
            }),
        )
    }
}
