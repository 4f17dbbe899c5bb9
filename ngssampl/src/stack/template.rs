// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::stack::{
    types::{AssetId, LogicalId},
    StackError, StackResult,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Rendered form of a stack, in the resource/type/properties shape used by
/// CloudFormation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "Resources")]
    resources: BTreeMap<LogicalId, Resource>,

    #[serde(rename = "Assets", skip_serializing_if = "Vec::is_empty")]
    assets: Vec<Asset>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    kind: String,

    #[serde(rename = "Properties")]
    properties: Value,

    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<LogicalId>,
}

#[cfg(test)]
impl Resource {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn properties(&self) -> &Value {
        &self.properties
    }

    pub fn depends_on(&self) -> Vec<&str> {
        self.depends_on.iter().map(|id| id.as_str()).collect()
    }
}

// A docker image built from a local directory at deploy time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Asset {
    pub id: AssetId,
    #[serde(rename = "Type")]
    pub kind: String,
    pub path: String,
}

impl Template {
    pub fn add_resource(
        &mut self,
        id: &LogicalId,
        kind: &str,
        properties: Value,
    ) -> StackResult<()> {
        if self.resources.contains_key(id) {
            return Err(StackError::Render {
                dbg: format!("Duplicate logical id: {}", id),
            });
        }
        self.resources.insert(
            id.clone(),
            Resource {
                kind: kind.to_owned(),
                properties,
                depends_on: Vec::new(),
            },
        );
        Ok(())
    }

    /// Order `id` after `on` at deploy time. Both must already be rendered.
    pub fn add_dependency(&mut self, id: &LogicalId, on: &LogicalId) -> StackResult<()> {
        if !self.resources.contains_key(on) {
            return Err(StackError::Render {
                dbg: format!("{} depends on unknown resource {}", id, on),
            });
        }
        let resource = self.resources.get_mut(id).ok_or(StackError::Render {
            dbg: format!("Unknown resource {}", id),
        })?;
        if !resource.depends_on.contains(on) {
            resource.depends_on.push(on.clone());
        }
        Ok(())
    }

    pub fn add_asset(&mut self, asset: Asset) {
        if !self.assets.iter().any(|a| a.id == asset.id) {
            self.assets.push(asset);
        }
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn to_json_pretty(&self) -> StackResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| StackError::Render {
            dbg: format!("Failed to serialize template: {err}"),
        })
    }
}

#[cfg(test)]
impl Template {
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(&LogicalId::from(id))
    }

    pub fn resource_ids(&self) -> Vec<&str> {
        self.resources.keys().map(|id| id.as_str()).collect()
    }

    pub fn resources_of_kind(&self, kind: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, r)| r.kind == kind)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }
}

pub fn reference(id: &LogicalId) -> Value {
    json!({ "Ref": id })
}

pub fn get_att(id: &LogicalId, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id, attribute] })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut template = Template::default();
        let id = LogicalId::from("Cluster");
        template
            .add_resource(&id, "AWS::ECS::Cluster", json!({}))
            .unwrap();
        assert!(matches!(
            template.add_resource(&id, "AWS::ECS::Cluster", json!({})),
            Err(StackError::Render { .. })
        ));
    }

    #[test]
    fn dependencies_must_exist() {
        let mut template = Template::default();
        let igw = LogicalId::from("VpcIGW");
        let route = LogicalId::from("VpcPublicSubnet1DefaultRoute");
        template
            .add_resource(&route, "AWS::EC2::Route", json!({}))
            .unwrap();
        assert!(template.add_dependency(&route, &igw).is_err());

        template
            .add_resource(&igw, "AWS::EC2::InternetGateway", json!({}))
            .unwrap();
        template.add_dependency(&route, &igw).unwrap();
        template.add_dependency(&route, &igw).unwrap();
        assert_eq!(
            template.resource(route.as_str()).unwrap().depends_on(),
            vec!["VpcIGW"]
        );

        let rendered: Value = serde_json::from_str(&template.to_json_pretty().unwrap()).unwrap();
        assert_eq!(
            rendered["Resources"]["VpcPublicSubnet1DefaultRoute"]["DependsOn"],
            json!(["VpcIGW"])
        );
        assert!(rendered["Resources"]["VpcIGW"].get("DependsOn").is_none());
    }

    #[test]
    fn empty_template_renders_resources_only() {
        let rendered: Value =
            serde_json::from_str(&Template::default().to_json_pretty().unwrap()).unwrap();
        assert_eq!(rendered, json!({ "Resources": {} }));
    }

    #[test]
    fn assets_are_deduplicated() {
        let mut template = Template::default();
        for _ in 0..2 {
            template.add_asset(Asset {
                id: AssetId::from("image"),
                kind: "docker-image".to_owned(),
                path: "../".to_owned(),
            });
        }
        assert_eq!(template.assets().len(), 1);
    }

    #[test]
    fn intrinsic_helpers() {
        let id = LogicalId::from("TaskDefLogGroup");
        assert_eq!(reference(&id), json!({ "Ref": "TaskDefLogGroup" }));
        assert_eq!(
            get_att(&id, "Arn"),
            json!({ "Fn::GetAtt": ["TaskDefLogGroup", "Arn"] })
        );
    }
}
