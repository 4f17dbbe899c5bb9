// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::stack::{
    template::{get_att, reference, Template},
    types::LogicalId,
    StackError, StackResult,
};
use serde_json::json;

pub const VPC_CIDR: &str = "10.0.0.0/16";

// The /16 is split into eight /19 blocks: one public and one private per AZ.
pub const MAX_SUPPORTED_AZS: u8 = 4;
const SUBNET_BLOCK: u8 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubnetType {
    Public,
    Private,
}

impl SubnetType {
    pub fn as_str(&self) -> &str {
        match self {
            SubnetType::Public => "Public",
            SubnetType::Private => "Private",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Subnet {
    pub id: LogicalId,
    pub subnet_type: SubnetType,
    pub az_index: u8,
    pub cidr: String,
}

impl Subnet {
    fn route_table_id(&self) -> LogicalId {
        self.id.child("RouteTable")
    }

    fn route_table_association_id(&self) -> LogicalId {
        self.id.child("RouteTableAssociation")
    }

    fn default_route_id(&self) -> LogicalId {
        self.id.child("DefaultRoute")
    }

    fn nat_gateway_id(&self) -> LogicalId {
        self.id.child("NATGateway")
    }
}

#[derive(Clone, Debug)]
pub struct Vpc {
    id: LogicalId,
    subnets: Vec<Subnet>,
}

impl Vpc {
    // Callers validate `max_azs` against MAX_SUPPORTED_AZS.
    pub fn new(id: LogicalId, max_azs: u8) -> Self {
        let mut subnets = Vec::with_capacity(max_azs as usize * 2);
        for subnet_type in [SubnetType::Public, SubnetType::Private] {
            let block_offset = match subnet_type {
                SubnetType::Public => 0,
                SubnetType::Private => MAX_SUPPORTED_AZS,
            };
            for az_index in 0..max_azs {
                let block = (block_offset + az_index) as u16 * SUBNET_BLOCK as u16;
                subnets.push(Subnet {
                    id: id.child(&format!("{}Subnet{}", subnet_type.as_str(), az_index + 1)),
                    subnet_type,
                    az_index,
                    cidr: format!("10.0.{}.0/19", block),
                });
            }
        }

        Vpc { id, subnets }
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn subnets(&self, subnet_type: SubnetType) -> impl Iterator<Item = &Subnet> {
        self.subnets
            .iter()
            .filter(move |s| s.subnet_type == subnet_type)
    }

    pub fn internet_gateway_id(&self) -> LogicalId {
        self.id.child("IGW")
    }

    fn gateway_attachment_id(&self) -> LogicalId {
        self.id.child("VPCGW")
    }

    // The NAT gateway serving an AZ lives in that AZ's public subnet.
    fn nat_gateway_id(&self, az_index: u8) -> Option<LogicalId> {
        self.subnets(SubnetType::Public)
            .find(|s| s.az_index == az_index)
            .map(|s| s.nat_gateway_id())
    }

    /// Resources which must exist before anything placed in `subnet_type`
    /// subnets has a working default route.
    pub fn egress_dependencies(&self, subnet_type: SubnetType) -> Vec<LogicalId> {
        self.subnets(subnet_type)
            .flat_map(|s| [s.default_route_id(), s.route_table_association_id()])
            .collect()
    }

    pub fn render(&self, template: &mut Template) -> StackResult<()> {
        template.add_resource(
            &self.id,
            "AWS::EC2::VPC",
            json!({
                "CidrBlock": VPC_CIDR,
                "EnableDnsHostnames": true,
                "EnableDnsSupport": true,
            }),
        )?;

        let igw = self.internet_gateway_id();
        let attachment = self.gateway_attachment_id();
        template.add_resource(&igw, "AWS::EC2::InternetGateway", json!({}))?;
        template.add_resource(
            &attachment,
            "AWS::EC2::VPCGatewayAttachment",
            json!({
                "InternetGatewayId": reference(&igw),
                "VpcId": reference(&self.id),
            }),
        )?;

        // public subnets first: private routes point at their NAT gateways
        for subnet in self.subnets(SubnetType::Public) {
            self.render_subnet(template, subnet)?;

            let eip = subnet.id.child("EIP");
            template.add_resource(&eip, "AWS::EC2::EIP", json!({ "Domain": "vpc" }))?;
            template.add_resource(
                &subnet.nat_gateway_id(),
                "AWS::EC2::NatGateway",
                json!({
                    "AllocationId": get_att(&eip, "AllocationId"),
                    "SubnetId": reference(&subnet.id),
                }),
            )?;
            template.add_dependency(&subnet.nat_gateway_id(), &subnet.default_route_id())?;
            template.add_dependency(
                &subnet.nat_gateway_id(),
                &subnet.route_table_association_id(),
            )?;
        }

        for subnet in self.subnets(SubnetType::Private) {
            self.render_subnet(template, subnet)?;
        }
        Ok(())
    }

    fn render_subnet(&self, template: &mut Template, subnet: &Subnet) -> StackResult<()> {
        template.add_resource(
            &subnet.id,
            "AWS::EC2::Subnet",
            json!({
                "VpcId": reference(&self.id),
                "CidrBlock": subnet.cidr,
                "AvailabilityZone": { "Fn::Select": [subnet.az_index, { "Fn::GetAZs": "" }] },
                "MapPublicIpOnLaunch": subnet.subnet_type == SubnetType::Public,
            }),
        )?;

        let route_table = subnet.route_table_id();
        template.add_resource(
            &route_table,
            "AWS::EC2::RouteTable",
            json!({ "VpcId": reference(&self.id) }),
        )?;
        template.add_resource(
            &subnet.route_table_association_id(),
            "AWS::EC2::SubnetRouteTableAssociation",
            json!({
                "RouteTableId": reference(&route_table),
                "SubnetId": reference(&subnet.id),
            }),
        )?;

        let default_route = subnet.default_route_id();
        match subnet.subnet_type {
            SubnetType::Public => {
                template.add_resource(
                    &default_route,
                    "AWS::EC2::Route",
                    json!({
                        "DestinationCidrBlock": "0.0.0.0/0",
                        "GatewayId": reference(&self.internet_gateway_id()),
                        "RouteTableId": reference(&route_table),
                    }),
                )?;
                // the gateway only routes once attached
                template.add_dependency(&default_route, &self.gateway_attachment_id())?;
            }
            SubnetType::Private => {
                let nat = self
                    .nat_gateway_id(subnet.az_index)
                    .ok_or(StackError::Render {
                        dbg: format!("No public subnet to host a NAT gateway for {}", subnet.id),
                    })?;
                template.add_resource(
                    &default_route,
                    "AWS::EC2::Route",
                    json!({
                        "DestinationCidrBlock": "0.0.0.0/0",
                        "NatGatewayId": reference(&nat),
                        "RouteTableId": reference(&route_table),
                    }),
                )?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SecurityGroup {
    id: LogicalId,
    vpc: LogicalId,
    description: String,
    allow_all_outbound: bool,
}

impl SecurityGroup {
    pub fn new(id: LogicalId, vpc: &Vpc, description: &str, allow_all_outbound: bool) -> Self {
        SecurityGroup {
            id,
            vpc: vpc.id().clone(),
            description: description.to_owned(),
            allow_all_outbound,
        }
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn render(&self, template: &mut Template) -> StackResult<()> {
        let egress = if self.allow_all_outbound {
            json!([{
                "CidrIp": "0.0.0.0/0",
                "Description": "Allow all outbound traffic by default",
                "IpProtocol": "-1",
            }])
        } else {
            // an empty egress list would fall back to allow-all; block with a
            // rule that matches nothing
            json!([{
                "CidrIp": "255.255.255.255/32",
                "Description": "Disallow all traffic",
                "FromPort": 252,
                "IpProtocol": "icmp",
                "ToPort": 86,
            }])
        };

        template.add_resource(
            &self.id,
            "AWS::EC2::SecurityGroup",
            json!({
                "GroupDescription": self.description,
                "SecurityGroupEgress": egress,
                "VpcId": reference(&self.vpc),
            }),
        )
    }
}
