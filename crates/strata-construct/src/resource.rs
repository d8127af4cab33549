//! Typed resource declarations.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strata_common::types::LogicalId;

use crate::attribute::{AttrValue, AttributeReference, Attributes};

/// Closed set of resource kinds the engine knows how to order and emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    /// Object storage bucket.
    Bucket,
    /// Access policy attached to a bucket.
    BucketPolicy,
    /// Static website hosting configuration of a bucket.
    WebsiteConfig,
    /// Single object uploaded into a bucket.
    BucketObject,
    /// CDN origin access identity.
    OriginIdentity,
    /// CDN distribution.
    Distribution,
    /// DNS record.
    DnsRecord,
    /// IAM role.
    Role,
    /// Managed policy attached to an IAM role.
    RolePolicyAttachment,
    /// Compute function.
    Function,
    /// REST API.
    RestApi,
    /// Response model of a REST API.
    ApiModel,
    /// Path resource of a REST API.
    ApiResource,
    /// HTTP method on an API resource.
    ApiMethod,
    /// Backend integration of an API method.
    ApiIntegration,
    /// Response mapping of an integration.
    ApiIntegrationResponse,
    /// Response declaration of a method.
    ApiMethodResponse,
    /// Deployment of a REST API to a stage.
    ApiDeployment,
    /// Permission allowing a service to invoke a function.
    LambdaPermission,
    /// Named stack output.
    Output,
}

impl ResourceType {
    /// Every resource type, in declaration order.
    pub const ALL: [Self; 20] = [
        Self::Bucket,
        Self::BucketPolicy,
        Self::WebsiteConfig,
        Self::BucketObject,
        Self::OriginIdentity,
        Self::Distribution,
        Self::DnsRecord,
        Self::Role,
        Self::RolePolicyAttachment,
        Self::Function,
        Self::RestApi,
        Self::ApiModel,
        Self::ApiResource,
        Self::ApiMethod,
        Self::ApiIntegration,
        Self::ApiIntegrationResponse,
        Self::ApiMethodResponse,
        Self::ApiDeployment,
        Self::LambdaPermission,
        Self::Output,
    ];

    /// Kebab-case tag used in the artifact.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Bucket => "bucket",
            Self::BucketPolicy => "bucket-policy",
            Self::WebsiteConfig => "website-config",
            Self::BucketObject => "bucket-object",
            Self::OriginIdentity => "origin-identity",
            Self::Distribution => "distribution",
            Self::DnsRecord => "dns-record",
            Self::Role => "role",
            Self::RolePolicyAttachment => "role-policy-attachment",
            Self::Function => "function",
            Self::RestApi => "rest-api",
            Self::ApiModel => "api-model",
            Self::ApiResource => "api-resource",
            Self::ApiMethod => "api-method",
            Self::ApiIntegration => "api-integration",
            Self::ApiIntegrationResponse => "api-integration-response",
            Self::ApiMethodResponse => "api-method-response",
            Self::ApiDeployment => "api-deployment",
            Self::LambdaPermission => "lambda-permission",
            Self::Output => "output",
        }
    }

    /// Provider type name the executor maps this kind to.
    #[must_use]
    pub const fn provider_type(self) -> &'static str {
        match self {
            Self::Bucket => "aws_s3_bucket",
            Self::BucketPolicy => "aws_s3_bucket_policy",
            Self::WebsiteConfig => "aws_s3_bucket_website_configuration",
            Self::BucketObject => "aws_s3_bucket_object",
            Self::OriginIdentity => "aws_cloudfront_origin_access_identity",
            Self::Distribution => "aws_cloudfront_distribution",
            Self::DnsRecord => "aws_route53_record",
            Self::Role => "aws_iam_role",
            Self::RolePolicyAttachment => "aws_iam_role_policy_attachment",
            Self::Function => "aws_lambda_function",
            Self::RestApi => "aws_api_gateway_rest_api",
            Self::ApiModel => "aws_api_gateway_model",
            Self::ApiResource => "aws_api_gateway_resource",
            Self::ApiMethod => "aws_api_gateway_method",
            Self::ApiIntegration => "aws_api_gateway_integration",
            Self::ApiIntegrationResponse => "aws_api_gateway_integration_response",
            Self::ApiMethodResponse => "aws_api_gateway_method_response",
            Self::ApiDeployment => "aws_api_gateway_deployment",
            Self::LambdaPermission => "aws_lambda_permission",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Declaration of one infrastructure object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    /// Globally unique id derived from the owning construct's path.
    pub logical_id: LogicalId,
    /// Kind of resource.
    pub resource_type: ResourceType,
    /// Attribute bag; may contain references.
    pub attributes: Attributes,
    /// Dependencies declared in addition to those implied by references.
    pub explicit_depends_on: BTreeSet<LogicalId>,
}

impl ResourceNode {
    /// Returns every logical id this resource depends on, explicit or implied.
    ///
    /// The result is sorted and free of duplicates.
    #[must_use]
    pub fn dependencies(&self) -> BTreeSet<&LogicalId> {
        let mut deps: BTreeSet<&LogicalId> = self.explicit_depends_on.iter().collect();
        for value in self.attributes.values() {
            value.visit_references(&mut |r| {
                let _ = deps.insert(r.target());
            });
        }
        deps
    }
}

/// Handle to a resource that was added to a construct tree.
///
/// Handles are cheap to clone and are how composition code wires one
/// resource's attributes to another's.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    pub(crate) index: usize,
    pub(crate) logical_id: LogicalId,
    pub(crate) resource_type: ResourceType,
}

impl ResourceHandle {
    /// Logical id of the resource.
    #[must_use]
    pub const fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    /// Kind of the resource.
    #[must_use]
    pub const fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Reference to one of this resource's attributes.
    #[must_use]
    pub fn reference(&self, attribute: impl Into<String>) -> AttributeReference {
        AttributeReference::new(self.logical_id.clone(), attribute)
    }

    /// Reference to one of this resource's attributes, as an attribute value.
    #[must_use]
    pub fn attr(&self, attribute: impl Into<String>) -> AttrValue {
        AttrValue::Reference(self.reference(attribute))
    }
}

/// Reference to `attribute` on `resource`. Always succeeds.
#[must_use]
pub fn reference(resource: &ResourceHandle, attribute: &str) -> AttributeReference {
    resource.reference(attribute)
}
