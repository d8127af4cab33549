//! Static website: private bucket, CDN in front of it, uploaded content.
//!
//! The bucket is only reachable through the CDN's origin identity; the
//! policy also denies any request made without TLS.

use strata_common::config::Settings;
use strata_common::error::Result;
use strata_common::types::StaticContent;
use strata_construct::attribute::{AttrValue, TemplatePart};
use strata_construct::construct::{ConstructId, ConstructTree};
use strata_construct::resource::{ResourceHandle, ResourceType};

const INDEX_DOCUMENT: &str = "index.html";
const POLICY_VERSION: &str = "2012-10-17";
const OAI_PRINCIPAL_PREFIX: &str = "arn:aws:iam::cloudfront:user/CloudFront Origin Access Identity ";
const ALLOWED_METHODS: [&str; 7] = ["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"];
const CACHED_METHODS: [&str; 2] = ["GET", "HEAD"];

/// Handles of the static-site subtree.
#[derive(Debug, Clone)]
pub struct StaticSite {
    /// The `ui-deployment-<env>` construct.
    pub construct: ConstructId,
    /// Bucket holding the site content.
    pub bucket: ResourceHandle,
    /// CDN distribution serving the bucket.
    pub distribution: ResourceHandle,
    /// One object per static content entry, in key order.
    pub objects: Vec<ResourceHandle>,
}

/// Adds the static site under `parent`.
///
/// Nothing is created when `settings.deploy_ui` is false, so no construct
/// or resource of the subtree exists for other code to reference.
///
/// # Errors
///
/// Returns `StrataError::DuplicateName` if the subtree already exists under
/// `parent`, or if two content keys sanitize to the same resource id.
pub fn add_static_site(
    tree: &mut ConstructTree,
    parent: ConstructId,
    settings: &Settings,
    content: &[StaticContent],
) -> Result<Option<StaticSite>> {
    if !settings.deploy_ui {
        tracing::info!(environment = %settings.environment, "UI deployment disabled, skipping static site");
        return Ok(None);
    }

    let name = format!("ui-deployment-{}", settings.environment);
    let site = tree.create_child(parent, name.as_str())?;
    let bucket_name = settings.ui_bucket_name.as_str();

    let bucket = tree
        .resource(site, "s3-ui-deployment", ResourceType::Bucket)
        .attr("bucket", bucket_name)
        .attr("acl", "private")
        .add()?;

    let _ = tree
        .resource(site, "s3-ui-website-config", ResourceType::WebsiteConfig)
        .attr("bucket", bucket.attr("bucket"))
        .attr(
            "index_document",
            AttrValue::map([("suffix", AttrValue::from(INDEX_DOCUMENT))]),
        )
        .attr(
            "error_document",
            AttrValue::map([("key", AttrValue::from(INDEX_DOCUMENT))]),
        )
        .add()?;

    let identity = tree
        .resource(site, format!("origin-access-{name}"), ResourceType::OriginIdentity)
        .attr("comment", format!("For {}", settings.name))
        .add()?;

    let _ = tree
        .resource(site, "s3-ui-deployment-policy", ResourceType::BucketPolicy)
        .attr("bucket", bucket.attr("id"))
        .attr("policy", bucket_policy(&name, bucket_name, &identity))
        .add()?;

    let mut objects = Vec::with_capacity(content.len());
    for entry in content {
        let mut object = tree
            .resource(site, format!("s3-object-{}", entry.relative_key), ResourceType::BucketObject)
            .depends_on(&bucket)
            .attr("key", entry.relative_key.as_str())
            .attr("bucket", bucket.attr("bucket"))
            .attr("source", entry.absolute_path.to_string_lossy().into_owned())
            .attr("etag", entry.content_hash.as_hex());
        if let Some(content_type) = &entry.content_type {
            object = object.attr("content_type", content_type);
        }
        objects.push(object.add()?);
    }

    let distribution = tree
        .resource(site, "ui-deployment-cloudfront", ResourceType::Distribution)
        .attr("enabled", true)
        .attr("default_root_object", INDEX_DOCUMENT)
        .attr("retain_on_delete", false)
        .attr("http_version", "http2")
        .attr(
            "origin",
            AttrValue::list([AttrValue::map([
                ("origin_id", AttrValue::from(bucket_name)),
                ("domain_name", bucket.attr("bucket_domain_name")),
                (
                    "s3_origin_config",
                    AttrValue::map([(
                        "origin_access_identity",
                        identity.attr("cloudfront_access_identity_path"),
                    )]),
                ),
            ])]),
        )
        .attr("aliases", aliases(settings))
        .attr("viewer_certificate", viewer_certificate(settings))
        .attr("default_cache_behavior", cache_behavior(bucket_name))
        .attr(
            "restrictions",
            AttrValue::map([(
                "geo_restriction",
                AttrValue::map([("restriction_type", AttrValue::from("none"))]),
            )]),
        )
        .attr("wait_for_deployment", false)
        .add()?;

    let _ = tree
        .resource(site, "website_endpoint", ResourceType::Output)
        .attr("description", "CloudFront URL")
        .attr(
            "value",
            AttrValue::template([
                TemplatePart::from("https://"),
                distribution.reference("domain_name").into(),
            ]),
        )
        .add()?;

    if settings.setup_custom_domain {
        add_custom_domain(tree, site, &name, settings, &distribution)?;
    }

    tracing::info!(
        environment = %settings.environment,
        objects = objects.len(),
        custom_domain = settings.setup_custom_domain,
        "static site composed"
    );
    Ok(Some(StaticSite {
        construct: site,
        bucket,
        distribution,
        objects,
    }))
}

fn add_custom_domain(
    tree: &mut ConstructTree,
    site: ConstructId,
    name: &str,
    settings: &Settings,
    distribution: &ResourceHandle,
) -> Result<()> {
    let _ = tree
        .resource(site, format!("distribution-domain-{name}"), ResourceType::DnsRecord)
        .attr("name", settings.ui_bucket_name.as_str())
        .attr("type", "A")
        .attr("zone_id", settings.domain_zone_id.as_str())
        .attr(
            "alias",
            AttrValue::list([AttrValue::map([
                ("name", distribution.attr("domain_name")),
                ("zone_id", distribution.attr("hosted_zone_id")),
                ("evaluate_target_health", AttrValue::from(true)),
            ])]),
        )
        .add()?;

    let _ = tree
        .resource(site, "website_custom_endpoint", ResourceType::Output)
        .attr("description", "CloudFront (Custom Domain) URL")
        .attr("value", format!("https://{}", settings.ui_bucket_name))
        .add()?;
    Ok(())
}

fn bucket_policy(name: &str, bucket_name: &str, identity: &ResourceHandle) -> AttrValue {
    let objects_arn = format!("arn:aws:s3:::{bucket_name}/*");
    let bucket_arn = format!("arn:aws:s3:::{bucket_name}");
    let identity_principal = || {
        AttrValue::map([(
            "AWS",
            AttrValue::template([
                TemplatePart::from(OAI_PRINCIPAL_PREFIX),
                identity.reference("id").into(),
            ]),
        )])
    };

    AttrValue::encoded(AttrValue::map([
        ("Version", AttrValue::from(POLICY_VERSION)),
        ("Id", format!("{name}-public-website").into()),
        (
            "Statement",
            AttrValue::list([
                AttrValue::map([
                    ("Sid", AttrValue::from("")),
                    ("Effect", "Allow".into()),
                    ("Principal", identity_principal()),
                    ("Action", "s3:GetObject".into()),
                    ("Resource", objects_arn.as_str().into()),
                ]),
                AttrValue::map([
                    ("Sid", AttrValue::from("")),
                    ("Effect", "Allow".into()),
                    ("Principal", identity_principal()),
                    ("Action", "s3:ListBucket".into()),
                    ("Resource", bucket_arn.as_str().into()),
                ]),
                AttrValue::map([
                    ("Sid", AttrValue::from("")),
                    ("Effect", "Deny".into()),
                    ("Principal", AttrValue::map([("AWS", AttrValue::from("*"))])),
                    ("Action", "s3:*".into()),
                    ("Resource", AttrValue::list([objects_arn, bucket_arn])),
                    (
                        "Condition",
                        AttrValue::map([(
                            "Bool",
                            AttrValue::map([("aws:SecureTransport", AttrValue::from("false"))]),
                        )]),
                    ),
                ]),
            ]),
        ),
    ]))
}

fn aliases(settings: &Settings) -> AttrValue {
    if settings.setup_custom_domain {
        AttrValue::list([settings.ui_bucket_name.as_str()])
    } else {
        AttrValue::List(Vec::new())
    }
}

fn viewer_certificate(settings: &Settings) -> AttrValue {
    let certificate = if settings.setup_custom_domain {
        ("acm_certificate_arn", AttrValue::from(settings.certificate_arn.as_str()))
    } else {
        ("cloudfront_default_certificate", AttrValue::from(true))
    };
    AttrValue::map([certificate, ("ssl_support_method", AttrValue::from("sni-only"))])
}

fn cache_behavior(bucket_name: &str) -> AttrValue {
    AttrValue::map([
        ("min_ttl", AttrValue::from(0)),
        ("default_ttl", AttrValue::from(60)),
        ("max_ttl", AttrValue::from(86_400)),
        ("allowed_methods", AttrValue::list(ALLOWED_METHODS)),
        ("cached_methods", AttrValue::list(CACHED_METHODS)),
        ("target_origin_id", AttrValue::from(bucket_name)),
        ("viewer_protocol_policy", AttrValue::from("redirect-to-https")),
        (
            "forwarded_values",
            AttrValue::map([
                (
                    "cookies",
                    AttrValue::map([("forward", AttrValue::from("none"))]),
                ),
                ("headers", AttrValue::List(Vec::new())),
                ("query_string", AttrValue::from(false)),
            ]),
        ),
    ])
}
