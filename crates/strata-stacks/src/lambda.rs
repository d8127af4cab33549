//! Compute function with its execution role.

use strata_common::config::Settings;
use strata_common::error::Result;
use strata_common::types::FunctionBundle;
use strata_construct::attribute::AttrValue;
use strata_construct::construct::{ConstructId, ConstructTree};
use strata_construct::resource::{ResourceHandle, ResourceType};

/// Managed policy granting the function permission to write its logs.
pub const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

const HANDLER: &str = "index.handler";
const TIMEOUT_SECONDS: i64 = 15;
const MEMORY_SIZE_MB: i64 = 128;

/// Handles of the compute-function subtree.
#[derive(Debug, Clone)]
pub struct Lambda {
    /// The `lambda-deployment-main-<name>` construct.
    pub construct: ConstructId,
    /// Execution role assumed by the function.
    pub role: ResourceHandle,
    /// The function itself; the API integrates with its `invoke_arn`.
    pub function: ResourceHandle,
}

/// Adds the compute function under `parent`.
///
/// Without a bundle the archive attributes are left as placeholders, which
/// makes synthesis of this environment fail until one is supplied.
///
/// # Errors
///
/// Returns `StrataError::DuplicateName` if the subtree already exists under
/// `parent`.
pub fn add_lambda(
    tree: &mut ConstructTree,
    parent: ConstructId,
    settings: &Settings,
    bundle: Option<&FunctionBundle>,
) -> Result<Lambda> {
    let name = format!("lambda-deployment-main-{}", settings.name);
    let construct = tree.create_child(parent, name.as_str())?;

    let role = tree
        .resource(construct, "lambdarole", ResourceType::Role)
        .attr("assume_role_policy", assume_role_policy())
        .add()?;

    let _ = tree
        .resource(construct, "lambda-managed-policy", ResourceType::RolePolicyAttachment)
        .attr("policy_arn", BASIC_EXECUTION_POLICY_ARN)
        .attr("role", role.attr("name"))
        .add()?;

    let (filename, source_code_hash) = bundle.map_or_else(
        || {
            tracing::warn!(environment = %settings.environment, "no function bundle supplied");
            (
                AttrValue::placeholder("function archive path"),
                AttrValue::placeholder("function archive hash"),
            )
        },
        |b| {
            (
                AttrValue::from(b.archive_path.to_string_lossy().into_owned()),
                AttrValue::from(b.content_hash.as_hex()),
            )
        },
    );

    let function = tree
        .resource(construct, format!("lambda-deployment-{name}"), ResourceType::Function)
        .attr(
            "function_name",
            format!("{}-{}-lambda", settings.name, settings.environment),
        )
        .attr("handler", HANDLER)
        .attr("runtime", settings.function_runtime())
        .attr("role", role.attr("arn"))
        .attr("timeout", TIMEOUT_SECONDS)
        .attr("memory_size", MEMORY_SIZE_MB)
        .attr("source_code_hash", source_code_hash)
        .attr("filename", filename)
        .add()?;

    tracing::info!(environment = %settings.environment, function = %function.logical_id(), "function composed");
    Ok(Lambda {
        construct,
        role,
        function,
    })
}

fn assume_role_policy() -> AttrValue {
    AttrValue::encoded(AttrValue::map([
        ("Version", AttrValue::from("2012-10-17")),
        (
            "Statement",
            AttrValue::list([AttrValue::map([
                ("Action", AttrValue::list(["sts:AssumeRole"])),
                (
                    "Principal",
                    AttrValue::map([(
                        "Service",
                        AttrValue::list(["lambda.amazonaws.com", "apigateway.amazonaws.com"]),
                    )]),
                ),
                ("Effect", AttrValue::from("Allow")),
                ("Sid", AttrValue::from("")),
            ])]),
        ),
    ]))
}
