//! The workshop application: static site, compute function, REST API.

use strata_common::config::Settings;
use strata_common::error::Result;
use strata_common::types::{FunctionBundle, StaticContent};
use strata_construct::construct::ConstructTree;

use crate::api_gateway::{ApiGatewayProps, add_api_gateway};
use crate::lambda::add_lambda;
use crate::static_site::add_static_site;

/// Default first path segment of the REST API.
pub const DEFAULT_PUBLIC_PATH: &str = "public";

/// Externally prepared inputs shared by every environment.
#[derive(Debug, Clone)]
pub struct StackInputs {
    /// Prebuilt function archive, if one was supplied.
    pub function_bundle: Option<FunctionBundle>,
    /// Files uploaded to the UI bucket.
    pub static_content: Vec<StaticContent>,
    /// First path segment of the REST API.
    pub public_path: String,
}

impl Default for StackInputs {
    fn default() -> Self {
        Self {
            function_bundle: None,
            static_content: Vec::new(),
            public_path: DEFAULT_PUBLIC_PATH.to_string(),
        }
    }
}

/// Builds a fresh construct tree for one environment.
///
/// # Errors
///
/// Returns `StrataError::Config` if the settings are incomplete, or any
/// construction error raised while declaring the subtrees.
pub fn compose(settings: &Settings, inputs: &StackInputs) -> Result<ConstructTree> {
    settings.validate()?;
    tracing::info!(environment = %settings.environment, stack = %settings.name, "composing workshop");

    let mut tree = ConstructTree::new(settings.environment.as_str());
    let root = tree.root();

    let _ = add_static_site(&mut tree, root, settings, &inputs.static_content)?;
    let lambda = add_lambda(&mut tree, root, settings, inputs.function_bundle.as_ref())?;
    let props = ApiGatewayProps {
        function: &lambda.function,
        public_path: &inputs.public_path,
    };
    let _ = add_api_gateway(&mut tree, root, settings, &props)?;

    tracing::debug!(resources = tree.resource_count(), "workshop tree built");
    Ok(tree)
}
