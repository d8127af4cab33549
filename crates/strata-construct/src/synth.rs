//! Deterministic synthesis of a dependency graph into an ordered artifact.
//!
//! The artifact is the only output of the engine. It must be byte-identical
//! across runs over an unchanged tree: every map in it is ordered, the
//! resource order comes from [`DependencyGraph::resolve_order`], and no
//! value depends on time or randomness.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strata_common::config::{BackendConfig, Settings};
use strata_common::constants::ARTIFACT_FORMAT_VERSION;
use strata_common::error::Result;
use strata_common::types::LogicalId;

use crate::graph::DependencyGraph;
use crate::resource::ResourceType;

/// Header of a synthesized artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Layout version of the artifact.
    pub format_version: u32,
    /// Environment label.
    pub environment: String,
    /// Stack name.
    pub stack: String,
    /// Provider region.
    pub region: String,
    /// Remote state locator for the executor.
    pub backend: BackendConfig,
}

impl Manifest {
    /// Builds the manifest header for one environment.
    #[must_use]
    pub fn for_settings(settings: &Settings) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            environment: settings.environment.clone(),
            stack: settings.name.clone(),
            region: settings.region.clone(),
            backend: settings.backend(),
        }
    }
}

/// One resource of the artifact, with attributes rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedResource {
    /// Logical id.
    pub logical_id: LogicalId,
    /// Resource kind.
    pub resource_type: ResourceType,
    /// Rendered attributes; references appear as `${id.attribute}`.
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// All dependencies, explicit or implied, sorted by logical id.
    pub depends_on: Vec<LogicalId>,
}

/// Ordered, serializable output of one environment's synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Header.
    pub manifest: Manifest,
    /// Resources in deployment order.
    pub resources: Vec<SynthesizedResource>,
}

impl Artifact {
    /// Canonical pretty-printed JSON form of the artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Looks up a resource by logical id.
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&SynthesizedResource> {
        self.resources
            .iter()
            .find(|r| r.logical_id.as_str() == logical_id)
    }

    /// Position of a resource in the deployment order.
    #[must_use]
    pub fn position(&self, logical_id: &str) -> Option<usize> {
        self.resources
            .iter()
            .position(|r| r.logical_id.as_str() == logical_id)
    }

    /// Resources of one kind, in deployment order.
    pub fn of_type(&self, resource_type: ResourceType) -> impl Iterator<Item = &SynthesizedResource> {
        self.resources
            .iter()
            .filter(move |r| r.resource_type == resource_type)
    }
}

/// Orders the graph and renders every resource.
///
/// No partial artifact is produced: the first rendering error aborts.
///
/// # Errors
///
/// Returns `StrataError::UnresolvedPlaceholder` if an attribute still holds
/// a placeholder, or a serialization error for encoded documents.
pub fn synthesize(graph: &DependencyGraph<'_>, manifest: Manifest) -> Result<Artifact> {
    let order = graph.resolve_order();
    let mut resources = Vec::with_capacity(order.len());

    for pos in order {
        let node = graph.resources()[pos];
        let attributes = node
            .attributes
            .iter()
            .map(|(name, value)| Ok((name.clone(), value.render(&node.logical_id, name)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let depends_on = graph.dependencies_of(pos).into_iter().cloned().collect();
        tracing::debug!(logical_id = %node.logical_id, "synthesized resource");
        resources.push(SynthesizedResource {
            logical_id: node.logical_id.clone(),
            resource_type: node.resource_type,
            attributes,
            depends_on,
        });
    }

    tracing::info!(
        environment = %manifest.environment,
        resources = resources.len(),
        "synthesis complete"
    );
    Ok(Artifact {
        manifest,
        resources,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use strata_common::config::workshop_environments;
    use strata_common::error::StrataError;

    use super::*;
    use crate::attribute::{AttrValue, TemplatePart};
    use crate::construct::ConstructTree;

    fn manifest() -> Manifest {
        Manifest::for_settings(&workshop_environments()[0])
    }

    fn sample_tree() -> ConstructTree {
        let mut tree = ConstructTree::new("dev");
        let site = tree.create_child(tree.root(), "site").expect("site");
        let bucket = tree
            .resource(site, "bucket", ResourceType::Bucket)
            .attr("bucket", "workshop-dev")
            .attr("acl", "private")
            .add()
            .expect("bucket");
        let cdn = tree
            .resource(site, "cdn", ResourceType::Distribution)
            .attr(
                "origin",
                AttrValue::list([AttrValue::map([(
                    "domain_name",
                    bucket.attr("bucket_domain_name"),
                )])]),
            )
            .attr("enabled", true)
            .add()
            .expect("cdn");
        let _ = tree
            .resource(tree.root(), "endpoint", ResourceType::Output)
            .attr(
                "value",
                AttrValue::template([
                    TemplatePart::from("https://"),
                    cdn.reference("domain_name").into(),
                ]),
            )
            .add()
            .expect("output");
        tree
    }

    #[test]
    fn manifest_carries_backend_locator() {
        let manifest = manifest();
        assert_eq!(manifest.environment, "dev");
        assert_eq!(manifest.backend.key, "dev/terraform.dev.tfstate");
        assert_eq!(manifest.format_version, ARTIFACT_FORMAT_VERSION);
    }

    #[test]
    fn synthesis_orders_and_renders() {
        let tree = sample_tree();
        let graph = DependencyGraph::build(&tree).expect("graph");
        let artifact = synthesize(&graph, manifest()).expect("synth");

        let ids: Vec<&str> = artifact.resources.iter().map(|r| r.logical_id.as_str()).collect();
        assert_eq!(ids, vec!["site_bucket", "site_cdn", "endpoint"]);

        let cdn = artifact.resource("site_cdn").expect("cdn");
        assert_eq!(
            cdn.attributes["origin"],
            json!([{"domain_name": "${site_bucket.bucket_domain_name}"}])
        );
        assert_eq!(cdn.depends_on, vec![LogicalId::new("site_bucket")]);

        let endpoint = artifact.resource("endpoint").expect("endpoint");
        assert_eq!(endpoint.attributes["value"], json!("https://${site_cdn.domain_name}"));
    }

    #[test]
    fn synthesis_is_byte_identical_across_runs() {
        let tree = sample_tree();
        let first = synthesize(&DependencyGraph::build(&tree).expect("graph"), manifest())
            .expect("synth")
            .to_json_pretty()
            .expect("json");
        let second = synthesize(&DependencyGraph::build(&tree).expect("graph"), manifest())
            .expect("synth")
            .to_json_pretty()
            .expect("json");
        assert_eq!(first, second);

        let rebuilt = synthesize(&DependencyGraph::build(&sample_tree()).expect("graph"), manifest())
            .expect("synth")
            .to_json_pretty()
            .expect("json");
        assert_eq!(first, rebuilt);
    }

    #[test]
    fn placeholder_aborts_synthesis() {
        let mut tree = ConstructTree::new("dev");
        let root = tree.root();
        let _ = tree
            .resource(root, "fn", ResourceType::Function)
            .attr("filename", AttrValue::placeholder("function archive"))
            .add()
            .expect("fn");
        let graph = DependencyGraph::build(&tree).expect("graph");
        let err = synthesize(&graph, manifest()).unwrap_err();
        assert!(matches!(err, StrataError::UnresolvedPlaceholder { .. }), "got: {err}");
    }

    #[test]
    fn artifact_json_round_trips() {
        let tree = sample_tree();
        let artifact = synthesize(&DependencyGraph::build(&tree).expect("graph"), manifest()).expect("synth");
        let text = artifact.to_json_pretty().expect("json");
        assert!(text.contains("\"resource_type\": \"distribution\""), "got: {text}");
        let back: Artifact = serde_json::from_str(&text).expect("parse");
        assert_eq!(back, artifact);
    }

    #[test]
    fn of_type_filters_in_order() {
        let tree = sample_tree();
        let artifact = synthesize(&DependencyGraph::build(&tree).expect("graph"), manifest()).expect("synth");
        assert_eq!(artifact.of_type(ResourceType::Output).count(), 1);
        assert_eq!(artifact.position("site_bucket"), Some(0));
    }
}
