//! Arena-backed construct tree.
//!
//! Constructs and resources live in two flat vectors owned by the
//! [`ConstructTree`]; parents and children refer to each other through
//! integer handles only. A resource's logical id is derived from the local
//! names on the path from the root (excluded) to its owning construct, plus
//! a construct-local suffix.

use std::collections::BTreeSet;

use strata_common::constants::LOGICAL_ID_SEPARATOR;
use strata_common::error::{Result, StrataError};
use strata_common::types::LogicalId;

use crate::attribute::{AttrValue, Attributes};
use crate::resource::{ResourceHandle, ResourceNode, ResourceType};

/// Handle to a construct inside a [`ConstructTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstructId(usize);

/// One composable unit of the scope tree.
#[derive(Debug, Clone)]
pub struct ConstructNode {
    local_name: String,
    parent: Option<ConstructId>,
    children: Vec<ConstructId>,
    resources: Vec<usize>,
}

impl ConstructNode {
    /// Name of this construct, unique among its siblings.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Parent construct, `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<ConstructId> {
        self.parent
    }

    /// Child constructs in creation order.
    #[must_use]
    pub fn children(&self) -> &[ConstructId] {
        &self.children
    }
}

/// A tree of constructs and the resources they own.
#[derive(Debug, Clone)]
pub struct ConstructTree {
    constructs: Vec<ConstructNode>,
    resources: Vec<ResourceNode>,
}

impl ConstructTree {
    /// Creates a tree whose root construct is called `root_name`.
    #[must_use]
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            constructs: vec![ConstructNode {
                local_name: root_name.into(),
                parent: None,
                children: Vec::new(),
                resources: Vec::new(),
            }],
            resources: Vec::new(),
        }
    }

    /// Handle of the root construct.
    #[must_use]
    pub const fn root(&self) -> ConstructId {
        ConstructId(0)
    }

    /// Looks up a construct by handle.
    #[must_use]
    pub fn construct(&self, id: ConstructId) -> Option<&ConstructNode> {
        self.constructs.get(id.0)
    }

    /// Looks up a resource by handle.
    #[must_use]
    pub fn resource_node(&self, handle: &ResourceHandle) -> Option<&ResourceNode> {
        self.resources
            .get(handle.index)
            .filter(|node| node.logical_id == handle.logical_id)
    }

    /// Total number of resources in the tree.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Creates a child construct under `parent`.
    ///
    /// # Errors
    ///
    /// Returns `StrataError::DuplicateName` if a sibling already uses
    /// `local_name`, or `StrataError::NotFound` if `parent` is not a
    /// construct of this tree.
    pub fn create_child(
        &mut self,
        parent: ConstructId,
        local_name: impl Into<String>,
    ) -> Result<ConstructId> {
        let local_name = local_name.into();
        let parent_node = self.node(parent)?;
        if local_name.is_empty() {
            return Err(StrataError::Config {
                message: format!("empty construct name under \"{}\"", self.scope_path(parent)),
            });
        }
        if parent_node
            .children
            .iter()
            .any(|c| self.constructs[c.0].local_name == local_name)
        {
            return Err(StrataError::DuplicateName {
                scope: self.scope_path(parent),
                name: local_name,
            });
        }

        let id = ConstructId(self.constructs.len());
        self.constructs.push(ConstructNode {
            local_name,
            parent: Some(parent),
            children: Vec::new(),
            resources: Vec::new(),
        });
        self.constructs[parent.0].children.push(id);
        tracing::debug!(scope = %self.scope_path(id), "created construct");
        Ok(id)
    }

    /// Adds a resource to `construct`.
    ///
    /// # Errors
    ///
    /// Returns `StrataError::DuplicateName` if the construct already owns a
    /// resource with the same logical id, or `StrataError::NotFound` if
    /// `construct` is not part of this tree.
    pub fn add_resource(
        &mut self,
        construct: ConstructId,
        suffix: &str,
        resource_type: ResourceType,
        attributes: Attributes,
        depends_on: BTreeSet<LogicalId>,
    ) -> Result<ResourceHandle> {
        let logical_id = self.logical_id_for(construct, suffix)?;
        let owner = self.node(construct)?;
        if owner
            .resources
            .iter()
            .any(|&r| self.resources[r].logical_id == logical_id)
        {
            return Err(StrataError::DuplicateName {
                scope: self.scope_path(construct),
                name: logical_id.to_string(),
            });
        }

        let index = self.resources.len();
        tracing::debug!(%logical_id, %resource_type, "added resource");
        self.resources.push(ResourceNode {
            logical_id: logical_id.clone(),
            resource_type,
            attributes,
            explicit_depends_on: depends_on,
        });
        self.constructs[construct.0].resources.push(index);
        Ok(ResourceHandle {
            index,
            logical_id,
            resource_type,
        })
    }

    /// Starts a fluent resource declaration under `construct`.
    pub fn resource<'t>(
        &'t mut self,
        construct: ConstructId,
        suffix: impl Into<String>,
        resource_type: ResourceType,
    ) -> ResourceBuilder<'t> {
        ResourceBuilder {
            tree: self,
            construct,
            suffix: suffix.into(),
            resource_type,
            attributes: Attributes::new(),
            depends_on: BTreeSet::new(),
        }
    }

    /// Computes the logical id a resource with `suffix` would get in `construct`.
    ///
    /// # Errors
    ///
    /// Returns `StrataError::NotFound` for a foreign handle, or
    /// `StrataError::Config` for an empty suffix.
    pub fn logical_id_for(&self, construct: ConstructId, suffix: &str) -> Result<LogicalId> {
        let _ = self.node(construct)?;
        if suffix.is_empty() {
            return Err(StrataError::Config {
                message: format!("empty resource suffix in \"{}\"", self.scope_path(construct)),
            });
        }
        let mut segments: Vec<String> = self
            .path(construct)
            .into_iter()
            .skip(1)
            .map(sanitize_segment)
            .collect();
        segments.push(sanitize_segment(suffix));
        let separator = LOGICAL_ID_SEPARATOR.to_string();
        Ok(LogicalId::new(segments.join(separator.as_str())))
    }

    /// Local names from the root down to `construct`, root included.
    #[must_use]
    pub fn path(&self, construct: ConstructId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut cursor = self.constructs.get(construct.0);
        while let Some(node) = cursor {
            names.push(node.local_name.as_str());
            cursor = node.parent.and_then(|p| self.constructs.get(p.0));
        }
        names.reverse();
        names
    }

    /// Human-readable scope path of a construct (`root/child/grandchild`).
    #[must_use]
    pub fn scope_path(&self, construct: ConstructId) -> String {
        self.path(construct).join("/")
    }

    /// All resources in pre-order: a construct's own resources first, then
    /// those of its children in creation order.
    #[must_use]
    pub fn flatten(&self) -> Vec<&ResourceNode> {
        let mut out = Vec::with_capacity(self.resources.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = &self.constructs[id.0];
            out.extend(node.resources.iter().map(|&r| &self.resources[r]));
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    fn node(&self, id: ConstructId) -> Result<&ConstructNode> {
        self.constructs.get(id.0).ok_or_else(|| StrataError::NotFound {
            kind: "construct",
            id: id.0.to_string(),
        })
    }
}

/// Replaces every character outside `[A-Za-z0-9_-]` with the id separator.
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                LOGICAL_ID_SEPARATOR
            }
        })
        .collect()
}

/// Fluent declaration of one resource; finished with [`ResourceBuilder::add`].
#[derive(Debug)]
pub struct ResourceBuilder<'t> {
    tree: &'t mut ConstructTree,
    construct: ConstructId,
    suffix: String,
    resource_type: ResourceType,
    attributes: Attributes,
    depends_on: BTreeSet<LogicalId>,
}

impl ResourceBuilder<'_> {
    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Declares an explicit dependency on another resource.
    #[must_use]
    pub fn depends_on(mut self, resource: &ResourceHandle) -> Self {
        let _ = self.depends_on.insert(resource.logical_id().clone());
        self
    }

    /// Declares an explicit dependency by logical id.
    #[must_use]
    pub fn depends_on_id(mut self, logical_id: impl Into<LogicalId>) -> Self {
        let _ = self.depends_on.insert(logical_id.into());
        self
    }

    /// Adds the resource to the tree.
    ///
    /// # Errors
    ///
    /// See [`ConstructTree::add_resource`].
    pub fn add(self) -> Result<ResourceHandle> {
        self.tree.add_resource(
            self.construct,
            &self.suffix,
            self.resource_type,
            self.attributes,
            self.depends_on,
        )
    }
}
