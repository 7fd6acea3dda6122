//! Compartment tree traversal with explicit bounds.
//!
//! Walks the compartment hierarchy depth-first from a root, visiting only
//! active children. Depth and node count are capped by `TraversalLimits`,
//! passed in by the caller.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::FetchError;

/// Lifecycle state of a usable compartment.
pub const ACTIVE: &str = "ACTIVE";

/// A compartment as returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compartment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lifecycle_state: String,
    /// Parent compartment OCID
    #[serde(default, rename = "compartmentId")]
    pub parent_id: Option<String>,
}

impl Compartment {
    pub fn is_active(&self) -> bool {
        self.lifecycle_state == ACTIVE
    }
}

/// Read access to the compartment hierarchy.
pub trait CompartmentSource {
    fn get_compartment(&self, id: &str) -> Result<Compartment, FetchError>;

    /// Direct children of `parent_id`, all pages drained.
    fn list_children(&self, parent_id: &str) -> Result<Vec<Compartment>, FetchError>;
}

/// Bounds on a traversal. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraversalLimits {
    /// Deepest level whose children are still listed (root is 0)
    pub max_depth: Option<usize>,
    /// Total compartments visited, root included
    pub max_nodes: Option<usize>,
}

impl TraversalLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build from counts where zero means unlimited.
    pub fn from_counts(max_depth: usize, max_nodes: usize) -> Self {
        Self {
            max_depth: (max_depth > 0).then_some(max_depth),
            max_nodes: (max_nodes > 0).then_some(max_nodes),
        }
    }

    fn allows_children_at(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }

    fn allows_another(&self, visited: usize) -> bool {
        self.max_nodes.map_or(true, |max| visited < max)
    }
}

/// A compartment reached by the walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitedCompartment {
    #[serde(flatten)]
    pub compartment: Compartment,
    pub depth: usize,
    /// Name of the parent in this walk, `None` for the root
    pub parent_name: Option<String>,
}

/// A compartment whose children could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSubtree {
    pub id: String,
    pub reason: String,
}

/// Everything a walk found, in pre-order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalReport {
    pub visited: Vec<VisitedCompartment>,
    pub skipped: Vec<SkippedSubtree>,
    /// The node limit stopped the walk before the tree was exhausted
    pub truncated: bool,
}

/// Walk the tree under `root_id`.
///
/// Failing to fetch the root is an error. Failing to list a compartment's
/// children skips that subtree and is recorded in the report. An inactive
/// root is not reported itself, but its active children are still walked.
pub fn walk<S: CompartmentSource + ?Sized>(
    source: &S,
    root_id: &str,
    limits: TraversalLimits,
) -> Result<TraversalReport, FetchError> {
    let root = source.get_compartment(root_id)?;
    let mut report = TraversalReport::default();
    let mut stack = vec![(root, 0usize, None::<String>)];

    while let Some((compartment, depth, parent_name)) = stack.pop() {
        if !limits.allows_another(report.visited.len()) {
            report.truncated = true;
            break;
        }
        debug!(id = %compartment.id, depth, "visiting compartment");

        if limits.allows_children_at(depth) {
            match source.list_children(&compartment.id) {
                Ok(children) => {
                    // reversed so the listing order is preserved when popping
                    for child in children.into_iter().filter(Compartment::is_active).rev() {
                        stack.push((child, depth + 1, Some(compartment.name.clone())));
                    }
                }
                Err(err) => {
                    warn!(id = %compartment.id, error = %err, "skipping subtree");
                    report.skipped.push(SkippedSubtree {
                        id: compartment.id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        // children are filtered on push, so only the root can be inactive here
        if compartment.is_active() {
            report.visited.push(VisitedCompartment {
                compartment,
                depth,
                parent_name,
            });
        }
    }

    Ok(report)
}
