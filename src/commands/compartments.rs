//! Compartments command handler

use anyhow::{Context, Result};

use ocitools::cli::{CompartmentsArgs, GlobalArgs};
use ocitools::compartments::{walk, TraversalLimits, TraversalReport};
use ocitools::HttpCompartmentSource;

use super::{load_profile, request_timeout, require_endpoint};

/// Handle the compartments command.
#[cfg(not(tarpaulin_include))]
pub fn handle(global: &GlobalArgs, args: &CompartmentsArgs) -> Result<()> {
    let (config, profile) = load_profile(global)?;
    let limits = limits_for(config.traversal_limits(), args);
    let root = args.root.as_deref().unwrap_or(&profile.tenancy);

    let endpoint = require_endpoint(profile.identity_endpoint(), "identity")?;
    let source = HttpCompartmentSource::new(endpoint, request_timeout(&profile))
        .context("Failed to set up identity client")?;

    let report = walk(&source, root, limits)
        .with_context(|| format!("Failed to fetch root compartment {}", root))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.visited)?);
    } else {
        print!("{}", format_tree(&report));
    }

    for skipped in &report.skipped {
        eprintln!("Skipped children of {}: {}", skipped.id, skipped.reason);
    }
    if report.truncated && !global.quiet {
        eprintln!(
            "Stopped after {} compartments (raise --max-nodes or use 0 for no limit)",
            report.visited.len()
        );
    }
    Ok(())
}

/// CLI limits override configured ones; 0 still means unlimited.
pub fn limits_for(configured: TraversalLimits, args: &CompartmentsArgs) -> TraversalLimits {
    let from_cli = |value: Option<usize>, fallback: Option<usize>| match value {
        Some(0) => None,
        Some(n) => Some(n),
        None => fallback,
    };
    TraversalLimits {
        max_depth: from_cli(args.max_depth, configured.max_depth),
        max_nodes: from_cli(args.max_nodes, configured.max_nodes),
    }
}

/// `Name:`/`OCID:` blocks indented two spaces per level.
pub fn format_tree(report: &TraversalReport) -> String {
    let mut out = String::new();
    for visited in &report.visited {
        let indent = "  ".repeat(visited.depth);
        out.push_str(&format!("{}Name: {}\n", indent, visited.compartment.name));
        out.push_str(&format!("{}OCID: {}\n", indent, visited.compartment.id));
    }
    out
}
