pub mod diff;
pub mod init;
pub mod order;
pub mod snapshot;
pub mod status;

use anyhow::{Context, Result};
use pbschema::{SchemaDefinition, SchemaSnapshot, load_schema_definition, load_snapshot};

use crate::context::ProjectContext;
use crate::output::OutputManager;

/// Locate the project and make sure `pbschema init` has been run.
pub fn initialized_context(output: &OutputManager) -> Result<ProjectContext> {
    let ctx = ProjectContext::find()?;

    if !ctx.is_initialized() {
        output.error("pbschema is not initialized in this project.");
        output.info("Run 'pbschema init' first to initialize.");
        anyhow::bail!("Project not initialized");
    }

    output.verbose(&format!("Project root: {}", ctx.project_root.display()));
    Ok(ctx)
}

/// Load the current schema definition and the recorded snapshot, if any.
pub fn load_project_state(
    ctx: &ProjectContext,
    output: &OutputManager,
) -> Result<(SchemaDefinition, Option<SchemaSnapshot>)> {
    let definition = load_schema_definition(&ctx.schema_dir)
        .with_context(|| format!("Failed to load schema from {}", ctx.display_path(&ctx.schema_dir)))?;
    output.verbose(&format!(
        "Loaded {} collection(s) from {}",
        definition.len(),
        ctx.display_path(&ctx.schema_dir)
    ));

    let snapshot = load_snapshot(&ctx.snapshot_path)
        .with_context(|| format!("Failed to load snapshot {}", ctx.display_path(&ctx.snapshot_path)))?;
    match &snapshot {
        Some(snapshot) => output.verbose(&format!(
            "Loaded snapshot v{} ({} collection(s), recorded {})",
            snapshot.version,
            snapshot.collections.len(),
            snapshot.timestamp.to_rfc3339()
        )),
        None => output.verbose("No snapshot recorded yet; every collection is new"),
    }

    Ok((definition, snapshot))
}
