use anyhow::{Context, Result};
use clap::Args;

use crate::context::{PathSettings, PbschemaConfig, ProjectContext};
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Initialize",
    commands: &[
        "pbschema init                          # Create .pbschema/config.toml and pb_schema/",
        "pbschema init --schema-dir schema      # Keep collection JSON files in schema/",
        "pbschema init --force                  # Overwrite an existing config with defaults",
    ],
}];

#[derive(Args)]
pub struct InitArgs {
    /// Directory holding the collection JSON files, relative to the project root
    #[arg(long)]
    pub schema_dir: Option<String>,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

pub fn handle_init(args: InitArgs, output: &OutputManager) -> Result<()> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let ctx = ProjectContext::from_root(current_dir.clone())?;

    output.heading("Initialize pbschema");

    if ctx.is_initialized() && !args.force {
        output.warning(&format!(
            "Already initialized: {}",
            ctx.display_path(&ctx.config_path)
        ));
        output.info("Use --force to overwrite the configuration with defaults.");
        return Ok(());
    }

    let mut config = PbschemaConfig::default();
    if let Some(schema_dir) = args.schema_dir {
        config.pbschema = PathSettings {
            schema_dir,
            ..PathSettings::default()
        };
    }

    std::fs::create_dir_all(&ctx.state_dir)
        .with_context(|| format!("Failed to create {}", ctx.state_dir.display()))?;

    let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
    std::fs::write(&ctx.config_path, content)
        .with_context(|| format!("Failed to write {}", ctx.config_path.display()))?;
    output.success(&format!("Created {}", ctx.display_path(&ctx.config_path)));

    let schema_dir = current_dir.join(&config.pbschema.schema_dir);
    if schema_dir.exists() {
        output.bullet(&format!("Using existing {}", ctx.display_path(&schema_dir)));
    } else {
        std::fs::create_dir_all(&schema_dir)
            .with_context(|| format!("Failed to create {}", schema_dir.display()))?;
        output.success(&format!("Created {}", ctx.display_path(&schema_dir)));
    }

    output.info("Next steps:");
    output.bullet("Add one JSON file per collection to the schema directory");
    output.bullet("Run 'pbschema diff' to see pending changes");
    output.bullet("Run 'pbschema snapshot' once the changes are applied");

    Ok(())
}
