//! Init command implementation - creates the system catalog

use anyhow::{Context, Result};
use sl_db::Catalog;

use crate::cli::{GlobalArgs, InitArgs};
use crate::context::RuntimeContext;

/// Execute the init command
pub(crate) async fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let prefix = &ctx.project.config.database.table_prefix;
    let catalog = Catalog::new(ctx.db.clone(), prefix);

    let existed = catalog
        .exists()
        .await
        .with_context(|| format!("Failed to inspect catalog table {}", catalog.table()))?;
    catalog
        .ensure()
        .await
        .with_context(|| format!("Failed to create catalog table {}", catalog.table()))?;
    if existed {
        ctx.verbose(&format!("Catalog table {} already present", catalog.table()));
    } else {
        println!("Created catalog table {}", catalog.table());
    }

    let mut registered = 0;
    for module in &ctx.project.modules {
        let version = args.baseline.or_else(|| module.declared_max());
        let inserted = catalog
            .register_module(&module.name, version)
            .await
            .with_context(|| format!("Failed to register module '{}'", module.name))?;
        if inserted {
            registered += 1;
            match version {
                Some(v) => println!("  + {} (schema version {})", module.name, v),
                None => println!("  + {} (no schema version)", module.name),
            }
        } else {
            ctx.verbose(&format!("{} already registered", module.name));
        }
    }

    println!(
        "\nCatalog {} initialised: {} module(s) registered, {} already present",
        catalog.table(),
        registered,
        ctx.project.modules.len() - registered
    );
    Ok(())
}
