//! Handler for `integra resolve` and `integra solve`.

use miette::Result;

use integra_ops::ops_resolve::{self, Engine, ResolveOptions};

use crate::cli::EngineArgs;

pub fn exec(args: EngineArgs, engine: Engine) -> Result<()> {
    let catalog = super::locate_catalog(args.catalog)?;
    let config = match args.config {
        Some(path) => path,
        None => catalog
            .parent()
            .map(|dir| dir.join(integra_core::CONFIG_FILE))
            .unwrap_or_else(|| integra_core::CONFIG_FILE.into()),
    };

    tracing::debug!("using config {}", config.display());

    let opts = ResolveOptions {
        catalog,
        config,
        json: args.json,
    };
    ops_resolve::resolve(&args.roots, engine, &opts)
}
