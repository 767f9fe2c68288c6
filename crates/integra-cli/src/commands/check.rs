//! Check command implementation.

use std::path::PathBuf;

use miette::Result;

pub fn exec(catalog: Option<PathBuf>) -> Result<()> {
    let path = super::locate_catalog(catalog)?;
    integra_ops::ops_check::check(&path)
}
