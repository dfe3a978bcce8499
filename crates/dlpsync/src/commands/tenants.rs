//! `dlpsync tenants`: configured tenants, straight from the file.

use dlpsync_config::TenantEntry;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output::{self, TenantListing};

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let rows: Vec<TenantListing> = cfg
        .tenants()
        .map(|(role, name, entry)| TenantListing {
            name,
            role: role.to_string(),
            service_account: entry.service_account.clone(),
            tsg_id: entry.tsg_id.clone(),
            key_source: key_source(entry),
        })
        .collect();

    let rendered = output::render(global.output, &rows, |rows| output::tenants_table(rows))?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// Where the API key will come from, without reading it.
fn key_source(entry: &TenantEntry) -> String {
    match (&entry.api_key_env, &entry.api_key) {
        (Some(var), _) => format!("${var}"),
        (None, Some(_)) => "keyring or config".into(),
        (None, None) => "keyring".into(),
    }
}
