//! First-run aid: list both sides so an operator can write bindings.

use tracing::info;

use upcachet_adapters::{AdapterError, MonitoringService, StatusPageService};
use upcachet_types::{AccountDetails, Component, ComponentId, MonitorId};

use crate::scheduler::log_account_usage;

/// Placeholder monitor written into a fresh configuration.
pub const EXAMPLE_MONITOR: MonitorId = 123;

/// Placeholder components bound to [`EXAMPLE_MONITOR`].
pub const EXAMPLE_COMPONENTS: [ComponentId; 2] = [456, 789];

/// Everything an operator needs to fill in the bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub account: AccountDetails,
    /// Monitor IDs and their names.
    pub monitors: Vec<(MonitorId, String)>,
    pub components: Vec<Component>,
}

/// List all monitors and all status-page components, logging each.
///
/// Account details are fetched first so a bad monitoring key fails before
/// anything else is listed.
pub async fn discover(
    monitoring: &dyn MonitoringService,
    status_page: &dyn StatusPageService,
) -> Result<Discovery, AdapterError> {
    let account = monitoring.get_account_details().await?;
    log_account_usage(&account);

    info!("no monitor-component bindings configured; here is a list of monitors:");
    let monitors: Vec<_> = monitoring
        .get_monitors()
        .await?
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect();
    for (id, name) in &monitors {
        info!("{} - {}", id, name);
    }

    info!("and here is the list of status page components:");
    let components = status_page.list_components().await?;
    for component in &components {
        info!("{} - {}", component.id, component.name);
    }

    Ok(Discovery {
        account,
        monitors,
        components,
    })
}
