//! Campaign Enumerator.

use tracing::{error, info};

use bounce_core::Campaign;

use crate::error::IngestError;
use crate::source::BounceSource;

/// List every campaign visible to the configured account.
///
/// Credentials are checked before any request goes out. Any failure here is
/// fatal to the run: without a campaign list there is nothing to paginate.
pub async fn enumerate_campaigns(source: &dyn BounceSource) -> Result<Vec<Campaign>, IngestError> {
    source.check_credentials()?;

    match source.list_campaigns().await {
        Ok(campaigns) => {
            info!(
                source = source.source_name(),
                count = campaigns.len(),
                "campaigns enumerated"
            );
            Ok(campaigns)
        }
        Err(e) => {
            error!(source = source.source_name(), error = %e, "campaign enumeration failed");
            Err(e)
        }
    }
}
