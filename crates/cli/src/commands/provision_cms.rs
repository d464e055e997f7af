//! `sift provision-cms`: wait for the CMS, then set the admin token.

use sift_cms::{ProvisionSettings, provision_admin_token};
use sift_config::AppConfig;
use tracing::debug;

pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let settings = ProvisionSettings::from_config(&config.cms)?;

    println!("🛠️  Provisioning CMS at {}", settings.host);
    println!("   Admin: {}", settings.email);
    debug!(
        max_attempts = settings.max_attempts,
        poll_interval = ?settings.poll_interval,
        "Waiting for CMS login"
    );

    provision_admin_token(&settings).await?;

    println!("   ✅ Admin static token set");
    Ok(())
}
