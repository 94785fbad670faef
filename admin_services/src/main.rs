use admin_services::prelude::*;
use dispatch_core::prelude::bearer_auth;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // a local .env may carry the ADMIN_API_* variables
    dotenvy::dotenv().ok();
    let settings = Settings::load()?;
    info!(?settings, "starting");

    // no privileged shell around a CLI run: every call goes direct
    let mut services = AdminServices::new(settings.to_service_config()?, None);
    if let Some(token) = settings.token() {
        services.add_request_interceptor(|| bearer_auth(token.clone()));
    }
    services.add_response_interceptor(unwrap_envelope);

    let roles = services.roles.get_all_roles().await?;
    info!(count = roles.len(), "roles loaded");
    for role in &roles {
        println!("{:>6}  {}", role.id, role.name);
    }

    let users = services
        .users
        .list_users(&ListQuery::new().page(1, 20).status(EntityStatus::Enabled))
        .await?;
    println!("{} enabled users ({} on this page)", users.total, users.items.len());

    let tree = services.permissions.get_permission_tree().await?;
    println!("{} root permissions", tree.len());
    Ok(())
}
