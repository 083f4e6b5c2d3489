use crate::{
    api,
    session::{CookieConfig, Gateway, RefreshCoordinator, UpstreamClient},
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub upstream_url: String,
    pub upstream_timeout_seconds: u64,
    pub refresh_timeout_seconds: u64,
    pub production: bool,
    pub access_cookie_name: String,
    pub refresh_cookie_name: String,
    pub access_cookie_max_age_seconds: i64,
    pub refresh_cookie_max_age_seconds: i64,
}

/// Wire the upstream client, refresh coordinator and cookie policy into a
/// [`Gateway`] shared by every request.
///
/// # Errors
/// Returns an error if the upstream client cannot be built.
pub fn gateway(args: &Args) -> Result<Gateway> {
    let upstream = UpstreamClient::with_timeout(
        &args.upstream_url,
        &args.refresh_cookie_name,
        Duration::from_secs(args.upstream_timeout_seconds),
    )?;

    let coordinator = RefreshCoordinator::new(Arc::new(upstream.clone()))
        .with_refresh_timeout(Duration::from_secs(args.refresh_timeout_seconds));

    let cookie_config = CookieConfig::new()
        .with_access_name(args.access_cookie_name.clone())
        .with_refresh_name(args.refresh_cookie_name.clone())
        .with_secure(args.production)
        .with_access_max_age_seconds(args.access_cookie_max_age_seconds)
        .with_refresh_max_age_seconds(args.refresh_cookie_max_age_seconds);

    Ok(Gateway::new(upstream, Arc::new(coordinator), cookie_config))
}

/// Execute the server action.
/// # Errors
/// Returns an error if the gateway cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let gateway = gateway(&args)?;

    let result = api::new(args.port, gateway).await;

    crate::cli::telemetry::shutdown_tracer();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(upstream_url: &str) -> Args {
        Args {
            port: 0,
            upstream_url: upstream_url.to_string(),
            upstream_timeout_seconds: 10,
            refresh_timeout_seconds: 15,
            production: true,
            access_cookie_name: "sid".to_string(),
            refresh_cookie_name: "rid".to_string(),
            access_cookie_max_age_seconds: 900,
            refresh_cookie_max_age_seconds: 0,
        }
    }

    #[test]
    fn gateway_uses_configured_cookie_policy() -> Result<()> {
        let gateway = gateway(&args("http://127.0.0.1:3000/"))?;
        assert_eq!(gateway.upstream().base_url(), "http://127.0.0.1:3000");

        let mut store = gateway.cookie_store(axum_extra::extract::cookie::CookieJar::default());
        store.set("sid", "a1");
        let jar = store.into_jar();
        let cookie = jar.get("sid");
        assert_eq!(cookie.and_then(|c| c.secure()), Some(true));
        Ok(())
    }

    #[test]
    fn gateway_rejects_invalid_upstream() {
        assert!(gateway(&args("not a url")).is_err());
    }
}
