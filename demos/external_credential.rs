//! Connects an identity to a mock OAuth provider, then serves its access token and refreshes
//! it once the stored credential turns stale.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use bearer_guard::{
	auth::{IdentityId, ProviderId},
	flows::CredentialManager,
	provider::ProviderDescriptor,
	store::MemoryCredentialStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let code_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("grant_type", "authorization_code");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("grant_type", "refresh_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access-2\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let descriptor = ProviderDescriptor::builder(ProviderId::new("demo-provider")?)
		.authorization_endpoint(Url::parse(&server.url("/authorize"))?)
		.token_endpoint(Url::parse(&server.url("/token"))?)
		.build()?;
	let store = Arc::new(MemoryCredentialStore::default());
	let manager = CredentialManager::new(store, descriptor, "demo-client", "demo-secret")?;
	let identity = IdentityId::new("ada@example.com")?;
	let redirect = Url::parse("https://app.example.com/api/figma/callback")?;

	println!("Authorize at: {}", manager.authorization_url(&redirect, "file_read", "demo-state"));

	let connected = manager.connect(&identity, "demo-code", &redirect).await?;

	println!("Connected: {connected:?}");
	println!("Live token: {}", manager.live_access_token(&identity).await?.expose());

	// Drop the expiry so the next lookup has to refresh.
	manager.store(&identity, connected.access_token, connected.refresh_token, None).await?;

	println!("Refreshed token: {}", manager.live_access_token(&identity).await?.expose());
	println!("Refresh attempts: {}", manager.refresh_metrics.attempts());

	code_mock.assert_calls_async(1).await;
	refresh_mock.assert_calls_async(1).await;

	Ok(())
}
