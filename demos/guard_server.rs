//! Serves a small API behind the guard: a protected `/api/me`, the exempt `/api/auth/login`
//! route, and the `/tokens` administration routes.
//!
//! Pass a JSON configuration file as the first argument, or run without one to use a freshly
//! generated signing key. Both seeded identities sign in with the password `demo-password`.

// std
use std::sync::Arc;
// crates.io
use axum::{Router, routing::get};
use color_eyre::Result;
use tokio::net::TcpListener;
// self
use bearer_guard::{
	auth::{ADMIN_AUTHORITY, Identity, IdentityId, MemoryIdentityStore, hash_password},
	config::GuardConfig,
	revocation::{MemoryRevocationRegistry, RevocationSweeper},
	server::{self, GuardState, Principal},
	token::SigningKey,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = match std::env::args().nth(1) {
		Some(path) => GuardConfig::from_json_str(&std::fs::read_to_string(path)?)?,
		None => GuardConfig::from_json_str(&format!(
			r#"{{ "jwt": {{ "secret": "{}" }} }}"#,
			SigningKey::generate().to_base64()
		))?,
	};
	let identities = Arc::new(MemoryIdentityStore::default());

	let password = hash_password("demo-password")?;

	identities.insert(
		Identity::new(IdentityId::new("admin@example.com")?)
			.with_authority(ADMIN_AUTHORITY)
			.with_password_hash(password.clone()),
	);
	identities.insert(Identity::new(IdentityId::new("ada@example.com")?).with_password_hash(password));

	let registry = Arc::new(MemoryRevocationRegistry::default());
	let _sweeper = RevocationSweeper::spawn(registry.clone(), config.revocation.sweep_interval()?)?;
	let authenticator = config.authenticator(registry, identities)?;

	let state = GuardState::new(authenticator);
	let api = Router::new()
		.route(
			"/api/me",
			get(|Principal(context): Principal| async move {
				format!("{} ({} authorities)", context.identity.id, context.identity.authorities.len())
			}),
		)
		.nest("/api", server::login_router(state.clone()))
		.merge(server::admin_router(state.clone()));
	let listener = TcpListener::bind("127.0.0.1:3000").await?;

	println!("Listening on http://{}", listener.local_addr()?);

	axum::serve(listener, server::protect(api, state)).await?;

	Ok(())
}
