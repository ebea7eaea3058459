// std
use std::sync::Arc;
// crates.io
use time::{Duration, OffsetDateTime, macros::datetime};
// self
use bearer_guard::revocation::{MemoryRevocationRegistry, RevocationRegistry, TokenId};

#[tokio::test]
async fn revoked_tokens_answer_through_the_trait_object() {
	let registry: Arc<dyn RevocationRegistry> = Arc::new(MemoryRevocationRegistry::default());
	let token = TokenId::of("header.payload.signature");
	let expires_at = OffsetDateTime::now_utc() + Duration::hours(1);

	assert!(!registry.is_revoked(&token).await.expect("Lookup should succeed."));

	registry.revoke(&token, expires_at).await.expect("Revocation should succeed.");

	assert!(registry.is_revoked(&token).await.expect("Lookup should succeed."));
	assert_eq!(registry.size().await.expect("Size should be available."), 1);
	assert!(registry.unrevoke(&token).await.expect("Unrevoke should succeed."));
	assert!(!registry.is_revoked(&token).await.expect("Lookup should succeed."));
}

#[test]
fn dead_entries_disappear_lazily_and_by_sweep() {
	let registry = MemoryRevocationRegistry::default();
	let now = datetime!(2025-11-10 12:00 UTC);
	let short = TokenId::of("short");
	let long = TokenId::of("long");

	registry.revoke_at(&short, now + Duration::minutes(1), now);
	registry.revoke_at(&long, now + Duration::hours(1), now);

	let later = now + Duration::minutes(5);

	assert!(!registry.is_revoked_at(&short, later));
	assert_eq!(registry.len(), 1, "The dead entry should be removed by the lookup.");
	assert_eq!(registry.sweep_at(now + Duration::hours(2)), 1);
	assert!(registry.is_empty());
}

#[test]
fn already_expired_tokens_are_never_stored() {
	let registry = MemoryRevocationRegistry::default();
	let now = datetime!(2025-11-10 12:00 UTC);

	registry.revoke_at(&TokenId::of("expired"), now, now);
	registry.revoke_at(&TokenId::of("older"), now - Duration::seconds(1), now);

	assert!(registry.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_revocations_and_lookups_do_not_interfere() {
	let registry = Arc::new(MemoryRevocationRegistry::default());
	let expires_at = OffsetDateTime::now_utc() + Duration::hours(1);
	let mut tasks = Vec::new();

	for i in 0..64 {
		let registry = registry.clone();

		tasks.push(tokio::spawn(async move {
			let token = TokenId::of(&format!("token-{i}"));

			registry.revoke(&token, expires_at).await.expect("Revocation should succeed.");
			registry.is_revoked(&token).await.expect("Lookup should succeed.")
		}));
	}

	for task in tasks {
		assert!(task.await.expect("Task should not panic."));
	}

	assert_eq!(registry.len(), 64);
}
