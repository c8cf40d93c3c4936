// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
use time::Duration;
use tokio::sync::Notify;
use url::Url;
// self
use token_broker::{
	auth::{Identity, SubjectId},
	broker::TokenBroker,
	clock::ManualClock,
	config::BrokerConfig,
	logout::{LogoutOptions, StaticNavigator},
	provider::{ProviderError, SilentAuthRequest},
};

fn build_broker(path: &str) -> Result<(TokenBroker, ManualClock)> {
	let config = BrokerConfig::builder(
		"https://api.storefront.test",
		Url::parse("https://shop.storefront.test/callback")?,
	)
	.build()?;
	let clock = ManualClock::default();
	let broker = TokenBroker::with_parts(
		config,
		Arc::new(clock.clone()),
		Arc::new(StaticNavigator::new(path)),
	);

	Ok((broker, clock))
}

fn counting_logout() -> (Arc<AtomicUsize>, impl Fn(LogoutOptions) + Send + Sync + 'static) {
	let count = Arc::new(AtomicUsize::new(0));
	let sink = count.clone();

	(count, move |_: LogoutOptions| {
		sink.fetch_add(1, Ordering::SeqCst);
	})
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn spawned_callers_share_one_provider_call() -> Result<()> {
	let (broker, _) = build_broker("/products")?;
	let gate = Arc::new(Notify::new());
	let calls = Arc::new(AtomicUsize::new(0));
	let provider = {
		let gate = gate.clone();
		let calls = calls.clone();

		move |_: SilentAuthRequest| {
			let gate = gate.clone();

			calls.fetch_add(1, Ordering::SeqCst);

			async move {
				gate.notified().await;

				Ok::<_, ProviderError>("token-shared".to_owned())
			}
		}
	};
	let (_, logout) = counting_logout();

	broker.setup(Arc::new(provider), Arc::new(logout), None);

	let leader = {
		let broker = broker.clone();

		tokio::spawn(async move { broker.get_token().await })
	};

	while !broker.is_in_flight() {
		tokio::task::yield_now().await;
	}

	let followers = (0..7)
		.map(|_| {
			let broker = broker.clone();

			tokio::spawn(async move { broker.get_token().await })
		})
		.collect::<Vec<_>>();

	while broker.metrics().coalesced() < 7 {
		tokio::task::yield_now().await;
	}

	gate.notify_one();

	let mut tokens = vec![leader.await?];

	for follower in followers {
		tokens.push(follower.await?);
	}

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert!(tokens.iter().all(|token| token.as_ref().map(|t| t.expose()) == Some("token-shared")));

	Ok(())
}

#[tokio::test]
async fn scripted_reject_twice_then_succeed() -> Result<()> {
	let (broker, _) = build_broker("/cart")?;
	let calls = Arc::new(AtomicUsize::new(0));
	let provider = {
		let calls = calls.clone();

		move |_: SilentAuthRequest| {
			let attempt = calls.fetch_add(1, Ordering::SeqCst);

			async move {
				tokio::task::yield_now().await;

				if attempt < 2 {
					Err(ProviderError::new("timeout").with_description("Timeout"))
				} else {
					Ok("token-third-try".to_owned())
				}
			}
		}
	};
	let (logouts, logout) = counting_logout();

	broker.setup(Arc::new(provider), Arc::new(logout), None);

	let (a, b, c) = tokio::join!(broker.get_token(), broker.get_token(), broker.get_token());

	assert!(a.is_none() && b.is_none() && c.is_none());
	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(broker.backoff_snapshot().failure_count, 1);

	assert!(broker.get_token().await.is_none());

	let token = broker.get_token().await;

	assert_eq!(token.as_ref().map(|t| t.expose()), Some("token-third-try"));
	assert_eq!(calls.load(Ordering::SeqCst), 3);
	assert_eq!(broker.backoff_snapshot().failure_count, 0);
	assert_eq!(logouts.load(Ordering::SeqCst), 0);

	Ok(())
}

#[tokio::test]
async fn setup_mid_flight_keeps_the_starting_provider() -> Result<()> {
	let (broker, _) = build_broker("/checkout")?;
	let gate = Arc::new(Notify::new());
	let old_provider = {
		let gate = gate.clone();

		move |_: SilentAuthRequest| {
			let gate = gate.clone();

			async move {
				gate.notified().await;

				Ok::<_, ProviderError>("token-old".to_owned())
			}
		}
	};
	let new_calls = Arc::new(AtomicUsize::new(0));
	let new_provider = {
		let new_calls = new_calls.clone();

		move |_: SilentAuthRequest| {
			new_calls.fetch_add(1, Ordering::SeqCst);

			async { Ok::<_, ProviderError>("token-new".to_owned()) }
		}
	};
	let (_, old_logout) = counting_logout();
	let (_, new_logout) = counting_logout();
	let shopper = Identity::new(SubjectId::new("auth0|shopper-3")?);

	broker.setup(Arc::new(old_provider), Arc::new(old_logout), Some(shopper));

	let (in_flight, ()) = tokio::join!(broker.get_token(), async {
		while !broker.is_in_flight() {
			tokio::task::yield_now().await;
		}

		broker.setup(Arc::new(new_provider), Arc::new(new_logout), None);
		gate.notify_one();
	});

	assert_eq!(in_flight.as_ref().map(|t| t.expose()), Some("token-old"));
	assert_eq!(new_calls.load(Ordering::SeqCst), 0);
	assert_eq!(broker.current_subject().as_deref(), Some("auth0|shopper-3"));

	let next = broker.get_token().await;

	assert_eq!(next.as_ref().map(|t| t.expose()), Some("token-new"));
	assert_eq!(new_calls.load(Ordering::SeqCst), 1);

	Ok(())
}

#[tokio::test]
async fn circuit_reopens_for_the_provider_after_the_window() -> Result<()> {
	let (broker, clock) = build_broker("/admin/reports")?;
	let calls = Arc::new(AtomicUsize::new(0));
	let provider = {
		let calls = calls.clone();

		move |_: SilentAuthRequest| {
			calls.fetch_add(1, Ordering::SeqCst);

			async { Err::<String, _>(ProviderError::network("provider unreachable")) }
		}
	};
	let (logouts, logout) = counting_logout();

	broker.setup(Arc::new(provider), Arc::new(logout), None);

	for _ in 0..3 {
		assert!(broker.get_token().await.is_none());
	}

	clock.advance(Duration::seconds(9));

	assert!(broker.get_token().await.is_none());
	assert_eq!(calls.load(Ordering::SeqCst), 3);

	clock.advance(Duration::seconds(1));

	assert!(broker.get_token().await.is_none());
	assert_eq!(calls.load(Ordering::SeqCst), 4);
	assert_eq!(broker.backoff_snapshot().failure_count, 1);
	assert_eq!(logouts.load(Ordering::SeqCst), 0);

	Ok(())
}
