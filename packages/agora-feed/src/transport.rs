use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::watch;

use agora_domain::{Listing, Scope};

use crate::{BoxFuture, Error, Result};

/// One pair per fetch. The handle stays with the controller; the signal
/// travels into the transport.
pub fn abort_pair() -> (AbortHandle, AbortSignal) {
	let (tx, rx) = watch::channel(false);

	(AbortHandle { tx }, AbortSignal { rx })
}

#[derive(Debug)]
pub struct AbortHandle {
	tx: watch::Sender<bool>,
}
impl AbortHandle {
	pub fn abort(&self) {
		let _ = self.tx.send(true);
	}
}

#[derive(Clone, Debug)]
pub struct AbortSignal {
	rx: watch::Receiver<bool>,
}
impl AbortSignal {
	pub fn is_aborted(&self) -> bool {
		*self.rx.borrow()
	}

	/// Resolves once the handle fires. A dropped handle never fires, so
	/// this stays pending and the surrounding select resolves through the
	/// request branch.
	pub async fn aborted(&mut self) {
		loop {
			if self.is_aborted() {
				return;
			}
			if self.rx.changed().await.is_err() {
				std::future::pending::<()>().await;
			}
		}
	}
}

/// One page of the feed as delivered by the transport. Never mutated after
/// creation; aggregation happens only inside the controller's cache entry.
#[derive(Clone, Debug, Deserialize)]
pub struct FeedPage {
	pub items: Vec<Listing>,
	pub total: u64,
	pub total_is_estimate: bool,
	pub has_more: bool,
}

pub trait FeedTransport
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		scope: &'a Scope,
		page: u32,
		limit: u32,
		abort: AbortSignal,
	) -> BoxFuture<'a, Result<FeedPage>>;
}

/// Production transport: the listings endpoint, addressed with the wire
/// query-pair shape of the scope.
pub struct HttpTransport {
	client: Client,
	base_url: String,
}
impl HttpTransport {
	pub fn new(cfg: &agora_config::Feed) -> Result<Self> {
		let client =
			Client::builder().timeout(Duration::from_millis(cfg.fetch_timeout_ms)).build()?;

		Ok(Self { client, base_url: cfg.api_base.clone() })
	}
}
impl FeedTransport for HttpTransport {
	fn fetch<'a>(
		&'a self,
		scope: &'a Scope,
		page: u32,
		limit: u32,
		mut abort: AbortSignal,
	) -> BoxFuture<'a, Result<FeedPage>> {
		let mut query = scope.to_query_pairs();

		query.push(("page".to_string(), page.to_string()));
		query.push(("limit".to_string(), limit.to_string()));

		Box::pin(async move {
			let request =
				self.client.get(format!("{}/v1/listings", self.base_url)).query(&query).send();

			tokio::select! {
				response = request => {
					let page: FeedPage = response?.error_for_status()?.json().await?;

					Ok(page)
				},
				() = abort.aborted() => Err(Error::Aborted),
			}
		})
	}
}
