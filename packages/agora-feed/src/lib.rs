pub mod controller;
pub mod transport;

mod error;

pub use controller::{FeedController, FeedSnapshot, FetchPhase, FilterParams};
pub use error::{Error, Result};
pub use transport::{AbortHandle, AbortSignal, FeedPage, FeedTransport, HttpTransport, abort_pair};

use std::{future::Future, pin::Pin};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
