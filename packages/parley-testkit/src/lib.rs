//! In-memory collaborators for exercising the pipeline without a network.

mod error;

pub use error::{Error, Result};

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
	time::Duration,
};

use parley_config::Config;
use parley_providers::{
	BoxFuture, InteractionEvent, InteractionSink, SearchHit, SimilaritySearch, WebHit, WebSearch,
};

const SAMPLE_CONFIG_TOML: &str =
	include_str!("../../parley-config/tests/fixtures/sample_config.template.toml");

/// The validated sample configuration shared with the config test suite.
pub fn sample_config() -> Result<Config> {
	let cfg: Config = toml::from_str(SAMPLE_CONFIG_TOML)?;

	parley_config::validate(&cfg)?;

	Ok(cfg)
}

pub fn hit(text: &str, similarity: f32, document_id: &str, chunk_index: u32) -> SearchHit {
	SearchHit {
		text: text.to_string(),
		similarity,
		document_id: document_id.to_string(),
		chunk_index,
		url: None,
		title: None,
	}
}

pub fn web_hit(url: &str, title: &str, snippet: &str, domain_trust_hint: f32) -> WebHit {
	WebHit {
		url: url.to_string(),
		title: title.to_string(),
		snippet: snippet.to_string(),
		domain_trust_hint,
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCall {
	pub collection: String,
	pub query_text: String,
	pub k: u32,
}

#[derive(Clone, Debug)]
enum Behavior {
	Hits(Vec<SearchHit>),
	Fail,
	Delay(Duration, Vec<SearchHit>),
	Panic,
}

/// Answers each collection from a fixed script. Unscripted collections return no hits.
#[derive(Default)]
pub struct StaticSimilaritySearch {
	behaviors: HashMap<String, Behavior>,
	calls: Mutex<Vec<SearchCall>>,
}
impl StaticSimilaritySearch {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_hits(mut self, collection: &str, hits: Vec<SearchHit>) -> Self {
		self.behaviors.insert(collection.to_string(), Behavior::Hits(hits));

		self
	}

	pub fn failing(mut self, collection: &str) -> Self {
		self.behaviors.insert(collection.to_string(), Behavior::Fail);

		self
	}

	pub fn delayed(mut self, collection: &str, delay: Duration, hits: Vec<SearchHit>) -> Self {
		self.behaviors.insert(collection.to_string(), Behavior::Delay(delay, hits));

		self
	}

	pub fn panicking(mut self, collection: &str) -> Self {
		self.behaviors.insert(collection.to_string(), Behavior::Panic);

		self
	}

	pub fn into_arc(self) -> Arc<Self> {
		Arc::new(self)
	}

	pub fn calls(&self) -> Vec<SearchCall> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn calls_for(&self, collection: &str) -> Vec<SearchCall> {
		self.calls().into_iter().filter(|call| call.collection == collection).collect()
	}
}
impl SimilaritySearch for StaticSimilaritySearch {
	fn search<'a>(
		&'a self,
		collection: &'a str,
		query_text: &'a str,
		k: u32,
	) -> BoxFuture<'a, parley_providers::Result<Vec<SearchHit>>> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).push(SearchCall {
			collection: collection.to_string(),
			query_text: query_text.to_string(),
			k,
		});

		let behavior = self.behaviors.get(collection).cloned();

		Box::pin(async move {
			match behavior {
				None => Ok(Vec::new()),
				Some(Behavior::Hits(hits)) => Ok(truncated(hits, k)),
				Some(Behavior::Fail) => Err(parley_providers::Error::InvalidResponse {
					message: format!("Collection {collection} is unavailable."),
				}),
				Some(Behavior::Delay(delay, hits)) => {
					tokio::time::sleep(delay).await;

					Ok(truncated(hits, k))
				},
				Some(Behavior::Panic) => panic!("Scripted panic for collection {collection}."),
			}
		})
	}
}

#[derive(Default)]
pub struct StaticWebSearch {
	hits: Vec<WebHit>,
	fail: bool,
	delay: Option<Duration>,
	queries: Mutex<Vec<String>>,
}
impl StaticWebSearch {
	pub fn new(hits: Vec<WebHit>) -> Self {
		Self { hits, ..Self::default() }
	}

	pub fn failing() -> Self {
		Self { fail: true, ..Self::default() }
	}

	/// Answers every search only after `delay`.
	pub fn delayed(delay: Duration, hits: Vec<WebHit>) -> Self {
		Self { hits, delay: Some(delay), ..Self::default() }
	}

	pub fn queries(&self) -> Vec<String> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl WebSearch for StaticWebSearch {
	fn search<'a>(
		&'a self,
		query_text: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, parley_providers::Result<Vec<WebHit>>> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).push(query_text.to_string());

		Box::pin(async move {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if self.fail {
				return Err(parley_providers::Error::InvalidResponse {
					message: "Web search is unavailable.".to_string(),
				});
			}

			Ok(self.hits.iter().take(max_results as usize).cloned().collect())
		})
	}
}

#[derive(Default)]
pub struct RecordingSink {
	events: Mutex<Vec<InteractionEvent>>,
	fail: bool,
}
impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records events and then reports a failure for each one.
	pub fn failing() -> Self {
		Self { fail: true, ..Self::default() }
	}

	pub fn events(&self) -> Vec<InteractionEvent> {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl InteractionSink for RecordingSink {
	fn notify<'a>(
		&'a self,
		event: &'a InteractionEvent,
	) -> BoxFuture<'a, parley_providers::Result<()>> {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).push(event.clone());

		Box::pin(async move {
			if self.fail {
				return Err(parley_providers::Error::InvalidResponse {
					message: "Interaction sink is unavailable.".to_string(),
				});
			}

			Ok(())
		})
	}
}

fn truncated(mut hits: Vec<SearchHit>, k: u32) -> Vec<SearchHit> {
	hits.truncate(k as usize);

	hits
}
