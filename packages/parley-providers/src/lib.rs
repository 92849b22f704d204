//! Collaborator boundary: similarity search, web search and interaction logging.
//!
//! The traits are what the service depends on. The HTTP clients and the tracing sink are the
//! default implementations used by the binaries.

pub mod interaction;
pub mod similarity;
pub mod web_search;

mod error;
mod time_serde;

pub use error::{Error, Result};
pub use interaction::{InteractionEvent, TracingSink};
pub use similarity::HttpSimilaritySearch;
pub use web_search::HttpWebSearch;

use std::{future::Future, pin::Pin};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One passage returned by the similarity-search collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
	pub text: String,
	pub similarity: f32,
	pub document_id: String,
	pub chunk_index: u32,
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebHit {
	pub url: String,
	pub title: String,
	pub snippet: String,
	pub domain_trust_hint: f32,
}

pub trait SimilaritySearch
where
	Self: Send + Sync,
{
	/// Results are sorted by similarity descending and may hold fewer than `k` hits.
	fn search<'a>(
		&'a self,
		collection: &'a str,
		query_text: &'a str,
		k: u32,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>>;
}

pub trait WebSearch
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		query_text: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, Result<Vec<WebHit>>>;
}

pub trait InteractionSink
where
	Self: Send + Sync,
{
	fn notify<'a>(&'a self, event: &'a InteractionEvent) -> BoxFuture<'a, Result<()>>;
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Lower-cased host of a URL without a leading `www.`.
pub fn host_of(url: &str) -> Option<String> {
	let parsed = reqwest::Url::parse(url).ok()?;
	let host = parsed.host_str()?.to_ascii_lowercase();

	Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}
