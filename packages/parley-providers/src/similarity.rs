use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use parley_config::ProviderConfig;

use crate::{BoxFuture, Error, Result, SearchHit, SimilaritySearch};

pub struct HttpSimilaritySearch {
	cfg: ProviderConfig,
	client: Client,
}
impl HttpSimilaritySearch {
	pub fn new(cfg: &ProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { cfg: cfg.clone(), client })
	}

	async fn search_inner(
		&self,
		collection: &str,
		query_text: &str,
		k: u32,
	) -> Result<Vec<SearchHit>> {
		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let body = serde_json::json!({ "collection": collection, "query": query_text, "k": k });
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&self.cfg.api_key, &self.cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		let mut hits = parse_search_response(json)?;

		hits.truncate(k as usize);

		Ok(hits)
	}
}
impl SimilaritySearch for HttpSimilaritySearch {
	fn search<'a>(
		&'a self,
		collection: &'a str,
		query_text: &'a str,
		k: u32,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(self.search_inner(collection, query_text, k))
	}
}

fn parse_search_response(json: Value) -> Result<Vec<SearchHit>> {
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Search response is missing results array.".to_string(),
		})?;
	let mut hits = Vec::with_capacity(results.len());

	for (fallback_index, item) in results.iter().enumerate() {
		let text = item
			.get("text")
			.or_else(|| item.get("passage"))
			.and_then(|v| v.as_str())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Search result missing text.".to_string(),
			})?;
		let similarity = item
			.get("similarity")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Search result missing similarity.".to_string(),
			})? as f32;
		let metadata = item.get("metadata").unwrap_or(item);
		let document_id = metadata
			.get("document_id")
			.and_then(|v| v.as_str())
			.map(str::to_string)
			.unwrap_or_else(|| format!("result-{fallback_index}"));
		let chunk_index = metadata
			.get("chunk_index")
			.and_then(|v| v.as_u64())
			.and_then(|v| u32::try_from(v).ok())
			.unwrap_or(0);
		let url = metadata.get("url").and_then(|v| v.as_str()).map(str::to_string);
		let title = metadata.get("title").and_then(|v| v.as_str()).map(str::to_string);

		hits.push(SearchHit {
			text: text.to_string(),
			similarity,
			document_id,
			chunk_index,
			url,
			title,
		});
	}

	hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

	Ok(hits)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hits_with_nested_metadata() {
		let json = serde_json::json!({
			"results": [
				{
					"text": "Secure the border.",
					"score": 0.8,
					"metadata": { "document_id": "platform.md", "chunk_index": 3 }
				},
				{
					"passage": "Fund schools.",
					"similarity": 0.9,
					"document_id": "schools.md"
				}
			]
		});
		let hits = parse_search_response(json).expect("parse failed");

		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].document_id, "schools.md");
		assert_eq!(hits[0].chunk_index, 0);
		assert_eq!(hits[1].chunk_index, 3);
		assert_eq!(hits[1].text, "Secure the border.");
	}

	#[test]
	fn rejects_hits_without_similarity() {
		let json = serde_json::json!({ "data": [{ "text": "x" }] });

		assert!(parse_search_response(json).is_err());
	}
}
