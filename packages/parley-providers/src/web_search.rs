use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use parley_config::WebSearchProviderConfig;

use crate::{BoxFuture, Error, Result, WebHit, WebSearch};

pub struct HttpWebSearch {
	cfg: WebSearchProviderConfig,
	client: Client,
}
impl HttpWebSearch {
	pub fn new(cfg: &WebSearchProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { cfg: cfg.clone(), client })
	}

	async fn search_inner(&self, query_text: &str, max_results: u32) -> Result<Vec<WebHit>> {
		let max_results = max_results.min(self.cfg.max_results);
		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let body = serde_json::json!({ "query": query_text, "max_results": max_results });
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&self.cfg.api_key, &self.cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		let mut hits = parse_web_response(json)?;

		hits.truncate(max_results as usize);

		Ok(hits)
	}
}
impl WebSearch for HttpWebSearch {
	fn search<'a>(
		&'a self,
		query_text: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, Result<Vec<WebHit>>> {
		Box::pin(self.search_inner(query_text, max_results))
	}
}

/// Keeps provider rank order; results without a URL are skipped.
fn parse_web_response(json: Value) -> Result<Vec<WebHit>> {
	let results = json
		.get("results")
		.or_else(|| json.get("web").and_then(|web| web.get("results")))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Web search response is missing results array.".to_string(),
		})?;
	let mut hits = Vec::with_capacity(results.len());

	for item in results {
		let Some(url) = item.get("url").or_else(|| item.get("href")).and_then(|v| v.as_str())
		else {
			continue;
		};
		let title = item.get("title").and_then(|v| v.as_str()).unwrap_or(url);
		let snippet = item
			.get("snippet")
			.or_else(|| item.get("body"))
			.or_else(|| item.get("description"))
			.and_then(|v| v.as_str())
			.unwrap_or_default();
		let domain_trust_hint =
			item.get("domain_trust_hint").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;

		hits.push(WebHit {
			url: url.to_string(),
			title: title.to_string(),
			snippet: snippet.to_string(),
			domain_trust_hint,
		});
	}

	Ok(hits)
}
