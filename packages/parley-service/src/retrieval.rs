//! Per-source retrieval with soft failure.
//!
//! Every call runs under its own timeout. An error or timeout for one source becomes an empty
//! candidate list for that source and a warning; nothing here aborts the query.

use std::{collections::HashSet, future::Future, sync::Arc, time::Duration};

use futures::future;

use parley_config::{Config, GroupTag, WEB_COLLECTION, WEB_OWNED_COLLECTION};
use parley_domain::{Candidate, Provenance, Source};
use parley_providers::{SimilaritySearch, WebHit, WebSearch};

use crate::{Error, Result};

/// One collection query in a fan-out.
#[derive(Clone, Debug)]
pub struct RetrievalRequest {
	pub source: Source,
	pub query_text: String,
	pub k: u32,
}
impl RetrievalRequest {
	pub fn new(source: Source, query_text: impl Into<String>, k: u32) -> Self {
		Self { source, query_text: query_text.into(), k }
	}
}

pub struct SourceRetriever {
	cfg: Arc<Config>,
	similarity: Arc<dyn SimilaritySearch>,
	web: Option<Arc<dyn WebSearch>>,
}
impl SourceRetriever {
	pub fn new(
		cfg: Arc<Config>,
		similarity: Arc<dyn SimilaritySearch>,
		web: Option<Arc<dyn WebSearch>>,
	) -> Self {
		Self { cfg, similarity, web }
	}

	pub fn has_web_search(&self) -> bool {
		self.web.is_some()
	}

	/// Queries one collection. Candidates keep the collaborator's order.
	pub async fn retrieve(&self, request: &RetrievalRequest) -> Vec<Candidate> {
		let collection = request.source.name.as_str();
		let search = self.similarity.search(collection, &request.query_text, request.k);

		match with_timeout(self.timeout_ms(), collection, search).await {
			Ok(mut hits) => {
				hits.truncate(request.k as usize);

				hits.into_iter()
					.map(|hit| {
						Candidate::new(
							&request.source,
							hit.similarity,
							hit.text,
							Provenance {
								document_id: hit.document_id,
								chunk_index: hit.chunk_index,
								url: hit.url,
								title: hit.title,
							},
						)
					})
					.collect()
			},
			Err(err) => {
				tracing::warn!(
					collection,
					error = %err,
					"Collection retrieval failed; continuing without it."
				);

				Vec::new()
			},
		}
	}

	/// Issues every request concurrently and returns one list per request, in request order.
	pub async fn retrieve_all(&self, requests: &[RetrievalRequest]) -> Vec<Vec<Candidate>> {
		future::join_all(requests.iter().map(|request| self.retrieve(request))).await
	}

	/// Runs up to `web.max_queries` web searches and folds the results into web candidates.
	///
	/// With `only` set, candidates of any other group are discarded.
	pub async fn search_web(&self, queries: &[String], only: Option<GroupTag>) -> Vec<Candidate> {
		let Some(web) = self.web.as_ref() else {
			return Vec::new();
		};
		let max_results = self
			.cfg
			.providers
			.web_search
			.as_ref()
			.map(|web_search| web_search.max_results)
			.unwrap_or(3);
		let searches = queries.iter().take(self.cfg.web.max_queries as usize).map(|query| {
			let search = web.search(query, max_results);

			async move {
				match with_timeout(self.timeout_ms(), WEB_COLLECTION, search).await {
					Ok(hits) => hits,
					Err(err) => {
						tracing::warn!(
							error = %err,
							"Web search failed; continuing without web results."
						);

						Vec::new()
					},
				}
			}
		});
		let hits: Vec<WebHit> = future::join_all(searches).await.into_iter().flatten().collect();
		let mut candidates = fold_web_hits(&self.cfg, hits);

		if let Some(group) = only {
			candidates.retain(|candidate| candidate.group() == group);
		}

		candidates
	}

	fn timeout_ms(&self) -> u64 {
		self.cfg.retrieval.timeout_ms
	}
}

pub fn web_source(cfg: &Config) -> Source {
	Source {
		name: WEB_COLLECTION.to_string(),
		group: GroupTag::ComparisonTarget,
		trust_weight: cfg.web.trust_weight,
		confidence_floor: cfg.web.confidence_floor,
	}
}

/// Owned domains speak for the candidate, so their weight is boosted up to full trust.
pub fn web_owned_source(cfg: &Config) -> Source {
	Source {
		name: WEB_OWNED_COLLECTION.to_string(),
		group: GroupTag::OwnPosition,
		trust_weight: (cfg.web.trust_weight * cfg.web.owned_domain_multiplier).min(1.0),
		confidence_floor: cfg.web.owned_confidence_floor,
	}
}

pub fn is_owned_domain(cfg: &Config, url: &str) -> bool {
	let Some(host) = parley_providers::host_of(url) else {
		return false;
	};

	cfg.web.owned_domains.iter().any(|domain| {
		host == *domain
			|| host.strip_suffix(domain.as_str()).is_some_and(|prefix| prefix.ends_with('.'))
	})
}

/// Converts web hits into candidates.
///
/// Repeated URLs keep their first occurrence. Hits are ordered by `domain_trust_hint`
/// descending, then by original rank, and that position becomes the chunk index.
pub fn fold_web_hits(cfg: &Config, hits: Vec<WebHit>) -> Vec<Candidate> {
	let mut seen = HashSet::new();
	let mut ranked: Vec<(usize, WebHit)> = hits
		.into_iter()
		.filter(|hit| seen.insert(hit.url.clone()))
		.enumerate()
		.collect();

	ranked.sort_by(|(left_rank, left), (right_rank, right)| {
		parley_domain::evidence::cmp_f32_desc(left.domain_trust_hint, right.domain_trust_hint)
			.then_with(|| left_rank.cmp(right_rank))
	});

	let external = web_source(cfg);
	let owned = web_owned_source(cfg);

	ranked
		.into_iter()
		.enumerate()
		.map(|(position, (_, hit))| {
			let source = if is_owned_domain(cfg, &hit.url) { &owned } else { &external };

			Candidate::new(
				source,
				cfg.web.assumed_similarity,
				hit.snippet,
				Provenance {
					document_id: hit.url.clone(),
					chunk_index: u32::try_from(position).unwrap_or(u32::MAX),
					url: Some(hit.url),
					title: Some(hit.title),
				},
			)
		})
		.collect()
}

async fn with_timeout<T, F>(timeout_ms: u64, label: &str, fut: F) -> Result<T>
where
	F: Future<Output = parley_providers::Result<T>>,
{
	match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
		Ok(result) => result.map_err(Error::from),
		Err(_) => Err(Error::Timeout { message: format!("{label} did not respond."), timeout_ms }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config() -> Config {
		parley_testkit::sample_config().expect("Sample config must be valid.")
	}

	fn web_hit(url: &str, domain_trust_hint: f32) -> WebHit {
		parley_testkit::web_hit(url, "t", "s", domain_trust_hint)
	}

	#[test]
	fn owned_domain_matches_host_and_subdomains() {
		let cfg = config();

		assert!(is_owned_domain(&cfg, "https://example-campaign.org/plan"));
		assert!(is_owned_domain(&cfg, "https://www.example-campaign.org/plan"));
		assert!(is_owned_domain(&cfg, "https://news.example-campaign.org/"));
		assert!(!is_owned_domain(&cfg, "https://notexample-campaign.org/"));
	}

	#[test]
	fn web_hits_are_ranked_by_trust_hint_then_rank() {
		let cfg = config();
		let candidates = fold_web_hits(
			&cfg,
			vec![
				web_hit("https://a.example.com/", 0.1),
				web_hit("https://b.example.com/", 0.9),
				web_hit("https://a.example.com/", 1.0),
				web_hit("https://c.example.com/", 0.1),
			],
		);
		let urls: Vec<&str> = candidates
			.iter()
			.map(|candidate| candidate.provenance().document_id.as_str())
			.collect();
		let chunks: Vec<u32> =
			candidates.iter().map(|candidate| candidate.provenance().chunk_index).collect();

		assert_eq!(
			urls,
			["https://b.example.com/", "https://a.example.com/", "https://c.example.com/"]
		);
		assert_eq!(chunks, [0, 1, 2]);
	}

	#[test]
	fn owned_web_weight_is_boosted_and_clamped() {
		let mut cfg = config();

		cfg.web.owned_domain_multiplier = 10.0;

		let candidates = fold_web_hits(
			&cfg,
			vec![web_hit("https://example-campaign.org/", 0.0), web_hit("https://other.org/", 0.0)],
		);

		assert_eq!(candidates[0].collection(), WEB_OWNED_COLLECTION);
		assert_eq!(candidates[0].group(), GroupTag::OwnPosition);
		assert_eq!(candidates[0].trust_weight(), 1.0);
		assert_eq!(candidates[1].collection(), WEB_COLLECTION);
		assert_eq!(candidates[1].confidence(), 0.6 * 0.4);
	}
}
