mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Analysis, AwarenessCues, Collection, Config, DoctrinalTopic, DualSource, GroupTag, Policy,
	ProviderConfig, Providers, Retrieval, Service, Style, ToneCues, Web, WebSearchProviderConfig,
};

use std::{collections::HashSet, fs, path::Path};

use regex::{Regex, RegexBuilder};

/// Names reserved for the pseudo-collections that web results are folded into.
pub const WEB_COLLECTION: &str = "web";
pub const WEB_OWNED_COLLECTION: &str = "web_owned";
/// Sequential retrieval stages per query: initial fan-out, supplemental round, style guidance.
/// Each is bounded by `retrieval.timeout_ms`.
pub const RETRIEVAL_STAGES: u64 = 3;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.providers.similarity.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.similarity.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.providers.similarity.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.similarity.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if let Some(web_search) = cfg.providers.web_search.as_ref() {
		if web_search.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: "providers.web_search.api_base must be non-empty.".to_string(),
			});
		}
		if web_search.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "providers.web_search.timeout_ms must be greater than zero.".to_string(),
			});
		}
		if web_search.max_results == 0 {
			return Err(Error::Validation {
				message: "providers.web_search.max_results must be greater than zero.".to_string(),
			});
		}
	}

	validate_collections(cfg)?;

	if cfg.retrieval.k == 0 || cfg.retrieval.k > 50 {
		return Err(Error::Validation {
			message: "retrieval.k must be in the range 1-50.".to_string(),
		});
	}
	if cfg.retrieval.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.pipeline_timeout_ms
		<= cfg.retrieval.timeout_ms.saturating_mul(RETRIEVAL_STAGES)
	{
		return Err(Error::Validation {
			message: format!(
				"retrieval.pipeline_timeout_ms must exceed {RETRIEVAL_STAGES}x retrieval.timeout_ms."
			),
		});
	}

	for (label, value) in [
		("web.trust_weight", cfg.web.trust_weight),
		("web.confidence_floor", cfg.web.confidence_floor),
		("web.owned_confidence_floor", cfg.web.owned_confidence_floor),
		("web.assumed_similarity", cfg.web.assumed_similarity),
		("dual_source.widened_floor", cfg.dual_source.widened_floor),
		("policy.confidence_tier_boundary", cfg.policy.confidence_tier_boundary),
		("style.gate_threshold", cfg.style.gate_threshold),
		("style.reduced_k_threshold", cfg.style.reduced_k_threshold),
	] {
		check_unit_interval(label, value)?;
	}

	if !cfg.web.owned_domain_multiplier.is_finite() || cfg.web.owned_domain_multiplier < 1.0 {
		return Err(Error::Validation {
			message: "web.owned_domain_multiplier must be a finite number of at least 1.0."
				.to_string(),
		});
	}
	if cfg.web.max_queries == 0 {
		return Err(Error::Validation {
			message: "web.max_queries must be greater than zero.".to_string(),
		});
	}
	if cfg.web.owned_domains.iter().any(|domain| domain.trim().is_empty()) {
		return Err(Error::Validation {
			message: "web.owned_domains entries must be non-empty.".to_string(),
		});
	}
	if cfg.dual_source.supplemental_k == 0 {
		return Err(Error::Validation {
			message: "dual_source.supplemental_k must be greater than zero.".to_string(),
		});
	}
	if let Some(collection) = cfg
		.collections
		.iter()
		.filter(|collection| {
			matches!(collection.group, GroupTag::OwnPosition | GroupTag::ComparisonTarget)
		})
		.find(|collection| cfg.dual_source.widened_floor > collection.confidence_floor)
	{
		return Err(Error::Validation {
			message: format!(
				"dual_source.widened_floor must not exceed collections.{}.confidence_floor.",
				collection.name
			),
		});
	}
	if cfg.style.reduced_k == 0 {
		return Err(Error::Validation {
			message: "style.reduced_k must be greater than zero.".to_string(),
		});
	}

	compile_patterns("policy.callback_patterns", &cfg.policy.callback_patterns)?;

	for (label, patterns) in [
		("analysis.truth_seeking_patterns", &cfg.analysis.truth_seeking_patterns),
		("analysis.comparison_patterns", &cfg.analysis.comparison_patterns),
		("analysis.statistics_patterns", &cfg.analysis.statistics_patterns),
		("analysis.recent_event_patterns", &cfg.analysis.recent_event_patterns),
		("analysis.factual_patterns", &cfg.analysis.factual_patterns),
	] {
		compile_patterns(label, patterns)?;
	}

	if cfg.analysis.doctrinal_topics.iter().any(|topic| topic.topic.trim().is_empty()) {
		return Err(Error::Validation {
			message: "analysis.doctrinal_topics.topic must be non-empty.".to_string(),
		});
	}

	Ok(())
}

/// Compiles a pattern table case-insensitively, naming the table on failure.
pub fn compile_patterns(label: &str, patterns: &[String]) -> Result<Vec<Regex>> {
	patterns
		.iter()
		.map(|pattern| {
			RegexBuilder::new(pattern).case_insensitive(true).build().map_err(|err| {
				Error::Validation { message: format!("{label} contains an invalid pattern: {err}.") }
			})
		})
		.collect()
}

fn validate_collections(cfg: &Config) -> Result<()> {
	let mut seen = HashSet::new();

	for collection in &cfg.collections {
		let name = collection.name.trim();

		if name.is_empty() {
			return Err(Error::Validation {
				message: "collections.name must be non-empty.".to_string(),
			});
		}
		if name == WEB_COLLECTION || name == WEB_OWNED_COLLECTION {
			return Err(Error::Validation {
				message: format!("collections.name {name} is reserved for web results."),
			});
		}
		if !seen.insert(name) {
			return Err(Error::Validation {
				message: format!("collections.name {name} is declared more than once."),
			});
		}

		check_unit_interval(&format!("collections.{name}.trust_weight"), collection.trust_weight)?;
		check_unit_interval(
			&format!("collections.{name}.confidence_floor"),
			collection.confidence_floor,
		)?;
	}

	for group in [GroupTag::OwnPosition, GroupTag::ComparisonTarget] {
		if cfg.collections_in(group).next().is_none() {
			let group = group.as_str();

			return Err(Error::Validation {
				message: format!("collections must include at least one {group} collection."),
			});
		}
	}

	Ok(())
}

fn check_unit_interval(label: &str, value: f32) -> Result<()> {
	if !value.is_finite() {
		return Err(Error::Validation { message: format!("{label} must be a finite number.") });
	}
	if !(0.0..=1.0).contains(&value) {
		return Err(Error::Validation {
			message: format!("{label} must be in the range 0.0-1.0."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for collection in &mut cfg.collections {
		collection.name = collection.name.trim().to_string();
	}
	for domain in &mut cfg.web.owned_domains {
		*domain = domain.trim().trim_start_matches("www.").to_ascii_lowercase();
	}

	cfg.analysis.topical_keywords.retain(|keyword| !keyword.trim().is_empty());
	cfg.analysis.opponent_names.retain(|name| !name.trim().is_empty());
	for keyword in &mut cfg.analysis.topical_keywords {
		*keyword = keyword.trim().to_lowercase();
	}
	for name in &mut cfg.analysis.opponent_names {
		*name = name.trim().to_lowercase();
	}
}
