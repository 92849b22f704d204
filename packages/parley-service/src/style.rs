use std::sync::Arc;

use parley_config::{Config, GroupTag};
use parley_domain::{Candidate, EvidenceSet, QuestionAnalysis, Source, StyleDirective};

use crate::retrieval::{RetrievalRequest, SourceRetriever};

pub struct StyleGuidanceSelector {
	cfg: Arc<Config>,
}
impl StyleGuidanceSelector {
	pub fn new(cfg: Arc<Config>) -> Self {
		Self { cfg }
	}

	/// Returns no directives unless the top content confidence reaches the gate. Guidance text is
	/// only used to choose directives and never leaves this function.
	pub async fn select(
		&self,
		retriever: &SourceRetriever,
		evidence: &EvidenceSet,
		analysis: &QuestionAnalysis,
	) -> Vec<StyleDirective> {
		let Some(top) = evidence.top_content_confidence() else {
			return Vec::new();
		};

		if top.is_nan() || top < self.cfg.style.gate_threshold {
			tracing::debug!(top_confidence = top, "Style guidance gated off.");

			return Vec::new();
		}

		let k = self.guidance_k(top);
		let query_text = if analysis.style_keywords.is_empty() {
			analysis.question_type.as_str().to_string()
		} else {
			analysis.style_keywords.join(" ")
		};
		let requests: Vec<RetrievalRequest> = self
			.cfg
			.collections_in(GroupTag::StyleGuidance)
			.map(|collection| RetrievalRequest::new(Source::from(collection), query_text.clone(), k))
			.collect();

		if requests.is_empty() {
			return Vec::new();
		}

		let guidance = parley_domain::merge(retriever.retrieve_all(&requests).await);

		parley_domain::map_guidance(guidance.candidates().iter().map(Candidate::text), analysis)
	}

	/// Very confident content needs less guidance.
	pub fn guidance_k(&self, top_confidence: f32) -> u32 {
		if top_confidence >= self.cfg.style.reduced_k_threshold {
			self.cfg.style.reduced_k.min(self.cfg.retrieval.k)
		} else {
			self.cfg.retrieval.k
		}
	}
}
