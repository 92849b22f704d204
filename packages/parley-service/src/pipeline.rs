//! One query from raw text to the bundle handed to the generator.
//!
//! `answer` never fails. A panic anywhere in the run or an overrun of the pipeline budget ends on
//! the fallback plan, which always offers a callback.

use std::{any::Any, panic::AssertUnwindSafe, time::Duration};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::Instrument;
use uuid::Uuid;

use parley_config::GroupTag;
use parley_domain::{EvidenceSet, QuestionAnalysis, ResponsePlan, Source};
use parley_providers::InteractionEvent;

use crate::{ContextPackage, ParleyService, RetrievalRequest};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Query {
	pub text: String,
	/// Opaque to the core.
	pub requester_id: String,
	pub logging_consent: bool,
}
impl Query {
	pub fn new(
		text: impl Into<String>,
		requester_id: impl Into<String>,
		logging_consent: bool,
	) -> Self {
		Self { text: text.into(), requester_id: requester_id.into(), logging_consent }
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerBundle {
	pub trace_id: Uuid,
	pub analysis: QuestionAnalysis,
	pub evidence: EvidenceSet,
	pub plan: ResponsePlan,
	pub context: ContextPackage,
}

struct Outcome {
	analysis: QuestionAnalysis,
	evidence: EvidenceSet,
	plan: ResponsePlan,
}
impl Outcome {
	fn fallback() -> Self {
		Self {
			analysis: QuestionAnalysis::fallback(),
			evidence: EvidenceSet::default(),
			plan: ResponsePlan::fallback(),
		}
	}
}

impl ParleyService {
	pub async fn answer(&self, query: &Query) -> AnswerBundle {
		let trace_id = Uuid::new_v4();
		let span = tracing::info_span!("answer", trace_id = %trace_id);

		self.answer_inner(trace_id, query).instrument(span).await
	}

	async fn answer_inner(&self, trace_id: Uuid, query: &Query) -> AnswerBundle {
		let budget_ms = self.cfg.retrieval.pipeline_timeout_ms;
		let run = AssertUnwindSafe(self.run(query)).catch_unwind();
		let requester = query.logging_consent.then_some(query.requester_id.as_str());
		let outcome = match tokio::time::timeout(Duration::from_millis(budget_ms), run).await {
			Ok(Ok(outcome)) => outcome,
			Ok(Err(panic)) => {
				tracing::error!(
					query_text = %query.text,
					requester = ?requester,
					panic = panic_message(&*panic),
					"Pipeline faulted; answering with the fallback plan."
				);

				Outcome::fallback()
			},
			Err(_) => {
				tracing::error!(
					query_text = %query.text,
					requester = ?requester,
					timeout_ms = budget_ms,
					"Pipeline timed out; answering with the fallback plan."
				);

				Outcome::fallback()
			},
		};
		let context = self.assembler.assemble(
			&query.text,
			&outcome.analysis,
			&outcome.plan,
			&outcome.evidence,
		);

		self.notify(trace_id, query, &outcome).await;

		AnswerBundle {
			trace_id,
			analysis: outcome.analysis,
			evidence: outcome.evidence,
			plan: outcome.plan,
			context,
		}
	}

	async fn run(&self, query: &Query) -> Outcome {
		let analysis = self.analyzer.analyze(&query.text);
		let requests = self.initial_requests(&analysis, &query.text);
		let web_queries = if analysis.needs_external_search && !query.text.trim().is_empty() {
			analysis.search_queries.clone()
		} else {
			Vec::new()
		};
		let (mut lists, web) = futures::join!(
			self.retriever.retrieve_all(&requests),
			self.retriever.search_web(&web_queries, None)
		);

		lists.push(web);

		let evidence = parley_domain::merge(lists);
		let (evidence, coverage) =
			self.enforcer.enforce(&self.retriever, evidence, &analysis, &query.text).await;
		let directives = self.style.select(&self.retriever, &evidence, &analysis).await;
		let plan = self.policy.plan(&query.text, &analysis, &evidence, coverage, directives);

		tracing::info!(
			question_type = analysis.question_type.as_str(),
			coverage = plan.coverage.as_str(),
			evidence_count = evidence.len(),
			top_confidence = ?plan.top_confidence,
			stay_in_character = plan.stay_in_character,
			offer_callback = plan.offer_callback,
			"Response planned."
		);

		Outcome { analysis, evidence, plan }
	}

	fn initial_requests(
		&self,
		analysis: &QuestionAnalysis,
		query_text: &str,
	) -> Vec<RetrievalRequest> {
		let question = query_text.trim();

		if question.is_empty() {
			return Vec::new();
		}

		let k = self.cfg.retrieval.k;
		let mut requests: Vec<RetrievalRequest> = self
			.cfg
			.collections
			.iter()
			.filter(|collection| {
				matches!(collection.group, GroupTag::OwnPosition | GroupTag::ComparisonTarget)
			})
			.map(|collection| RetrievalRequest::new(Source::from(collection), question, k))
			.collect();

		if analysis.needs_doctrinal_citation && !analysis.doctrinal_topics.is_empty() {
			let topics = analysis.doctrinal_topics.join(" ");

			requests.extend(self.cfg.collections_in(GroupTag::Doctrinal).map(|collection| {
				RetrievalRequest::new(Source::from(collection), topics.clone(), k)
			}));
		}

		requests
	}

	async fn notify(&self, trace_id: Uuid, query: &Query, outcome: &Outcome) {
		let event = InteractionEvent {
			trace_id,
			requester: query.logging_consent.then(|| query.requester_id.clone()),
			query_text: query.text.clone(),
			analysis: outcome.analysis.clone(),
			plan: outcome.plan.clone(),
			evidence_count: outcome.evidence.len(),
			top_confidence: outcome.plan.top_confidence,
			query_fingerprint: fingerprint(&query.text),
			timestamp: OffsetDateTime::now_utc(),
		};
		let budget = Duration::from_millis(self.cfg.retrieval.timeout_ms);
		let delivery = AssertUnwindSafe(self.sink.notify(&event)).catch_unwind();

		match tokio::time::timeout(budget, delivery).await {
			Ok(Ok(Ok(()))) => {},
			Ok(Ok(Err(err))) => {
				tracing::warn!(error = %err, "Interaction sink failed; event dropped.");
			},
			Ok(Err(panic)) => {
				tracing::warn!(
					panic = panic_message(&*panic),
					"Interaction sink faulted; event dropped."
				);
			},
			Err(_) => {
				tracing::warn!(timeout_ms = budget.as_millis() as u64, "Interaction sink timed out.");
			},
		}
	}
}

/// Counts repeated questions without identifying the asker.
pub fn fingerprint(query_text: &str) -> String {
	blake3::hash(query_text.trim().to_lowercase().as_bytes()).to_hex().to_string()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	payload
		.downcast_ref::<&str>()
		.copied()
		.or_else(|| payload.downcast_ref::<String>().map(String::as_str))
		.unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fingerprint_ignores_case_and_padding() {
		assert_eq!(fingerprint("  What is your plan? "), fingerprint("what is your PLAN?"));
		assert_ne!(fingerprint("What is your plan?"), fingerprint("What is your position?"));
		assert_eq!(fingerprint("x").len(), 64);
	}
}
