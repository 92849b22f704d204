use std::sync::Arc;

use futures::future;

use parley_config::{Config, GroupTag};
use parley_domain::{CoverageStatus, EvidenceSet, QuestionAnalysis, QuestionType, Source};

use crate::retrieval::{RetrievalRequest, SourceRetriever};

const REQUIRED_GROUPS: [GroupTag; 2] = [GroupTag::OwnPosition, GroupTag::ComparisonTarget];

/// Makes sure a comparison answer can draw on both sides.
pub struct DualSourceEnforcer {
	cfg: Arc<Config>,
}
impl DualSourceEnforcer {
	pub fn new(cfg: Arc<Config>) -> Self {
		Self { cfg }
	}

	/// A no-op for anything but comparison questions.
	///
	/// When a side is missing, one supplemental round queries only that side's collections with
	/// the widened floor, plus web search when it is configured. All of the round's calls run
	/// concurrently. Whatever is still missing afterwards is reported as partial coverage.
	pub async fn enforce(
		&self,
		retriever: &SourceRetriever,
		evidence: EvidenceSet,
		analysis: &QuestionAnalysis,
		query_text: &str,
	) -> (EvidenceSet, CoverageStatus) {
		if analysis.question_type != QuestionType::Comparison {
			return (evidence, CoverageStatus::NotApplicable);
		}

		let missing = missing_groups(&evidence);

		if missing.is_empty() {
			return (evidence, CoverageStatus::Complete);
		}

		let requests = self.supplemental_requests(&missing, analysis, query_text);
		let web_searches =
			missing.iter().filter(|_| retriever.has_web_search()).map(|group| {
				let queries = supplemental_web_queries(*group, analysis, query_text);

				async move { retriever.search_web(&queries, Some(*group)).await }
			});
		let (mut lists, web_lists) = futures::join!(
			retriever.retrieve_all(&requests),
			future::join_all(web_searches)
		);

		lists.extend(web_lists);

		let evidence = evidence.extend(lists);
		let still_missing = missing_groups(&evidence);

		if still_missing.is_empty() {
			return (evidence, CoverageStatus::Complete);
		}

		let still_missing: Vec<&str> = still_missing.iter().map(|group| group.as_str()).collect();

		tracing::info!(
			missing = ?still_missing,
			"Dual-source coverage is still partial after supplemental retrieval."
		);

		(evidence, CoverageStatus::Partial)
	}

	fn supplemental_requests(
		&self,
		missing: &[GroupTag],
		analysis: &QuestionAnalysis,
		query_text: &str,
	) -> Vec<RetrievalRequest> {
		let widened_floor = self.cfg.dual_source.widened_floor;
		let k = self.cfg.dual_source.supplemental_k;

		missing
			.iter()
			.flat_map(|group| {
				let text = supplemental_query_text(*group, analysis, query_text);

				self.cfg.collections_in(*group).map(move |collection| {
					RetrievalRequest::new(
						Source::from(collection).with_floor(widened_floor),
						text.clone(),
						k,
					)
				})
			})
			.collect()
	}
}

fn missing_groups(evidence: &EvidenceSet) -> Vec<GroupTag> {
	REQUIRED_GROUPS.into_iter().filter(|group| !evidence.has_group(*group)).collect()
}

/// The comparison side is searched for the named opponents when there are any.
fn supplemental_query_text(
	group: GroupTag,
	analysis: &QuestionAnalysis,
	query_text: &str,
) -> String {
	if group == GroupTag::ComparisonTarget && !analysis.comparison_targets.is_empty() {
		return analysis.comparison_targets.join(" ");
	}

	query_text.to_string()
}

fn supplemental_web_queries(
	group: GroupTag,
	analysis: &QuestionAnalysis,
	query_text: &str,
) -> Vec<String> {
	if group == GroupTag::ComparisonTarget && !analysis.search_queries.is_empty() {
		return analysis.search_queries.clone();
	}

	vec![query_text.to_string()]
}
