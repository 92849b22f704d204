//! The response decision table.
//!
//! Every (question type, confidence tier, coverage) cell is spelled out in [`transition`]; the only
//! rule applied outside the table is the explicit callback request, which is evaluated last.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use parley_config::{GroupTag, Policy, WEB_COLLECTION, WEB_OWNED_COLLECTION};

use crate::{
	analysis::{QuestionAnalysis, QuestionType},
	directive::StyleDirective,
	evidence::EvidenceSet,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
	Complete,
	Partial,
	/// Dual-source coverage is only assessed for comparison questions.
	NotApplicable,
}
impl CoverageStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Complete => "complete",
			Self::Partial => "partial",
			Self::NotApplicable => "not_applicable",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
	High,
	Low,
	/// No content evidence survived retrieval and merging.
	Absent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFraming {
	InCharacter,
	/// In character, with a note that figures come from external sources.
	InCharacterExternalData,
	BreakCharacterComparison,
	BreakCharacterRecentEvent,
	BreakCharacterLowConfidence,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRequirements {
	pub web: bool,
	pub doctrinal: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponsePlan {
	pub question_type: QuestionType,
	pub stay_in_character: bool,
	pub offer_callback: bool,
	/// Whether the asker explicitly requested contact.
	pub callback_requested: bool,
	pub required_groups_present: BTreeSet<GroupTag>,
	pub style_directives: Vec<StyleDirective>,
	pub citations: CitationRequirements,
	pub framing: ResponseFraming,
	pub coverage: CoverageStatus,
	pub confidence_tier: ConfidenceTier,
	pub top_confidence: Option<f32>,
}
impl ResponsePlan {
	/// The safe terminal plan: answer cautiously and offer a callback.
	pub fn fallback() -> Self {
		Self {
			question_type: QuestionType::LowConfidenceFallback,
			stay_in_character: false,
			offer_callback: true,
			callback_requested: false,
			required_groups_present: BTreeSet::new(),
			style_directives: Vec::new(),
			citations: CitationRequirements::default(),
			framing: ResponseFraming::BreakCharacterLowConfidence,
			coverage: CoverageStatus::NotApplicable,
			confidence_tier: ConfidenceTier::Absent,
			top_confidence: None,
		}
	}
}

/// One cell of the decision table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
	pub stay_in_character: bool,
	pub offer_callback: bool,
	pub framing: ResponseFraming,
}

pub struct ResponsePolicyEngine {
	boundary: f32,
	callback_patterns: Vec<Regex>,
}
impl ResponsePolicyEngine {
	pub fn new(cfg: &Policy) -> parley_config::Result<Self> {
		Ok(Self {
			boundary: cfg.confidence_tier_boundary,
			callback_patterns: parley_config::compile_patterns(
				"policy.callback_patterns",
				&cfg.callback_patterns,
			)?,
		})
	}

	/// Total over every input: a missing or NaN confidence never reads as high.
	pub fn tier(&self, top_confidence: Option<f32>) -> ConfidenceTier {
		match top_confidence {
			None => ConfidenceTier::Absent,
			Some(confidence) if confidence >= self.boundary => ConfidenceTier::High,
			Some(_) => ConfidenceTier::Low,
		}
	}

	pub fn callback_requested(&self, query_text: &str) -> bool {
		self.callback_patterns.iter().any(|pattern| pattern.is_match(query_text))
	}

	pub fn plan(
		&self,
		query_text: &str,
		analysis: &QuestionAnalysis,
		evidence: &EvidenceSet,
		coverage: CoverageStatus,
		style_directives: Vec<StyleDirective>,
	) -> ResponsePlan {
		let top_confidence = evidence.top_content_confidence();
		let confidence_tier = self.tier(top_confidence);
		let cell = transition(analysis.question_type, confidence_tier, coverage);
		let callback_requested = self.callback_requested(query_text);
		let citations = CitationRequirements {
			web: evidence.candidates().iter().any(|candidate| {
				matches!(candidate.collection(), WEB_COLLECTION | WEB_OWNED_COLLECTION)
			}),
			doctrinal: analysis.needs_doctrinal_citation && evidence.has_group(GroupTag::Doctrinal),
		};

		ResponsePlan {
			question_type: analysis.question_type,
			stay_in_character: cell.stay_in_character,
			offer_callback: cell.offer_callback || callback_requested,
			callback_requested,
			required_groups_present: evidence.groups_present(),
			style_directives,
			citations,
			framing: cell.framing,
			coverage,
			confidence_tier,
			top_confidence,
		}
	}
}

pub fn transition(
	question_type: QuestionType,
	tier: ConfidenceTier,
	coverage: CoverageStatus,
) -> Transition {
	use ConfidenceTier::{Absent, High, Low};
	use CoverageStatus::{Complete, NotApplicable, Partial};
	use ResponseFraming::*;

	let (stay_in_character, offer_callback, framing) = match (question_type, tier, coverage) {
		(QuestionType::Policy, High, _) => (true, false, InCharacter),
		(QuestionType::Policy, Low | Absent, _) => (true, true, InCharacter),
		(QuestionType::Statistics, High | Low, _) => (true, false, InCharacterExternalData),
		(QuestionType::Statistics, Absent, _) => (true, true, InCharacterExternalData),
		(QuestionType::TruthSeeking, High | Low, _) => (true, false, InCharacter),
		(QuestionType::TruthSeeking, Absent, _) => (true, true, InCharacter),
		(QuestionType::Comparison, High, Complete) => (false, false, BreakCharacterComparison),
		(QuestionType::Comparison, Low | Absent, Complete) =>
			(false, true, BreakCharacterComparison),
		// Coverage is always assessed for comparisons; an unassessed one is treated as partial.
		(QuestionType::Comparison, _, Partial | NotApplicable) =>
			(false, true, BreakCharacterComparison),
		(QuestionType::RecentEvent, _, _) => (false, true, BreakCharacterRecentEvent),
		(QuestionType::LowConfidenceFallback, _, _) => (false, true, BreakCharacterLowConfidence),
	};

	Transition { stay_in_character, offer_callback, framing }
}
