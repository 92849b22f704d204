//! Closed set of communication directives handed to the generator in place of style guidance text.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::analysis::{AwarenessLevel, EmotionalTone, QuestionAnalysis, QuestionType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleDirective {
	LeadWithBenefit,
	MatchAwareness(AwarenessLevel),
	AvoidJargon,
	AcknowledgeConcern,
	LeadWithProof,
	Differentiate,
	CiteSpecificNumbers,
	EmphasizeHonesty,
	InviteAction,
	Conversational,
}
impl StyleDirective {
	pub fn tag(self) -> String {
		match self {
			Self::LeadWithBenefit => "lead_with_benefit".to_string(),
			Self::MatchAwareness(level) => format!("match_awareness:{}", level.as_str()),
			Self::AvoidJargon => "avoid_jargon".to_string(),
			Self::AcknowledgeConcern => "acknowledge_concern".to_string(),
			Self::LeadWithProof => "lead_with_proof".to_string(),
			Self::Differentiate => "differentiate".to_string(),
			Self::CiteSpecificNumbers => "cite_specific_numbers".to_string(),
			Self::EmphasizeHonesty => "emphasize_honesty".to_string(),
			Self::InviteAction => "invite_action".to_string(),
			Self::Conversational => "conversational".to_string(),
		}
	}
}
impl fmt::Display for StyleDirective {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.tag())
	}
}
impl Serialize for StyleDirective {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.tag())
	}
}

const PASSAGE_CUES: &[(&[&str], StyleDirective)] = &[
	(&["benefit", "what's in it for"], StyleDirective::LeadWithBenefit),
	(&["jargon", "plain language", "simple words", "simplify"], StyleDirective::AvoidJargon),
	(&["empath", "reassur", "acknowledge"], StyleDirective::AcknowledgeConcern),
	(&["proof", "evidence", "credib", "testimonial"], StyleDirective::LeadWithProof),
	(&["call to action", "urgency", "next step"], StyleDirective::InviteAction),
	(&["conversational", "friendly", "first-person", "first person"], StyleDirective::Conversational),
];

/// Maps retrieved guidance passages onto directives. Passage text only selects directives; none
/// of it is carried forward.
///
/// Without guidance there is nothing to map and the result is empty.
pub fn map_guidance<'a, I>(passages: I, analysis: &QuestionAnalysis) -> Vec<StyleDirective>
where
	I: IntoIterator<Item = &'a str>,
{
	let passages: Vec<String> = passages.into_iter().map(str::to_lowercase).collect();

	if passages.is_empty() {
		return Vec::new();
	}

	let mut directives =
		vec![StyleDirective::LeadWithBenefit, StyleDirective::MatchAwareness(analysis.awareness_level)];

	for (cues, directive) in PASSAGE_CUES {
		if passages.iter().any(|passage| cues.iter().any(|cue| passage.contains(cue))) {
			directives.push(*directive);
		}
	}

	match analysis.emotional_tone {
		EmotionalTone::Concerned => directives.push(StyleDirective::AcknowledgeConcern),
		EmotionalTone::Skeptical => directives.push(StyleDirective::LeadWithProof),
		EmotionalTone::Supportive => directives.push(StyleDirective::InviteAction),
		EmotionalTone::Curious | EmotionalTone::Neutral =>
			directives.push(StyleDirective::Conversational),
	}
	match analysis.awareness_level {
		AwarenessLevel::Unaware | AwarenessLevel::ProblemAware =>
			directives.push(StyleDirective::AvoidJargon),
		AwarenessLevel::MostAware => directives.push(StyleDirective::InviteAction),
		AwarenessLevel::SolutionAware | AwarenessLevel::ProductAware => {},
	}
	match analysis.question_type {
		QuestionType::Comparison => directives.push(StyleDirective::Differentiate),
		QuestionType::Statistics => directives.push(StyleDirective::CiteSpecificNumbers),
		QuestionType::TruthSeeking => directives.push(StyleDirective::EmphasizeHonesty),
		_ => {},
	}

	directives.sort();
	directives.dedup();

	directives
}
