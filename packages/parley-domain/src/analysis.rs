use regex::Regex;
use serde::{Deserialize, Serialize};

use parley_config::{Analysis, AwarenessCues, ToneCues};

const COMPARISON_ENTITY_PATTERN: &str =
	r"(?:differs? from|compared? (?:to|with)|vs\.?|versus) (.+?)(?:\?|$)";
const MAX_DOCTRINAL_TOPICS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
	Comparison,
	Statistics,
	TruthSeeking,
	RecentEvent,
	Policy,
	LowConfidenceFallback,
}
impl QuestionType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Comparison => "comparison",
			Self::Statistics => "statistics",
			Self::TruthSeeking => "truth_seeking",
			Self::RecentEvent => "recent_event",
			Self::Policy => "policy",
			Self::LowConfidenceFallback => "low_confidence_fallback",
		}
	}
}

/// How much the asker already knows, ordered from least to most aware.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwarenessLevel {
	Unaware,
	ProblemAware,
	SolutionAware,
	ProductAware,
	MostAware,
}
impl AwarenessLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Unaware => "unaware",
			Self::ProblemAware => "problem_aware",
			Self::SolutionAware => "solution_aware",
			Self::ProductAware => "product_aware",
			Self::MostAware => "most_aware",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTone {
	Concerned,
	Skeptical,
	Supportive,
	Curious,
	Neutral,
}
impl EmotionalTone {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Concerned => "concerned",
			Self::Skeptical => "skeptical",
			Self::Supportive => "supportive",
			Self::Curious => "curious",
			Self::Neutral => "neutral",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
	pub question_type: QuestionType,
	pub awareness_level: AwarenessLevel,
	pub emotional_tone: EmotionalTone,
	pub needs_external_search: bool,
	pub needs_doctrinal_citation: bool,
	/// Web queries to issue when external search is needed.
	pub search_queries: Vec<String>,
	/// Opposing parties or entities named in a comparison.
	pub comparison_targets: Vec<String>,
	pub doctrinal_topics: Vec<String>,
	/// Query terms for the style-guidance collection.
	pub style_keywords: Vec<String>,
}
impl QuestionAnalysis {
	/// The analysis given to input that carries nothing to classify.
	pub fn degraded() -> Self {
		Self {
			question_type: QuestionType::Policy,
			awareness_level: AwarenessLevel::Unaware,
			emotional_tone: EmotionalTone::Neutral,
			needs_external_search: false,
			needs_doctrinal_citation: false,
			search_queries: Vec::new(),
			comparison_targets: Vec::new(),
			doctrinal_topics: Vec::new(),
			style_keywords: Vec::new(),
		}
	}

	/// The analysis attached to the safe terminal plan after a pipeline fault.
	pub fn fallback() -> Self {
		Self { question_type: QuestionType::LowConfidenceFallback, ..Self::degraded() }
	}
}

pub struct QuestionAnalyzer {
	truth_seeking: Vec<Regex>,
	comparison: Vec<Regex>,
	statistics: Vec<Regex>,
	recent_event: Vec<Regex>,
	factual: Vec<Regex>,
	comparison_entity: Regex,
	topical_keywords: Vec<WordCue>,
	opponent_names: Vec<WordCue>,
	awareness: AwarenessCues,
	tone: ToneCues,
	doctrinal_topics: Vec<(String, Vec<WordCue>)>,
}
impl QuestionAnalyzer {
	pub fn new(cfg: &Analysis) -> parley_config::Result<Self> {
		let compile = parley_config::compile_patterns;
		let comparison_entity = compile(
			"analysis.comparison_entity",
			&[COMPARISON_ENTITY_PATTERN.to_string()],
		)?
		.into_iter()
		.next()
		.ok_or_else(|| parley_config::Error::Validation {
			message: "analysis.comparison_entity must compile to one pattern.".to_string(),
		})?;

		Ok(Self {
			truth_seeking: compile("analysis.truth_seeking_patterns", &cfg.truth_seeking_patterns)?,
			comparison: compile("analysis.comparison_patterns", &cfg.comparison_patterns)?,
			statistics: compile("analysis.statistics_patterns", &cfg.statistics_patterns)?,
			recent_event: compile("analysis.recent_event_patterns", &cfg.recent_event_patterns)?,
			factual: compile("analysis.factual_patterns", &cfg.factual_patterns)?,
			comparison_entity,
			topical_keywords: word_cues("analysis.topical_keywords", &cfg.topical_keywords)?,
			opponent_names: word_cues("analysis.opponent_names", &cfg.opponent_names)?,
			awareness: AwarenessCues {
				most_aware: lowered(&cfg.awareness.most_aware),
				product_aware: lowered(&cfg.awareness.product_aware),
				solution_aware: lowered(&cfg.awareness.solution_aware),
				problem_aware: lowered(&cfg.awareness.problem_aware),
			},
			tone: ToneCues {
				concerned: lowered(&cfg.tone.concerned),
				skeptical: lowered(&cfg.tone.skeptical),
				supportive: lowered(&cfg.tone.supportive),
				curious: lowered(&cfg.tone.curious),
			},
			doctrinal_topics: cfg
				.doctrinal_topics
				.iter()
				.map(|topic| {
					word_cues("analysis.doctrinal_topics.stems", &topic.stems)
						.map(|stems| (topic.topic.clone(), stems))
				})
				.collect::<parley_config::Result<_>>()?,
		})
	}

	/// Classifies a raw query. Total: every input yields an analysis.
	pub fn analyze(&self, query_text: &str) -> QuestionAnalysis {
		let question = query_text.trim();

		if question.is_empty() {
			return QuestionAnalysis::degraded();
		}

		let lower = question.to_lowercase();
		let question_type = self.classify(&lower);
		let awareness_level = self.awareness_level(&lower);
		let emotional_tone = self.emotional_tone(&lower);
		let needs_external_search = matches!(
			question_type,
			QuestionType::Comparison
				| QuestionType::Statistics
				| QuestionType::RecentEvent
				| QuestionType::LowConfidenceFallback
		);
		let needs_doctrinal_citation = question_type == QuestionType::TruthSeeking
			&& !matches_any(&self.factual, &lower);
		let comparison_targets = if question_type == QuestionType::Comparison {
			self.comparison_targets(question, &lower)
		} else {
			Vec::new()
		};
		let search_queries = if needs_external_search {
			self.search_queries(question, question_type)
		} else {
			Vec::new()
		};
		let doctrinal_topics =
			if needs_doctrinal_citation { self.doctrinal_topics(&lower) } else { Vec::new() };
		let style_keywords = style_keywords(question_type, awareness_level, emotional_tone);

		QuestionAnalysis {
			question_type,
			awareness_level,
			emotional_tone,
			needs_external_search,
			needs_doctrinal_citation,
			search_queries,
			comparison_targets,
			doctrinal_topics,
			style_keywords,
		}
	}

	// Truth-seeking and comparison framing change the plan more than a plain policy match does,
	// so they are checked first.
	fn classify(&self, lower: &str) -> QuestionType {
		if matches_any(&self.truth_seeking, lower) {
			return QuestionType::TruthSeeking;
		}
		if matches_any(&self.comparison, lower)
			|| self.opponent_names.iter().any(|name| name.is_match(lower))
		{
			return QuestionType::Comparison;
		}
		if matches_any(&self.statistics, lower) {
			return QuestionType::Statistics;
		}
		if matches_any(&self.recent_event, lower) {
			return QuestionType::RecentEvent;
		}
		if self.topical_keywords.iter().any(|keyword| keyword.is_match(lower)) {
			return QuestionType::Policy;
		}

		QuestionType::LowConfidenceFallback
	}

	fn awareness_level(&self, lower: &str) -> AwarenessLevel {
		let cues = &self.awareness;

		for (level, words) in [
			(AwarenessLevel::MostAware, &cues.most_aware),
			(AwarenessLevel::ProductAware, &cues.product_aware),
			(AwarenessLevel::SolutionAware, &cues.solution_aware),
			(AwarenessLevel::ProblemAware, &cues.problem_aware),
		] {
			if contains_any(words, lower) {
				return level;
			}
		}

		AwarenessLevel::Unaware
	}

	fn emotional_tone(&self, lower: &str) -> EmotionalTone {
		let cues = &self.tone;

		for (tone, words) in [
			(EmotionalTone::Concerned, &cues.concerned),
			(EmotionalTone::Skeptical, &cues.skeptical),
			(EmotionalTone::Supportive, &cues.supportive),
			(EmotionalTone::Curious, &cues.curious),
		] {
			if contains_any(words, lower) {
				return tone;
			}
		}

		EmotionalTone::Neutral
	}

	fn comparison_entity(&self, question: &str) -> Option<String> {
		let captures = self.comparison_entity.captures(question)?;
		let entity = captures.get(1)?.as_str().trim().trim_end_matches(['.', '!', ',']);
		let entity = entity
			.strip_prefix("the ")
			.or_else(|| entity.strip_prefix("The "))
			.unwrap_or(entity)
			.trim();

		if entity.is_empty() { None } else { Some(entity.to_string()) }
	}

	fn comparison_targets(&self, question: &str, lower: &str) -> Vec<String> {
		let mut targets: Vec<String> = self
			.opponent_names
			.iter()
			.filter(|name| name.is_match(lower))
			.map(|name| name.text.clone())
			.collect();

		if let Some(entity) = self.comparison_entity(question) {
			let entity_lower = entity.to_lowercase();

			if !targets.iter().any(|target| entity_lower.contains(target.as_str())) {
				targets.push(entity);
			}
		}

		targets
	}

	fn search_queries(&self, question: &str, question_type: QuestionType) -> Vec<String> {
		let query = match question_type {
			QuestionType::Comparison => self
				.comparison_entity(question)
				.map(|entity| format!("{entity} position policy platform")),
			QuestionType::Statistics => Some(format!("{question} latest data statistics")),
			QuestionType::RecentEvent => Some(format!("{question} latest news")),
			_ => None,
		};

		vec![query.unwrap_or_else(|| question.to_string())]
	}

	fn doctrinal_topics(&self, lower: &str) -> Vec<String> {
		let mut topics: Vec<String> = self
			.doctrinal_topics
			.iter()
			.filter(|(_, stems)| stems.iter().any(|stem| stem.is_match(lower)))
			.map(|(topic, _)| topic.clone())
			.take(MAX_DOCTRINAL_TOPICS)
			.collect();

		if topics.is_empty() {
			topics = vec!["truth".to_string(), "integrity".to_string()];
		}

		topics
	}
}

/// A keyword or stem that only matches at the start of a word.
struct WordCue {
	text: String,
	pattern: Regex,
}
impl WordCue {
	fn is_match(&self, lower: &str) -> bool {
		self.pattern.is_match(lower)
	}
}

fn word_cues(label: &str, values: &[String]) -> parley_config::Result<Vec<WordCue>> {
	let texts = lowered(values);
	let sources: Vec<String> =
		texts.iter().map(|text| format!(r"\b{}", regex::escape(text))).collect();
	let patterns = parley_config::compile_patterns(label, &sources)?;

	Ok(texts.into_iter().zip(patterns).map(|(text, pattern)| WordCue { text, pattern }).collect())
}

fn style_keywords(
	question_type: QuestionType,
	awareness_level: AwarenessLevel,
	emotional_tone: EmotionalTone,
) -> Vec<String> {
	let mut keywords: Vec<&str> = match awareness_level {
		AwarenessLevel::Unaware => vec!["curiosity", "attention"],
		AwarenessLevel::ProblemAware => vec!["problem", "agitate"],
		AwarenessLevel::SolutionAware => vec!["solution", "benefits"],
		AwarenessLevel::ProductAware => vec!["proof", "specific", "features"],
		AwarenessLevel::MostAware => vec!["urgency", "action", "offer"],
	};

	match emotional_tone {
		EmotionalTone::Concerned => keywords.extend(["empathy", "reassurance"]),
		EmotionalTone::Skeptical => keywords.extend(["proof", "credibility", "facts"]),
		EmotionalTone::Supportive => keywords.extend(["enthusiasm", "action"]),
		EmotionalTone::Curious | EmotionalTone::Neutral => {},
	}
	match question_type {
		QuestionType::Comparison => keywords.extend(["differentiation", "unique"]),
		QuestionType::Statistics => keywords.extend(["specific", "numbers"]),
		QuestionType::TruthSeeking => keywords.extend(["honesty", "integrity"]),
		_ => {},
	}

	keywords.extend(["benefits", "clear", "direct", "conversational"]);

	let mut out: Vec<String> = Vec::with_capacity(keywords.len());

	for keyword in keywords {
		if !out.iter().any(|existing| existing == keyword) {
			out.push(keyword.to_string());
		}
	}

	out
}

fn matches_any(patterns: &[Regex], text: &str) -> bool {
	patterns.iter().any(|pattern| pattern.is_match(text))
}

fn contains_any(words: &[String], text: &str) -> bool {
	words.iter().any(|word| text.contains(word.as_str()))
}

fn lowered(values: &[String]) -> Vec<String> {
	values
		.iter()
		.map(|value| value.trim().to_lowercase())
		.filter(|value| !value.is_empty())
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn analyzer() -> QuestionAnalyzer {
		QuestionAnalyzer::new(&Analysis::default()).expect("Default analysis tables must compile.")
	}

	#[test]
	fn extracts_comparison_entity() {
		let analyzer = analyzer();

		assert_eq!(
			analyzer.comparison_entity("How does your position differ from the opposing platform?"),
			Some("opposing platform".to_string())
		);
		assert_eq!(
			analyzer.comparison_entity("Your plan vs. the governor's plan"),
			Some("governor's plan".to_string())
		);
		assert_eq!(analyzer.comparison_entity("Tell me about schools"), None);
	}

	#[test]
	fn style_keywords_are_unique_and_ordered() {
		let keywords = style_keywords(
			QuestionType::Statistics,
			AwarenessLevel::ProductAware,
			EmotionalTone::Skeptical,
		);

		assert_eq!(keywords[..3], ["proof", "specific", "features"]);
		assert_eq!(keywords.iter().filter(|keyword| keyword.as_str() == "proof").count(), 1);
		assert_eq!(keywords.iter().filter(|keyword| keyword.as_str() == "specific").count(), 1);
		assert_eq!(keywords.last().map(String::as_str), Some("conversational"));
	}

	#[test]
	fn doctrinal_topics_default_when_nothing_matches() {
		let analyzer = analyzer();

		assert_eq!(analyzer.doctrinal_topics("is it true"), vec!["truth", "integrity"]);
		assert_eq!(
			analyzer.doctrinal_topics("what does scripture say about the border and the poor"),
			vec!["immigration", "wealth"]
		);
		assert_eq!(analyzer.doctrinal_topics("do you believe in it"), vec!["truth", "integrity"]);
	}
}
