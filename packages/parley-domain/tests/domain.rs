use parley_config::{Analysis, Policy};
use parley_domain::{
	AwarenessLevel, Candidate, ConfidenceTier, CoverageStatus, EmotionalTone, EvidenceSet,
	GroupTag, Provenance, QuestionAnalysis, QuestionAnalyzer, QuestionType, ResponseFraming,
	ResponsePolicyEngine, Source, StyleDirective, map_guidance, merge,
};

fn analyzer() -> QuestionAnalyzer {
	QuestionAnalyzer::new(&Analysis::default()).expect("Default analysis tables must compile.")
}

fn engine() -> ResponsePolicyEngine {
	ResponsePolicyEngine::new(&Policy::default()).expect("Default policy must compile.")
}

fn source(name: &str, group: GroupTag, trust_weight: f32, confidence_floor: f32) -> Source {
	Source { name: name.to_string(), group, trust_weight, confidence_floor }
}

fn candidate(source: &Source, similarity: f32, document_id: &str, chunk_index: u32) -> Candidate {
	Candidate::new(
		source,
		similarity,
		format!("{document_id} passage {chunk_index}"),
		Provenance { document_id: document_id.to_string(), chunk_index, ..Default::default() },
	)
}

fn own() -> Source {
	source("CandidatePlatform", GroupTag::OwnPosition, 1.0, 0.45)
}

fn party() -> Source {
	source("PartyPlatform", GroupTag::ComparisonTarget, 0.6, 0.35)
}

#[test]
fn classifies_position_question_as_policy() {
	let analysis = analyzer().analyze("What is your position on immigration?");

	assert_eq!(analysis.question_type, QuestionType::Policy);
	assert_eq!(analysis.awareness_level, AwarenessLevel::ProductAware);
	assert!(!analysis.needs_external_search);
	assert!(!analysis.needs_doctrinal_citation);
	assert!(analysis.search_queries.is_empty());
}

#[test]
fn classifies_comparison_and_extracts_target() {
	let analysis = analyzer().analyze("How does your position differ from the opposing platform?");

	assert_eq!(analysis.question_type, QuestionType::Comparison);
	assert!(analysis.needs_external_search);
	assert_eq!(analysis.comparison_targets, vec!["opposing platform".to_string()]);
	assert_eq!(
		analysis.search_queries,
		vec!["opposing platform position policy platform".to_string()]
	);
}

#[test]
fn opponent_name_alone_marks_comparison() {
	let analysis = analyzer().analyze("What do Republicans want for schools?");

	assert_eq!(analysis.question_type, QuestionType::Comparison);
	assert_eq!(analysis.comparison_targets, vec!["republican".to_string()]);
}

#[test]
fn truth_seeking_outranks_comparison() {
	let analysis = analyzer().analyze("Is it true you differ from the Democrats on taxes?");

	assert_eq!(analysis.question_type, QuestionType::TruthSeeking);
	assert!(analysis.needs_doctrinal_citation);
	assert_eq!(analysis.doctrinal_topics, vec!["wealth".to_string()]);
	assert!(analysis.comparison_targets.is_empty());
}

#[test]
fn factual_truth_question_needs_no_doctrinal_citation() {
	let analysis = analyzer().analyze("Is it true the forum is on November 5?");

	assert_eq!(analysis.question_type, QuestionType::TruthSeeking);
	assert!(!analysis.needs_doctrinal_citation);
	assert!(analysis.doctrinal_topics.is_empty());
}

#[test]
fn statistics_and_recent_events_need_external_search() {
	let analyzer = analyzer();
	let statistics = analyzer.analyze("How many teachers were hired last year?");
	let recent = analyzer.analyze("What is the latest on the water plan?");

	assert_eq!(statistics.question_type, QuestionType::Statistics);
	assert_eq!(
		statistics.search_queries,
		vec!["How many teachers were hired last year? latest data statistics".to_string()]
	);
	assert_eq!(recent.question_type, QuestionType::RecentEvent);
	assert_eq!(
		recent.search_queries,
		vec!["What is the latest on the water plan? latest news".to_string()]
	);
}

#[test]
fn unmatched_question_is_low_confidence_fallback() {
	let analysis = analyzer().analyze("Hello there");

	assert_eq!(analysis.question_type, QuestionType::LowConfidenceFallback);
	assert!(analysis.needs_external_search);
	assert_eq!(analysis.search_queries, vec!["Hello there".to_string()]);
}

#[test]
fn keywords_match_only_at_word_start() {
	let analyzer = analyzer();

	for question in ["Has the race begun?", "Did you see the shotgun?"] {
		let analysis = analyzer.analyze(question);

		assert_eq!(analysis.question_type, QuestionType::LowConfidenceFallback, "{question}");
		assert!(analysis.needs_external_search, "{question}");
	}

	assert_eq!(analyzer.analyze("What about gun laws?").question_type, QuestionType::Policy);
	assert_eq!(
		analyzer.analyze("How is the economy holding up?").question_type,
		QuestionType::Policy
	);
	assert_eq!(
		analyzer.analyze("Are immigrants welcome here?").question_type,
		QuestionType::Policy
	);
}

#[test]
fn opponent_names_match_only_at_word_start() {
	let analysis = analyzer().analyze("Is the antirepublican movement on your border plan?");

	assert_eq!(analysis.question_type, QuestionType::Policy);
	assert!(analysis.comparison_targets.is_empty());
}

#[test]
fn blank_question_degrades_to_unaware_policy() {
	let analysis = analyzer().analyze("   ");

	assert_eq!(analysis, QuestionAnalysis::degraded());
	assert_eq!(analysis.question_type, QuestionType::Policy);
	assert_eq!(analysis.awareness_level, AwarenessLevel::Unaware);
	assert!(!analysis.needs_external_search && !analysis.needs_doctrinal_citation);
}

#[test]
fn tone_is_attached_independently_of_type() {
	let analyzer = analyzer();

	assert_eq!(
		analyzer.analyze("I am worried about the border plan").emotional_tone,
		EmotionalTone::Concerned
	);
	assert_eq!(
		analyzer.analyze("Can you actually prove the tax plan works?").emotional_tone,
		EmotionalTone::Skeptical
	);
}

#[test]
fn confidence_is_similarity_times_weight() {
	let party = party();

	for similarity in [0.0_f32, 0.1, 0.35, 0.5, 0.77, 1.0] {
		let candidate = candidate(&party, similarity, "d", 0);

		assert_eq!(candidate.confidence(), similarity * 0.6);
	}
}

#[test]
fn merge_drops_candidates_under_their_floor() {
	let evidence = merge(vec![
		vec![candidate(&own(), 0.44, "own", 0), candidate(&own(), 0.9, "own", 1)],
		vec![candidate(&party(), 0.5, "party", 0), candidate(&party(), 0.7, "party", 1)],
	]);
	let confidences: Vec<f32> = evidence.candidates().iter().map(Candidate::confidence).collect();

	assert_eq!(confidences, vec![0.9, 0.7 * 0.6]);
}

#[test]
fn merge_is_sorted_and_independent_of_list_order() {
	let own = own();
	let party = party();
	let lists = vec![
		vec![
			candidate(&own, 0.6, "a", 3),
			candidate(&own, 0.6, "a", 1),
			candidate(&own, 0.8, "b", 0),
		],
		vec![candidate(&party, 1.0, "c", 2), candidate(&party, 1.0, "c", 0)],
	];
	let mut reversed: Vec<Vec<Candidate>> =
		lists.iter().rev().map(|list| list.iter().rev().cloned().collect()).collect();

	reversed.swap(0, 1);

	let forward = merge(lists);
	let backward = merge(reversed);

	assert_eq!(forward, backward);

	let order: Vec<(f32, u32)> = forward
		.candidates()
		.iter()
		.map(|candidate| (candidate.confidence(), candidate.provenance().chunk_index))
		.collect();

	assert_eq!(order, vec![(0.8, 0), (0.6, 0), (0.6, 1), (0.6, 2), (0.6, 3)]);
}

#[test]
fn top_content_confidence_ignores_doctrinal_evidence() {
	let scripture = source("Scripture", GroupTag::Doctrinal, 1.0, 0.3);
	let evidence = merge(vec![
		vec![candidate(&scripture, 0.95, "s", 0)],
		vec![candidate(&party(), 0.7, "p", 0)],
	]);

	assert_eq!(evidence.top_content_confidence(), Some(0.7 * 0.6));
	assert!(merge(vec![vec![candidate(&scripture, 0.95, "s", 0)]])
		.top_content_confidence()
		.is_none());
}

#[test]
fn high_confidence_policy_stays_in_character() {
	let analysis = analyzer().analyze("What is your position on immigration?");
	let evidence = merge(vec![vec![candidate(&own(), 0.8, "platform", 0)]]);
	let plan = engine().plan(
		"What is your position on immigration?",
		&analysis,
		&evidence,
		CoverageStatus::NotApplicable,
		Vec::new(),
	);

	assert_eq!(plan.top_confidence, Some(0.8));
	assert_eq!(plan.confidence_tier, ConfidenceTier::High);
	assert!(plan.stay_in_character);
	assert!(!plan.offer_callback);
	assert_eq!(plan.framing, ResponseFraming::InCharacter);
}

#[test]
fn explicit_callback_request_overrides_the_table() {
	let query = "What is your position on immigration? Please call me back.";
	let analysis = analyzer().analyze(query);
	let evidence = merge(vec![vec![candidate(&own(), 0.8, "platform", 0)]]);
	let plan = engine().plan(query, &analysis, &evidence, CoverageStatus::NotApplicable, Vec::new());

	assert_eq!(analysis.question_type, QuestionType::Policy);
	assert!(plan.stay_in_character);
	assert!(plan.callback_requested);
	assert!(plan.offer_callback);
}

#[test]
fn partial_comparison_breaks_character_and_offers_callback() {
	let query = "How does your position differ from the opposing platform?";
	let analysis = analyzer().analyze(query);
	let evidence = merge(vec![vec![candidate(&own(), 0.7, "platform", 0)]]);
	let plan = engine().plan(query, &analysis, &evidence, CoverageStatus::Partial, Vec::new());

	assert!(!plan.stay_in_character);
	assert!(plan.offer_callback);
	assert_eq!(plan.framing, ResponseFraming::BreakCharacterComparison);
	assert!(plan.required_groups_present.contains(&GroupTag::OwnPosition));
	assert!(!plan.required_groups_present.contains(&GroupTag::ComparisonTarget));
}

#[test]
fn statistics_stay_in_character_with_external_data_note() {
	let query = "How many teachers were hired last year?";
	let analysis = analyzer().analyze(query);
	let evidence = merge(vec![vec![candidate(&own(), 0.46, "platform", 0)]]);
	let plan = engine().plan(query, &analysis, &evidence, CoverageStatus::NotApplicable, Vec::new());

	assert_eq!(plan.confidence_tier, ConfidenceTier::Low);
	assert!(plan.stay_in_character);
	assert!(!plan.offer_callback);
	assert_eq!(plan.framing, ResponseFraming::InCharacterExternalData);
}

#[test]
fn empty_evidence_offers_callback() {
	let query = "What is your position on immigration?";
	let analysis = analyzer().analyze(query);
	let plan = engine().plan(
		query,
		&analysis,
		&EvidenceSet::default(),
		CoverageStatus::NotApplicable,
		Vec::new(),
	);

	assert_eq!(plan.confidence_tier, ConfidenceTier::Absent);
	assert!(plan.offer_callback);
	assert!(plan.required_groups_present.is_empty());
}

#[test]
fn guidance_maps_to_closed_directive_set() {
	let analysis = analyzer().analyze("I am worried about the border plan");
	let passages = ["Use plain language and skip jargon.", "Lead with proof and testimonials."];
	let directives = map_guidance(passages, &analysis);

	assert!(directives.contains(&StyleDirective::LeadWithBenefit));
	assert!(directives.contains(&StyleDirective::MatchAwareness(analysis.awareness_level)));
	assert!(directives.contains(&StyleDirective::AvoidJargon));
	assert!(directives.contains(&StyleDirective::LeadWithProof));
	assert!(directives.contains(&StyleDirective::AcknowledgeConcern));

	let mut sorted = directives.clone();

	sorted.sort();
	sorted.dedup();

	assert_eq!(directives, sorted);

	for directive in &directives {
		for passage in passages {
			assert!(!passage.to_lowercase().contains(&directive.tag()));
		}
	}
}

#[test]
fn no_guidance_means_no_directives() {
	let analysis = analyzer().analyze("What is your position on immigration?");

	assert!(map_guidance(std::iter::empty::<&str>(), &analysis).is_empty());
}
