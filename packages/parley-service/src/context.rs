//! The package handed to the generation collaborator.

use std::fmt::Write as _;

use serde::Serialize;

use parley_config::{GroupTag, WEB_COLLECTION, WEB_OWNED_COLLECTION};
use parley_domain::{EvidenceSet, QuestionAnalysis, ResponseFraming, ResponsePlan};

#[derive(Clone, Debug, Serialize)]
pub struct ContextPassage {
	pub label: String,
	pub collection: String,
	pub group: GroupTag,
	pub confidence: f32,
	pub text: String,
	/// Index into `ContextPackage::web_citations`, starting at 1.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub citation: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct WebCitation {
	pub number: usize,
	pub title: String,
	pub url: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ContextPackage {
	pub query_text: String,
	pub analysis: QuestionAnalysis,
	pub plan: ResponsePlan,
	pub passages: Vec<ContextPassage>,
	pub web_citations: Vec<WebCitation>,
}
impl ContextPackage {
	/// Plain-text rendering for prompt construction.
	pub fn render(&self) -> String {
		let mut out = String::new();
		let plan = &self.plan;

		let _ = writeln!(out, "Question: {}", self.query_text);
		let _ = writeln!(out, "Question type: {}", plan.question_type.as_str());
		let _ = writeln!(out, "Framing: {}", framing_note(plan.framing));

		if plan.offer_callback {
			let _ = writeln!(out, "Offer a callback from a staff member.");
		}
		if plan.citations.web {
			let _ = writeln!(out, "Cite web sources by number.");
		}
		if plan.citations.doctrinal {
			let _ = writeln!(out, "Cite the doctrinal passages you rely on.");
		}
		if !plan.style_directives.is_empty() {
			let tags: Vec<String> =
				plan.style_directives.iter().map(|directive| directive.tag()).collect();

			let _ = writeln!(out, "Style: {}", tags.join(", "));
		}

		out.push_str("\nEvidence:\n");

		if self.passages.is_empty() {
			out.push_str("(none)\n");
		}

		for passage in &self.passages {
			let _ = writeln!(out, "{} {}", passage.label, passage.text);
		}

		if !self.web_citations.is_empty() {
			out.push_str("\nSources:\n");

			for citation in &self.web_citations {
				let _ = writeln!(out, "[{}] {} - {}", citation.number, citation.title, citation.url);
			}
		}

		out
	}
}

/// Serializes evidence and plan; style guidance text never reaches this point.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContextAssembler;
impl ContextAssembler {
	pub fn assemble(
		&self,
		query_text: &str,
		analysis: &QuestionAnalysis,
		plan: &ResponsePlan,
		evidence: &EvidenceSet,
	) -> ContextPackage {
		let mut passages = Vec::with_capacity(evidence.len());
		let mut web_citations: Vec<WebCitation> = Vec::new();

		for candidate in evidence.candidates() {
			if candidate.group() == GroupTag::StyleGuidance {
				continue;
			}

			let provenance = candidate.provenance();
			let is_web = matches!(candidate.collection(), WEB_COLLECTION | WEB_OWNED_COLLECTION);
			let citation = match (is_web, provenance.url.as_ref()) {
				(true, Some(url)) => {
					let existing = web_citations
						.iter()
						.find(|citation| citation.url == *url)
						.map(|citation| citation.number);

					Some(existing.unwrap_or_else(|| {
						let number = web_citations.len() + 1;

						web_citations.push(WebCitation {
							number,
							title: provenance.title.clone().unwrap_or_else(|| url.clone()),
							url: url.clone(),
						});

						number
					}))
				},
				_ => None,
			};

			passages.push(ContextPassage {
				label: format!(
					"[{} - {}#{}]",
					candidate.collection(),
					provenance.document_id,
					provenance.chunk_index
				),
				collection: candidate.collection().to_string(),
				group: candidate.group(),
				confidence: candidate.confidence(),
				text: candidate.text().to_string(),
				citation,
			});
		}

		ContextPackage {
			query_text: query_text.to_string(),
			analysis: analysis.clone(),
			plan: plan.clone(),
			passages,
			web_citations,
		}
	}
}

fn framing_note(framing: ResponseFraming) -> &'static str {
	match framing {
		ResponseFraming::InCharacter => "Answer in the candidate's voice.",
		ResponseFraming::InCharacterExternalData =>
			"Answer in the candidate's voice and note that figures come from external sources.",
		ResponseFraming::BreakCharacterComparison =>
			"Speak as a campaign assistant and compare positions using only cited sources.",
		ResponseFraming::BreakCharacterRecentEvent =>
			"Speak as a campaign assistant; recent events may not be reflected in campaign material.",
		ResponseFraming::BreakCharacterLowConfidence =>
			"Speak as a campaign assistant and say plainly that a complete answer is not available.",
	}
}

#[cfg(test)]
mod tests {
	use parley_domain::{Candidate, Provenance, Source};

	use super::*;

	#[test]
	fn web_passages_share_citation_numbers() {
		let web = Source {
			name: WEB_COLLECTION.to_string(),
			group: GroupTag::ComparisonTarget,
			trust_weight: 0.4,
			confidence_floor: 0.0,
		};
		let own = Source {
			name: "CandidatePlatform".to_string(),
			group: GroupTag::OwnPosition,
			trust_weight: 1.0,
			confidence_floor: 0.0,
		};
		let provenance = |url: &str, chunk_index| Provenance {
			document_id: url.to_string(),
			chunk_index,
			url: Some(url.to_string()),
			title: Some(format!("Title {url}")),
		};
		let evidence = parley_domain::merge(vec![
			vec![
				Candidate::new(&web, 0.6, "a".to_string(), provenance("https://a.org/", 0)),
				Candidate::new(&web, 0.6, "b".to_string(), provenance("https://b.org/", 1)),
			],
			vec![Candidate::new(
				&own,
				0.9,
				"own".to_string(),
				Provenance {
					document_id: "platform.md".to_string(),
					chunk_index: 2,
					..Default::default()
				},
			)],
		]);
		let package = ContextAssembler.assemble(
			"q",
			&QuestionAnalysis::degraded(),
			&ResponsePlan::fallback(),
			&evidence,
		);

		assert_eq!(package.passages[0].label, "[CandidatePlatform - platform.md#2]");
		assert_eq!(package.passages[0].citation, None);
		assert_eq!(package.passages[1].citation, Some(1));
		assert_eq!(package.passages[2].citation, Some(2));
		assert_eq!(package.web_citations.len(), 2);

		let rendered = package.render();

		assert!(rendered.contains("[1] Title https://a.org/ - https://a.org/"));
		assert!(rendered.contains("Offer a callback"));
	}
}
