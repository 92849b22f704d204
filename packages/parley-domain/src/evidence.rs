//! Candidate scoring and the trust-ranked evidence set.
//!
//! A candidate's confidence is always `similarity * trust_weight`, computed once at construction
//! in `f32` without rounding. Merging discards candidates below their source's floor and orders
//! the rest by confidence, falling back to the lower chunk index for equal confidence.

use std::{
	cmp::Ordering,
	collections::{BTreeSet, HashMap},
};

use serde::{Deserialize, Serialize};

use parley_config::{Collection, GroupTag};

/// A queryable knowledge partition with its static trust settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Source {
	pub name: String,
	pub group: GroupTag,
	pub trust_weight: f32,
	pub confidence_floor: f32,
}
impl Source {
	pub fn with_floor(&self, confidence_floor: f32) -> Self {
		Self { confidence_floor, ..self.clone() }
	}
}
impl From<&Collection> for Source {
	fn from(collection: &Collection) -> Self {
		Self {
			name: collection.name.clone(),
			group: collection.group,
			trust_weight: collection.trust_weight,
			confidence_floor: collection.confidence_floor,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
	pub document_id: String,
	pub chunk_index: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	collection: String,
	group: GroupTag,
	similarity: f32,
	trust_weight: f32,
	confidence: f32,
	confidence_floor: f32,
	text: String,
	provenance: Provenance,
}
impl Candidate {
	/// Similarity is clamped into `[0, 1]` (NaN becomes 0) before scoring.
	pub fn new(source: &Source, similarity: f32, text: String, provenance: Provenance) -> Self {
		let similarity = if similarity.is_nan() { 0.0 } else { similarity.clamp(0.0, 1.0) };

		Self {
			collection: source.name.clone(),
			group: source.group,
			similarity,
			trust_weight: source.trust_weight,
			confidence: similarity * source.trust_weight,
			confidence_floor: source.confidence_floor,
			text,
			provenance,
		}
	}

	pub fn collection(&self) -> &str {
		&self.collection
	}

	pub fn group(&self) -> GroupTag {
		self.group
	}

	pub fn similarity(&self) -> f32 {
		self.similarity
	}

	pub fn trust_weight(&self) -> f32 {
		self.trust_weight
	}

	pub fn confidence(&self) -> f32 {
		self.confidence
	}

	pub fn confidence_floor(&self) -> f32 {
		self.confidence_floor
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn provenance(&self) -> &Provenance {
		&self.provenance
	}

	pub fn passes_floor(&self) -> bool {
		self.confidence >= self.confidence_floor
	}

	/// Content answers the question; style and doctrinal passages only shape or support it.
	pub fn is_content(&self) -> bool {
		matches!(self.group, GroupTag::OwnPosition | GroupTag::ComparisonTarget)
	}

	fn key(&self) -> (&str, &str, u32) {
		(&self.collection, &self.provenance.document_id, self.provenance.chunk_index)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSet {
	candidates: Vec<Candidate>,
}
impl EvidenceSet {
	pub fn candidates(&self) -> &[Candidate] {
		&self.candidates
	}

	pub fn len(&self) -> usize {
		self.candidates.len()
	}

	pub fn is_empty(&self) -> bool {
		self.candidates.is_empty()
	}

	pub fn has_group(&self, group: GroupTag) -> bool {
		self.candidates.iter().any(|candidate| candidate.group == group)
	}

	pub fn groups_present(&self) -> BTreeSet<GroupTag> {
		self.candidates.iter().map(|candidate| candidate.group).collect()
	}

	pub fn top_content_confidence(&self) -> Option<f32> {
		self.candidates.iter().find(|candidate| candidate.is_content()).map(Candidate::confidence)
	}

	/// Re-merges this set with more candidate lists, keeping every invariant of [`merge`].
	pub fn extend(self, candidate_lists: Vec<Vec<Candidate>>) -> Self {
		let mut lists = Vec::with_capacity(candidate_lists.len() + 1);

		lists.push(self.candidates);
		lists.extend(candidate_lists);

		merge(lists)
	}
}

/// Concatenates candidate lists, drops those under their source floor, collapses repeats of the
/// same passage, then sorts by confidence descending.
///
/// The result depends only on the set of candidates, not on list order: ties fall back to the
/// lower chunk index, then collection name and document id.
pub fn merge(candidate_lists: Vec<Vec<Candidate>>) -> EvidenceSet {
	let mut best: HashMap<(String, String, u32), Candidate> = HashMap::new();

	for candidate in candidate_lists.into_iter().flatten() {
		if !candidate.passes_floor() {
			continue;
		}

		let (collection, document_id, chunk_index) = candidate.key();
		let key = (collection.to_string(), document_id.to_string(), chunk_index);

		let replace = best
			.get(&key)
			.is_none_or(|existing| cmp_candidates(&candidate, existing) == Ordering::Less);

		if replace {
			best.insert(key, candidate);
		}
	}

	let mut candidates: Vec<Candidate> = best.into_values().collect();

	candidates.sort_by(cmp_candidates);

	EvidenceSet { candidates }
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

fn cmp_candidates(left: &Candidate, right: &Candidate) -> Ordering {
	cmp_f32_desc(left.confidence, right.confidence)
		.then_with(|| left.provenance.chunk_index.cmp(&right.provenance.chunk_index))
		.then_with(|| left.collection.cmp(&right.collection))
		.then_with(|| left.provenance.document_id.cmp(&right.provenance.document_id))
		.then_with(|| left.text.cmp(&right.text))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn source(name: &str, trust_weight: f32, confidence_floor: f32) -> Source {
		Source {
			name: name.to_string(),
			group: GroupTag::OwnPosition,
			trust_weight,
			confidence_floor,
		}
	}

	#[test]
	fn nan_sorts_last() {
		let mut values = vec![0.2, f32::NAN, 0.9];

		values.sort_by(|a, b| cmp_f32_desc(*a, *b));

		assert_eq!(values[0], 0.9);
		assert_eq!(values[1], 0.2);
		assert!(values[2].is_nan());
	}

	#[test]
	fn repeated_passage_collapses_to_one() {
		let strict = source("a", 1.0, 0.5);
		let widened = strict.with_floor(0.1);
		let provenance =
			Provenance { document_id: "d".to_string(), chunk_index: 0, ..Default::default() };
		let first = Candidate::new(&strict, 0.6, "x".to_string(), provenance.clone());
		let second = Candidate::new(&widened, 0.6, "x".to_string(), provenance);
		let merged = merge(vec![vec![first], vec![second]]);

		assert_eq!(merged.len(), 1);
	}

	#[test]
	fn similarity_is_clamped() {
		let source = source("a", 0.5, 0.0);
		let high = Candidate::new(&source, 1.2, String::new(), Provenance::default());
		let nan = Candidate::new(&source, f32::NAN, String::new(), Provenance::default());

		assert_eq!(high.similarity(), 1.0);
		assert_eq!(high.confidence(), 0.5);
		assert_eq!(nan.confidence(), 0.0);
	}
}
