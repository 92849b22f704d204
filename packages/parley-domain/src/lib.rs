//! Pure decision logic: question analysis, trust scoring, directive mapping and response policy.
//!
//! Nothing in this crate performs I/O. Every component is built from an immutable configuration
//! section and is safe to share across concurrent queries.

pub mod analysis;
pub mod directive;
pub mod evidence;
pub mod policy;

pub use analysis::{AwarenessLevel, EmotionalTone, QuestionAnalysis, QuestionAnalyzer, QuestionType};
pub use directive::{StyleDirective, map_guidance};
pub use evidence::{Candidate, EvidenceSet, Provenance, Source, merge};
pub use parley_config::GroupTag;
pub use policy::{
	CitationRequirements, ConfidenceTier, CoverageStatus, ResponseFraming, ResponsePlan,
	ResponsePolicyEngine, Transition, transition,
};
