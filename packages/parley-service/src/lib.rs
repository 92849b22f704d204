pub mod context;
pub mod enforce;
pub mod pipeline;
pub mod retrieval;
pub mod style;

mod error;

pub use context::{ContextAssembler, ContextPackage, ContextPassage, WebCitation};
pub use enforce::DualSourceEnforcer;
pub use error::{Error, Result};
pub use pipeline::{AnswerBundle, Query};
pub use retrieval::{RetrievalRequest, SourceRetriever};
pub use style::StyleGuidanceSelector;

use std::sync::Arc;

use parley_config::Config;
use parley_domain::{QuestionAnalyzer, ResponsePolicyEngine};
use parley_providers::{
	HttpSimilaritySearch, HttpWebSearch, InteractionSink, SimilaritySearch, TracingSink, WebSearch,
};

#[derive(Clone)]
pub struct Collaborators {
	pub similarity: Arc<dyn SimilaritySearch>,
	pub web: Option<Arc<dyn WebSearch>>,
	pub sink: Arc<dyn InteractionSink>,
}
impl Collaborators {
	pub fn new(
		similarity: Arc<dyn SimilaritySearch>,
		web: Option<Arc<dyn WebSearch>>,
		sink: Arc<dyn InteractionSink>,
	) -> Self {
		Self { similarity, web, sink }
	}

	/// HTTP collaborators from the provider sections, with events written to the log.
	pub fn from_config(cfg: &Config) -> Result<Self> {
		let similarity: Arc<dyn SimilaritySearch> =
			Arc::new(HttpSimilaritySearch::new(&cfg.providers.similarity)?);
		let web = match cfg.providers.web_search.as_ref() {
			Some(web_cfg) => Some(Arc::new(HttpWebSearch::new(web_cfg)?) as Arc<dyn WebSearch>),
			None => None,
		};

		Ok(Self { similarity, web, sink: Arc::new(TracingSink) })
	}
}

/// The orchestration core. Holds only immutable state, so one instance serves concurrent queries.
pub struct ParleyService {
	pub cfg: Arc<Config>,
	analyzer: QuestionAnalyzer,
	policy: ResponsePolicyEngine,
	retriever: SourceRetriever,
	enforcer: DualSourceEnforcer,
	style: StyleGuidanceSelector,
	assembler: ContextAssembler,
	sink: Arc<dyn InteractionSink>,
}
impl ParleyService {
	pub fn new(cfg: Config, collaborators: Collaborators) -> Result<Self> {
		let cfg = Arc::new(cfg);
		let analyzer = QuestionAnalyzer::new(&cfg.analysis)?;
		let policy = ResponsePolicyEngine::new(&cfg.policy)?;
		let retriever =
			SourceRetriever::new(cfg.clone(), collaborators.similarity, collaborators.web);

		Ok(Self {
			enforcer: DualSourceEnforcer::new(cfg.clone()),
			style: StyleGuidanceSelector::new(cfg.clone()),
			cfg,
			analyzer,
			policy,
			retriever,
			assembler: ContextAssembler,
			sink: collaborators.sink,
		})
	}
}
