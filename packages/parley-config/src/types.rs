use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub collections: Vec<Collection>,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub web: Web,
	#[serde(default)]
	pub dual_source: DualSource,
	#[serde(default)]
	pub policy: Policy,
	#[serde(default)]
	pub style: Style,
	#[serde(default)]
	pub analysis: Analysis,
}
impl Config {
	pub fn collection(&self, name: &str) -> Option<&Collection> {
		self.collections.iter().find(|collection| collection.name == name)
	}

	pub fn collections_in(&self, group: GroupTag) -> impl Iterator<Item = &Collection> {
		self.collections.iter().filter(move |collection| collection.group == group)
	}
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub similarity: ProviderConfig,
	pub web_search: Option<WebSearchProviderConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebSearchProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default = "default_web_max_results")]
	pub max_results: u32,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Which side of an answer a collection speaks for.
///
/// Grouping is always resolved through this tag, never by inspecting collection names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupTag {
	OwnPosition,
	ComparisonTarget,
	StyleGuidance,
	Doctrinal,
}
impl GroupTag {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::OwnPosition => "own_position",
			Self::ComparisonTarget => "comparison_target",
			Self::StyleGuidance => "style_guidance",
			Self::Doctrinal => "doctrinal",
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Collection {
	pub name: String,
	pub group: GroupTag,
	pub trust_weight: f32,
	pub confidence_floor: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub k: u32,
	pub timeout_ms: u64,
	pub pipeline_timeout_ms: u64,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { k: 5, timeout_ms: 3_000, pipeline_timeout_ms: 15_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Web {
	pub trust_weight: f32,
	pub confidence_floor: f32,
	pub owned_confidence_floor: f32,
	/// Web snippets carry no similarity score, so every result is assumed to be this relevant.
	pub assumed_similarity: f32,
	pub owned_domains: Vec<String>,
	pub owned_domain_multiplier: f32,
	pub max_queries: u32,
}
impl Default for Web {
	fn default() -> Self {
		Self {
			trust_weight: 0.4,
			confidence_floor: 0.2,
			owned_confidence_floor: 0.4,
			assumed_similarity: 0.6,
			owned_domains: Vec::new(),
			owned_domain_multiplier: 2.0,
			max_queries: 2,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DualSource {
	pub widened_floor: f32,
	pub supplemental_k: u32,
}
impl Default for DualSource {
	fn default() -> Self {
		Self { widened_floor: 0.2, supplemental_k: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Policy {
	pub confidence_tier_boundary: f32,
	pub callback_patterns: Vec<String>,
}
impl Default for Policy {
	fn default() -> Self {
		Self {
			confidence_tier_boundary: 0.5,
			callback_patterns: strings(&[
				r"\bcall me back\b",
				r"\bcall back\b",
				r"\bcallback\b",
				r"\bcontact me\b",
				r"\breach (?:out to )?me\b",
				r"\bphone me\b",
				r"\b(?:talk|speak) (?:with|to) (?:someone|a (?:person|human|staffer))\b",
			]),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Style {
	pub gate_threshold: f32,
	pub reduced_k_threshold: f32,
	pub reduced_k: u32,
}
impl Default for Style {
	fn default() -> Self {
		Self { gate_threshold: 0.7, reduced_k_threshold: 0.8, reduced_k: 2 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Analysis {
	pub truth_seeking_patterns: Vec<String>,
	pub comparison_patterns: Vec<String>,
	pub statistics_patterns: Vec<String>,
	pub recent_event_patterns: Vec<String>,
	pub factual_patterns: Vec<String>,
	pub topical_keywords: Vec<String>,
	pub opponent_names: Vec<String>,
	pub awareness: AwarenessCues,
	pub tone: ToneCues,
	pub doctrinal_topics: Vec<DoctrinalTopic>,
}
impl Default for Analysis {
	fn default() -> Self {
		Self {
			truth_seeking_patterns: strings(&[
				r"\bis it true\b",
				r"what (?:does|do) (?:you|your) (?:faith|religion|belief|values) say",
				r"(?:biblically|scripturally|spiritually|morally|ethically) speaking",
				r"from a (?:moral|ethical|spiritual|biblical|religious|faith) (?:perspective|standpoint|view)",
				r"what (?:does|do) (?:the bible|scripture|god|jesus|your faith) say",
				r"is (?:it|this|that) (?:morally|ethically|biblically|scripturally) (?:right|wrong|acceptable)",
				r"(?:moral|ethical|spiritual|biblical|religious) (?:stance|view|position|perspective) on",
				r"your (?:faith|religious|spiritual|moral|ethical) (?:view|belief|position|perspective)",
				r"(?:integrity|character|honesty|truthfulness) (?:in|as a)",
				r"\b(?:god|jesus|bible|scripture|faith|prayer) (?:and|in|on)\b",
				r"what (?:are|is) your (?:core )?(?:values|beliefs|principles|convictions)",
				r"(?:christian|faith-based|biblical) (?:perspective|view|approach)",
			]),
			comparison_patterns: strings(&[
				r"how (?:do|does) (?:you|your) (?:differ|compare)",
				r"what.+difference between",
				r"\b(?:differ|differs|different|difference)\b",
				r"\bversus\b|\bvs\b\.?",
				r"\bcompared? (?:to|with)\b",
				r"\bopposing\b|\bopponents?\b",
			]),
			statistics_patterns: strings(&[
				r"how (?:many|much)\b",
				r"what (?:are the|is the) (?:number|rate|percentage|stat)",
				r"\b(?:data|statistics|numbers|percent)\b",
				r"how will.+affect",
			]),
			recent_event_patterns: strings(&[
				r"\b(?:recent|recently|latest|new)\b",
				r"what.+(?:response|reaction) to",
				r"\b(?:current|currently|today|this week)\b",
			]),
			factual_patterns: strings(&[
				r"what (?:day|date|time)",
				r"\bwhen is\b",
				r"how many (?:days|years)",
				r"\d+",
			]),
			topical_keywords: strings(&[
				"immigra",
				"border",
				"education",
				"school",
				"teacher",
				"health",
				"insurance",
				"econom",
				"job",
				"tax",
				"inflation",
				"crime",
				"police",
				"justice",
				"energy",
				"climate",
				"environment",
				"gun",
				"abortion",
				"housing",
				"water",
				"veteran",
				"position",
				"policy",
				"plan",
				"platform",
				"stance",
			]),
			opponent_names: strings(&["democrat", "republican", "libertarian", "green party"]),
			awareness: AwarenessCues::default(),
			tone: ToneCues::default(),
			doctrinal_topics: vec![
				DoctrinalTopic::new(
					"immigration",
					&["immigra", "border", "foreigner", "stranger", "alien"],
				),
				DoctrinalTopic::new(
					"stewardship",
					&["environment", "climate", "nature", "creation", "pollution", "earth"],
				),
				DoctrinalTopic::new(
					"justice",
					&["justice", "fair", "equal", "discriminat", "rights"],
				),
				DoctrinalTopic::new("truth", &["truth", "honest", "lie", "lying", "deception"]),
				DoctrinalTopic::new(
					"integrity",
					&["integrity", "character", "corrupt", "ethics", "moral"],
				),
				DoctrinalTopic::new(
					"compassion",
					&["compassion", "mercy", "kind", "caring", "help"],
				),
				DoctrinalTopic::new(
					"family",
					&["family", "parent", "child", "marriage", "father", "mother"],
				),
				DoctrinalTopic::new("authority", &["government", "authority", "leader", "rule"]),
				DoctrinalTopic::new("wealth", &["money", "wealth", "rich", "poor", "economy", "tax"]),
				DoctrinalTopic::new("work", &["work", "job", "employ", "labor"]),
				DoctrinalTopic::new("freedom", &["freedom", "liberty", "free"]),
				DoctrinalTopic::new("peace", &["peace", "war", "conflict", "violence"]),
			],
		}
	}
}

/// Lower-cased substrings; the first level whose list matches wins, checked from most to least
/// aware.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AwarenessCues {
	pub most_aware: Vec<String>,
	pub product_aware: Vec<String>,
	pub solution_aware: Vec<String>,
	pub problem_aware: Vec<String>,
}
impl Default for AwarenessCues {
	fn default() -> Self {
		Self {
			most_aware: strings(&["how do i", "where can i", "sign up", "join", "volunteer", "donate"]),
			product_aware: strings(&["your position", "your plan", "you believe", "your stance"]),
			solution_aware: strings(&["how does", "what", "who supports"]),
			problem_aware: strings(&["problem", "issue", "concern", "worried"]),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ToneCues {
	pub concerned: Vec<String>,
	pub skeptical: Vec<String>,
	pub supportive: Vec<String>,
	pub curious: Vec<String>,
}
impl Default for ToneCues {
	fn default() -> Self {
		Self {
			concerned: strings(&["worried", "concern", "afraid", "fear", "scared"]),
			skeptical: strings(&["really", "actually", "prove", "why should"]),
			supportive: strings(&["support", "agree", "love", "great"]),
			curious: strings(&["how", "what", "why", "tell me"]),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct DoctrinalTopic {
	pub topic: String,
	pub stems: Vec<String>,
}
impl DoctrinalTopic {
	fn new(topic: &str, stems: &[&str]) -> Self {
		Self { topic: topic.to_string(), stems: strings(stems) }
	}
}

fn strings(values: &[&str]) -> Vec<String> {
	values.iter().map(|value| value.to_string()).collect()
}

fn default_web_max_results() -> u32 {
	3
}
