use std::{
	fs,
	path::{Path, PathBuf},
	time::Instant,
};

use clap::Parser;
use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use parley_config::Config;
use parley_domain::{ConfidenceTier, CoverageStatus, QuestionType, StyleDirective};
use parley_service::{AnswerBundle, Collaborators, ParleyService, Query};

#[derive(Debug, Parser)]
#[command(
	version = parley_cli::VERSION,
	rename_all = "kebab",
	styles = parley_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Questions to plan, in order. Ignored when a dataset is given.
	#[arg(long, short = 'q', value_name = "TEXT", required_unless_present = "dataset")]
	pub query: Vec<String>,
	#[arg(long, short = 'd', value_name = "FILE")]
	pub dataset: Option<PathBuf>,
	#[arg(long, value_name = "ID", default_value = "parley-eval")]
	pub requester_id: String,
	#[arg(long)]
	pub logging_consent: bool,
}

#[derive(Debug, Deserialize)]
struct EvalDataset {
	name: Option<String>,
	queries: Vec<EvalQuery>,
}

#[derive(Debug, Deserialize)]
struct EvalQuery {
	id: Option<String>,
	question: String,
	#[serde(default)]
	expected: Option<Expectation>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
struct Expectation {
	#[serde(skip_serializing_if = "Option::is_none")]
	question_type: Option<QuestionType>,
	#[serde(skip_serializing_if = "Option::is_none")]
	stay_in_character: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	offer_callback: Option<bool>,
}

#[derive(Debug, Serialize)]
struct EvalOutput {
	dataset: EvalDatasetInfo,
	settings: EvalSettings,
	summary: EvalSummary,
	queries: Vec<QueryReport>,
}

#[derive(Debug, Serialize)]
struct EvalDatasetInfo {
	name: String,
	query_count: usize,
}

#[derive(Debug, Serialize)]
struct EvalSettings {
	config_path: String,
	k: u32,
	timeout_ms: u64,
	pipeline_timeout_ms: u64,
	web_search: bool,
}

#[derive(Debug, Serialize)]
struct EvalSummary {
	in_character_rate: f64,
	callback_rate: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	expectation_match_rate: Option<f64>,
	latency_ms_p50: f64,
	latency_ms_p95: f64,
}

#[derive(Debug, Serialize)]
struct QueryReport {
	id: String,
	question: String,
	trace_id: Uuid,
	question_type: QuestionType,
	coverage: CoverageStatus,
	confidence_tier: ConfidenceTier,
	top_confidence: Option<f32>,
	stay_in_character: bool,
	offer_callback: bool,
	style_directives: Vec<StyleDirective>,
	evidence_count: usize,
	latency_ms: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	expected: Option<Expectation>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	mismatches: Vec<String>,
}
impl QueryReport {
	fn new(
		id: String,
		question: String,
		bundle: AnswerBundle,
		latency_ms: f64,
		expected: Option<Expectation>,
	) -> Self {
		let plan = bundle.plan;
		let mismatches =
			expected.as_ref().map(|expected| mismatches(expected, &plan)).unwrap_or_default();

		Self {
			id,
			question,
			trace_id: bundle.trace_id,
			question_type: plan.question_type,
			coverage: plan.coverage,
			confidence_tier: plan.confidence_tier,
			top_confidence: plan.top_confidence,
			stay_in_character: plan.stay_in_character,
			offer_callback: plan.offer_callback,
			style_directives: plan.style_directives,
			evidence_count: bundle.evidence.len(),
			latency_ms,
			expected,
			mismatches,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = parley_config::load(&args.config)?;

	init_tracing(&config);

	let dataset = match args.dataset.as_ref() {
		Some(path) => load_dataset(path)?,
		None => EvalDataset {
			name: Some("adhoc".to_string()),
			queries: args
				.query
				.iter()
				.map(|question| EvalQuery { id: None, question: question.clone(), expected: None })
				.collect(),
		},
	};
	let output = eval_config(args.config.as_path(), config, &dataset, &args).await?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

/// Logs go to stderr so the report on stdout stays valid JSON.
fn init_tracing(config: &Config) {
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_dataset(path: &Path) -> color_eyre::Result<EvalDataset> {
	let raw = fs::read_to_string(path)?;

	parse_dataset(&raw)
}

fn parse_dataset(raw: &str) -> color_eyre::Result<EvalDataset> {
	let dataset: EvalDataset = serde_json::from_str(raw)?;

	if dataset.queries.is_empty() {
		return Err(eyre::eyre!("Dataset must include at least one query."));
	}

	Ok(dataset)
}

async fn eval_config(
	config_path: &Path,
	config: Config,
	dataset: &EvalDataset,
	args: &Args,
) -> color_eyre::Result<EvalOutput> {
	let collaborators = Collaborators::from_config(&config)?;
	let service = ParleyService::new(config, collaborators)?;
	let mut reports = Vec::with_capacity(dataset.queries.len());
	let mut latencies_ms = Vec::with_capacity(dataset.queries.len());

	for (index, query) in dataset.queries.iter().enumerate() {
		let request = Query::new(&query.question, &args.requester_id, args.logging_consent);
		let started = Instant::now();
		let bundle = service.answer(&request).await;
		let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;
		let id = query.id.clone().unwrap_or_else(|| format!("q{}", index + 1));

		tracing::debug!(id = %id, trace_id = %bundle.trace_id, latency_ms, "Query planned.");

		reports.push(QueryReport::new(
			id,
			query.question.clone(),
			bundle,
			latency_ms,
			query.expected.clone(),
		));
		latencies_ms.push(latency_ms);
	}

	let settings = EvalSettings {
		config_path: config_path.display().to_string(),
		k: service.cfg.retrieval.k,
		timeout_ms: service.cfg.retrieval.timeout_ms,
		pipeline_timeout_ms: service.cfg.retrieval.pipeline_timeout_ms,
		web_search: service.cfg.providers.web_search.is_some(),
	};

	Ok(EvalOutput {
		dataset: EvalDatasetInfo {
			name: dataset.name.clone().unwrap_or_else(|| "eval".to_string()),
			query_count: reports.len(),
		},
		settings,
		summary: summarize(&reports, &latencies_ms),
		queries: reports,
	})
}

fn mismatches(expected: &Expectation, plan: &parley_domain::ResponsePlan) -> Vec<String> {
	let mut out = Vec::new();

	if let Some(question_type) = expected.question_type.filter(|t| *t != plan.question_type) {
		out.push(format!(
			"question_type: expected {}, got {}.",
			question_type.as_str(),
			plan.question_type.as_str()
		));
	}
	if let Some(stay) = expected.stay_in_character.filter(|s| *s != plan.stay_in_character) {
		out.push(format!("stay_in_character: expected {stay}, got {}.", plan.stay_in_character));
	}
	if let Some(callback) = expected.offer_callback.filter(|c| *c != plan.offer_callback) {
		out.push(format!("offer_callback: expected {callback}, got {}.", plan.offer_callback));
	}

	out
}

fn summarize(reports: &[QueryReport], latencies_ms: &[f64]) -> EvalSummary {
	let count = reports.len().max(1) as f64;
	let in_character = reports.iter().filter(|r| r.stay_in_character).count() as f64;
	let callbacks = reports.iter().filter(|r| r.offer_callback).count() as f64;
	let checked: Vec<&QueryReport> = reports.iter().filter(|r| r.expected.is_some()).collect();
	let expectation_match_rate = (!checked.is_empty()).then(|| {
		let matched = checked.iter().filter(|r| r.mismatches.is_empty()).count() as f64;

		matched / checked.len() as f64
	});

	let mut sorted = latencies_ms.to_vec();

	sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

	EvalSummary {
		in_character_rate: in_character / count,
		callback_rate: callbacks / count,
		expectation_match_rate,
		latency_ms_p50: percentile(&sorted, 0.50),
		latency_ms_p95: percentile(&sorted, 0.95),
	}
}

fn percentile(values: &[f64], percentile: f64) -> f64 {
	if values.is_empty() {
		return 0.0;
	}

	let clamped = percentile.clamp(0.0, 1.0);
	let pos = clamped * (values.len() as f64 - 1.0);
	let lower = pos.floor() as usize;
	let upper = pos.ceil() as usize;

	if lower == upper {
		values[lower]
	} else {
		let weight = pos - lower as f64;
		values[lower] * (1.0 - weight) + values[upper] * weight
	}
}
