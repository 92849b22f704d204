use reqwest::header::AUTHORIZATION;
use serde_json::Map;
use time::OffsetDateTime;
use uuid::Uuid;

use parley_domain::{QuestionAnalysis, ResponsePlan};
use parley_providers::{InteractionEvent, InteractionSink, TracingSink};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		parley_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut default_headers = Map::new();

	default_headers.insert("x-retries".to_string(), serde_json::json!(3));

	let err = parley_providers::auth_headers("secret", &default_headers)
		.expect_err("Expected header validation error.");

	assert_eq!(err.to_string(), "Default header values must be strings.");
}

#[test]
fn extracts_host_without_www() {
	assert_eq!(
		parley_providers::host_of("https://www.Example-Campaign.org/plan?x=1"),
		Some("example-campaign.org".to_string())
	);
	assert_eq!(parley_providers::host_of("not a url"), None);
}

#[tokio::test]
async fn tracing_sink_serializes_events() {
	let event = InteractionEvent {
		trace_id: Uuid::new_v4(),
		requester: None,
		query_text: "What is your plan?".to_string(),
		analysis: QuestionAnalysis::fallback(),
		plan: ResponsePlan::fallback(),
		evidence_count: 0,
		top_confidence: None,
		query_fingerprint: "abc".to_string(),
		timestamp: OffsetDateTime::UNIX_EPOCH,
	};
	let json = serde_json::to_value(&event).expect("Failed to serialize event.");

	assert_eq!(json["timestamp"], "1970-01-01T00:00:00Z");
	assert_eq!(json["plan"]["framing"], "break_character_low_confidence");
	assert!(json["requester"].is_null());

	TracingSink.notify(&event).await.expect("Tracing sink must accept events.");
}
