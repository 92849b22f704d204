use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use parley_domain::{QuestionAnalysis, ResponsePlan};

use crate::{BoxFuture, InteractionSink, Result};

/// Emitted once per pipeline run, including runs that ended on the fallback plan.
#[derive(Clone, Debug, Serialize)]
pub struct InteractionEvent {
	pub trace_id: Uuid,
	/// Present only when the asker consented to logging.
	pub requester: Option<String>,
	pub query_text: String,
	pub analysis: QuestionAnalysis,
	pub plan: ResponsePlan,
	pub evidence_count: usize,
	pub top_confidence: Option<f32>,
	/// blake3 hex digest of the trimmed, lower-cased query.
	pub query_fingerprint: String,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
}

/// Writes each event as one structured log record.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;
impl InteractionSink for TracingSink {
	fn notify<'a>(&'a self, event: &'a InteractionEvent) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let payload = serde_json::to_string(event)?;

			tracing::info!(
				target: "parley::interaction",
				trace_id = %event.trace_id,
				question_type = event.analysis.question_type.as_str(),
				offer_callback = event.plan.offer_callback,
				event = %payload,
				"Interaction recorded."
			);

			Ok(())
		})
	}
}
