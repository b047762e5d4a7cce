use axum::Json;
use graph::catalog::resolve_icons;
use graph::{inspect, Canvas, GenerationSummary, GraphReport, SystemEntropy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extract::ApiJson;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// The canvas as the editor has it now.
    #[serde(default)]
    pub canvas: Canvas,
    /// The AI generation response.
    pub response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<GenerationSummary>,
    pub canvas: Canvas,
    pub report: GraphReport,
}

/// Apply an AI response to the canvas.  When the response is not a
/// generation the canvas is handed back unchanged.
pub async fn generate(ApiJson(request): ApiJson<GenerateRequest>) -> Json<GenerateResponse> {
    let mut canvas = request.canvas;
    let summary = canvas.apply_generation(&request.response, &mut SystemEntropy::new());
    if summary.is_some() {
        resolve_icons(&mut canvas.nodes);
    }

    let report = inspect(&canvas.nodes, &canvas.edges);
    Json(GenerateResponse {
        applied: summary.is_some(),
        summary,
        canvas,
        report,
    })
}
