//! Axum handlers for the clinical feature endpoints.
//!
//! Every handler is the same linear pipeline, parameterized by its feature:
//! look up the schema, render the prompt, make exactly one completion call,
//! extract the typed response. No retries, no shared state between requests.

use axum::Json;
use axum::extract::State;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument};

use crate::AppState;
use crate::agents::adherence::{self, AdherenceInput, AdherencePrediction};
use crate::agents::diagnosis::{self, Diagnosis, DiagnosisInput};
use crate::agents::drug_interaction::{self, DrugInteraction, DrugInteractionInput};
use crate::agents::guest_booking::{self, BookingPrediction, GuestBookingInput};
use crate::agents::health_analysis::{self, HealthAnalysis, HealthAnalysisInput};
use crate::agents::icd10::{self, Icd10Input, Icd10Suggestion};
use crate::agents::imaging::{ImagingAnalysis, ImagingInput};
use crate::agents::lab_interpretation::{self, LabInterpretation, LabInterpretationInput};
use crate::agents::no_show::{self, NoShowInput, NoShowPrediction};
use crate::agents::prescription::{self, PrescriptionInput, PrescriptionRecommendation};
use crate::agents::readmission::{self, ReadmissionInput, ReadmissionRisk};
use crate::agents::summarization::{self, SummarizationInput, SummarizedNotes};
use crate::agents::vitals_anomaly::{self, AnomalyDetection, VitalsAnomalyInput};
use crate::client::CompletionClient;
use crate::errors::{AgentError, RenderError};
use crate::extract;
use crate::registry::Feature;

/// Runs one feature pipeline end to end.
///
/// `render` receives the schema-derived format instructions and returns the
/// full prompt; the rest of the pipeline is identical for every feature.
async fn run_feature<C, T>(
    state: &AppState<C>,
    feature: Feature,
    render: impl FnOnce(&str) -> Result<String, RenderError>,
) -> Result<T, AgentError>
where
    C: CompletionClient,
    T: DeserializeOwned,
{
    let result = async {
        let spec = state
            .registry
            .spec(feature)
            .ok_or(AgentError::MissingSchema(feature.as_str()))?;
        let prompt = render(&spec.format_instructions())?;
        info!(%feature, "requesting completion");
        let reply = state.completions.complete(&prompt).await?;
        debug!(%feature, reply_bytes = reply.content.len(), "reply received");
        Ok(extract::extract(&reply.content, &spec)?)
    }
    .await;

    result.inspect_err(|e: &AgentError| error!(%feature, error = %e, "feature pipeline failed"))
}

#[instrument(skip(state, input))]
pub async fn diagnosis<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<DiagnosisInput>,
) -> Result<Json<Vec<Diagnosis>>, AgentError> {
    let diagnoses = run_feature(&state, Feature::Diagnosis, |instructions| {
        diagnosis::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(diagnoses))
}

#[instrument(skip(state, input))]
pub async fn summarization<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<SummarizationInput>,
) -> Result<Json<SummarizedNotes>, AgentError> {
    let summary = run_feature(&state, Feature::Summarization, |instructions| {
        summarization::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(summary))
}

#[instrument(skip(state, input))]
pub async fn icd10<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<Icd10Input>,
) -> Result<Json<Vec<Icd10Suggestion>>, AgentError> {
    let suggestions = run_feature(&state, Feature::Icd10, |instructions| {
        icd10::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(suggestions))
}

#[instrument(skip(state, input))]
pub async fn drug_interaction<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<DrugInteractionInput>,
) -> Result<Json<Vec<DrugInteraction>>, AgentError> {
    let interactions = run_feature(&state, Feature::DrugInteraction, |instructions| {
        drug_interaction::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(interactions))
}

#[instrument(skip(state, input))]
pub async fn guest_booking<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<GuestBookingInput>,
) -> Result<Json<BookingPrediction>, AgentError> {
    let prediction = run_feature(&state, Feature::GuestBooking, |instructions| {
        guest_booking::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(prediction))
}

#[instrument(skip(state, input))]
pub async fn health_analysis<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<HealthAnalysisInput>,
) -> Result<Json<HealthAnalysis>, AgentError> {
    let analysis = run_feature(&state, Feature::HealthAnalysis, |instructions| {
        health_analysis::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(analysis))
}

#[instrument(skip(state, input))]
pub async fn vitals_anomaly<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<VitalsAnomalyInput>,
) -> Result<Json<AnomalyDetection>, AgentError> {
    let detection = run_feature(&state, Feature::VitalsAnomaly, |instructions| {
        vitals_anomaly::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(detection))
}

#[instrument(skip(state, input))]
pub async fn adherence<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<AdherenceInput>,
) -> Result<Json<AdherencePrediction>, AgentError> {
    let prediction = run_feature(&state, Feature::Adherence, |instructions| {
        adherence::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(prediction))
}

#[instrument(skip(state, input))]
pub async fn lab_interpretation<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<LabInterpretationInput>,
) -> Result<Json<LabInterpretation>, AgentError> {
    let interpretation = run_feature(&state, Feature::LabInterpretation, |instructions| {
        lab_interpretation::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(interpretation))
}

#[instrument(skip(state, input))]
pub async fn readmission<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<ReadmissionInput>,
) -> Result<Json<ReadmissionRisk>, AgentError> {
    let risk = run_feature(&state, Feature::Readmission, |instructions| {
        readmission::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(risk))
}

#[instrument(skip(state, input))]
pub async fn prescription<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<PrescriptionInput>,
) -> Result<Json<PrescriptionRecommendation>, AgentError> {
    let recommendation = run_feature(&state, Feature::Prescription, |instructions| {
        prescription::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(recommendation))
}

#[instrument(skip(state, input))]
pub async fn no_show<C: CompletionClient>(
    State(state): State<AppState<C>>,
    Json(input): Json<NoShowInput>,
) -> Result<Json<NoShowPrediction>, AgentError> {
    let prediction = run_feature(&state, Feature::NoShow, |instructions| {
        no_show::prompt(&input, instructions)
    })
    .await?;
    Ok(Json(prediction))
}

/// Mounted but disabled: imaging analysis needs a vision-capable backend, so
/// the request is rejected before any completion call is made.
#[instrument(skip(_state, _input))]
pub async fn imaging<C: CompletionClient>(
    State(_state): State<AppState<C>>,
    Json(_input): Json<ImagingInput>,
) -> Result<Json<ImagingAnalysis>, AgentError> {
    Err(AgentError::FeatureDisabled("imaging analysis"))
}
