//! Template pipeline: fan out one field pipeline per field, fan the results back in

use futures::future::try_join_all;
use uuid::Uuid;

use crate::error::XtractError;
use crate::field::FieldPipeline;
use crate::models::ModelSet;
use crate::request::NormalizedRequest;
use crate::response::ExtractionResponse;
use crate::templates::Template;

/// Run every field of `template` concurrently over `request`.
///
/// Every provider call is tagged with `run_id`, which the response carries back.
///
/// The first field failure fails the request; the remaining field futures are
/// dropped, which cancels their in-flight provider calls.
///
/// # Errors
///
/// Returns the first `XtractError` raised by any field pipeline.
pub async fn run_template(
    models: &ModelSet,
    request: &NormalizedRequest,
    template: &Template,
    run_id: Uuid,
) -> Result<ExtractionResponse, XtractError> {
    let request_label = request.request_label();

    let pipelines = template
        .fields
        .iter()
        .map(|field| FieldPipeline::new(models, request, field, &request_label, run_id).run());

    let fields = try_join_all(pipelines).await?;

    Ok(ExtractionResponse::new(run_id, request.request_id.clone(), fields))
}
