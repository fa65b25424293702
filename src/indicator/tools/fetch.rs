use serde_json::Value;
use tracing::{info, instrument, warn};
use url::Url;

use crate::indicator::tools::error::{Result, ToolError};
use crate::indicator::tools::io::http::HttpClient;
use crate::indicator::tools::model::ApiKind;

/// Builds the request URL for the selected indicators.
///
/// Athena takes the comma-joined identifiers as the last path segment; DHS
/// takes them in the `indicatorIds` query parameter.
pub fn build_request_url(api: ApiKind, base_url: &str, indicator_ids: &[String]) -> Result<Url> {
    let joined = indicator_ids.join(",");
    match api {
        ApiKind::WhoAthena => {
            let mut url = Url::parse(base_url)?;
            url.path_segments_mut()
                .map_err(|_| ToolError::InvalidEndpoint(base_url.to_string()))?
                .pop_if_empty()
                .push(&joined);
            url.query_pairs_mut()
                .append_pair("format", "json")
                .append_pair("profile", "simple");
            Ok(url)
        }
        ApiKind::DhsProgram => Ok(Url::parse_with_params(
            base_url,
            &[("indicatorIds", joined.as_str()), ("format", "json")],
        )?),
    }
}

/// Fetches the raw records for the selected indicators with a single request.
///
/// An empty selection fails before anything is sent.
#[instrument(level = "info", skip(client, indicator_ids), fields(indicators = indicator_ids.len()))]
pub fn fetch_records<C: HttpClient + ?Sized>(
    client: &C,
    api: ApiKind,
    base_url: &str,
    indicator_ids: &[String],
) -> Result<Vec<Value>> {
    if indicator_ids.is_empty() {
        return Err(ToolError::EmptySelection { api });
    }

    let url = build_request_url(api, base_url, indicator_ids)?;
    let response = client.get(&url)?;
    if !response.is_success() {
        warn!(status = response.status, "API request failed");
        return Err(ToolError::HttpError {
            status: response.status,
            body: response.body,
        });
    }

    let payload: Value = serde_json::from_str(&response.body)?;
    let records = extract_records(api, payload)?;
    info!(record_count = records.len(), "records fetched");
    Ok(records)
}

/// Pulls the records array out of a response payload.
pub fn extract_records(api: ApiKind, payload: Value) -> Result<Vec<Value>> {
    let records = match payload {
        Value::Object(mut object) => object.remove(api.records_field()),
        _ => None,
    };

    match (api, records) {
        (ApiKind::DhsProgram, Some(Value::Array(items))) if items.is_empty() => {
            Err(ToolError::EmptyDataset)
        }
        (_, Some(Value::Array(items))) => Ok(items),
        _ => Err(ToolError::MissingDataField { api }),
    }
}
