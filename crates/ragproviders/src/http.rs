use ragcore::CollaboratorError;
use serde::de::DeserializeOwned;

pub(crate) fn request_failed(e: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Http(e.to_string())
}

/// Decode a JSON body, turning non-2xx statuses into `Api` errors.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CollaboratorError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CollaboratorError::Api {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| CollaboratorError::Decode(e.to_string()))
}
