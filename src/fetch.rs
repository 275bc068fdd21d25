use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for `{url}` failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("could not read response body from `{url}`")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Blocking GET returning the body as text. A non-2xx status is a failure,
/// same as a transport error; the run has no retry policy.
pub fn fetch_text(url: &str) -> Result<String, FetchError> {
    let response = ureq::get(url).call().map_err(|source| FetchError::Request {
        url: url.to_string(),
        source: Box::new(source),
    })?;

    response.into_string().map_err(|source| FetchError::Body {
        url: url.to_string(),
        source,
    })
}
