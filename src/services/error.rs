use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("{service} returned {status}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{service} GraphQL error: {message}")]
    GraphQl {
        service: &'static str,
        message: String,
    },

    #[error("{service} response missing {field}")]
    Decode {
        service: &'static str,
        field: &'static str,
    },
}

impl ServiceError {
    /// Build a `Status` error from a non-success response
    pub(crate) fn status(service: &'static str, response: &reqwest::Response) -> Self {
        Self::Status {
            service,
            status: response.status(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
