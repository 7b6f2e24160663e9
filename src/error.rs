//! Module defining the errors which are exposed to the users of the crate

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The processor returned a payload without a recognisable status, or with
    /// a status outside the known lifecycle values
    #[error("invalid processor response for {payment_id}: {message}")]
    InvalidProcessorResponse {
        payment_id: String,
        message: String,
    },

    /// Network failure, timeout or unexpected status code from the processor
    /// or the ledger; the payment is left pending for the next cycle
    #[error("transport error: {message}")]
    Transport {
        message: String,
        body: Option<String>,
    },

    /// Authentication or authorisation failure against a collaborator
    #[error("authentication failure: {message}")]
    Auth { message: String },

    /// A state change the collaborator reports as already applied, e.g. a
    /// second capture attempt on the same payment
    #[error("conflicting state change: {message}")]
    Conflict { message: String },

    /// Malformed numeric input to the charge calculation
    #[error("invalid amount: {message}")]
    InvalidAmount { message: String },
}

pub(crate) fn invalid_response(
    payment_id: impl Into<String>,
    message: impl Into<String>,
) -> Error {
    Error::InvalidProcessorResponse {
        payment_id: payment_id.into(),
        message: message.into(),
    }
}

pub(crate) fn transport_error(message: impl Into<String>, body: Option<String>) -> Error {
    Error::Transport {
        message: message.into(),
        body,
    }
}

pub(crate) fn auth_error(message: impl Into<String>) -> Error {
    Error::Auth {
        message: message.into(),
    }
}

pub(crate) fn conflict_error(message: impl Into<String>) -> Error {
    Error::Conflict {
        message: message.into(),
    }
}

pub(crate) fn invalid_amount(message: impl Into<String>) -> Error {
    Error::InvalidAmount {
        message: message.into(),
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            transport_error(format!("request timed out: {error}"), None)
        } else {
            transport_error(error.to_string(), None)
        }
    }
}
