//! Errors reported while decoding a GraphQL multipart request.

use actix_multipart::MultipartError;
use actix_web::{error::PayloadError, http::StatusCode, HttpResponse, ResponseError};
use derive_more::{Display, Error, From};

use crate::{
    binder::BindError,
    response::{GraphError, GraphResponse},
};

/// A set of errors that can occur while decoding a GraphQL multipart request.
///
/// All of them are rendered as a GraphQL error response with status `422 Unprocessable Entity`.
#[derive(Debug, Display, Error, From)]
#[non_exhaustive]
pub enum UploadError {
    /// Declared or actual body size is over the configured limit.
    #[display("failed to parse multipart form, request body too large")]
    SizeExceeded,

    /// Content-Type header could not be used to read a multipart body.
    #[display("failed to parse multipart form")]
    MultipartForm,

    /// First section is missing or is not named `operations`.
    #[display("first part must be operations")]
    FirstPartNotOperations,

    /// `operations` section is not a valid GraphQL request.
    #[display("operations form field could not be decoded")]
    OperationsDecode(#[error(not(source))] String),

    /// Second section is missing or is not named `map`.
    #[display("second part must be map")]
    SecondPartNotMap,

    /// `map` section is not a JSON object of string lists.
    #[display("map form field could not be decoded")]
    MapDecode(#[error(not(source))] String),

    /// Reading a file section failed.
    #[display("failed to parse part")]
    PartParse,

    /// File section name is not in `map`, was already used, or has no paths.
    #[display("invalid empty operations paths list for key {key}")]
    EmptyPathList { key: String },

    /// A declared path could not be resolved in the operation's variables.
    #[display("{_0}")]
    #[from]
    Binding(BindError),

    /// A `map` key was never matched by a file section.
    #[display("failed to get key {key} from form")]
    MissingFile { key: String },
}

impl UploadError {
    /// Maps a multipart read error, reporting body overflow as [`UploadError::SizeExceeded`] and
    /// anything else as `otherwise`.
    pub(crate) fn from_read(err: MultipartError, otherwise: UploadError) -> UploadError {
        match err {
            MultipartError::Payload(PayloadError::Overflow) => UploadError::SizeExceeded,
            err => {
                log::debug!("multipart read failed: {}", err);
                otherwise
            }
        }
    }

    /// Converts to an entry of a GraphQL `errors` list.
    pub fn to_graph_error(&self) -> GraphError {
        let err = GraphError::new(self.to_string());

        match self {
            UploadError::Binding(bind) => err
                .with_extension("key", bind.key())
                .with_extension("path", bind.path()),
            _ => err,
        }
    }
}

/// Return `UnprocessableEntity` with a GraphQL error body for `UploadError`
impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(GraphResponse::from_errors(vec![self.to_graph_error()]))
    }
}
