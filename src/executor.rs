//! The seam to a GraphQL execution engine.

use actix_web::{http::StatusCode, HttpRequest};
use futures_core::future::LocalBoxFuture;

use crate::{
    response::{GraphError, GraphResponse},
    RawParams,
};

/// A GraphQL execution engine.
///
/// The handler decodes a multipart request into [`RawParams`] and then drives the executor in two
/// steps: [`create_operation_context`] parses and validates the operation, and
/// [`dispatch_operation`] runs it. Errors from the first step are rendered by
/// [`dispatch_error`] with the status chosen by [`status_for`].
///
/// Uploads bound into the variables are fully buffered, so the executor may read them at any
/// point while it holds the params.
///
/// [`create_operation_context`]: Self::create_operation_context
/// [`dispatch_operation`]: Self::dispatch_operation
/// [`dispatch_error`]: Self::dispatch_error
/// [`status_for`]: Self::status_for
pub trait GraphExecutor {
    /// Prepared, executable operation.
    type OperationContext;

    /// Parses and validates a request.
    fn create_operation_context(
        &self,
        req: &HttpRequest,
        params: RawParams,
    ) -> Result<Self::OperationContext, Vec<GraphError>>;

    /// Executes a prepared operation. The response is only produced when the future is polled.
    fn dispatch_operation(&self, ctx: Self::OperationContext) -> LocalBoxFuture<'_, GraphResponse>;

    /// Renders errors returned from [`create_operation_context`](Self::create_operation_context).
    fn dispatch_error(&self, req: &HttpRequest, errors: Vec<GraphError>) -> GraphResponse {
        let _ = req;
        GraphResponse::from_errors(errors)
    }

    /// Chooses the response status for errors returned from
    /// [`create_operation_context`](Self::create_operation_context).
    ///
    /// Defaults to `422 Unprocessable Entity` if any error is a protocol error (see
    /// [`GraphError::is_protocol_error`]) and `200 OK` otherwise.
    fn status_for(&self, errors: &[GraphError]) -> StatusCode {
        if errors.iter().any(GraphError::is_protocol_error) {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::OK
        }
    }
}
