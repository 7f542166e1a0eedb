//! Request handling and response reporting.

use actix_multipart::Multipart;
use actix_web::{
    error::PayloadError,
    http::header::{self, HeaderMap},
    web, HttpRequest, HttpResponse, Resource, ResponseError as _,
};
use futures_core::Stream;
use mime::Mime;

use crate::{
    config::UploadConfig,
    decoder::Decoder,
    error::UploadError,
    executor::GraphExecutor,
    guard::{self, MultipartGuard},
    limit::{check_content_length, content_length, LimitedPayload},
    RawParams,
};

/// Handles a GraphQL multipart request.
///
/// Decodes the body into [`RawParams`] and hands it to the [`GraphExecutor`] registered as
/// `web::Data<E>`. Decoding failures are answered with `422 Unprocessable Entity` and a GraphQL
/// error body; the response is always JSON. The body size limit is taken from [`UploadConfig`]
/// app data.
///
/// Use together with [`MultipartGuard`] or through [`MultipartTransport`].
pub async fn graphql_upload<E>(
    req: HttpRequest,
    payload: web::Payload,
    executor: web::Data<E>,
) -> HttpResponse
where
    E: GraphExecutor + 'static,
{
    let limit = UploadConfig::from_req(&req).limit();

    match decode_request(&req, payload, limit).await {
        Ok(params) => execute(&req, executor.get_ref(), params).await,
        Err(err) => {
            log::debug!("rejecting GraphQL multipart request: {}", err);
            err.error_response()
        }
    }
}

/// Decodes a GraphQL multipart request body, reading at most `limit` bytes.
///
/// A declared `Content-Length` over `limit` is rejected before anything is read.
pub async fn decode_request<S>(
    req: &HttpRequest,
    payload: S,
    limit: u64,
) -> Result<RawParams, UploadError>
where
    S: Stream<Item = Result<web::Bytes, PayloadError>> + 'static,
{
    let declared = content_length(req.headers());
    check_content_length(declared, limit)?;

    if !has_boundary(req.headers()) {
        return Err(UploadError::MultipartForm);
    }

    let multipart = Multipart::new(req.headers(), LimitedPayload::new(payload, limit));

    Decoder::new(multipart, req.headers().clone(), declared)
        .decode()
        .await
}

/// Runs decoded params through the executor and renders its response.
async fn execute<E>(req: &HttpRequest, executor: &E, params: RawParams) -> HttpResponse
where
    E: GraphExecutor + ?Sized,
{
    match executor.create_operation_context(req, params) {
        Ok(ctx) => {
            let res = executor.dispatch_operation(ctx).await;
            HttpResponse::Ok().json(res)
        }
        Err(errors) => {
            let status = executor.status_for(&errors);
            HttpResponse::build(status).json(executor.dispatch_error(req, errors))
        }
    }
}

fn has_boundary(headers: &HeaderMap) -> bool {
    headers
        .get(&header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| ct.parse::<Mime>().ok())
        .map_or(false, |ct| {
            ct.type_() == mime::MULTIPART && ct.get_param(mime::BOUNDARY).is_some()
        })
}

/// GraphQL multipart request transport.
///
/// Bundles the acceptance guard, the size limit, and the handler into one resource.
///
/// ```
/// use actix_multipart_graphql::{GraphExecutor, GraphError, GraphResponse, MultipartTransport, RawParams};
/// use actix_web::{web, App, HttpRequest};
/// use futures_core::future::LocalBoxFuture;
///
/// struct Ping;
///
/// impl GraphExecutor for Ping {
///     type OperationContext = RawParams;
///
///     fn create_operation_context(
///         &self,
///         _req: &HttpRequest,
///         params: RawParams,
///     ) -> Result<RawParams, Vec<GraphError>> {
///         Ok(params)
///     }
///
///     fn dispatch_operation(&self, _ctx: RawParams) -> LocalBoxFuture<'_, GraphResponse> {
///         Box::pin(async { GraphResponse::from_data(serde_json::json!({ "ping": "pong" })) })
///     }
/// }
///
/// let app = App::new()
///     .app_data(web::Data::new(Ping))
///     .service(MultipartTransport::new().max_upload_size(1 << 20).resource::<Ping>("/graphql"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultipartTransport {
    config: UploadConfig,
}

impl MultipartTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets maximum accepted request body size in bytes. Zero means the default of 32MiB.
    pub fn max_upload_size(mut self, max_upload_size: u64) -> Self {
        self.config = self.config.max_upload_size(max_upload_size);
        self
    }

    /// Returns the transport's configuration.
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Returns true if this transport handles `req`. See [`supports`](crate::supports).
    pub fn supports(&self, req: &HttpRequest) -> bool {
        guard::supports(req.head())
    }

    /// Creates a resource at `path` whose only route serves GraphQL multipart requests with
    /// executor `E`, taken from `web::Data<E>` app data.
    pub fn resource<E>(self, path: &str) -> Resource
    where
        E: GraphExecutor + 'static,
    {
        web::resource(path)
            .app_data(self.config)
            .route(web::route().guard(MultipartGuard).to(graphql_upload::<E>))
    }
}
