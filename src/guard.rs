//! Request acceptance.

use actix_web::{
    dev::RequestHead,
    guard::{Guard, GuardContext},
    http::{header, Method},
};
use mime::Mime;

/// Returns true if the request is a GraphQL multipart request.
///
/// That is a `POST` whose `Content-Type` parses as `multipart/form-data` (parameters such as the
/// boundary are ignored) and that is not asking for a protocol upgrade. A malformed
/// `Content-Type` is not an error, the request is simply not supported.
pub fn supports(head: &RequestHead) -> bool {
    let headers = head.headers();

    if headers
        .get(&header::UPGRADE)
        .map_or(false, |upgrade| !upgrade.is_empty())
    {
        return false;
    }

    let Some(media_type) = headers
        .get(&header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| ct.parse::<Mime>().ok())
    else {
        return false;
    };

    head.method == Method::POST
        && media_type
            .essence_str()
            .eq_ignore_ascii_case("multipart/form-data")
}

/// Route guard matching GraphQL multipart requests. See [`supports`].
///
/// ```
/// use actix_multipart_graphql::MultipartGuard;
/// use actix_web::{web, HttpResponse};
///
/// web::resource("/graphql").route(
///     web::route()
///         .guard(MultipartGuard)
///         .to(|| HttpResponse::Ok()),
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MultipartGuard;

impl Guard for MultipartGuard {
    fn check(&self, ctx: &GuardContext<'_>) -> bool {
        supports(ctx.head())
    }
}
