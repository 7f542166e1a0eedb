//! Request body size enforcement.

use std::{
    pin::Pin,
    task::{ready, Context, Poll},
};

use actix_web::{
    error::PayloadError,
    http::header::{self, HeaderMap},
    web::Bytes,
};
use futures_core::Stream;
use pin_project_lite::pin_project;

use crate::error::UploadError;

/// Returns the request's declared `Content-Length`, if present and valid.
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(&header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Rejects a request whose declared length is over `limit`, before any of the body is read.
pub fn check_content_length(declared: Option<u64>, limit: u64) -> Result<(), UploadError> {
    match declared {
        Some(len) if len > limit => Err(UploadError::SizeExceeded),
        _ => Ok(()),
    }
}

pin_project! {
    /// Stream adapter that yields `PayloadError::Overflow` once more than `limit` bytes have
    /// passed through it.
    ///
    /// This holds regardless of the declared `Content-Length`, which may be absent (chunked
    /// bodies) or wrong. After the overflow error the stream ends.
    pub struct LimitedPayload<S> {
        #[pin]
        stream: S,
        remaining: u64,
        overflowed: bool,
    }
}

impl<S> LimitedPayload<S> {
    pub fn new(stream: S, limit: u64) -> Self {
        LimitedPayload {
            stream,
            remaining: limit,
            overflowed: false,
        }
    }
}

impl<S> Stream for LimitedPayload<S>
where
    S: Stream<Item = Result<Bytes, PayloadError>>,
{
    type Item = Result<Bytes, PayloadError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.overflowed {
            return Poll::Ready(None);
        }

        match ready!(this.stream.poll_next(cx)) {
            Some(Ok(chunk)) if chunk.len() as u64 > *this.remaining => {
                log::debug!("request body exceeds upload size limit");
                *this.overflowed = true;
                Poll::Ready(Some(Err(PayloadError::Overflow)))
            }
            Some(Ok(chunk)) => {
                *this.remaining -= chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            item => Poll::Ready(item),
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::header::HeaderValue;
    use futures_util::{stream, StreamExt as _};

    use super::*;

    fn chunks(
        data: &'static [&'static [u8]],
    ) -> impl Stream<Item = Result<Bytes, PayloadError>> + Unpin {
        stream::iter(data.iter().copied().map(|chunk| Ok(Bytes::from_static(chunk))))
    }

    #[test]
    fn declared_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_length(&headers), None);

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("1024"));
        assert_eq!(content_length(&headers), Some(1024));

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("nope"));
        assert_eq!(content_length(&headers), None);
    }

    #[test]
    fn check_declared_length() {
        assert!(check_content_length(None, 10).is_ok());
        assert!(check_content_length(Some(10), 10).is_ok());
        assert!(matches!(
            check_content_length(Some(11), 10),
            Err(UploadError::SizeExceeded)
        ));
    }

    #[actix_rt::test]
    async fn within_limit() {
        let mut pl = LimitedPayload::new(chunks(&[b"abc", b"def"]), 6);

        assert_eq!(pl.next().await.unwrap().unwrap(), "abc");
        assert_eq!(pl.next().await.unwrap().unwrap(), "def");
        assert!(pl.next().await.is_none());
    }

    #[actix_rt::test]
    async fn over_limit() {
        let mut pl = LimitedPayload::new(chunks(&[b"abc", b"def", b"ghi"]), 5);

        assert_eq!(pl.next().await.unwrap().unwrap(), "abc");
        assert!(matches!(
            pl.next().await.unwrap(),
            Err(PayloadError::Overflow)
        ));
        assert!(pl.next().await.is_none());
    }
}
