//! Section-by-section decoding of a GraphQL multipart body.
//!
//! A body holds, in this order and nothing else:
//!
//! 1. an `operations` section with the GraphQL request JSON;
//! 2. a `map` section declaring, for each file section name, the variable paths it fills;
//! 3. zero or more file sections, named after `map` keys.
//!
//! The multipart stream is forward-only. A section can only be read until the next one is
//! requested, so the decoder never looks ahead and never reorders.

use std::mem;

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{
    http::header::HeaderMap,
    web::{Bytes, BytesMut},
};
use futures_util::TryStreamExt as _;
use time::OffsetDateTime;

use crate::{
    binder::bind_upload,
    error::UploadError,
    map::PathMap,
    operation::{RawParams, TraceTiming},
    Upload,
};

const OPERATIONS: &str = "operations";
const MAP: &str = "map";

/// Decoder progress.
///
/// `Done` and `Failed` are terminal. A failed step leaves the decoder in `Failed`.
#[derive(Debug)]
pub enum State {
    ExpectOperations,
    ExpectMap(RawParams),
    ExpectFilesOrEnd(RawParams, PathMap),
    Done(RawParams),
    Failed,
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::ExpectOperations => "expect-operations",
            State::ExpectMap(_) => "expect-map",
            State::ExpectFilesOrEnd(..) => "expect-files-or-end",
            State::Done(_) => "done",
            State::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Done(_) | State::Failed)
    }
}

/// Decodes a GraphQL multipart body into [`RawParams`].
pub struct Decoder {
    multipart: Multipart,
    state: State,
    headers: HeaderMap,
    size: Option<u64>,
    start: OffsetDateTime,
}

impl Decoder {
    /// Creates a decoder over `multipart`.
    ///
    /// `headers` are attached to the decoded params. `size` is the request's declared content
    /// length, recorded on every upload.
    pub fn new(multipart: Multipart, headers: HeaderMap, size: Option<u64>) -> Self {
        Decoder {
            multipart,
            state: State::ExpectOperations,
            headers,
            size,
            start: OffsetDateTime::now_utc(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Reads one section and moves to the next state. Does nothing once a terminal state has been
    /// reached.
    pub async fn advance(&mut self) -> Result<(), UploadError> {
        let next = match mem::replace(&mut self.state, State::Failed) {
            State::ExpectOperations => State::ExpectMap(self.read_operations().await?),

            State::ExpectMap(params) => {
                let map = self.read_map().await?;
                State::ExpectFilesOrEnd(params, map)
            }

            State::ExpectFilesOrEnd(mut params, mut map) => {
                if self.read_file(&mut params, &mut map).await? {
                    State::ExpectFilesOrEnd(params, map)
                } else {
                    self.finish(params, &map)?
                }
            }

            terminal => terminal,
        };

        log::trace!("multipart decoder is now in state {}", next.name());
        self.state = next;

        Ok(())
    }

    /// Drives the decoder to completion.
    pub async fn decode(mut self) -> Result<RawParams, UploadError> {
        while !self.state.is_terminal() {
            self.advance().await?;
        }

        match self.state {
            State::Done(params) => Ok(params),
            _ => Err(UploadError::PartParse),
        }
    }

    async fn read_operations(&mut self) -> Result<RawParams, UploadError> {
        let mut field = self
            .expect_section(OPERATIONS, UploadError::FirstPartNotOperations)
            .await?;

        let data = collect(&mut field).await.map_err(|err| {
            let msg = err.to_string();
            UploadError::from_read(err, UploadError::OperationsDecode(msg))
        })?;

        RawParams::from_slice(&data).map_err(|err| {
            log::debug!("operations section is not a GraphQL request: {}", err);
            UploadError::OperationsDecode(err.to_string())
        })
    }

    async fn read_map(&mut self) -> Result<PathMap, UploadError> {
        let mut field = self
            .expect_section(MAP, UploadError::SecondPartNotMap)
            .await?;

        let data = collect(&mut field).await.map_err(|err| {
            let msg = err.to_string();
            UploadError::from_read(err, UploadError::MapDecode(msg))
        })?;

        PathMap::from_slice(&data).map_err(|err| {
            log::debug!("map section is not an object of path lists: {}", err);
            UploadError::MapDecode(err.to_string())
        })
    }

    /// Reads the next section, which must be named `name`.
    async fn expect_section(&mut self, name: &str, err: UploadError) -> Result<Field, UploadError> {
        match self.multipart.try_next().await {
            Ok(Some(field)) if field.name() == Some(name) => Ok(field),
            Ok(Some(field)) => {
                log::debug!(
                    "expected `{}` section, found `{}`",
                    name,
                    field.name().unwrap_or_default()
                );
                Err(err)
            }
            Ok(None) => Err(err),
            Err(read) => Err(UploadError::from_read(read, err)),
        }
    }

    /// Reads a file section and binds it at every path `map` declares for it. Returns `false` at
    /// the end of the body.
    async fn read_file(
        &mut self,
        params: &mut RawParams,
        map: &mut PathMap,
    ) -> Result<bool, UploadError> {
        let mut field = match self.multipart.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(false),
            Err(err) => return Err(UploadError::from_read(err, UploadError::PartParse)),
        };

        let key = field.name().unwrap_or_default().to_owned();

        let paths = map
            .take(&key)
            .ok_or_else(|| UploadError::EmptyPathList { key: key.clone() })?;

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(ToOwned::to_owned);
        let content_type = field.content_type().cloned();

        let content = collect(&mut field)
            .await
            .map_err(|err| UploadError::from_read(err, UploadError::PartParse))?;

        log::debug!(
            "binding file section `{}` ({} bytes) to {} path(s)",
            key,
            content.len(),
            paths.len()
        );

        let upload = Upload::new(filename, content_type, self.size, content);

        for path in &paths {
            bind_upload(params.variables.as_mut(), &key, path, &upload)?;
        }

        Ok(true)
    }

    fn finish(&mut self, mut params: RawParams, map: &PathMap) -> Result<State, UploadError> {
        if let Some(key) = map.first_pending() {
            return Err(UploadError::MissingFile {
                key: key.to_owned(),
            });
        }

        params.headers = mem::take(&mut self.headers);
        params.read_time = Some(TraceTiming {
            start: self.start,
            end: OffsetDateTime::now_utc(),
        });

        Ok(State::Done(params))
    }
}

/// Collects a section's remaining data.
async fn collect(field: &mut Field) -> Result<Bytes, MultipartError> {
    let mut buf = BytesMut::new();

    while let Some(chunk) = field.try_next().await? {
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}
