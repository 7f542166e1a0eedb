//! The `operations` section: a raw GraphQL request.

use actix_web::http::header::HeaderMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::variables::{Variable, Variables};

/// Start and end of reading a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceTiming {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

/// A decoded, not yet executed, GraphQL request.
///
/// Deserialized from the `operations` section. Uploads are bound into [`variables`] as their file
/// sections arrive; [`headers`] and [`read_time`] are filled in once the whole body has been
/// read. A `variables` member that is absent or `null` is kept as `None`, and no upload can be
/// bound into it.
///
/// [`variables`]: Self::variables
/// [`headers`]: Self::headers
/// [`read_time`]: Self::read_time
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParams {
    #[serde(default, deserialize_with = "null_as_default")]
    pub query: String,

    #[serde(default)]
    pub operation_name: Option<String>,

    #[serde(default)]
    pub variables: Option<Variables>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: Map<String, Value>,

    #[serde(skip)]
    pub headers: HeaderMap,

    #[serde(skip)]
    pub read_time: Option<TraceTiming>,
}

impl RawParams {
    /// Decodes the JSON body of an `operations` section.
    pub fn from_slice(data: &[u8]) -> Result<RawParams, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Returns the top-level variable `name`, if the operation has variables and one by that name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.as_ref()?.get(name)
    }
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}
