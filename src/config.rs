use actix_web::{web, HttpRequest};

/// Body size limit used when none is configured: 32MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 32 << 20;

/// GraphQL multipart request configuration.
///
/// Add to your app data (or to a resource's) to have it picked up by
/// [`graphql_upload`](crate::graphql_upload). Both `UploadConfig` and `web::Data<UploadConfig>`
/// are looked up, in that order.
///
/// ```
/// use actix_multipart_graphql::UploadConfig;
/// use actix_web::App;
///
/// let app = App::new().app_data(UploadConfig::default().max_upload_size(1024 * 1024));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    max_upload_size: u64,
}

impl UploadConfig {
    /// Sets maximum accepted request body size in bytes. Zero restores the default of 32MiB.
    pub fn max_upload_size(mut self, max_upload_size: u64) -> Self {
        self.max_upload_size = max_upload_size;
        self
    }

    /// Returns the effective body size limit.
    pub fn limit(&self) -> u64 {
        if self.max_upload_size == 0 {
            DEFAULT_MAX_UPLOAD_SIZE
        } else {
            self.max_upload_size
        }
    }

    /// Extracts config from app data. Check both `T` and `Data<T>`, in that order, and fall back
    /// to the default config.
    pub(crate) fn from_req(req: &HttpRequest) -> &Self {
        req.app_data::<Self>()
            .or_else(|| req.app_data::<web::Data<Self>>().map(|d| d.as_ref()))
            .unwrap_or(&DEFAULT_CONFIG)
    }
}

const DEFAULT_CONFIG: UploadConfig = UploadConfig { max_upload_size: 0 };

impl Default for UploadConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}
