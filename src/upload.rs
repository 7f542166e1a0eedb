use std::{fmt, sync::Arc};

use bytes::Bytes;
use mime::Mime;

/// A file attached to a GraphQL multipart request.
///
/// A file section of a multipart body can only be read once, and only until the next section is
/// requested. The decoder therefore drains each file section into memory before moving on, and
/// the `Upload` handed to the executor owns that buffer. The body size limit bounds the total.
///
/// `Upload` is a cheap handle: cloning it does not copy the content. When one file is mapped to
/// several variables, every location holds a clone of the same handle (see [`Upload::ptr_eq`]).
#[derive(Clone)]
pub struct Upload {
    inner: Arc<UploadInner>,
}

struct UploadInner {
    filename: Option<String>,
    content_type: Option<Mime>,
    size: Option<u64>,
    content: Bytes,
}

impl Upload {
    pub(crate) fn new(
        filename: Option<String>,
        content_type: Option<Mime>,
        size: Option<u64>,
        content: Bytes,
    ) -> Self {
        Upload {
            inner: Arc::new(UploadInner {
                filename,
                content_type,
                size,
                content,
            }),
        }
    }

    /// Returns the file name sent by the client, if any.
    pub fn filename(&self) -> Option<&str> {
        self.inner.filename.as_deref()
    }

    /// Returns the file section's content type, if it is supplied by the client.
    pub fn content_type(&self) -> Option<&Mime> {
        self.inner.content_type.as_ref()
    }

    /// Returns the declared `Content-Length` of the whole request.
    ///
    /// Sections do not carry their own length, so this is only an upper bound of the file size.
    /// Use [`len`](Self::len) for the exact number of bytes received.
    pub fn size(&self) -> Option<u64> {
        self.inner.size
    }

    /// Returns the file content.
    pub fn bytes(&self) -> Bytes {
        self.inner.content.clone()
    }

    /// Returns the number of bytes received for this file.
    pub fn len(&self) -> usize {
        self.inner.content.len()
    }

    /// Returns true if the file section was empty.
    pub fn is_empty(&self) -> bool {
        self.inner.content.is_empty()
    }

    /// Returns true if both handles refer to the same uploaded file section.
    pub fn ptr_eq(this: &Upload, other: &Upload) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }
}

/// Uploads compare structurally: same metadata and same content.
impl PartialEq for Upload {
    fn eq(&self, other: &Self) -> bool {
        Upload::ptr_eq(self, other)
            || (self.inner.filename == other.inner.filename
                && self.inner.content_type == other.inner.content_type
                && self.inner.size == other.inner.size
                && self.inner.content == other.inner.content)
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.inner.filename)
            .field("content_type", &self.inner.content_type)
            .field("size", &self.inner.size)
            .field("len", &self.inner.content.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_content() {
        let upload = Upload::new(
            Some("a.txt".to_owned()),
            Some(mime::TEXT_PLAIN),
            Some(120),
            Bytes::from_static(b"hello"),
        );
        let other = upload.clone();

        assert!(Upload::ptr_eq(&upload, &other));
        assert_eq!(other.filename(), Some("a.txt"));
        assert_eq!(other.content_type(), Some(&mime::TEXT_PLAIN));
        assert_eq!(other.size(), Some(120));
        assert_eq!(other.bytes(), "hello");
        assert_eq!(other.len(), 5);
    }

    #[test]
    fn structural_equality() {
        let a = Upload::new(None, None, None, Bytes::from_static(b"x"));
        let b = Upload::new(None, None, None, Bytes::from_static(b"x"));
        let c = Upload::new(Some("c".to_owned()), None, None, Bytes::from_static(b"x"));

        assert!(!Upload::ptr_eq(&a, &b));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
