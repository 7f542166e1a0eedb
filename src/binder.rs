//! Binds uploaded files into an operation's variables tree.

use std::fmt;

use derive_more::{Display, Error};

use crate::{variables::Variables, Upload, Variable};

/// Root segment every upload path must start with.
const VARIABLES_ROOT: &str = "variables";

/// A failure to bind an upload at one of the paths declared for it.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[non_exhaustive]
pub enum BindError {
    /// Path does not start at `variables`.
    #[display("invalid operations paths for key {key}")]
    MissingPrefix { key: String, path: String },

    /// Operation has no `variables` object, or it is `null`.
    #[display("invalid operations path {path} for key {key}: operation has no variables")]
    NoVariables { key: String, path: String },

    /// An object along the path does not contain the next field.
    #[display("invalid operations path {path} for key {key}: field `{segment}` does not exist")]
    MissingKey {
        key: String,
        path: String,
        segment: String,
    },

    /// A list along the path is shorter than the next index.
    #[display(
        "invalid operations path {path} for key {key}: index {index} is out of range for list of \
         length {len}"
    )]
    IndexOutOfRange {
        key: String,
        path: String,
        index: usize,
        len: usize,
    },

    /// A node along the path is neither an object nor a list.
    #[display("invalid operations path {path} for key {key}: `{segment}` is not an object or list")]
    NotAContainer {
        key: String,
        path: String,
        segment: String,
    },
}

impl BindError {
    /// Returns the `map` key of the file section being bound.
    pub fn key(&self) -> &str {
        match self {
            BindError::MissingPrefix { key, .. }
            | BindError::NoVariables { key, .. }
            | BindError::MissingKey { key, .. }
            | BindError::IndexOutOfRange { key, .. }
            | BindError::NotAContainer { key, .. } => key,
        }
    }

    /// Returns the path that could not be resolved.
    pub fn path(&self) -> &str {
        match self {
            BindError::MissingPrefix { path, .. }
            | BindError::NoVariables { path, .. }
            | BindError::MissingKey { path, .. }
            | BindError::IndexOutOfRange { path, .. }
            | BindError::NotAContainer { path, .. } => path,
        }
    }
}

/// A parsed upload path, e.g. `variables.files.0` or `variables.files[0]`.
///
/// Segments are split on `.`, and bracketed parts are split into their own segments. A segment is
/// used as an object field name or, when it consists only of ASCII digits, as a list index; which
/// one applies depends on the node it is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPath {
    segments: Vec<String>,
}

impl UploadPath {
    /// Parses a path string. Returns `None` if it does not start at `variables` or names nothing
    /// below it.
    pub fn parse(path: &str) -> Option<UploadPath> {
        let mut segments = Vec::new();

        for part in path.split('.') {
            match split_brackets(part) {
                Some((head, indices)) => {
                    if !head.is_empty() {
                        segments.push(head.to_owned());
                    }
                    segments.extend(indices.into_iter().map(ToOwned::to_owned));
                }
                None => segments.push(part.to_owned()),
            }
        }

        if segments.len() < 2 || segments[0] != VARIABLES_ROOT {
            return None;
        }

        segments.remove(0);
        Some(UploadPath { segments })
    }

    /// Segments below `variables`.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for UploadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(VARIABLES_ROOT)?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// Splits `files[0][1]` into `("files", ["0", "1"])`. Returns `None` for parts without brackets or
/// with unbalanced ones, which are then taken literally.
fn split_brackets(part: &str) -> Option<(&str, Vec<&str>)> {
    let open = part.find('[')?;
    let (head, mut rest) = part.split_at(open);

    let mut inner = Vec::new();
    while !rest.is_empty() {
        let stripped = rest.strip_prefix('[')?;
        let close = stripped.find(']')?;
        inner.push(&stripped[..close]);
        rest = &stripped[close + 1..];
    }

    Some((head, inner))
}

fn as_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    segment.parse().ok()
}

enum Container<'a> {
    Object(&'a mut Variables),
    List(&'a mut Vec<Variable>),
}

/// Stores `upload` at `path` inside `variables`.
///
/// Every node along the path must already exist, starting with `variables` itself; nothing is
/// created on the way. The node at the end of the path is overwritten. In an object the final
/// field is inserted if missing; in a list the final index must be in range.
pub fn bind_upload(
    variables: Option<&mut Variables>,
    key: &str,
    path: &str,
    upload: &Upload,
) -> Result<(), BindError> {
    let parsed = UploadPath::parse(path).ok_or_else(|| BindError::MissingPrefix {
        key: key.to_owned(),
        path: path.to_owned(),
    })?;

    let missing_key = |segment: &str| BindError::MissingKey {
        key: key.to_owned(),
        path: path.to_owned(),
        segment: segment.to_owned(),
    };
    let out_of_range = |index: usize, len: usize| BindError::IndexOutOfRange {
        key: key.to_owned(),
        path: path.to_owned(),
        index,
        len,
    };

    // parse guarantees at least one segment
    let Some((last, init)) = parsed.segments().split_last() else {
        return Err(missing_key(""));
    };

    let Some(variables) = variables else {
        return Err(BindError::NoVariables {
            key: key.to_owned(),
            path: path.to_owned(),
        });
    };

    let mut container = Container::Object(variables);

    for segment in init {
        let node = match container {
            Container::Object(map) => map
                .get_mut(segment.as_str())
                .ok_or_else(|| missing_key(segment.as_str()))?,

            Container::List(list) => {
                let index = as_index(segment).ok_or_else(|| missing_key(segment.as_str()))?;
                let len = list.len();
                list.get_mut(index).ok_or_else(|| out_of_range(index, len))?
            }
        };

        container = match node {
            Variable::Object(map) => Container::Object(map),
            Variable::List(list) => Container::List(list),
            _ => {
                return Err(BindError::NotAContainer {
                    key: key.to_owned(),
                    path: path.to_owned(),
                    segment: segment.clone(),
                })
            }
        };
    }

    match container {
        Container::Object(map) => {
            map.insert(last.clone(), Variable::Upload(upload.clone()));
        }

        Container::List(list) => {
            let index = as_index(last).ok_or_else(|| missing_key(last.as_str()))?;
            let len = list.len();
            let slot = list.get_mut(index).ok_or_else(|| out_of_range(index, len))?;
            *slot = Variable::Upload(upload.clone());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde_json::json;

    use super::*;

    fn vars(value: serde_json::Value) -> Variables {
        serde_json::from_value(value).unwrap()
    }

    fn upload() -> Upload {
        Upload::new(Some("a.txt".to_owned()), None, None, Bytes::from_static(b"a"))
    }

    #[test]
    fn parse_paths() {
        let path = UploadPath::parse("variables.files.0").unwrap();
        assert_eq!(path.segments(), ["files", "0"]);
        assert_eq!(path.to_string(), "variables.files.0");

        let path = UploadPath::parse("variables.files[0][2].file").unwrap();
        assert_eq!(path.segments(), ["files", "0", "2", "file"]);

        let path = UploadPath::parse("variables.a[b").unwrap();
        assert_eq!(path.segments(), ["a[b"]);

        assert!(UploadPath::parse("variables").is_none());
        assert!(UploadPath::parse("file").is_none());
        assert!(UploadPath::parse("input.file").is_none());
        assert!(UploadPath::parse("").is_none());
    }

    #[test]
    fn bind_object_field() {
        let mut v = vars(json!({ "file": null }));
        let up = upload();

        bind_upload(Some(&mut v), "0", "variables.file", &up).unwrap();
        assert!(Upload::ptr_eq(v["file"].as_upload().unwrap(), &up));
    }

    #[test]
    fn bind_list_element() {
        let mut v = vars(json!({ "input": { "files": [null, null] } }));
        let up = upload();

        bind_upload(Some(&mut v), "1", "variables.input.files.1", &up).unwrap();
        let files = v["input"].get("files").unwrap();
        assert!(files.index(0).unwrap().is_null());
        assert!(Upload::ptr_eq(files.index(1).unwrap().as_upload().unwrap(), &up));

        bind_upload(Some(&mut v), "0", "variables.input.files[0]", &up).unwrap();
        assert!(v["input"].get("files").unwrap().index(0).unwrap().as_upload().is_some());
    }

    #[test]
    fn bind_inserts_missing_leaf_field() {
        let mut v = vars(json!({ "input": {} }));

        bind_upload(Some(&mut v), "0", "variables.input.file", &upload()).unwrap();
        assert!(v["input"].get("file").unwrap().as_upload().is_some());
    }

    #[test]
    fn missing_prefix() {
        let mut v = vars(json!({ "file": null }));

        let err = bind_upload(Some(&mut v), "0", "file", &upload()).unwrap_err();
        assert_eq!(
            err,
            BindError::MissingPrefix {
                key: "0".to_owned(),
                path: "file".to_owned()
            }
        );
        assert_eq!(err.to_string(), "invalid operations paths for key 0");
    }

    #[test]
    fn absent_variables() {
        let err = bind_upload(None, "0", "variables.file", &upload()).unwrap_err();
        assert_eq!(
            err,
            BindError::NoVariables {
                key: "0".to_owned(),
                path: "variables.file".to_owned()
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid operations path variables.file for key 0: operation has no variables",
        );

        // prefix is checked first
        let err = bind_upload(None, "0", "file", &upload()).unwrap_err();
        assert!(matches!(err, BindError::MissingPrefix { .. }));
    }

    #[test]
    fn intermediate_nodes_are_not_created() {
        let mut v = vars(json!({ "file": null }));

        let err = bind_upload(Some(&mut v), "0", "variables.input.file", &upload()).unwrap_err();
        assert!(matches!(&err, BindError::MissingKey { segment, .. } if segment == "input"));
        assert_eq!(err.key(), "0");
        assert_eq!(err.path(), "variables.input.file");
        assert!(v.get("input").is_none());
    }

    #[test]
    fn index_out_of_range() {
        let mut v = vars(json!({ "files": [null] }));

        let err = bind_upload(Some(&mut v), "3", "variables.files.3", &upload()).unwrap_err();
        assert!(matches!(err, BindError::IndexOutOfRange { index: 3, len: 1, .. }));

        let mut v = vars(json!({ "files": [] }));
        let err = bind_upload(Some(&mut v), "0", "variables.files.0.file", &upload()).unwrap_err();
        assert!(matches!(err, BindError::IndexOutOfRange { index: 0, len: 0, .. }));
    }

    #[test]
    fn scalar_intermediate() {
        let mut v = vars(json!({ "file": "text" }));

        let err = bind_upload(Some(&mut v), "0", "variables.file.inner", &upload()).unwrap_err();
        assert!(matches!(&err, BindError::NotAContainer { segment, .. } if segment == "file"));
        assert_eq!(
            err.to_string(),
            "invalid operations path variables.file.inner for key 0: `file` is not an object or list",
        );
    }

    #[test]
    fn named_field_of_list() {
        let mut v = vars(json!({ "files": [null] }));

        let err = bind_upload(Some(&mut v), "0", "variables.files.first", &upload()).unwrap_err();
        assert!(matches!(&err, BindError::MissingKey { segment, .. } if segment == "first"));
    }

    #[test]
    fn numeric_field_of_object() {
        let mut v = vars(json!({ "files": { "0": null } }));

        bind_upload(Some(&mut v), "0", "variables.files.0", &upload()).unwrap();
        assert!(v["files"].get("0").unwrap().as_upload().is_some());
    }
}
