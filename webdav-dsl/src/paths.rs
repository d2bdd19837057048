use std::path::{Component, Path, PathBuf};

use crate::error::DslError;

/// Joins `segments` onto `base` with single `/` separators.
///
/// A `scheme://` head is kept as-is, duplicate separators collapse, backslashes
/// become `/`, and the result never ends with `/` unless it is the root.
pub fn resolve<S: AsRef<str>>(base: &str, segments: &[S]) -> String {
    let base = base.replace('\\', "/");
    let (head, rest) = match base.find("://") {
        Some(idx) => base.split_at(idx + 3),
        None => ("", base.as_str()),
    };

    let parts: Vec<String> = rest
        .split('/')
        .map(str::to_string)
        .chain(
            segments
                .iter()
                .flat_map(|segment| {
                    segment
                        .as_ref()
                        .replace('\\', "/")
                        .split('/')
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                }),
        )
        .filter(|part| !part.is_empty())
        .collect();
    let joined = parts.join("/");

    if !head.is_empty() {
        format!("{head}{joined}")
    } else if rest.is_empty() || rest.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Percent-encodes literal spaces; only for paths that go over the wire.
pub fn escape_for_transport(path: &str) -> String {
    path.replace(' ', "%20")
}

pub fn require_initialized<'a>(value: &'a str, what: &str) -> Result<&'a str, DslError> {
    if value.trim().is_empty() {
        return Err(DslError::InvalidArgument(what.to_string()));
    }
    Ok(value)
}

/// Parent of a `/`-separated path; a top-level entry has the empty parent.
pub fn parent_of(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .unwrap_or("")
}

pub fn name_of(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Maps a repository path ("/Sites/a/doc.txt") under a local volume root.
pub fn local_path_for(volume_root: &Path, repository_path: &str) -> Result<PathBuf, DslError> {
    let mut out = volume_root.to_path_buf();
    for component in Path::new(repository_path).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::RootDir | Component::CurDir => continue,
            Component::ParentDir | Component::Prefix(_) => {
                return Err(DslError::InvalidArgument(format!(
                    "repository path without parent references ({repository_path})"
                )));
            }
        }
    }
    Ok(out)
}
