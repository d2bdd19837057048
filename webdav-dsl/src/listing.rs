use std::path::Path;

use walkdir::WalkDir;
use webdav_core::MultiStatus;

use crate::error::DslError;
use crate::model::{ContentKind, ResourceRef, Scope};
use crate::paths::resolve;

/// Children of a PROPFIND depth-1 reply.
///
/// `relative_space` is the listed location without scheme and host; the row
/// whose href equals it (with or without a trailing `/`) is the location
/// itself and is skipped.
pub fn children_from_multistatus(
    status: &MultiStatus,
    relative_space: &str,
    context_prefix: &str,
    prefix: &str,
    scope: Scope,
) -> Vec<ResourceRef> {
    let own = relative_space.trim_end_matches('/');
    status
        .responses
        .iter()
        .filter(|entry| entry.href != own && entry.href != format!("{own}/"))
        .filter(|entry| scope.admits(entry.is_collection))
        .map(|entry| {
            let href = entry.href.trim_end_matches('/');
            let repository_location = href
                .strip_prefix(context_prefix)
                .unwrap_or(href)
                .to_string();
            ResourceRef {
                name: entry.name().to_string(),
                kind: if entry.is_collection {
                    ContentKind::Folder
                } else {
                    ContentKind::File
                },
                content: String::new(),
                protocol_location: Some(resolve(prefix, &[repository_location.as_str()])),
                repository_location: Some(repository_location),
                node_ref: None,
            }
        })
        .collect()
}

/// Recursive walk below `start`, excluding `start` itself. Blocking.
pub fn walk_children(
    volume_root: &Path,
    start: &Path,
    prefix: &str,
    scope: Scope,
) -> Result<Vec<ResourceRef>, DslError> {
    let mut children = Vec::new();
    for entry in WalkDir::new(start).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let is_folder = entry.file_type().is_dir();
        if !scope.admits(is_folder) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(volume_root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let repository_location = resolve("/", &[relative.as_str()]);
        children.push(ResourceRef {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind: if is_folder {
                ContentKind::Folder
            } else {
                ContentKind::File
            },
            content: String::new(),
            protocol_location: Some(resolve(prefix, &[repository_location.as_str()])),
            repository_location: Some(repository_location),
            node_ref: None,
        });
    }
    Ok(children)
}

/// Whether a child named like `target` is among `candidates`.
pub fn contains_named(candidates: &[ResourceRef], target: &ResourceRef) -> bool {
    candidates
        .iter()
        .any(|candidate| candidate.name == target.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use webdav_core::MultiStatusEntry;

    fn entry(href: &str, is_collection: bool) -> MultiStatusEntry {
        MultiStatusEntry {
            href: href.to_string(),
            is_collection,
            ..MultiStatusEntry::default()
        }
    }

    fn listing() -> MultiStatus {
        MultiStatus {
            responses: vec![
                entry("/alfresco/webdav/Sites/s1/documentLibrary/", true),
                entry("/alfresco/webdav/Sites/s1/documentLibrary/Reports", true),
                entry("/alfresco/webdav/Sites/s1/documentLibrary/readme.txt", false),
            ],
        }
    }

    #[test]
    fn folder_scope_returns_only_collections() {
        let children = children_from_multistatus(
            &listing(),
            "/alfresco/webdav/Sites/s1/documentLibrary",
            "/alfresco/webdav",
            "http://h:8080/alfresco/webdav",
            Scope::Folders,
        );
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Reports");
        assert_eq!(children[0].kind, ContentKind::Folder);
        assert_eq!(
            children[0].repository_location.as_deref(),
            Some("/Sites/s1/documentLibrary/Reports")
        );
        assert_eq!(
            children[0].protocol_location.as_deref(),
            Some("http://h:8080/alfresco/webdav/Sites/s1/documentLibrary/Reports")
        );
    }

    #[test]
    fn self_entry_is_excluded_with_or_without_trailing_slash() {
        for space in [
            "/alfresco/webdav/Sites/s1/documentLibrary",
            "/alfresco/webdav/Sites/s1/documentLibrary/",
        ] {
            let children = children_from_multistatus(
                &listing(),
                space,
                "/alfresco/webdav",
                "http://h:8080/alfresco/webdav",
                Scope::All,
            );
            let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["Reports", "readme.txt"]);
        }
    }

    #[test]
    fn file_scope_skips_collections() {
        let children = children_from_multistatus(
            &listing(),
            "/alfresco/webdav/Sites/s1/documentLibrary",
            "/alfresco/webdav",
            "http://h:8080/alfresco/webdav",
            Scope::Files,
        );
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind, ContentKind::File);
    }

    #[test]
    fn membership_compares_against_the_target_name() {
        let children = vec![ResourceRef::file("a.txt"), ResourceRef::folder("b")];
        assert!(contains_named(&children, &ResourceRef::content("b")));
        assert!(!contains_named(&children, &ResourceRef::content("missing")));
        assert!(!contains_named(&[], &ResourceRef::content("a.txt")));
    }

    #[test]
    fn walk_lists_nested_entries_relative_to_volume() {
        let dir = tempfile::tempdir().unwrap();
        let space = dir.path().join("Sites");
        std::fs::create_dir_all(space.join("docs")).unwrap();
        std::fs::write(space.join("docs/a.txt"), b"a").unwrap();

        let all = walk_children(dir.path(), &space, "/vol", Scope::All).unwrap();
        let locations: Vec<&str> = all
            .iter()
            .filter_map(|c| c.repository_location.as_deref())
            .collect();
        assert_eq!(locations, vec!["/Sites/docs", "/Sites/docs/a.txt"]);

        let files = walk_children(dir.path(), &space, "/vol", Scope::Files).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.txt");
        assert_eq!(files[0].protocol_location.as_deref(), Some("/vol/Sites/docs/a.txt"));
    }
}
