use percent_encoding::percent_decode_str;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::client::WebDavError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiStatus {
    pub responses: Vec<MultiStatusEntry>,
}

/// One `<D:response>` row of a PROPFIND reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiStatusEntry {
    /// Percent-decoded href as sent by the server.
    pub href: String,
    pub is_collection: bool,
    pub is_locked: bool,
}

impl MultiStatusEntry {
    /// Last path segment of the href, ignoring a trailing slash.
    pub fn name(&self) -> &str {
        let trimmed = self.href.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}


pub fn parse_multistatus(xml: &str) -> Result<MultiStatus, WebDavError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut saw_root = false;
    let mut responses = Vec::new();
    let mut current: Option<MultiStatusEntry> = None;
    let mut capture_href = false;
    let mut text = String::new();
    let mut in_resourcetype = false;
    let mut lockdiscovery_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if lockdiscovery_depth > 0 {
                    lockdiscovery_depth += 1;
                }
                match name {
                    b"multistatus" => saw_root = true,
                    b"response" => current = Some(MultiStatusEntry::default()),
                    b"resourcetype" => in_resourcetype = true,
                    b"lockdiscovery" => lockdiscovery_depth = 1,
                    b"href" if lockdiscovery_depth == 0 => capture_href = true,
                    other => mark_element(current.as_mut(), other, in_resourcetype, lockdiscovery_depth),
                }
                text.clear();
            }
            Event::Empty(e) => {
                let name = e.local_name();
                if name.as_ref() == b"multistatus" {
                    saw_root = true;
                }
                mark_element(current.as_mut(), name.as_ref(), in_resourcetype, lockdiscovery_depth);
            }
            Event::Text(t) => {
                if capture_href {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"response" => {
                        if let Some(entry) = current.take() {
                            responses.push(entry);
                        }
                    }
                    b"resourcetype" => in_resourcetype = false,
                    _ => {}
                }
                if lockdiscovery_depth > 0 {
                    lockdiscovery_depth -= 1;
                }
                if capture_href {
                    if let Some(entry) = current.as_mut() {
                        entry.href = percent_decode_str(text.trim())
                            .decode_utf8_lossy()
                            .into_owned();
                    }
                    capture_href = false;
                    text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(WebDavError::MissingMultiStatus);
    }
    Ok(MultiStatus { responses })
}

/// Extracts the `locktoken/href` of the first active lock in a LOCK reply body.
pub fn parse_lock_token(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut in_locktoken = false;
    let mut in_href = false;

    loop {
        match reader.read_event().ok()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"locktoken" => in_locktoken = true,
                b"href" if in_locktoken => in_href = true,
                _ => {}
            },
            Event::Text(t) if in_href => {
                let token = t.unescape().ok()?.trim().to_string();
                if !token.is_empty() {
                    return Some(token);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"locktoken" => in_locktoken = false,
                b"href" => in_href = false,
                _ => {}
            },
            Event::Eof => return None,
            _ => {}
        }
    }
}

fn mark_element(
    entry: Option<&mut MultiStatusEntry>,
    name: &[u8],
    in_resourcetype: bool,
    lockdiscovery_depth: usize,
) {
    let Some(entry) = entry else {
        return;
    };
    if in_resourcetype && contains(name, b"collection") {
        entry.is_collection = true;
    }
    if lockdiscovery_depth > 0 && name == b"activelock" {
        entry.is_locked = true;
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}
