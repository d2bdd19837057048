#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    File,
    Folder,
    /// Either kind; used for membership checks that only look at names.
    Content,
}

/// Identity of a file or folder as it moves through DSL calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub name: String,
    pub kind: ContentKind,
    /// Text body written when a file is created.
    pub content: String,
    /// Absolute, protocol-prefixed location last used for this resource.
    pub protocol_location: Option<String>,
    /// Server-relative location, set once the resource exists on the server.
    pub repository_location: Option<String>,
    pub node_ref: Option<String>,
}

impl ResourceRef {
    fn new(name: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            content: String::new(),
            protocol_location: None,
            repository_location: None,
            node_ref: None,
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self::new(name, ContentKind::Folder)
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, ContentKind::File)
    }

    pub fn file_with_content(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(name, ContentKind::File)
        }
    }

    pub fn content(name: impl Into<String>) -> Self {
        Self::new(name, ContentKind::Content)
    }

    pub fn at(mut self, repository_location: impl Into<String>) -> Self {
        self.repository_location = Some(repository_location.into());
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ContentKind::Folder
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Files,
    Folders,
    All,
}

impl Scope {
    pub fn admits(self, is_folder: bool) -> bool {
        match self {
            Scope::Files => !is_folder,
            Scope::Folders => is_folder,
            Scope::All => true,
        }
    }
}
