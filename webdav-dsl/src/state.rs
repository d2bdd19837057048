/// Navigation cursor of a session: where new content goes and what the
/// next chained call acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceState {
    prefix: String,
    current_space: String,
    last_resource: String,
}

impl ResourceState {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            current_space: prefix.clone(),
            last_resource: String::new(),
            prefix,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn current_space(&self) -> &str {
        &self.current_space
    }

    pub fn last_resource(&self) -> &str {
        &self.last_resource
    }

    pub fn set_current_space(&mut self, path: impl Into<String>) {
        self.current_space = path.into();
    }

    pub fn set_last_resource(&mut self, path: impl Into<String>) {
        self.last_resource = path.into();
    }

    /// Repository-relative form of an absolute path: "" for the root,
    /// otherwise always starting with `/`.
    pub fn without_prefix(&self, path: &str) -> String {
        let rest = path.strip_prefix(self.prefix.as_str()).unwrap_or(path);
        let rest = rest.replace('\\', "/");
        let rest = rest.trim_end_matches('/');
        if rest.is_empty() {
            String::new()
        } else if rest.starts_with('/') {
            rest.to_string()
        } else {
            format!("/{rest}")
        }
    }

    pub fn last_resource_without_prefix(&self) -> String {
        self.without_prefix(&self.last_resource)
    }
}
