use std::collections::HashSet;

/// Allow-list of content type identifiers that produce notifications.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeFilter {
    allowed: HashSet<String>,
}

impl ContentTypeFilter {
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_eligible(&self, content_type_identifier: &str) -> bool {
        self.allowed.contains(content_type_identifier)
    }
}

/// Membership test against a plain allow-list.
pub fn is_eligible(content_type_identifier: &str, allow_list: &[String]) -> bool {
    allow_list.iter().any(|id| id == content_type_identifier)
}
