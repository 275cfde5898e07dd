use hyper::Method;

/// Action name for methods the verb map does not know.
pub const INVALID_ACTION: &str = "invalid";

/// Ordered mapping from HTTP method to action name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbMap {
    entries: Vec<(Method, String)>,
}

impl Default for VerbMap {
    fn default() -> Self {
        VerbMap::new()
            .with(Method::GET, "index")
            .with(Method::PUT, "update")
            .with(Method::POST, "create")
            .with(Method::DELETE, "delete")
    }
}

impl VerbMap {
    /// An empty map, every method maps to [`INVALID_ACTION`].
    pub fn new() -> Self {
        VerbMap {
            entries: Vec::new(),
        }
    }
    /// Maps `method` to `action`, replacing an earlier mapping in place.
    pub fn with(mut self, method: Method, action: impl Into<String>) -> Self {
        let action = action.into();
        match self.entries.iter_mut().find(|(m, _)| *m == method) {
            Some(entry) => entry.1 = action,
            None => self.entries.push((method, action)),
        }
        self
    }
    pub fn map_action(&self, method: &Method) -> &str {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, action)| action.as_str())
            .unwrap_or(INVALID_ACTION)
    }
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.entries.iter().map(|(m, _)| m)
    }
    /// Value of the `Allow` header sent with a 405 response.
    pub fn allow_header(&self) -> String {
        self.methods()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_map() {
        let verbs = VerbMap::default();
        assert_eq!(verbs.map_action(&Method::GET), "index");
        assert_eq!(verbs.map_action(&Method::PUT), "update");
        assert_eq!(verbs.map_action(&Method::POST), "create");
        assert_eq!(verbs.map_action(&Method::DELETE), "delete");
        assert_eq!(verbs.map_action(&Method::PATCH), INVALID_ACTION);
        assert_eq!(verbs.map_action(&Method::HEAD), INVALID_ACTION);
        assert_eq!(verbs.allow_header(), "GET, PUT, POST, DELETE");
    }

    #[test]
    fn test_custom_map() {
        let verbs = VerbMap::default()
            .with(Method::PATCH, "patch")
            .with(Method::GET, "show");
        assert_eq!(verbs.map_action(&Method::GET), "show");
        assert_eq!(verbs.map_action(&Method::PATCH), "patch");
        assert_eq!(verbs.allow_header(), "GET, PUT, POST, DELETE, PATCH");
        assert_eq!(VerbMap::new().allow_header(), "");
    }
}
