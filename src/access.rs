//! Access URLs handed to callers.
use crate::error::{Error, Result};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use url::Url;

/// Query parameter the editor reads to open a directory.
pub const FOLDER_PARAM: &str = "folder";

/// Address of the running editor with a folder preselected.
///
/// Derived per request from the base URL, the instance port and the folder,
/// and never stored by the supervisor. Serializes as `{ "url": "..." }`.
///
/// ```
/// use editor_supervisor::AccessUrl;
/// use url::Url;
///
/// let base = Url::parse("http://127.0.0.1").unwrap();
/// let url = AccessUrl::new(&base, 8080, "/work/proj1").unwrap();
/// assert_eq!(url.as_str(), "http://127.0.0.1:8080/?folder=%2Fwork%2Fproj1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUrl {
    url: Url,
}

impl AccessUrl {
    /// Build the URL for `folder` on the instance listening on `port`.
    ///
    /// The folder is percent-encoded but otherwise passed through untouched.
    pub fn new(base: &Url, port: u16, folder: &str) -> Result<Self> {
        let mut url = base.clone();
        url.set_port(Some(port))
            .map_err(|_| Error::ConfigInvalid(format!("Base URL '{}' cannot carry a port", base)))?;
        url.query_pairs_mut().append_pair(FOLDER_PARAM, folder);
        Ok(Self { url })
    }

    /// The URL as a string
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Port of the instance the URL points at
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }

    /// The decoded folder parameter
    pub fn folder(&self) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == FOLDER_PARAM)
            .map(|(_, value)| value.into_owned())
    }

    /// The parsed URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Consume into the string form
    pub fn into_string(self) -> String {
        self.url.into()
    }
}

impl fmt::Display for AccessUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl Serialize for AccessUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AccessUrl", 1)?;
        state.serialize_field("url", self.url.as_str())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_folder_is_encoded() {
        let url = AccessUrl::new(&base("http://127.0.0.1"), 8080, "/work/my proj&co").unwrap();

        assert_eq!(url.port(), Some(8080));
        assert_eq!(url.folder().as_deref(), Some("/work/my proj&co"));
        assert!(!url.as_str().contains("&co"));
    }

    #[test]
    fn test_base_port_is_replaced() {
        let url = AccessUrl::new(&base("http://10.0.0.5:9999"), 8081, "/repo").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5:8081/?folder=%2Frepo");
    }

    #[test]
    fn test_default_port_reported() {
        let url = AccessUrl::new(&base("https://editor.local"), 443, "/repo").unwrap();
        assert_eq!(url.port(), Some(443));
    }

    #[test]
    fn test_serializes_as_url_object() {
        let url = AccessUrl::new(&base("http://127.0.0.1"), 8080, "/a").unwrap();
        let json = serde_json::to_value(&url).unwrap();
        assert_eq!(json, serde_json::json!({ "url": "http://127.0.0.1:8080/?folder=%2Fa" }));
    }
}
