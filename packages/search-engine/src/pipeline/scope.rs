//! URL canonicalization and classification against a site's root.

use url::Url;

use crate::error::{Result, SearchEngineError};

/// Where a URL falls relative to a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlClass {
    /// Host is neither the site's host nor one of its subdomains
    OtherSite,
    /// A downloadable file rather than a page
    SiteFile,
    /// A page of the site, stored under `path`
    SitePage { path: String },
}

/// The set of URLs belonging to one configured site.
///
/// Hosts are compared with a leading `www.` stripped, so `www.example.test`
/// and `example.test` are the same site.
#[derive(Debug, Clone)]
pub struct SiteScope {
    root: Url,
    host: String,
}

impl SiteScope {
    pub fn new(root_url: &str) -> Result<Self> {
        let root = Url::parse(root_url).map_err(|_| SearchEngineError::BadUrl {
            url: root_url.to_string(),
        })?;
        let host = root
            .host_str()
            .map(|h| bare_host(h).to_string())
            .ok_or_else(|| SearchEngineError::BadUrl {
                url: root_url.to_string(),
            })?;

        let mut scope = Self { root, host };
        scope.root = scope.canonicalize(scope.root.clone());
        Ok(scope)
    }

    /// The site's root URL, canonicalized.
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// The site's host without `www.`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether `url` is on the site's host or one of its subdomains.
    pub fn contains(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => {
                let host = bare_host(host);
                host == self.host || host.ends_with(&format!(".{}", self.host))
            }
            None => false,
        }
    }

    /// Parse a link into its canonical form: http(s) only, no query or fragment,
    /// and the root's scheme, host and port when the link points at the site's own host.
    pub fn normalize(&self, link: &str) -> Option<Url> {
        let url = Url::parse(link).ok()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }
        Some(self.canonicalize(url))
    }

    fn canonicalize(&self, mut url: Url) -> Url {
        url.set_query(None);
        url.set_fragment(None);
        if self.is_own_host(&url) {
            // Both are special schemes, so these setters cannot fail.
            let _ = url.set_scheme(self.root.scheme());
            let _ = url.set_host(self.root.host_str());
            let _ = url.set_port(self.root.port());
        }
        url
    }

    fn is_own_host(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|h| bare_host(h) == self.host)
    }

    /// Storage path of a page: the URL path for the site's own host, the full
    /// URL for subdomains so their paths never collide.
    pub fn page_path(&self, url: &Url) -> String {
        if self.is_own_host(url) {
            url.path().to_string()
        } else {
            url.to_string()
        }
    }

    pub fn classify(&self, url: &Url) -> UrlClass {
        if !self.contains(url) {
            return UrlClass::OtherSite;
        }
        if is_site_file(url.path()) {
            return UrlClass::SiteFile;
        }
        UrlClass::SitePage {
            path: self.page_path(url),
        }
    }
}

fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Paths whose last segment has an extension other than `.html`, and PDFs.
fn is_site_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    if lower.ends_with(".pdf") {
        return true;
    }
    let last_segment = lower.rsplit('/').next().unwrap_or("");
    last_segment.contains('.') && !last_segment.ends_with(".html")
}
