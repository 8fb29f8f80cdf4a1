//! Loading the resources that include directives point at.
use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

use ahash::AHashMap;
use url::Url;

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Absolute URL, without fragment.
    pub url: Url,
    /// Value for an HTTP `Accept` header.
    pub accept: Option<String>,
    /// Value for an HTTP `Accept-Language` header.
    pub accept_language: Option<String>,
}

impl Request {
    pub fn new(url: Url) -> Self {
        Request {
            url,
            accept: None,
            accept_language: None,
        }
    }
}

/// A fetched resource: its bytes and what the transport said about them.
pub struct Resource {
    pub reader: Box<dyn Read>,
    /// Media type, e.g. `application/xml`.
    pub content_type: Option<String>,
    /// Character encoding declared by the transport.
    pub encoding: Option<String>,
}

impl Resource {
    pub fn new(reader: impl Read + 'static) -> Self {
        Resource {
            reader: Box::new(reader),
            content_type: None,
            encoding: None,
        }
    }

    /// Read the resource to the end, closing it.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("content_type", &self.content_type)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// Opens resources by URL.
///
/// Any failure is reported as an I/O error; the include resolver treats
/// all of them as recoverable.
pub trait Fetch {
    fn fetch(&self, request: &Request) -> io::Result<Resource>;
}

/// Fetches `file:` URLs from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl Fetch for FileFetcher {
    fn fetch(&self, request: &Request) -> io::Result<Resource> {
        if request.url.scheme() != "file" {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot fetch {}", request.url),
            ));
        }
        let path = request.url.to_file_path().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a local path: {}", request.url),
            )
        })?;
        let file = File::open(&path)?;
        let mut resource = Resource::new(file);
        resource.content_type = guess_content_type(&path).map(str::to_string);
        Ok(resource)
    }
}

fn guess_content_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "xml" | "xsl" | "xslt" | "xsd" | "rng" => "application/xml",
        "xhtml" => "application/xhtml+xml",
        "svg" => "image/svg+xml",
        "txt" | "text" => "text/plain",
        "html" | "htm" => "text/html",
        _ => return None,
    };
    Some(content_type)
}

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    content_type: Option<String>,
    encoding: Option<String>,
}

/// Serves resources from memory.
///
/// Every request is recorded, which makes it possible to check what was
/// fetched.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: AHashMap<String, Entry>,
    requests: RefCell<Vec<Request>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` at `url`.
    pub fn insert(&mut self, url: &str, bytes: impl Into<Vec<u8>>) {
        self.insert_with(url, bytes, None, None);
    }

    /// Serve `bytes` at `url`, with transport metadata.
    pub fn insert_with(
        &mut self,
        url: &str,
        bytes: impl Into<Vec<u8>>,
        content_type: Option<&str>,
        encoding: Option<&str>,
    ) {
        let key = Url::parse(url)
            .map(String::from)
            .unwrap_or_else(|_| url.to_string());
        self.entries.insert(
            key,
            Entry {
                bytes: bytes.into(),
                content_type: content_type.map(str::to_string),
                encoding: encoding.map(str::to_string),
            },
        );
    }

    /// All requests made so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }
}

impl Fetch for MemoryFetcher {
    fn fetch(&self, request: &Request) -> io::Result<Resource> {
        self.requests.borrow_mut().push(request.clone());
        let entry = self.entries.get(request.url.as_str()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", request.url))
        })?;
        let mut resource = Resource::new(Cursor::new(entry.bytes.clone()));
        resource.content_type = entry.content_type.clone();
        resource.encoding = entry.encoding.clone();
        Ok(resource)
    }
}
