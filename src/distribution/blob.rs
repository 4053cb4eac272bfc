use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};
use url::Url;

use crate::{
    digest::Digest,
    distribution::{
        endpoint::{registry_authority, RegistryEndpoint},
        Name,
    },
    error::{Error, Result},
    transport::{Method, Request, Response},
};

/// Read origin for a blob push.
///
/// The source must be re-openable: the write phase rebuilds its request
/// from scratch when the registry redirects it to another URL.
pub trait BlobSource {
    /// Open a fresh reader over the full blob content.
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;
}

impl BlobSource for [u8] {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(io::Cursor::new(self.to_vec())))
    }
}

impl BlobSource for Path {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(fs::File::open(self)?))
    }
}

/// Reference to a blob written into local storage by [BlobPuller].
///
/// Valid only once the destination file has been fully written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    path: PathBuf,
    size: u64,
}

impl BlobRef {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written to the destination.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn open(&self) -> io::Result<fs::File> {
        fs::File::open(&self.path)
    }
}

/// Download a blob into a local file.
///
/// ```text
/// GET /v2/<name>/blobs/<digest>
/// ```
pub struct BlobPuller<'a> {
    digest: &'a Digest,
    dest: &'a Path,
}

impl<'a> BlobPuller<'a> {
    pub fn new(digest: &'a Digest, dest: &'a Path) -> Self {
        BlobPuller { digest, dest }
    }
}

impl RegistryEndpoint for BlobPuller<'_> {
    type Output = BlobRef;

    fn route_suffix(&self) -> String {
        format!("/blobs/{}", self.digest)
    }

    fn method(&self) -> Method {
        Method::Get
    }

    fn handle_response(&self, response: Response) -> Result<BlobRef> {
        let mut file = fs::File::create(self.dest)?;
        let size = io::copy(&mut response.into_reader(), &mut file)?;
        Ok(BlobRef {
            path: self.dest.to_path_buf(),
            size,
        })
    }

    fn action_description(&self, registry: &Url, name: &Name) -> String {
        format!(
            "pull blob {} for {}/{}",
            self.digest,
            registry_authority(registry),
            name
        )
    }
}

/// Upload a blob through the three-phase chunked protocol.
///
/// ```text
/// POST  /v2/<name>/blobs/uploads/?mount=<digest>
/// PATCH <location-from-initiate>
/// PUT   <location-from-write>?digest=<digest>
/// ```
///
/// The phases are driven in order by [crate::distribution::Client::push_blob];
/// each phase's Location header supplies the URL of the next.
pub struct BlobPusher<'a> {
    digest: &'a Digest,
    source: &'a dyn BlobSource,
}

impl<'a> BlobPusher<'a> {
    pub fn new(digest: &'a Digest, source: &'a dyn BlobSource) -> Self {
        BlobPusher { digest, source }
    }

    /// Phase 1: open an upload session, or learn the blob already exists.
    pub fn initiate(&self) -> BlobUploadInit<'_> {
        BlobUploadInit { pusher: self }
    }

    /// Phase 2: send the blob content to the session URL.
    pub fn write(&self) -> BlobUploadWrite<'_> {
        BlobUploadWrite { pusher: self }
    }

    /// Phase 3: finalize the upload.
    pub fn commit(&self) -> BlobUploadCommit<'_> {
        BlobUploadCommit { pusher: self }
    }

    /// Commit URL: the write-phase Location with the digest appended,
    /// keeping any session parameters the registry put there.
    pub fn commit_url(&self, location: Url) -> Url {
        let mut url = location;
        let query = match url.query() {
            Some(existing) => format!("{}&digest={}", existing, self.digest),
            None => format!("digest={}", self.digest),
        };
        url.set_query(Some(&query));
        url
    }

    fn action_description(&self, registry: &Url, name: &Name) -> String {
        format!(
            "push blob {} for {}/{}",
            self.digest,
            registry_authority(registry),
            name
        )
    }
}

fn require_location(response: &Response) -> Result<String> {
    response
        .header("Location")
        .map(str::to_string)
        .ok_or(Error::MissingLocation)
}

/// `POST /v2/<name>/blobs/uploads/?mount=<digest>`
pub struct BlobUploadInit<'a> {
    pusher: &'a BlobPusher<'a>,
}

impl RegistryEndpoint for BlobUploadInit<'_> {
    /// Location to continue the upload at, or `None` if the blob already
    /// exists on the registry.
    type Output = Option<String>;

    fn route_suffix(&self) -> String {
        format!("/blobs/uploads/?mount={}", self.pusher.digest)
    }

    fn method(&self) -> Method {
        Method::Post
    }

    fn handle_response(&self, response: Response) -> Result<Option<String>> {
        // 202 opens an upload session; any other success means the
        // registry already has the blob (e.g. a cross-repository mount)
        // and the remaining phases are skipped.
        if response.status() != 202 {
            return Ok(None);
        }
        require_location(&response).map(Some)
    }

    fn action_description(&self, registry: &Url, name: &Name) -> String {
        self.pusher.action_description(registry, name)
    }
}

/// `PATCH <location-from-initiate>` carrying the blob content
pub struct BlobUploadWrite<'a> {
    pusher: &'a BlobPusher<'a>,
}

impl RegistryEndpoint for BlobUploadWrite<'_> {
    /// Location for the commit phase.
    type Output = String;

    fn route_suffix(&self) -> String {
        // Reachable only through the Location of the initiate phase
        String::new()
    }

    fn method(&self) -> Method {
        Method::Patch
    }

    fn build_request(&self, request: &mut Request) -> Result<()> {
        let mut body = Vec::new();
        self.pusher.source.open()?.read_to_end(&mut body)?;
        request.set_header("Content-Type", "application/octet-stream");
        request.set_header("Content-Length", &body.len().to_string());
        request.set_body(body);
        Ok(())
    }

    fn handle_response(&self, response: Response) -> Result<String> {
        require_location(&response)
    }

    fn action_description(&self, registry: &Url, name: &Name) -> String {
        self.pusher.action_description(registry, name)
    }
}

/// `PUT <location-from-write>?digest=<digest>` with an empty body
pub struct BlobUploadCommit<'a> {
    pusher: &'a BlobPusher<'a>,
}

impl RegistryEndpoint for BlobUploadCommit<'_> {
    type Output = ();

    fn route_suffix(&self) -> String {
        // Reachable only through the Location of the write phase
        String::new()
    }

    fn method(&self) -> Method {
        Method::Put
    }

    fn build_request(&self, request: &mut Request) -> Result<()> {
        // The digest rides in the query string; the body stays empty
        request.set_header("Content-Length", "0");
        Ok(())
    }

    fn handle_response(&self, _response: Response) -> Result<()> {
        Ok(())
    }

    fn action_description(&self, registry: &Url, name: &Name) -> String {
        self.pusher.action_description(registry, name)
    }
}
