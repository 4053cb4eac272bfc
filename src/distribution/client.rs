use oci_spec::image::ImageManifest;
use std::path::Path;
use url::Url;

use crate::{
    digest::Digest,
    distribution::{
        auth::Authorization,
        blob::{BlobPuller, BlobPusher, BlobRef, BlobSource},
        endpoint::RegistryEndpoint,
        manifest::{ManifestPuller, ManifestPusher},
        tags::TagLister,
        Name, Reference,
    },
    error::{Error, ErrorResponse, RegistryError, Result},
    image_name::ImageName,
    transport::{Request, Transport, UreqTransport},
};

/// Maximum number of temporary redirects followed for one endpoint call.
const MAX_REDIRECTS: usize = 5;

/// A client for the `/v2/<name>/` API endpoint
///
/// The registry URL, repository name, and authorization are fixed at
/// construction, so one instance can serve calls from multiple threads.
pub struct Client {
    transport: Box<dyn Transport>,
    /// URL to registry server
    url: Url,
    /// Name of repository
    name: Name,
    /// Attached to every request; `None` sends anonymous requests
    auth: Option<Authorization>,
}

impl Client {
    pub fn new(url: Url, name: Name) -> Self {
        Self::with_transport(Box::new(UreqTransport::default()), url, name, None)
    }

    pub fn from_image_name(image: &ImageName) -> Result<Self> {
        Ok(Self::new(image.registry_url()?, Name::new(&image.name)?))
    }

    pub fn with_authorization(url: Url, name: Name, auth: Authorization) -> Self {
        Self::with_transport(Box::new(UreqTransport::default()), url, name, Some(auth))
    }

    /// Build a client over a custom [Transport].
    pub fn with_transport(
        transport: Box<dyn Transport>,
        url: Url,
        name: Name,
        auth: Option<Authorization>,
    ) -> Self {
        Client {
            transport,
            url,
            name,
            auth,
        }
    }

    /// Get manifest for given repository
    ///
    /// ```text
    /// GET /v2/<name>/manifests/<reference>
    /// ```
    ///
    /// See [corresponding OCI distribution spec document](https://github.com/opencontainers/distribution-spec/blob/main/spec.md#pulling-manifests) for detail.
    pub fn pull_manifest(&self, reference: &Reference) -> Result<ImageManifest> {
        self.call(&ManifestPuller::new(reference))
    }

    /// Push manifest to registry
    ///
    /// ```text
    /// PUT /v2/<name>/manifests/<reference>
    /// ```
    ///
    /// Manifest must be pushed after blobs are updated.
    ///
    /// See [corresponding OCI distribution spec document](https://github.com/opencontainers/distribution-spec/blob/main/spec.md#pushing-manifests) for detail.
    pub fn push_manifest(&self, reference: &Reference, manifest: &ImageManifest) -> Result<()> {
        self.call(&ManifestPusher::new(manifest, reference))
    }

    /// Download the blob `digest` into the file at `dest`
    ///
    /// ```text
    /// GET /v2/<name>/blobs/<digest>
    /// ```
    ///
    /// The returned [BlobRef] is backed by `dest` and valid once this call
    /// returns. The content is not digest-verified here.
    ///
    /// See [corresponding OCI distribution spec document](https://github.com/opencontainers/distribution-spec/blob/main/spec.md#pulling-blobs) for detail.
    pub fn pull_blob(&self, digest: &Digest, dest: &Path) -> Result<BlobRef> {
        self.call(&BlobPuller::new(digest, dest))
    }

    /// Upload a blob, or skip the upload if the registry already has it
    ///
    /// ```text
    /// POST  /v2/<name>/blobs/uploads/?mount=<digest>
    /// PATCH <location-from-initiate>
    /// PUT   <location-from-write>?digest=<digest>
    /// ```
    ///
    /// Returns `true` when the blob already existed and the upload was
    /// skipped after the first phase, `false` when the content was written
    /// and committed. `digest` must identify the exact bytes yielded by
    /// `source`.
    ///
    /// See [corresponding OCI distribution spec document](https://github.com/opencontainers/distribution-spec/blob/main/spec.md#pushing-blobs) for detail.
    pub fn push_blob(&self, digest: &Digest, source: &dyn BlobSource) -> Result<bool> {
        let pusher = BlobPusher::new(digest, source);
        let mut phase = PushPhase::Initiating;
        loop {
            phase = match phase {
                PushPhase::Initiating => match self.call(&pusher.initiate())? {
                    Some(location) => PushPhase::Writing(self.resolve_location(&location)?),
                    None => PushPhase::Exists,
                },
                PushPhase::Writing(location) => {
                    log::debug!("Blob upload session at {}", location);
                    let next = self.call_at(location, &pusher.write())?;
                    PushPhase::Committing(self.resolve_location(&next)?)
                }
                PushPhase::Committing(location) => {
                    self.call_at(pusher.commit_url(location), &pusher.commit())?;
                    PushPhase::Done
                }
                PushPhase::Exists => {
                    log::debug!("Blob {} already exists, upload skipped", digest);
                    return Ok(true);
                }
                PushPhase::Done => return Ok(false),
            };
        }
    }

    /// Get tags of the repository
    ///
    /// ```text
    /// GET /v2/<name>/tags/list
    /// ```
    ///
    /// See [corresponding OCI distribution spec document](https://github.com/opencontainers/distribution-spec/blob/main/spec.md#content-discovery) for detail.
    pub fn get_tags(&self) -> Result<Vec<String>> {
        self.call(&TagLister)
    }

    fn api_route(&self, suffix: &str) -> Result<Url> {
        Ok(self.url.join(&format!("/v2/{}{}", self.name, suffix))?)
    }

    /// Drive one endpoint at its default route.
    fn call<E: RegistryEndpoint>(&self, endpoint: &E) -> Result<E::Output> {
        let url = self.api_route(&endpoint.route_suffix())?;
        self.call_at(url, endpoint)
    }

    /// Dispatch primitive: send the endpoint's request at `url` over a
    /// connection scoped to this attempt, parse the response on success,
    /// classify the failure otherwise. Temporary redirects re-issue the
    /// same endpoint at the new URL, at most [MAX_REDIRECTS] times.
    fn call_at<E: RegistryEndpoint>(&self, url: Url, endpoint: &E) -> Result<E::Output> {
        let mut url = url;
        for _ in 0..=MAX_REDIRECTS {
            log::info!("{} {}", endpoint.method(), url);
            let connection = self.transport.connect(&url)?;
            let mut request = Request::new();
            if let Some(auth) = &self.auth {
                request.set_header("Authorization", &auth.to_header_value());
            }
            endpoint.build_request(&mut request)?;
            let response = connection.send(endpoint.method(), request)?;
            if response.is_success() {
                return endpoint.handle_response(response);
            }
            match response.status() {
                // The name or reference was rejected; the body explains why
                400 | 404 | 405 => {
                    let body: ErrorResponse = serde_json::from_reader(response.into_reader())?;
                    return Err(Error::Registry(RegistryError {
                        action: endpoint.action_description(&self.url, &self.name),
                        reasons: body.errors,
                    }));
                }
                status @ 401 | status @ 403 => return Err(Error::Unauthorized(status)),
                // Temporary redirect: same request, new URL, fresh connection
                307 => {
                    let location = response
                        .header("Location")
                        .ok_or(Error::MissingLocation)?
                        .to_string();
                    let next = Url::parse(&location).or_else(|_| url.join(&location))?;
                    log::debug!("Redirected to {}", next);
                    url = next;
                }
                status => return Err(Error::UnexpectedStatus { status, url }),
            }
        }
        Err(Error::TooManyRedirects {
            limit: MAX_REDIRECTS,
            url,
        })
    }

    /// A mid-upload Location is an absolute URL used verbatim; a relative
    /// one is resolved against the registry base.
    fn resolve_location(&self, location: &str) -> Result<Url> {
        Ok(Url::parse(location).or_else(|_| self.url.join(location))?)
    }
}

/// Progress of one `push_blob` call. A classified failure in any phase
/// aborts the sequence; only `Exists` short-circuits it successfully.
enum PushPhase {
    Initiating,
    Exists,
    Writing(Url),
    Committing(Url),
    Done,
}
