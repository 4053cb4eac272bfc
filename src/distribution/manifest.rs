use oci_spec::image::{ImageManifest, MediaType};
use url::Url;

use crate::{
    distribution::{
        endpoint::{registry_authority, RegistryEndpoint},
        Name, Reference,
    },
    error::Result,
    transport::{Method, Request, Response},
};

/// Docker schema2 media type accepted alongside the OCI manifest type
const DOCKER_MANIFEST_V2S2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Pull the manifest stored for a reference.
///
/// ```text
/// GET /v2/<name>/manifests/<reference>
/// ```
pub struct ManifestPuller<'a> {
    reference: &'a Reference,
}

impl<'a> ManifestPuller<'a> {
    pub fn new(reference: &'a Reference) -> Self {
        ManifestPuller { reference }
    }
}

impl RegistryEndpoint for ManifestPuller<'_> {
    type Output = ImageManifest;

    fn route_suffix(&self) -> String {
        format!("/manifests/{}", self.reference)
    }

    fn method(&self) -> Method {
        Method::Get
    }

    fn build_request(&self, request: &mut Request) -> Result<()> {
        request.set_header(
            "Accept",
            &format!("{}, {}", DOCKER_MANIFEST_V2S2, MediaType::ImageManifest),
        );
        Ok(())
    }

    fn handle_response(&self, response: Response) -> Result<ImageManifest> {
        Ok(ImageManifest::from_reader(response.into_reader())?)
    }

    fn action_description(&self, registry: &Url, name: &Name) -> String {
        format!(
            "pull image manifest for {}/{}:{}",
            registry_authority(registry),
            name,
            self.reference
        )
    }
}

/// Push a manifest under a reference.
///
/// ```text
/// PUT /v2/<name>/manifests/<reference>
/// ```
///
/// Blobs named by the manifest must be pushed first.
pub struct ManifestPusher<'a> {
    manifest: &'a ImageManifest,
    reference: &'a Reference,
}

impl<'a> ManifestPusher<'a> {
    pub fn new(manifest: &'a ImageManifest, reference: &'a Reference) -> Self {
        ManifestPusher {
            manifest,
            reference,
        }
    }
}

impl RegistryEndpoint for ManifestPusher<'_> {
    type Output = ();

    fn route_suffix(&self) -> String {
        format!("/manifests/{}", self.reference)
    }

    fn method(&self) -> Method {
        Method::Put
    }

    fn build_request(&self, request: &mut Request) -> Result<()> {
        let mut body = Vec::new();
        self.manifest.to_writer(&mut body)?;
        request.set_header("Content-Type", &MediaType::ImageManifest.to_string());
        request.set_body(body);
        Ok(())
    }

    fn handle_response(&self, _response: Response) -> Result<()> {
        Ok(())
    }

    fn action_description(&self, registry: &Url, name: &Name) -> String {
        format!(
            "push image manifest for {}/{}:{}",
            registry_authority(registry),
            name,
            self.reference
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST_JSON: &str = r#"{
        "schemaVersion": 2,
        "config": {
            "mediaType": "application/vnd.oci.image.config.v1+json",
            "digest": "sha256:b5b2b2c507a0944348e0303114d8d93aaaa081732b86451d9bce1f432a537bc7",
            "size": 7023
        },
        "layers": [
            {
                "mediaType": "application/vnd.oci.image.layer.v1.tar+gzip",
                "digest": "sha256:9834876dcfb05cb167a5c24953eba58c4ac89b1adf57f28f2f9d09af107ee8f0",
                "size": 32654
            }
        ]
    }"#;

    fn test_manifest() -> ImageManifest {
        ImageManifest::from_reader(MANIFEST_JSON.as_bytes()).unwrap()
    }

    #[test]
    fn puller_route() {
        let tag = Reference::new("1.0.3").unwrap();
        let puller = ManifestPuller::new(&tag);
        assert_eq!(puller.route_suffix(), "/manifests/1.0.3");
        assert_eq!(puller.method(), Method::Get);
    }

    #[test]
    fn puller_accept_header() {
        let tag = Reference::new("latest").unwrap();
        let puller = ManifestPuller::new(&tag);
        let mut request = Request::new();
        puller.build_request(&mut request).unwrap();
        let accept = request.header("Accept").unwrap();
        assert!(accept.contains("application/vnd.oci.image.manifest.v1+json"));
        assert!(accept.contains(DOCKER_MANIFEST_V2S2));
    }

    #[test]
    fn pusher_request() {
        let manifest = test_manifest();
        let tag = Reference::new("latest").unwrap();
        let pusher = ManifestPusher::new(&manifest, &tag);
        assert_eq!(pusher.route_suffix(), "/manifests/latest");
        assert_eq!(pusher.method(), Method::Put);

        let mut request = Request::new();
        pusher.build_request(&mut request).unwrap();
        assert_eq!(
            request.header("Content-Type"),
            Some("application/vnd.oci.image.manifest.v1+json")
        );
        let sent = ImageManifest::from_reader(request.body()).unwrap();
        let mut expected = Vec::new();
        manifest.to_writer(&mut expected).unwrap();
        let mut roundtrip = Vec::new();
        sent.to_writer(&mut roundtrip).unwrap();
        assert_eq!(expected, roundtrip);
    }

    #[test]
    fn action_descriptions() {
        let registry = Url::parse("https://registry.example.com").unwrap();
        let name = Name::new("library/app").unwrap();
        let tag = Reference::new("latest").unwrap();
        assert_eq!(
            ManifestPuller::new(&tag).action_description(&registry, &name),
            "pull image manifest for registry.example.com/library/app:latest"
        );
        let manifest = test_manifest();
        assert_eq!(
            ManifestPusher::new(&manifest, &tag).action_description(&registry, &name),
            "push image manifest for registry.example.com/library/app:latest"
        );
    }
}
