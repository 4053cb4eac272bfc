use url::Url;

use crate::error::Result;

/// Image name in `[registry/]name[:reference]` form, e.g.
/// `ghcr.io/example/app:latest`
///
/// The registry defaults to `docker.io` and the reference to `latest`.
/// `localhost` registries are addressed over plain HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageName {
    pub url: String,
    pub name: String,
    pub reference: String,
}

impl ImageName {
    pub fn parse(name: &str) -> Result<Self> {
        let (domain, name) = name.split_once('/').unwrap_or(("docker.io", name));
        let (name, reference) = name.split_once(':').unwrap_or((name, "latest"));
        let url = if domain.starts_with("localhost") {
            format!("http://{}", domain)
        } else {
            format!("https://{}", domain)
        };
        Ok(ImageName {
            url,
            name: name.to_string(),
            reference: reference.to_string(),
        })
    }

    /// URL of the registry server holding this image
    pub fn registry_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.url)?)
    }
}
