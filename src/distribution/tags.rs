use oci_spec::distribution::TagList;
use url::Url;

use crate::{
    distribution::{
        endpoint::{registry_authority, RegistryEndpoint},
        Name,
    },
    error::Result,
    transport::{Method, Response},
};

/// List the tags of a repository.
///
/// ```text
/// GET /v2/<name>/tags/list
/// ```
pub struct TagLister;

impl RegistryEndpoint for TagLister {
    type Output = Vec<String>;

    fn route_suffix(&self) -> String {
        "/tags/list".to_string()
    }

    fn method(&self) -> Method {
        Method::Get
    }

    fn handle_response(&self, response: Response) -> Result<Vec<String>> {
        let tag_list: TagList = serde_json::from_reader(response.into_reader())?;
        Ok(tag_list.tags().to_vec())
    }

    fn action_description(&self, registry: &Url, name: &Name) -> String {
        format!("list tags for {}/{}", registry_authority(registry), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route() {
        assert_eq!(TagLister.route_suffix(), "/tags/list");
        assert_eq!(TagLister.method(), Method::Get);
    }
}
