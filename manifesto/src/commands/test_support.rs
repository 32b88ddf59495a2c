//! Registry fixtures shared by the command tests

use libmanifesto::config::Config;
use libmanifesto::digest::compute_digest;
use libmanifesto::oci::{index_manifest, manifest_to_vec};
use libmanifesto::resolver::StaticResolver;
use libmanifesto::{Manifesto, MetadataIndex};
use mockito::{Mock, Server};

pub const IMAGE_DIGEST: &str =
    "sha256:3333333333333333333333333333333333333333333333333333333333333333";

pub fn image_for(server: &Server) -> String {
    format!("{}/acme/widget:v1", server.host_with_port())
}

/// Store talking plain HTTP to `server`, with the image resolved to [`IMAGE_DIGEST`]
pub fn manifesto_for(server: &Server) -> Manifesto {
    let mut config = Config::default();
    config.registry.insecure = true;
    Manifesto::builder()
        .with_config(config)
        .resolver(StaticResolver::new().with_image(image_for(server), IMAGE_DIGEST))
        .build()
        .unwrap()
}

/// Serves `index` as the repository's metadata index
pub fn mock_index(server: &mut Server, index: &MetadataIndex) -> Vec<Mock> {
    let body = index.to_vec().unwrap();
    let digest = compute_digest(&body);
    let manifest = manifest_to_vec(&index_manifest(&digest, body.len() as u64).unwrap()).unwrap();

    vec![
        server
            .mock("GET", "/v2/acme/widget/manifests/_manifesto")
            .with_status(200)
            .with_body(manifest)
            .create(),
        server
            .mock("GET", format!("/v2/acme/widget/blobs/{}", digest).as_str())
            .with_status(200)
            .with_body(body)
            .create(),
    ]
}

pub fn mock_no_index(server: &mut Server) -> Mock {
    server
        .mock("GET", "/v2/acme/widget/manifests/_manifesto")
        .with_status(404)
        .create()
}

pub fn mock_blob(server: &mut Server, data: &[u8]) -> Mock {
    server
        .mock(
            "GET",
            format!("/v2/acme/widget/blobs/{}", compute_digest(data)).as_str(),
        )
        .with_status(200)
        .with_body(data)
        .create()
}
