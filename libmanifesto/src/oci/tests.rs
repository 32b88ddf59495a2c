use super::*;

const EMPTY_CONFIG_DIGEST: &str =
    "sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a";

const FOREIGN_MANIFEST: &str = r#"{
    "schemaVersion": 2,
    "mediaType": "application/vnd.oci.image.manifest.v1+json",
    "config": {
        "mediaType": "application/vnd.oci.image.config.v1+json",
        "size": 7023,
        "digest": "sha256:b5b2b2c507a0944348e0303114d8d93aaaa081732b86451d9bce1f432a537bc7"
    },
    "layers": [
        {
            "mediaType": "application/vnd.oci.image.layer.v1.tar+gzip",
            "size": 32654,
            "digest": "sha256:9834876dcfb05cb167a5c24953eba58c4ac89b1adf57f28f2f9d09af107ee8f0"
        }
    ]
}"#;

#[test]
fn test_index_manifest_shape() {
    let digest = compute_digest(b"index");
    let manifest = index_manifest(&digest, 5).unwrap();

    assert_eq!(manifest.schema_version(), 2);
    assert_eq!(manifest.config().media_type(), &MediaType::EmptyJSON);
    assert_eq!(manifest.config().digest().to_string(), EMPTY_CONFIG_DIGEST);
    assert_eq!(manifest.config().size(), 2);
    assert_eq!(manifest.layers().len(), 1);
    assert_eq!(index_layer(&manifest), Some((digest, 5)));
}

#[test]
fn test_index_manifest_survives_serialization() {
    let digest = compute_digest(b"{}");
    let manifest = index_manifest(&digest, 2).unwrap();

    let bytes = manifest_to_vec(&manifest).unwrap();
    let json = String::from_utf8(bytes.clone()).unwrap();
    assert!(json.contains(INDEX_MEDIA_TYPE));
    assert!(json.contains(MANIFEST_MEDIA_TYPE));

    let parsed = manifest_from_slice(&bytes).unwrap();
    assert_eq!(index_layer(&parsed), Some((digest, 2)));
}

#[test]
fn test_index_manifest_rejects_bad_digest() {
    let result = index_manifest("not-a-digest", 1);
    assert!(matches!(result, Err(ManifestoError::Validation { .. })));
}

#[test]
fn test_foreign_manifest_has_no_index_layer() {
    let manifest = manifest_from_slice(FOREIGN_MANIFEST.as_bytes()).unwrap();
    assert_eq!(index_layer(&manifest), None);
}

#[test]
fn test_manifest_from_slice_rejects_garbage() {
    assert!(manifest_from_slice(b"{\"images\":[]}").is_err());
    assert!(manifest_from_slice(b"<html>").is_err());
}
