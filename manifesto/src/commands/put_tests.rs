use super::*;
use crate::commands::test_support::{IMAGE_DIGEST, image_for, manifesto_for, mock_index};
use libmanifesto::MetadataIndex;
use libmanifesto::digest::compute_digest;
use libmanifesto::oci::EMPTY_CONFIG;
use mockito::{Matcher, Server};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_put_replaces_existing_entry() {
    let mut server = Server::new();
    let scan = b"{\"critical\": 1}";

    let mut existing = MetadataIndex::new();
    existing.put(IMAGE_DIGEST, "scan", &compute_digest(b"{\"critical\": 0}"));
    let _index = mock_index(&mut server, &existing);

    let mut updated = existing.clone();
    updated.put(IMAGE_DIGEST, "scan", &compute_digest(scan));
    let updated_body = updated.to_vec().unwrap();

    let _sessions = server
        .mock("POST", "/v2/acme/widget/blobs/uploads/")
        .with_status(202)
        .with_header("Location", "/v2/acme/widget/blobs/uploads/session")
        .expect(3)
        .create();
    let uploads: Vec<_> = [&scan[..], &updated_body[..], &EMPTY_CONFIG[..]]
        .iter()
        .map(|data| {
            server
                .mock("PUT", "/v2/acme/widget/blobs/uploads/session")
                .match_query(Matcher::UrlEncoded("digest".into(), compute_digest(data)))
                .with_status(201)
                .create()
        })
        .collect();
    let bind = server
        .mock("PUT", "/v2/acme/widget/manifests/_manifesto")
        .match_body(Matcher::Regex(compute_digest(&updated_body)))
        .with_status(201)
        .create();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(scan).unwrap();

    let name = put_metadata(&manifesto_for(&server), &image_for(&server), "scan", file.path())
        .unwrap();

    assert_eq!(name, image_for(&server));
    for upload in uploads {
        upload.assert();
    }
    bind.assert();
}

#[test]
fn test_put_missing_file_is_error() {
    let server = Server::new();
    let dir = tempfile::tempdir().unwrap();

    let result = put_metadata(
        &manifesto_for(&server),
        &image_for(&server),
        "scan",
        &dir.path().join("absent.json"),
    );
    assert!(result.is_err());
}
