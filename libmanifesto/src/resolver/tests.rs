use super::*;

#[test]
fn test_static_resolver_known_image() {
    let resolver = StaticResolver::new()
        .with_image("acme/widget:v1", "sha256:one")
        .with_image("acme/widget:v2", "sha256:two");

    assert_eq!(resolver.resolve_digest("acme/widget:v1").unwrap(), "sha256:one");
    assert_eq!(resolver.resolve_digest("acme/widget:v2").unwrap(), "sha256:two");
}

#[test]
fn test_static_resolver_unknown_image() {
    let resolver = StaticResolver::new();
    let err = resolver.resolve_digest("acme/widget:v1").unwrap_err();

    assert!(matches!(err, ManifestoError::Resolution { .. }));
    assert!(err.to_string().contains("acme/widget:v1"));
}

#[test]
fn test_boxed_resolver_delegates() {
    let resolver: Box<dyn ImageResolver> =
        Box::new(StaticResolver::new().with_image("a:b", "sha256:c"));
    assert_eq!(resolver.resolve_digest("a:b").unwrap(), "sha256:c");
}
