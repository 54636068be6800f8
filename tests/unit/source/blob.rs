use super::*;

#[test]
fn created_urls_resolve_until_revoked() {
    let store = BlobStore::new();
    let url = store.create_object_url(b"PK\x03\x04".to_vec(), "application/epub+zip");
    assert!(url.as_str().starts_with(BLOB_URL_PREFIX));

    let blob = store.fetch(url.as_str()).unwrap();
    assert_eq!(blob.bytes.as_ref(), b"PK\x03\x04");
    assert_eq!(blob.content_type, "application/epub+zip");

    assert!(store.revoke(url.as_str()));
    assert!(!store.revoke(url.as_str()));
    let err = store.fetch(url.as_str()).unwrap_err();
    assert!(matches!(err, EpubError::Resolve(_)));
    assert!(store.is_empty());
}

#[test]
fn urls_are_unique_and_clones_share_state() {
    let store = BlobStore::new();
    let shared = store.clone();
    let a = store.create_object_url(Bytes::from_static(b"a"), "text/plain");
    let b = shared.create_object_url(Bytes::from_static(b"b"), "text/plain");
    assert_ne!(a, b);
    assert_eq!(store.len(), 2);
    assert!(store.contains(b.as_str()));
    assert_eq!(a.to_string(), a.as_str());
}
