use crate::kernel::error::ErrorKind;
use crate::utils::{hash_sha256, sha256_hex, IdGenerator, ProcessIdGenerator};

#[test]
fn test_hash_sha256_known_vectors() {
    assert_eq!(
        hash_sha256(""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(
        hash_sha256("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(hash_sha256("orders"), sha256_hex(b"orders"));
}

#[test]
fn test_hash_is_deterministic() {
    assert_eq!(hash_sha256("orders"), hash_sha256("orders"));
    assert_ne!(hash_sha256("orders"), hash_sha256("Orders"));
    assert_eq!(hash_sha256("orders").len(), 64);
}

#[test]
fn test_process_id_has_prefix_and_bounded_suffix() {
    let generator = ProcessIdGenerator::new("worker");
    for _ in 0..100 {
        let id = generator.generate_id().expect("generation should succeed");
        let suffix = id.strip_prefix("worker-").expect("id should start with the prefix");
        let n: u32 = suffix.parse().expect("suffix should be numeric");
        assert!(n < 1_000_000);
    }
}

#[test]
fn test_process_id_empty_prefix_fails() {
    let generator = ProcessIdGenerator::new("");
    let err = generator.generate_id().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("prefix cannot be empty"));
}
