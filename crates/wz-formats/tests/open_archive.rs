//! End-to-end tests for opening archives from disk and memory
//!
//! Archives are synthesized with `wz-test-utils`. The real-data test at the
//! bottom only runs when `WZ_TEST_DATA` points at a `.wz` file.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use pretty_assertions::assert_eq;
use wz_crypto::{VersionHash, WzVariant, encode_offset};
use wz_formats::{ArchiveConfig, EntryKind, WzArchive, WzError};
use wz_test_utils::ArchiveFixture;

#[test]
fn opens_minimal_unencrypted_archive() {
    let built = ArchiveFixture::new(WzVariant::Classic, false)
        .version(1)
        .image("Foo.img")
        .build();

    let mut archive = WzArchive::from_bytes(built.bytes, WzVariant::Classic, false)
        .expect("minimal archive should open");

    assert_eq!(archive.version(), 1);
    assert_eq!(archive.version_hash(), VersionHash::compute(1).value());
    assert_eq!(archive.content_start(), built.content_start);
    assert_eq!(archive.header().magic, "PKG1");
    assert_eq!(archive.reader().position(), built.content_start as usize);
}

#[test]
fn opens_hand_built_plain_archive() {
    let content_start = 18u32;
    let mut bytes = b"PKG1".to_vec();
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes.extend_from_slice(&content_start.to_le_bytes());
    bytes.extend_from_slice(b"x\0");
    assert_eq!(bytes.len(), content_start as usize);

    // Version 1: check byte 0xCD, hash 50
    bytes.extend_from_slice(&0xCDi16.to_le_bytes());
    bytes.push(1);
    bytes.push(4);
    bytes.push(0xFB);
    bytes.extend_from_slice(b"a.img");
    bytes.extend_from_slice(&[10, 0]);
    let field = bytes.len() as u32;
    let target = field + 4;
    bytes.extend_from_slice(&encode_offset(field, content_start, 50, target).to_le_bytes());
    bytes.push(0x73);
    bytes.push(0xF8);
    bytes.extend_from_slice(b"Property");

    let mut archive = WzArchive::from_bytes(bytes, WzVariant::Classic, false)
        .expect("plain archive should open");
    assert_eq!(archive.version(), 1);
    assert_eq!(archive.version_hash(), 50);

    let entries = archive.root_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "a.img");
    assert_eq!(entries[0].offset, target);
}

#[test]
fn opens_archive_with_reference_to_non_entry_record() {
    let built = ArchiveFixture::new(WzVariant::Gms, true)
        .version(83)
        .reference_to_tag(1)
        .image("Item.img")
        .build();

    let mut archive = WzArchive::from_bytes(built.bytes, WzVariant::Gms, true).unwrap();
    assert_eq!(archive.version(), 83);

    let entries = archive.root_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::Image);
    assert_eq!(entries[0].name, "Item.img");
}

#[test]
fn opens_memory_mapped_file() {
    let built = ArchiveFixture::new(WzVariant::Gms, true)
        .version(83)
        .directory("Character")
        .continuation()
        .image("Item.img")
        .build();
    let file = built.to_temp_file().unwrap();

    let mut archive = WzArchive::open_path(file.path(), WzVariant::Gms, true).unwrap();

    assert_eq!(archive.version(), 83);
    assert_eq!(archive.origin(), file.path().display().to_string());

    let entries = archive.root_entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, EntryKind::Directory);
    assert_eq!(entries[0].name, "Character");
    assert_eq!(entries[1].name, "Item.img");
    assert_eq!(entries[1].offset, built.targets[1]);

    archive.close();
}

#[test]
fn opens_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = ArchiveFixture::new(WzVariant::Kms, true)
        .version(176)
        .image_reference("Shared.img")
        .build()
        .write_to(dir.path(), "Base.wz")
        .unwrap();

    let config = ArchiveConfig::from_json_str(r#"{"variant":"kms"}"#).unwrap();
    let mut archive = WzArchive::open_path_with(&path, config).unwrap();

    assert_eq!(archive.variant(), WzVariant::Kms);
    assert!(archive.is_encrypted());
    assert_eq!(archive.version(), 176);
    assert_eq!(archive.root_entries().unwrap()[0].name, "Shared.img");
}

#[test]
fn recovers_every_injected_version() {
    for version in [0u16, 9, 55, 83, 100, 255, 1000, 65535] {
        let built = ArchiveFixture::new(WzVariant::Msea, true)
            .version(version)
            .image("a.img")
            .build();
        let archive = WzArchive::from_bytes(built.bytes, WzVariant::Msea, true)
            .unwrap_or_else(|e| panic!("version {version}: {e}"));
        assert_eq!(archive.version(), version);
        assert_eq!(archive.version_hash(), VersionHash::compute(version).value());
    }
}

#[test]
fn rejects_bad_magic() {
    let built = ArchiveFixture::new(WzVariant::Classic, false)
        .magic(*b"PKG0")
        .image("a.img")
        .build();
    let err = WzArchive::from_bytes(built.bytes, WzVariant::Classic, false).unwrap_err();
    assert!(matches!(err.cause(), WzError::BadMagic { found } if found == "PKG0"));
}

#[test]
fn rejects_empty_archive() {
    let built = ArchiveFixture::new(WzVariant::Classic, false).build();
    let err = WzArchive::from_bytes(built.bytes, WzVariant::Classic, false).unwrap_err();
    assert!(matches!(
        err.into_cause(),
        WzError::EmptyArchive { content_start } if content_start == built.content_start
    ));
}

#[test]
fn rejects_directory_only_archive() {
    let built = ArchiveFixture::new(WzVariant::Gms, true)
        .directory("Map")
        .continuation()
        .directory_reference("Sound")
        .build();
    let err = WzArchive::from_bytes(built.bytes, WzVariant::Gms, true).unwrap_err();
    assert!(matches!(err.cause(), WzError::NoImageEntries { scanned: 3 }));
}

#[test]
fn rejects_unknown_entry_kind() {
    let built = ArchiveFixture::new(WzVariant::Classic, false)
        .raw_tag(7)
        .build();
    let err = WzArchive::from_bytes(built.bytes, WzVariant::Classic, false).unwrap_err();
    assert!(matches!(err.cause(), WzError::UnknownEntryKind { tag: 7, .. }));
}

#[test]
fn exhausts_search_when_marker_missing() {
    let built = ArchiveFixture::new(WzVariant::Classic, false)
        .version(3)
        .property_name("Canvas")
        .image("a.img")
        .build();
    let err = WzArchive::from_bytes(built.bytes, WzVariant::Classic, false).unwrap_err();
    assert!(matches!(err.cause(), WzError::VersionGuessExhausted { .. }));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.wz");
    let err = WzArchive::open_path(&path, WzVariant::Gms, true).unwrap_err();
    assert_eq!(err.origin(), path.display().to_string());
    assert!(matches!(err.cause(), WzError::Io(_)));
}

#[test]
fn detection_report_serializes() {
    let built = ArchiveFixture::new(WzVariant::Classic, false)
        .version(12)
        .description("test archive")
        .image("a.img")
        .build();
    let archive = WzArchive::from_bytes(built.bytes, WzVariant::Classic, false).unwrap();

    let json = serde_json::to_value(archive.detection()).unwrap();
    assert_eq!(json["version"], 12);
    assert_eq!(json["header"]["description"], "test archive");
    assert_eq!(json["entry_count"], 1);
    assert!(json.get("anchor").is_none());
}

#[test]
fn opens_real_archive_when_available() {
    let path = wz_test_utils::require_wz_data!();
    let variant = wz_test_utils::wz_test_variant();
    let encrypted = !variant.has_zero_iv();

    let mut archive = WzArchive::open_path(&path, variant, encrypted)
        .unwrap_or_else(|e| panic!("failed to open {}: {e}", path.display()));
    let entries = archive.root_entries().unwrap();
    assert!(!entries.is_empty());
    assert!(entries.iter().any(|e| e.kind == EntryKind::Image));
}
