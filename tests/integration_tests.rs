//! Integration tests for infect / extract / restore end to end.

use parasite::config::TRAILER_LEN;
use parasite::{HostAccess, ItemDescriptor, ItemFlags, ParasiteConfig, ParasiteHost};
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a host file with a recognizable byte pattern.
fn create_host(dir: &Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    let data: Vec<u8> = (0..size).map(|x| (x % 251) as u8).collect();
    fs::write(&path, &data).expect("Failed to create host file");
    path
}

fn create_payload(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).expect("Failed to create payload file");
    path
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

fn infect(host: &Path, payloads: &[(&Path, ItemFlags)]) {
    let items = payloads
        .iter()
        .map(|(path, flags)| ItemDescriptor::from_file(path, *flags).expect("Failed to read item"))
        .collect();

    let mut engine = ParasiteHost::open(host, HostAccess::ReadWrite, ParasiteConfig::default())
        .expect("Failed to open host");
    engine.infect(items).expect("Failed to infect");
    engine.close().expect("Failed to close");
}

fn open_loaded(host: &Path) -> ParasiteHost {
    let mut engine = ParasiteHost::open(host, HostAccess::Read, ParasiteConfig::default())
        .expect("Failed to open host");
    engine.read_header().expect("Failed to read header");
    engine.read_file_table().expect("Failed to read table");
    engine
}

#[test]
fn test_example_scenario() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    let host = create_host(dir, "host.bin", 1000);
    let original_host = fs::read(&host).unwrap();
    let a_data = b"0123456789".to_vec();
    let b_data = b"The quick brown fox jumps over the lazy dog. ".repeat(12)[..500].to_vec();
    let a = create_payload(dir, "a.txt", &a_data);
    let b = create_payload(dir, "b.txt", &b_data);

    infect(&host, &[(a.as_path(), ItemFlags::empty()), (b.as_path(), ItemFlags::COMPRESS)]);

    let mut engine = open_loaded(&host);
    assert_eq!(engine.header().base_offset, 1000);
    assert_eq!(engine.header().item_count, 2);

    let items = engine.items();
    assert_eq!(items[0].name, "a.txt");
    assert_eq!(items[0].offset, 1000);
    assert_eq!(items[0].stored_size, 10);
    assert_eq!(items[0].logical_size, 0);
    assert_eq!(items[1].name, "b.txt");
    assert_eq!(items[1].offset, 1010);
    assert_eq!(items[1].logical_size, 500);
    assert!(items[1].stored_size < 500);

    let out = dir.join("out");
    fs::create_dir(&out).unwrap();
    let extracted = engine.extract_all(Some(&out)).expect("Failed to extract");

    assert_eq!(extracted.len(), 2);
    assert!(extracted.iter().all(|e| e.verification.is_verified()));
    assert_eq!(fs::read(out.join("a.txt")).unwrap(), a_data);
    assert_eq!(fs::read(out.join("b.txt")).unwrap(), b_data);

    let restored = dir.join("orig.bin");
    let written = engine.restore(&restored).expect("Failed to restore");
    assert_eq!(written, 1000);
    assert_eq!(fs::read(&restored).unwrap(), original_host);
}

#[test]
fn test_round_trip_uncompressed_and_compressed() {
    for flags in [ItemFlags::empty(), ItemFlags::COMPRESS] {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path();

        let host = create_host(dir, "carrier.exe", 4096 + 17);
        let payloads: Vec<(PathBuf, Vec<u8>)> = vec![
            ("random.bin", random_bytes(3000)),
            ("text.txt", b"line of text\n".repeat(200)),
            ("tiny", vec![1u8]),
        ]
        .into_iter()
        .map(|(name, data)| (create_payload(dir, name, &data), data))
        .collect();

        let refs: Vec<(&Path, ItemFlags)> = payloads
            .iter()
            .map(|(path, _)| (path.as_path(), flags))
            .collect();
        infect(&host, &refs);

        let out = dir.join("out");
        fs::create_dir(&out).unwrap();
        let mut engine = open_loaded(&host);
        engine.extract_all(Some(&out)).expect("Failed to extract");

        for (path, data) in &payloads {
            let name = path.file_name().unwrap();
            assert_eq!(&fs::read(out.join(name)).unwrap(), data, "{:?}", flags);
        }
    }
}

#[test]
fn test_restore_after_many_items() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    let host = create_host(dir, "host.bin", 777);
    let original = fs::read(&host).unwrap();

    let payloads: Vec<PathBuf> = (0..12)
        .map(|i| create_payload(dir, &format!("item_{}.dat", i), &random_bytes(i * 97)))
        .collect();
    let refs: Vec<(&Path, ItemFlags)> = payloads
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let flags = if i % 2 == 0 {
                ItemFlags::COMPRESS
            } else {
                ItemFlags::empty()
            };
            (p.as_path(), flags)
        })
        .collect();
    infect(&host, &refs);

    let mut engine = ParasiteHost::open(&host, HostAccess::Read, ParasiteConfig::default())
        .expect("Failed to open host");
    engine.read_header().expect("Failed to read header");

    let restored = dir.join("restored.bin");
    engine.restore(&restored).expect("Failed to restore");
    assert_eq!(fs::read(&restored).unwrap(), original);
}

#[test]
fn test_detection_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    let host = create_host(dir, "host.bin", 256);
    let a = create_payload(dir, "a.txt", b"first");
    let b = create_payload(dir, "b.txt", b"second");

    let mut engine = ParasiteHost::open(&host, HostAccess::ReadWrite, ParasiteConfig::default())
        .expect("Failed to open host");
    assert!(!engine.has_parasite().unwrap());

    engine
        .infect(vec![ItemDescriptor::from_file(a.as_path(), ItemFlags::empty()).unwrap()])
        .expect("Failed to infect");
    assert!(engine.has_parasite().unwrap());
    engine.close().unwrap();

    let mut engine = ParasiteHost::open(&host, HostAccess::ReadWrite, ParasiteConfig::default())
        .expect("Failed to open host");
    engine.read_header().unwrap();
    engine.read_file_table().unwrap();
    engine
        .infect_more(ItemDescriptor::from_file(b.as_path(), ItemFlags::empty()).unwrap())
        .expect("Failed to add item");
    assert!(engine.has_parasite().unwrap());
    engine.close().unwrap();

    let bytes = fs::read(&host).unwrap();
    assert_eq!(&bytes[bytes.len() - 8..], b"Parasite");
}

#[test]
fn test_infect_more_grows_table() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    let host = create_host(dir, "host.bin", 2000);
    let original = fs::read(&host).unwrap();
    let first = random_bytes(1500);
    let second = b"appended later ".repeat(40);
    let a = create_payload(dir, "first.bin", &first);
    let b = create_payload(dir, "second.txt", &second);

    infect(&host, &[(a.as_path(), ItemFlags::COMPRESS)]);

    let (old_digest, old_offset, old_header_offset) = {
        let engine = open_loaded(&host);
        let item = &engine.items()[0];
        (item.digest, item.offset, engine.header().header_offset)
    };

    let mut engine = ParasiteHost::open(&host, HostAccess::ReadWrite, ParasiteConfig::default())
        .expect("Failed to open host");
    engine.read_header().unwrap();
    engine.read_file_table().unwrap();
    engine
        .infect_more(ItemDescriptor::from_file(b.as_path(), ItemFlags::COMPRESS).unwrap())
        .expect("Failed to add item");
    engine.close().unwrap();

    let mut engine = open_loaded(&host);
    assert_eq!(engine.header().item_count, 2);
    assert_eq!(engine.header().base_offset, 2000);

    let items = engine.items().to_vec();
    assert_eq!(items[0].digest, old_digest);
    assert_eq!(items[0].offset, old_offset);
    // New item reuses the space of the old table.
    assert_eq!(items[1].offset, old_header_offset);
    assert_eq!(engine.header().header_offset as u64, items[1].end());

    let file_len = fs::metadata(&host).unwrap().len();
    assert!(engine.header().header_offset as u64 + TRAILER_LEN < file_len);

    let out = dir.join("out");
    fs::create_dir(&out).unwrap();
    let extracted = engine.extract_all(Some(&out)).expect("Failed to extract");
    assert!(extracted.iter().all(|e| e.verification.is_verified()));
    assert_eq!(fs::read(out.join("first.bin")).unwrap(), first);
    assert_eq!(fs::read(out.join("second.txt")).unwrap(), second);

    let restored = dir.join("orig.bin");
    engine.restore(&restored).unwrap();
    assert_eq!(fs::read(&restored).unwrap(), original);
}

#[test]
fn test_infect_more_after_long_names() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    let host = create_host(dir, "host.bin", 100);
    let long_a = create_payload(dir, &format!("{}.a", "x".repeat(200)), b"aaaa");
    let long_b = create_payload(dir, &format!("{}.b", "y".repeat(200)), b"bbbb");
    let small = create_payload(dir, "s", b"!");

    infect(
        &host,
        &[
            (long_a.as_path(), ItemFlags::empty()),
            (long_b.as_path(), ItemFlags::empty()),
        ],
    );

    let mut engine = ParasiteHost::open(&host, HostAccess::ReadWrite, ParasiteConfig::default())
        .unwrap();
    engine.read_header().unwrap();
    engine.read_file_table().unwrap();
    engine
        .infect_more(ItemDescriptor::from_file(small.as_path(), ItemFlags::empty()).unwrap())
        .unwrap();
    engine.close().unwrap();

    let bytes = fs::read(&host).unwrap();
    assert_eq!(&bytes[bytes.len() - 8..], b"Parasite");

    let mut engine = open_loaded(&host);
    assert_eq!(engine.items().len(), 3);
    let out = dir.join("out");
    fs::create_dir(&out).unwrap();
    engine.extract_all(Some(&out)).unwrap();
    assert_eq!(fs::read(out.join("s")).unwrap(), b"!");
}

#[test]
fn test_extract_single_item_by_name() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    let host = create_host(dir, "host.bin", 64);
    let a = create_payload(dir, "a.txt", b"alpha");
    let b = create_payload(dir, "b.txt", b"bravo");
    infect(&host, &[(a.as_path(), ItemFlags::empty()), (b.as_path(), ItemFlags::COMPRESS)]);

    let out = dir.join("only");
    fs::create_dir(&out).unwrap();
    let mut engine = open_loaded(&host);
    let extraction = engine.extract_item("b.txt", Some(&out)).unwrap();

    assert_eq!(extraction.path, out.join("b.txt"));
    assert_eq!(extraction.size, 5);
    assert_eq!(fs::read(out.join("b.txt")).unwrap(), b"bravo");
    assert!(!out.join("a.txt").exists());
}

#[test]
fn test_unicode_and_empty_items() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    let host = create_host(dir, "host.bin", 300);
    let unicode = create_payload(dir, "日本語.txt", "Japanese content".as_bytes());
    let empty = create_payload(dir, "empty.txt", b"");
    infect(
        &host,
        &[
            (unicode.as_path(), ItemFlags::COMPRESS),
            (empty.as_path(), ItemFlags::empty()),
        ],
    );

    let out = dir.join("out");
    fs::create_dir(&out).unwrap();
    let mut engine = open_loaded(&host);
    engine.extract_all(Some(&out)).unwrap();

    assert_eq!(fs::read(out.join("日本語.txt")).unwrap(), b"Japanese content");
    assert!(fs::read(out.join("empty.txt")).unwrap().is_empty());
}

#[test]
fn test_empty_host() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    let host = create_host(dir, "empty_host", 0);
    let a = create_payload(dir, "a.txt", b"payload in an empty host");
    infect(&host, &[(a.as_path(), ItemFlags::empty())]);

    let mut engine = open_loaded(&host);
    assert_eq!(engine.header().base_offset, 0);

    let restored = dir.join("restored");
    assert_eq!(engine.restore(&restored).unwrap(), 0);
    assert!(fs::read(&restored).unwrap().is_empty());
}
