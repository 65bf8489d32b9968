//! End-to-end writer/reader scenarios.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use archive_core::archive::{
    ArchiveReader, ArchiveReaderConfig, ArchiveReaderSecrets, ArchiveWriter, ArchiveWriterConfig, ArchiveWriterSecrets,
    EntryKind, PartWritten,
};
use archive_core::chunk::ChunkHeader;
use archive_core::credentials::PromptFn;
use archive_core::{ArchiveError, ChunkTag, CipherAlgorithm, CryptType, EntryMeta, FragmentRange, PasswordMode};
use secrecy::SecretBox;

/// Surfaces the writer's/reader's `tracing::debug!` spans (part rotation,
/// entry open/close, password trials) when a test fails under
/// `RUST_LOG=debug`; harmless to call more than once across tests.
fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// Collects every part path the writer hands back, in order, so the
/// reader's `open_next_part` can be driven from the same list.
fn collector() -> (Rc<RefCell<Vec<PathBuf>>>, impl FnMut(PartWritten) -> Result<(), ArchiveError>) {
    let parts = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&parts);
    let cb = move |written: PartWritten| {
        sink.borrow_mut().push(written.temp_path);
        Ok(())
    };
    (parts, cb)
}

fn open_reader<'a>(
    parts: &Rc<RefCell<Vec<PathBuf>>>,
    config: ArchiveReaderConfig,
    secrets: ArchiveReaderSecrets,
    prompt_cb: Option<&'a mut PromptFn<'a>>,
) -> ArchiveReader<'a> {
    let all = parts.borrow().clone();
    let first = all[0].clone();
    let for_reader = all.clone();
    ArchiveReader::open(config, secrets, &first, move |n| Ok(for_reader.get((n - 1) as usize).cloned()), prompt_cb).unwrap()
}

fn secret(s: &str) -> SecretBox<[u8]> {
    SecretBox::new(s.as_bytes().to_vec().into_boxed_slice())
}

#[test]
fn round_trip_single_file_no_crypt_no_compress() {
    init_tracing();
    let (parts, cb) = collector();
    let config = ArchiveWriterConfig { archive_name: "archive".into(), ..Default::default() };
    let mut writer = ArchiveWriter::create(config, ArchiveWriterSecrets::default(), cb, None).unwrap();

    let meta = EntryMeta::new("a.txt").with_size(5).with_owner(0, 0, 0o644);
    let mut entry = writer.new_file_entry("a.txt", meta, None).unwrap();
    writer.write_file_data(&mut entry, b"hello", 0).unwrap();
    writer.close_file_entry(&mut entry).unwrap();
    writer.close().unwrap();

    let mut reader = open_reader(&parts, ArchiveReaderConfig::default(), ArchiveReaderSecrets::default(), None);
    let header = reader.next_entry().unwrap().expect("one entry");
    assert_eq!(header.kind, EntryKind::File);
    assert_eq!(header.meta.name, "a.txt");
    assert_eq!(header.meta.size, Some(5));
    assert_eq!(header.meta.permission, 0o644);
    assert_eq!(header.fragment_range, Some(FragmentRange { fragment_offset: 0, fragment_size: 5 }));

    let mut buf = [0u8; 5];
    let n = reader.read_data(&mut buf).unwrap();
    assert_eq!(n, 5);
    assert_eq!(&buf, b"hello");

    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn two_part_split_preserves_every_byte() {
    init_tracing();
    let (parts, cb) = collector();
    let config = ArchiveWriterConfig { archive_name: "archive".into(), max_part_size: 64, ..Default::default() };
    let mut writer = ArchiveWriter::create(config, ArchiveWriterSecrets::default(), cb, None).unwrap();

    let data = vec![0x41u8; 200];
    let meta = EntryMeta::new("big.bin").with_size(200);
    let mut entry = writer.new_file_entry("big.bin", meta, None).unwrap();
    writer.write_file_data(&mut entry, &data, 1).unwrap();
    writer.close_file_entry(&mut entry).unwrap();
    writer.close().unwrap();

    assert!(parts.borrow().len() >= 2, "expected at least two parts, got {}", parts.borrow().len());

    let mut reader = open_reader(&parts, ArchiveReaderConfig::default(), ArchiveReaderSecrets::default(), None);
    let mut collected = Vec::new();
    let mut total_fragment_size = 0u64;
    while let Some(header) = reader.next_entry().unwrap() {
        assert_eq!(header.kind, EntryKind::File);
        let range = header.fragment_range.expect("file entry has a fragment range");
        total_fragment_size += range.fragment_size;
        let mut buf = vec![0u8; range.fragment_size as usize];
        reader.read_data(&mut buf).unwrap();
        collected.extend(buf);
    }
    assert_eq!(total_fragment_size, 200);
    assert_eq!(collected, data);
}

#[test]
fn symmetric_crypt_trials_passwords_in_order() {
    init_tracing();
    let (parts, cb) = collector();
    let config = ArchiveWriterConfig {
        archive_name: "archive".into(),
        cipher_algorithm: CipherAlgorithm::Aes128,
        crypt_type: CryptType::Symmetric,
        ..Default::default()
    };
    let writer_secrets = ArchiveWriterSecrets { password: Some(secret("secret")), public_key: None };
    let mut writer = ArchiveWriter::create(config, writer_secrets, cb, None).unwrap();

    let meta = EntryMeta::new("secret.txt").with_size(4);
    let mut entry = writer.new_file_entry("secret.txt", meta, None).unwrap();
    writer.write_file_data(&mut entry, b"shh!", 0).unwrap();
    writer.close_file_entry(&mut entry).unwrap();
    writer.close().unwrap();

    let reader_config = ArchiveReaderConfig { archive_name: "archive".into(), password_mode: PasswordMode::Default, skip_unknown: true };
    let reader_secrets =
        ArchiveReaderSecrets { global_password: Some(secret("wrong1")), job_password: Some(secret("wrong2")), private_key: None };
    let mut prompt: Box<PromptFn> = Box::new(|_archive_name| Some(secret("secret")));
    let mut reader = open_reader(&parts, reader_config, reader_secrets, Some(&mut *prompt));

    let header = reader.next_entry().unwrap().expect("one entry");
    assert_eq!(header.meta.name, "secret.txt");
    let mut buf = [0u8; 4];
    reader.read_data(&mut buf).unwrap();
    assert_eq!(&buf, b"shh!");
}

#[test]
fn asymmetric_crypt_round_trip() {
    init_tracing();
    let (private_key, public_key) = archive_core::crypt::create_key_pair(2048).unwrap();

    let (parts, cb) = collector();
    let config = ArchiveWriterConfig {
        archive_name: "archive".into(),
        cipher_algorithm: CipherAlgorithm::Aes256,
        crypt_type: CryptType::Asymmetric,
        ..Default::default()
    };
    let writer_secrets = ArchiveWriterSecrets { password: None, public_key: Some(public_key) };
    let mut writer = ArchiveWriter::create(config, writer_secrets, cb, None).unwrap();

    let meta = EntryMeta::new("keyed.bin").with_size(9);
    let mut entry = writer.new_file_entry("keyed.bin", meta, None).unwrap();
    writer.write_file_data(&mut entry, b"asymmetri", 0).unwrap();
    writer.close_file_entry(&mut entry).unwrap();
    writer.close().unwrap();

    let reader_secrets = ArchiveReaderSecrets { global_password: None, job_password: None, private_key: Some(private_key) };
    let mut reader = open_reader(&parts, ArchiveReaderConfig::default(), reader_secrets, None);

    let header = reader.next_entry().unwrap().expect("one entry");
    assert_eq!(header.meta.name, "keyed.bin");
    let mut buf = [0u8; 9];
    reader.read_data(&mut buf).unwrap();
    assert_eq!(&buf, b"asymmetri");
}

#[test]
fn unknown_top_level_chunk_is_skipped() {
    init_tracing();
    let (parts, cb) = collector();
    let config = ArchiveWriterConfig { archive_name: "archive".into(), ..Default::default() };
    let mut writer = ArchiveWriter::create(config, ArchiveWriterSecrets::default(), cb, None).unwrap();

    let mut first = writer.new_file_entry("first.txt", EntryMeta::new("first.txt").with_size(5), None).unwrap();
    writer.write_file_data(&mut first, b"first", 0).unwrap();
    writer.close_file_entry(&mut first).unwrap();

    let split_at = writer.tell().unwrap();

    let mut second = writer.new_file_entry("second.txt", EntryMeta::new("second.txt").with_size(6), None).unwrap();
    writer.write_file_data(&mut second, b"second", 0).unwrap();
    writer.close_file_entry(&mut second).unwrap();
    writer.close().unwrap();

    assert_eq!(parts.borrow().len(), 1, "scenario expects a single part to splice into");
    let part_path = parts.borrow()[0].clone();
    let original = std::fs::read(&part_path).unwrap();

    let payload = b"not a real entry".to_vec();
    let header = ChunkHeader { id: ChunkTag::new(*b"ZZZZ"), size: payload.len() as u64, offset: 0 };
    let mut spliced = original[..split_at as usize].to_vec();
    spliced.extend(header.encode());
    spliced.extend(&payload);
    spliced.extend(&original[split_at as usize..]);
    std::fs::write(&part_path, spliced).unwrap();

    let reader_config = ArchiveReaderConfig { archive_name: "archive".into(), password_mode: PasswordMode::Default, skip_unknown: true };
    let mut reader = open_reader(&parts, reader_config, ArchiveReaderSecrets::default(), None);

    let first_header = reader.next_entry().unwrap().expect("first entry survives the splice");
    assert_eq!(first_header.meta.name, "first.txt");
    let mut buf = [0u8; 5];
    reader.read_data(&mut buf).unwrap();
    assert_eq!(&buf, b"first");

    let second_header = reader.next_entry().unwrap().expect("second entry follows the unknown chunk");
    assert_eq!(second_header.meta.name, "second.txt");
    let mut buf = [0u8; 6];
    reader.read_data(&mut buf).unwrap();
    assert_eq!(&buf, b"second");

    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn hardlink_with_three_names_round_trips() {
    init_tracing();
    let (parts, cb) = collector();
    let config = ArchiveWriterConfig { archive_name: "archive".into(), ..Default::default() };
    let mut writer = ArchiveWriter::create(config, ArchiveWriterSecrets::default(), cb, None).unwrap();

    let names = vec!["x".to_string(), "y".to_string(), "z".to_string()];
    let meta = EntryMeta::new("x").with_size(10);
    let mut entry = writer.new_hardlink_entry(names, meta, None).unwrap();
    writer.write_hardlink_data(&mut entry, &[7u8; 10], 0).unwrap();
    writer.close_hardlink_entry(&mut entry).unwrap();
    writer.close().unwrap();

    let mut reader = open_reader(&parts, ArchiveReaderConfig::default(), ArchiveReaderSecrets::default(), None);
    let header = reader.next_entry().unwrap().expect("one entry");
    assert_eq!(header.kind, EntryKind::Hardlink);

    let mut all_names = vec![header.meta.name.clone()];
    all_names.extend(header.extra_names.clone());
    assert_eq!(all_names, vec!["x".to_string(), "y".to_string(), "z".to_string()]);

    let mut buf = [0u8; 10];
    reader.read_data(&mut buf).unwrap();
    assert_eq!(buf, [7u8; 10]);
}
