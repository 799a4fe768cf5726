use modelscan::cache::ScanCache;
use modelscan::scanner::{scan_directory, scan_directory_with, FileRecord, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    assert!(scan_directory(dir.path()).is_empty());
}

#[test]
fn test_scan_missing_directory() {
    assert!(scan_directory(Path::new("/nonexistent/modelscan/scan")).is_empty());
}

#[test]
fn test_scan_file_root_is_empty() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("model.ckpt");
    fs::write(&file, b"x").unwrap();
    assert!(scan_directory(&file).is_empty());
}

#[test]
fn test_scan_filters_by_extension() {
    let dir = tempdir().unwrap();
    for name in [
        "a.ckpt",
        "b.safetensors",
        "c.pt",
        "d.bin",
        "e.yaml",
        "f.vae",
        "g.sft",
        "h.gguf",
        "i.txt",
        "j.json",
        "k.yml",
        "l.safetensors.tmp",
    ] {
        File::create(dir.path().join(name))
            .unwrap()
            .write_all(name.as_bytes())
            .unwrap();
    }

    let mut names: Vec<String> = scan_directory(dir.path())
        .into_iter()
        .map(|r| r.name)
        .collect();
    names.sort();

    assert_eq!(
        names,
        vec![
            "a.ckpt",
            "b.safetensors",
            "c.pt",
            "d.bin",
            "e.yaml",
            "f.vae",
            "g.sft",
            "h.gguf"
        ]
    );
}

#[test]
fn test_scan_records_have_absolute_paths_and_sizes() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("unet/fp16")).unwrap();
    fs::write(dir.path().join("unet/fp16/model.SAFETENSORS"), vec![0u8; 1234]).unwrap();

    let records = scan_directory(dir.path());

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.name, "model.SAFETENSORS");
    assert_eq!(record.size, 1234);
    assert!(Path::new(&record.path).is_absolute());
    assert!(record.path.ends_with("model.SAFETENSORS"));
    assert!(record.modified.contains('T'));
}

#[test]
fn test_scan_skip_hidden() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join(".cache")).unwrap();
    fs::write(dir.path().join(".cache/tmp.bin"), b"x").unwrap();
    fs::write(dir.path().join(".hidden.pt"), b"x").unwrap();
    fs::write(dir.path().join("visible.pt"), b"x").unwrap();

    assert_eq!(scan_directory(dir.path()).len(), 3);

    let config = WalkerConfig::new(false, true);
    let records = scan_directory_with(dir.path(), &config);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "visible.pt");
}

#[test]
fn test_scan_order_is_repeatable() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        fs::write(dir.path().join(format!("m{i:02}.gguf")), b"x").unwrap();
    }

    let first: Vec<String> = scan_directory(dir.path()).into_iter().map(|r| r.path).collect();
    let second: Vec<String> = scan_directory(dir.path()).into_iter().map(|r| r.path).collect();
    assert_eq!(first, second);
}

#[cfg(unix)]
#[test]
fn test_scan_lists_symlinked_files_by_default() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("real.ckpt"), b"weights").unwrap();
    std::os::unix::fs::symlink(
        outside.path().join("real.ckpt"),
        dir.path().join("link.ckpt"),
    )
    .unwrap();

    for config in [WalkerConfig::default(), WalkerConfig::new(true, false)] {
        let records = scan_directory_with(dir.path(), &config);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "link.ckpt");
        assert_eq!(records[0].size, 7);
    }
}

#[cfg(unix)]
#[test]
fn test_scan_follows_symlink_target_changes_through_cache() {
    let models = tempdir().unwrap();
    let store = tempdir().unwrap();
    let target = store.path().join("sdxl-real.safetensors");
    fs::write(&target, vec![0u8; 100]).unwrap();
    std::os::unix::fs::symlink(&target, models.path().join("sdxl.safetensors")).unwrap();

    let cache: ScanCache<Vec<FileRecord>> = ScanCache::with_default_ttl();
    let (files, cached) = cache.get_or_insert_with(models.path(), || scan_directory(models.path()));
    assert!(!cached);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].size, 100);

    fs::write(&target, vec![0u8; 250]).unwrap();

    let (files, cached) = cache.get_or_insert_with(models.path(), || scan_directory(models.path()));
    assert!(!cached);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].size, 250);
}
