//! Package archives built in memory, plus directory tree helpers

use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

/// Zip holding `files` (path, content); paths ending in `/` become directories
pub fn zip_package(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().unix_permissions(0o755);

    for (name, content) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Gzipped tarball holding `files` (path, content)
pub fn tar_gz_package(files: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// Write `files` (path, content) below `root`, creating parents
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    fs::create_dir_all(root).unwrap();
    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

/// Every file below `root` by relative `/`-separated path
pub fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (relative, fs::read(entry.path()).unwrap())
        })
        .collect()
}

/// The release package most tests ship
pub fn standard_package_files() -> Vec<(&'static str, &'static [u8])> {
    vec![
        (super::EXE_NAME, super::EXE_CONTENT_NEW),
        ("assets/prices.json", b"{\"dtf\": 12.5}"),
        ("assets/logo.png", b"\x89PNG fake"),
    ]
}

/// `files` in the shape returned by [`read_tree`]
pub fn expected_tree(files: &[(&str, &[u8])]) -> BTreeMap<String, Vec<u8>> {
    files
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_vec()))
        .collect()
}
