//! Package Operations

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use exn::{OptionExt, ResultExt};
use tempfile::TempDir;
use tracing::instrument;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{ErrorKind, Result};
use crate::{Package, is_xml_name};

fn package(path: &Path) -> Result<Package> {
    Package::from_path(path).ok_or_raise(|| ErrorKind::Unsupported(path.display().to_string()))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_raise(|| ErrorKind::Unsupported(path.display().to_string()))
}

fn wanted(name: &str, names: Option<&[&str]>) -> bool {
    is_xml_name(name) && names.is_none_or(|names| names.iter().any(|listed| *listed == name))
}

fn read_zip(path: &Path, names: Option<&[&str]>) -> Result<BTreeMap<String, Vec<u8>>> {
    let file = File::open(path).or_raise(|| ErrorKind::Io)?;
    let mut archive = ZipArchive::new(file).or_raise(|| ErrorKind::Zip)?;
    let mut raw = BTreeMap::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).or_raise(|| ErrorKind::Zip)?;
        if entry.is_dir() || !wanted(entry.name(), names) {
            continue;
        }
        let name = entry.name().to_string();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).or_raise(|| ErrorKind::Zip)?;
        raw.insert(name, bytes);
    }
    Ok(raw)
}

fn decode(raw: BTreeMap<String, Vec<u8>>) -> Result<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();
    let mut failures = Vec::new();
    for (name, bytes) in raw {
        match String::from_utf8(bytes) {
            Ok(content) => {
                entries.insert(name, content);
            },
            Err(err) => failures.push(format!("{name} ({err})")),
        }
    }
    if !failures.is_empty() {
        exn::bail!(ErrorKind::Decode(failures.join("; ")));
    }
    tracing::Span::current().record("entries", entries.len());
    Ok(entries)
}

/// Reads the XML documents of a package, keyed by entry name.
///
/// For a zip archive every `.xml` entry is read (restricted to `names` when
/// given). A bare `.xml` file is a package of one entry named after the file.
///
/// # Errors
///
/// - [`ErrorKind::Unsupported`] for anything other than `.zip` and `.xml`.
/// - [`ErrorKind::Io`] / [`ErrorKind::Zip`] if the package cannot be read.
/// - [`ErrorKind::Decode`] listing *every* entry that is not valid UTF-8.
#[instrument(skip(names), fields(path = %path.display(), entries))]
pub fn read_xml_entries(path: &Path, names: Option<&[&str]>) -> Result<BTreeMap<String, String>> {
    let raw = match package(path)? {
        Package::Xml => {
            let name = file_name(path)?;
            let mut raw = BTreeMap::new();
            if wanted(&name, names) {
                raw.insert(name, fs::read(path).or_raise(|| ErrorKind::Io)?);
            }
            raw
        },
        Package::Zip => read_zip(path, names)?,
    };
    decode(raw)
}

/// Reads the XML entries of a zip archive whatever the file is named, as
/// written by [`write_xml_entries`].
///
/// # Errors
///
/// As [`read_xml_entries`], except that the path's suffix is never checked.
#[instrument(skip(names), fields(path = %path.display(), entries))]
pub fn read_zip_entries(path: &Path, names: Option<&[&str]>) -> Result<BTreeMap<String, String>> {
    decode(read_zip(path, names)?)
}

/// Reads the first XML document of a package.
///
/// # Errors
///
/// As [`read_xml_entries`], plus [`ErrorKind::Io`] if the package holds no XML.
pub fn read_xml_file(path: &Path) -> Result<String> {
    read_xml_entries(path, None)?
        .into_values()
        .next()
        .ok_or_raise(|| ErrorKind::Io)
}

/// Writes a zip archive holding exactly `entries`, replacing any existing file
/// and creating missing parent directories.
#[instrument(skip(entries), fields(path = %path.display(), entries = entries.len()))]
pub fn write_xml_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
    }
    let file = File::create(path).or_raise(|| ErrorKind::Io)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in entries {
        writer.start_file(name.as_str(), options).or_raise(|| ErrorKind::Zip)?;
        writer.write_all(content.as_bytes()).or_raise(|| ErrorKind::Io)?;
    }
    writer.finish().or_raise(|| ErrorKind::Zip)?;
    Ok(())
}

/// Writes a zip archive with a single entry named after the archive itself
/// (`package.zip` holds `package.xml`).
pub fn write_xml_file(path: &Path, content: &str) -> Result<()> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_raise(|| ErrorKind::Unsupported(path.display().to_string()))?;
    let entries = BTreeMap::from([(format!("{stem}.{}", crate::XML_EXTENSION), content.to_string())]);
    write_xml_entries(path, &entries)
}

/// Copies a package into a fresh scratch directory.
///
/// The copy lives as long as the returned [`TempDir`].
#[instrument(fields(path = %path.display()))]
pub fn copy_to_temp(path: &Path) -> Result<(TempDir, PathBuf)> {
    let name = file_name(path)?;
    let directory = tempfile::tempdir().or_raise(|| ErrorKind::Io)?;
    let copy = directory.path().join(name);
    fs::copy(path, &copy).or_raise(|| ErrorKind::Io)?;
    Ok((directory, copy))
}
