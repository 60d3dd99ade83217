//! Utilities for input/output.

use std::{
    ffi::OsString,
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Reads and returns the content of the specified text file.
pub fn read_text_file<P: AsRef<Path>>(file_path: P) -> io::Result<String> {
    let file_path = file_path.as_ref();
    let file = fs::File::open(file_path).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("Could not open {}: {}", file_path.display(), err),
        )
    })?;
    let mut text = String::new();
    let _ = io::BufReader::new(file).read_to_string(&mut text)?;
    Ok(text)
}

/// Output file that is written to a temporary file next to the target path
/// and moved into place only when writing has completed.
#[derive(Debug)]
pub struct AtomicOutputPath {
    target_path: PathBuf,
    temp_file: NamedTempFile,
}

impl AtomicOutputPath {
    /// Creates a temporary file in the directory of the given target path.
    pub fn new<P: AsRef<Path>>(target_path: P) -> io::Result<Self> {
        let target_path = target_path.as_ref().to_path_buf();
        let file_name = target_path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("No file name in path {}", target_path.display()),
            )
        })?;
        let directory = match target_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut prefix = OsString::from(".");
        prefix.push(file_name);
        let temp_file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(directory)?;

        Ok(Self {
            target_path,
            temp_file,
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn temporary_path(&self) -> &Path {
        self.temp_file.path()
    }

    /// Returns an error if the target file exists and may not be overwritten.
    pub fn ensure_write_allowed(&self, automatic_overwrite: bool) -> io::Result<()> {
        if self.target_path.exists() && !automatic_overwrite {
            Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "File {} already exists (use --overwrite to replace it)",
                    self.target_path.display()
                ),
            ))
        } else {
            Ok(())
        }
    }

    /// Writes to the temporary file through a buffered writer.
    pub fn write_with<W>(&mut self, write_contents: W) -> io::Result<()>
    where
        W: FnOnce(&mut io::BufWriter<&mut fs::File>) -> io::Result<()>,
    {
        let mut writer = io::BufWriter::new(self.temp_file.as_file_mut());
        write_contents(&mut writer)?;
        writer.flush()
    }

    /// Moves the temporary file to the target path, replacing any existing file.
    pub fn perform_replace(self) -> io::Result<()> {
        self.temp_file
            .persist(&self.target_path)
            .map(|_| ())
            .map_err(|err| err.error)
    }
}

/// Serializes the given data into JSON format and writes it to the given writer.
#[cfg(feature = "json")]
pub fn write_data_as_json<T: Serialize, W: Write>(writer: &mut W, data: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, data).map_err(io::Error::from)
}

/// Serializes the given data into pickle format and writes it to the given writer.
#[cfg(feature = "pickle")]
pub fn write_data_as_pickle<T: Serialize, W: Write>(writer: &mut W, data: &T) -> io::Result<()> {
    match serde_pickle::to_writer(writer, data, serde_pickle::SerOptions::new()) {
        Ok(_) => Ok(()),
        Err(serde_pickle::Error::Io(err)) => Err(err),
        Err(err) => Err(io::Error::new(
            io::ErrorKind::Other,
            format!("Could not serialize data to pickle: {}", err),
        )),
    }
}
