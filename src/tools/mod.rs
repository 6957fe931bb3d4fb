//! Analysis utilities built on the packet stream.

pub mod features;
pub mod filter;
pub mod inspect;
pub mod mean;
pub mod show;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::stream::{PacketCodec, StreamReader, StreamWriter};

const STDIO_PATH: &str = "-";

/// Byte source for a stream: a file, or stdin when the path is `-`.
#[derive(Debug)]
pub enum InputSource {
    Stdin(io::Stdin),
    File(BufReader<File>),
}

impl InputSource {
    pub fn open(path: &Path) -> Result<Self> {
        if path.as_os_str() == STDIO_PATH {
            return Ok(InputSource::Stdin(io::stdin()));
        }
        let file =
            File::open(path).with_context(|| format!("failed to open input stream {:?}", path))?;
        Ok(InputSource::File(BufReader::new(file)))
    }
}

impl Read for InputSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputSource::Stdin(stdin) => stdin.read(buf),
            InputSource::File(file) => file.read(buf),
        }
    }
}

impl Seek for InputSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            InputSource::Stdin(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "stdin cannot be repositioned",
            )),
            InputSource::File(file) => file.seek(pos),
        }
    }
}

/// Open `path` (or stdin) as a packet reader, probing for seek support.
pub fn open_reader(path: &Path, codec: PacketCodec) -> Result<StreamReader<InputSource>> {
    Ok(StreamReader::with_seek_probe(InputSource::open(path)?, codec))
}

/// Open `path` (or stdout) as a packet writer.
pub fn open_writer(path: &Path, codec: PacketCodec) -> Result<StreamWriter<Box<dyn Write>>> {
    Ok(StreamWriter::new(open_output(path)?, codec))
}

pub fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == STDIO_PATH {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create output stream {:?}", path))?;
    Ok(Box::new(BufWriter::new(file)))
}
