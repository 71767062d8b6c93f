//! Streaming checksums for artifact integrity files (`.md5`, `.sha1`).

use digest::Digest;
use md5::Md5;
use sha1::Sha1;
use std::io::{self, Read};

const CHUNK_SIZE: usize = 8 * 1024;

/// Checksum flavours Maven clients request next to every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
}

impl ChecksumAlgorithm {
    /// Suffix appended to the checksummed file's name.
    pub fn extension(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha1 => "sha1",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md5" => Some(ChecksumAlgorithm::Md5),
            "sha1" => Some(ChecksumAlgorithm::Sha1),
            _ => None,
        }
    }

    /// Hex digest of everything `reader` yields.
    pub fn hash_reader<R: Read + ?Sized>(&self, reader: &mut R) -> io::Result<String> {
        match self {
            ChecksumAlgorithm::Md5 => digest_reader::<Md5, R>(reader),
            ChecksumAlgorithm::Sha1 => digest_reader::<Sha1, R>(reader),
        }
    }

    pub fn hash_bytes(&self, data: &[u8]) -> String {
        match self {
            ChecksumAlgorithm::Md5 => format!("{:x}", Md5::digest(data)),
            ChecksumAlgorithm::Sha1 => format!("{:x}", Sha1::digest(data)),
        }
    }
}

fn digest_reader<D: Digest, R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    let mut hasher = D::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

/// `<hex> <directory>/<file_name>`, the format served for checksum requests.
pub fn checksum_line(hex: &str, directory: &str, file_name: &str) -> String {
    if directory.is_empty() {
        format!("{} {}", hex, file_name)
    } else {
        format!("{} {}/{}", hex, directory, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields one byte per read call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.split_first() {
                Some((first, rest)) if !buf.is_empty() => {
                    buf[0] = *first;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_known_digests() {
        let data = b"hello world";
        assert_eq!(
            ChecksumAlgorithm::Md5.hash_bytes(data),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(
            ChecksumAlgorithm::Sha1.hash_bytes(data),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
    }

    #[test]
    fn test_streaming_matches_whole_buffer() {
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        for algorithm in [ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha1] {
            let streamed = algorithm.hash_reader(&mut Trickle(&data)).unwrap();
            assert_eq!(streamed, algorithm.hash_bytes(&data));
        }
    }

    #[test]
    fn test_checksum_line_and_extensions() {
        assert_eq!(
            checksum_line("abc", "org/example/demo/1.0", "demo-1.0.jar"),
            "abc org/example/demo/1.0/demo-1.0.jar"
        );
        assert_eq!(checksum_line("abc", "", "x.jar"), "abc x.jar");
        assert_eq!(
            ChecksumAlgorithm::from_extension("sha1"),
            Some(ChecksumAlgorithm::Sha1)
        );
        assert_eq!(ChecksumAlgorithm::from_extension("sha256"), None);
        assert_eq!(ChecksumAlgorithm::Md5.extension(), "md5");
    }
}
