//! Checksum computation for archives and split-volume manifests (§4.7).

use crate::error::PoshBackupError;
use crate::strategies::ChecksumAlgorithm;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::io::Read;
use std::path::Path;

/// Compute the hex digest of a file under the given algorithm, streaming it
/// in fixed-size chunks so archive size is not bounded by available memory.
pub fn hash_file(path: &Path, algorithm: ChecksumAlgorithm) -> Result<String, PoshBackupError> {
	let mut file = std::fs::File::open(path)?;
	let mut buffer = [0u8; 64 * 1024];

	macro_rules! digest_with {
		($hasher:expr) => {{
			let mut hasher = $hasher;
			loop {
				let read = file.read(&mut buffer)?;
				if read == 0 {
					break;
				}
				hasher.update(&buffer[..read]);
			}
			hex::encode(hasher.finalize())
		}};
	}

	let digest = match algorithm {
		ChecksumAlgorithm::Md5 => digest_with!(Md5::new()),
		ChecksumAlgorithm::Sha1 => digest_with!(Sha1::new()),
		ChecksumAlgorithm::Sha256 => digest_with!(Sha256::new()),
		ChecksumAlgorithm::Sha384 => digest_with!(Sha384::new()),
		ChecksumAlgorithm::Sha512 => digest_with!(Sha512::new()),
	};
	Ok(digest)
}

/// Render a split-volume manifest body: one `<hash>  <filename>` line per
/// volume part, in the order given.
pub fn render_manifest(entries: &[(String, String)]) -> String {
	let mut body = String::new();
	for (hash, filename) in entries {
		body.push_str(hash);
		body.push_str("  ");
		body.push_str(filename);
		body.push('\n');
	}
	body
}


// vim: ts=4
