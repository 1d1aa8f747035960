//! Field-level validation for resolved job configuration.

use super::ValidationError;

/// Validate a `RetentionPolicy.KeepCount`. Zero would delete every instance
/// including the one just created, which is never the intent.
pub fn validate_keep_count(keep_count: u32) -> Result<(), ValidationError> {
	if keep_count == 0 {
		return Err(ValidationError::ConfigError(
			"KeepCount must be at least 1 (0 would delete every archive instance)".to_string(),
		));
	}
	Ok(())
}

/// Validate a 7-Zip compression level (`-mx` argument), 0 (store) through 9
/// (ultra).
pub fn validate_compression_level(level: u8) -> Result<(), ValidationError> {
	if level > 9 {
		return Err(ValidationError::ConfigError(format!(
			"CompressionLevel must be 0-9, got {}",
			level
		)));
	}
	Ok(())
}

/// Validate a retry count for retention deletion / transfer backoff.
pub fn validate_retry_count(count: u32) -> Result<(), ValidationError> {
	if count < 1 {
		return Err(ValidationError::ConfigError("Retry count must be at least 1".to_string()));
	}
	if count > 100 {
		return Err(ValidationError::ConfigError(format!("Retry count too high: {}", count)));
	}
	Ok(())
}

/// Validate a timeout in seconds (connectivity tests, transfer waits).
pub fn validate_timeout_secs(timeout_secs: u32) -> Result<(), ValidationError> {
	if timeout_secs == 0 {
		return Err(ValidationError::ConfigError("Timeout must be greater than 0".to_string()));
	}
	if timeout_secs > 86_400 {
		return Err(ValidationError::ConfigError(format!(
			"Timeout too large: {} seconds (max 86400)",
			timeout_secs
		)));
	}
	Ok(())
}

/// Validate a CPU affinity limit expressed as a percentage of available
/// cores (§4.4, clamped against `sysinfo`'s reported core count downstream).
pub fn validate_cpu_affinity_percent(percent: u8) -> Result<(), ValidationError> {
	if percent == 0 || percent > 100 {
		return Err(ValidationError::ConfigError(format!(
			"CPUCoreAffinityPercent must be 1-100, got {}",
			percent
		)));
	}
	Ok(())
}

/// Validate that a base filename contains none of the characters that would
/// break the instance-key regex built from it (`InstanceScanner`, §4.2).
pub fn validate_base_filename(name: &str) -> Result<(), ValidationError> {
	if name.is_empty() {
		return Err(ValidationError::ConfigError("BaseFileName must not be empty".to_string()));
	}
	if name.contains(['/', '\\']) {
		return Err(ValidationError::ConfigError(format!(
			"BaseFileName must not contain path separators: {}",
			name
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keep_count_rejects_zero() {
		let result = validate_keep_count(0);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("at least 1"));
	}

	#[test]
	fn keep_count_accepts_positive() {
		assert!(validate_keep_count(1).is_ok());
		assert!(validate_keep_count(30).is_ok());
	}

	#[test]
	fn compression_level_bounds() {
		assert!(validate_compression_level(0).is_ok());
		assert!(validate_compression_level(9).is_ok());
		assert!(validate_compression_level(10).is_err());
	}

	#[test]
	fn retry_count_bounds() {
		assert!(validate_retry_count(1).is_ok());
		assert!(validate_retry_count(100).is_ok());
		assert!(validate_retry_count(0).is_err());
		assert!(validate_retry_count(101).is_err());
	}

	#[test]
	fn timeout_bounds() {
		assert!(validate_timeout_secs(0).is_err());
		assert!(validate_timeout_secs(60).is_ok());
		assert!(validate_timeout_secs(86_401).is_err());
	}

	#[test]
	fn cpu_affinity_bounds() {
		assert!(validate_cpu_affinity_percent(0).is_err());
		assert!(validate_cpu_affinity_percent(50).is_ok());
		assert!(validate_cpu_affinity_percent(101).is_err());
	}

	#[test]
	fn base_filename_rejects_separators() {
		assert!(validate_base_filename("Documents").is_ok());
		assert!(validate_base_filename("").is_err());
		assert!(validate_base_filename("sub/Documents").is_err());
	}
}

// vim: ts=4
