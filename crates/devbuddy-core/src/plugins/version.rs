//! Version compatibility between plugins and the host

use crate::error::LoadError;
use semver::{Version, VersionReq};

/// Version plugins are checked against
pub const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check a plugin's `requires` against the running version
pub fn check_compatibility(requirement: &str, running: &str) -> Result<(), LoadError> {
    let req = VersionReq::parse(requirement.trim()).map_err(|source| LoadError::Requirement {
        requirement: requirement.to_string(),
        source,
    })?;
    let version = parse_version(running).map_err(|source| LoadError::Requirement {
        requirement: running.to_string(),
        source,
    })?;

    if req.matches(&version) {
        Ok(())
    } else {
        Err(LoadError::Incompatible {
            required: requirement.to_string(),
            running: running.to_string(),
        })
    }
}

/// Parse version string, tolerating a leading `v`
pub fn parse_version(version_str: &str) -> Result<Version, semver::Error> {
    let cleaned = version_str.strip_prefix('v').unwrap_or(version_str);
    Version::parse(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_satisfied() {
        assert!(check_compatibility(">=0.2.0", "0.2.0").is_ok());
        assert!(check_compatibility("^0.2", "v0.2.5").is_ok());
    }

    #[test]
    fn test_host_older_than_plugin_needs() {
        let err = check_compatibility(">=0.3.0", "0.2.0").unwrap_err();
        assert!(matches!(err, LoadError::Incompatible { .. }));
        assert!(err.to_string().contains(">=0.3.0"));
    }

    #[test]
    fn test_invalid_requirement() {
        let err = check_compatibility("soon", "0.2.0").unwrap_err();
        assert!(matches!(err, LoadError::Requirement { .. }));
    }

    #[test]
    fn test_host_version_parses() {
        assert!(parse_version(HOST_VERSION).is_ok());
    }
}
