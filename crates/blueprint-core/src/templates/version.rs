//! Version comparison for CLI and template compatibility

use anyhow::Result;
use semver::Version;

/// Compare the running CLI version against the version a template script asks for.
/// Returns a warning message if the CLI is older than the template expects
pub fn check_compatibility(
    cli_version: &str,
    template_version: &str,
    upgrade_command: &str,
) -> Option<String> {
    let cli_ver = parse_version(cli_version).ok()?; // Can't compare, skip warning
    let template_ver = parse_version(template_version).ok()?;

    if cli_ver < template_ver {
        Some(format!(
            "Warning: This template was written for blueprint {} or newer.\n\
             You are running version {}.\n\
             Consider updating: {}",
            template_ver, cli_ver, upgrade_command
        ))
    } else {
        None
    }
}

/// Parse version string, accepting a leading 'v'
pub fn parse_version(version_str: &str) -> Result<Version> {
    let cleaned = version_str.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);
    Version::parse(cleaned).map_err(|e| anyhow::anyhow!("Invalid version '{}': {}", version_str, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPGRADE: &str = "cargo install blueprint --force";

    #[test]
    fn test_cli_older_than_template() {
        let warning = check_compatibility("0.1.0", "0.2.0", UPGRADE);
        assert!(warning.is_some());
        assert!(warning.unwrap().contains("0.2.0"));
    }

    #[test]
    fn test_cli_same_as_template() {
        assert!(check_compatibility("0.1.0", "0.1.0", UPGRADE).is_none());
    }

    #[test]
    fn test_cli_newer_than_template() {
        assert!(check_compatibility("0.2.0", "v0.1.0", UPGRADE).is_none());
    }

    #[test]
    fn test_invalid_versions() {
        // Should return None (no warning) for invalid versions
        assert!(check_compatibility("invalid", "0.1.0", UPGRADE).is_none());
        assert!(check_compatibility("0.1.0", "soon", UPGRADE).is_none());
    }
}
