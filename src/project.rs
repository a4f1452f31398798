//! The SFDX project being set up, and the constants that go with it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Project config file at the root of every SFDX project.
pub const SFDX_PROJECT_JSON: &str = "sfdx-project.json";
/// Used when `sfdx-project.json` has no `name`.
pub const DEFAULT_PROJECT_NAME: &str = "packaging-project";
/// Scratch org definition for DEV environments, under `config/`.
pub const DEV_ORG_CONFIG_FILE: &str = "afdx-scratch-def.json";
/// A non-default browser makes scratch orgs easy to tell apart from "real" ones.
pub const ALTERNATIVE_BROWSER: &str = "firefox";
/// Setup page showing the status of a deployment.
pub const DEPLOYMENT_STATUS_PAGE: &str = "lightning/setup/DeployStatus/home";
/// Base username for the agent user; made unique at startup.
pub const AGENT_USERNAME_BASE: &str = "afdx-agent@testdrive.org";
/// Data file used to create the agent user.
pub const USER_JSON: &str = "data-import/User.json";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No sfdx-project.json found in {0:?}; is this an SFDX project directory?")]
    NotAProject(PathBuf),
}

/// The parts of `sfdx-project.json` we care about.
#[derive(Debug, Default, Deserialize)]
pub struct SfdxProjectJson {
    pub name: Option<String>,
    #[serde(rename = "sourceApiVersion")]
    pub source_api_version: Option<String>,
}

/// Names and paths derived from the project directory.
#[derive(Debug)]
pub struct Project {
    pub dir: PathBuf,
    pub name: String,
    pub source_api_version: Option<String>,
}

impl Project {
    /// Load `sfdx-project.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SFDX_PROJECT_JSON);
        if !path.is_file() {
            return Err(Error::NotAProject(dir.to_path_buf()).into());
        }
        let text = fs::read_to_string(&path).with_context(|| format!("while reading {path:?}"))?;
        let json: SfdxProjectJson =
            serde_json::from_str(&text).with_context(|| format!("while parsing {path:?}"))?;
        log::debug!("{SFDX_PROJECT_JSON}: {json:?}");

        let name = json
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_owned());

        Ok(Self {
            dir: dir.to_path_buf(),
            name,
            source_api_version: json.source_api_version,
        })
    }

    /// Alias for this project's DEV scratch org.
    pub fn dev_org_alias(&self) -> String {
        format!("SCRATCH:{}", self.name)
    }

    pub fn user_json_path(&self) -> PathBuf {
        self.dir.join(USER_JSON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_named_project() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(SFDX_PROJECT_JSON),
            r#"{"name": "afdx-pro-code-testdrive", "sourceApiVersion": "64.0", "packageDirectories": []}"#,
        )?;
        let project = Project::load(dir.path())?;
        assert_eq!(project.name, "afdx-pro-code-testdrive");
        assert_eq!(project.dev_org_alias(), "SCRATCH:afdx-pro-code-testdrive");
        assert_eq!(project.source_api_version.as_deref(), Some("64.0"));
        assert_eq!(project.user_json_path(), dir.path().join("data-import/User.json"));
        Ok(())
    }

    #[test]
    fn test_default_name() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(SFDX_PROJECT_JSON), r#"{"packageDirectories": []}"#)?;
        let project = Project::load(dir.path())?;
        assert_eq!(project.name, DEFAULT_PROJECT_NAME);
        assert_eq!(project.dev_org_alias(), "SCRATCH:packaging-project");
        Ok(())
    }

    #[test]
    fn test_missing_or_malformed() -> Result<()> {
        let dir = tempdir()?;
        let e = Project::load(dir.path()).unwrap_err();
        assert!(matches!(e.downcast_ref::<Error>(), Some(Error::NotAProject(_))));

        fs::write(dir.path().join(SFDX_PROJECT_JSON), "{ not json")?;
        assert!(Project::load(dir.path()).is_err());
        Ok(())
    }
}
