use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::debug::DebugSeverity;
use super::errors::{Error, Result};

/// The setup parameters of a rendering context.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextParams {
    /// Debug messages below this severity are filtered out by the driver.
    pub debug_severity: DebugSeverity,
    /// Delivers debug messages on the thread issuing the offending command,
    /// before the command returns.
    pub synchronous_debug_output: bool,
    /// Filters across cube map faces when sampling near the edges.
    pub seamless_cube_maps: bool,
}

impl Default for ContextParams {
    fn default() -> Self {
        ContextParams {
            debug_severity: DebugSeverity::Medium,
            synchronous_debug_output: true,
            seamless_cube_maps: true,
        }
    }
}

impl ContextParams {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| Error::Io(path.display().to_string(), err.to_string()))?;

        Self::from_json(&text)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn json() {
        let params = ContextParams::from_json(r#"{ "debug_severity": "Low" }"#).unwrap();
        assert_eq!(params.debug_severity, DebugSeverity::Low);
        assert!(params.synchronous_debug_output);
        assert!(params.seamless_cube_maps);

        let params = ContextParams::from_json("{}").unwrap();
        assert_eq!(params, ContextParams::default());

        match ContextParams::from_json(r#"{ "debug_severity": "Always" }"#) {
            Err(Error::Settings(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_file() {
        match ContextParams::from_file("/nonexistent/glframe.json") {
            Err(Error::Io(path, _)) => assert_eq!(path, "/nonexistent/glframe.json"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
