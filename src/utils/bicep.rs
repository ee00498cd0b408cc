use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;
use regex::Regex;
use serde_json::{Map, Value};

use crate::utils::error::Error;

pub const BINARY_NAME: &str = "rad-bicep";
/// Env variable overriding the location of the `rad-bicep` binary.
pub const BINARY_PATH_ENV: &str = "RAD_BICEP";

// https://semver.org/#is-there-a-suggested-regular-expression-regex-to-check-a-semver-string
const SEMANTIC_VERSION_REGEX: &str = r"(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?";

/// Compiles a deployment template file into a template document.
pub trait TemplateCompiler {
    fn compile(&self, file_path: &Path) -> Result<Map<String, Value>, Error>;

    /// Diagnostic only: never fails, reports `unknown (<reason>)` instead.
    fn version(&self) -> String;
}

pub struct BicepCompiler {
    binary: PathBuf,
}

impl BicepCompiler {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        BicepCompiler {
            binary: binary.into(),
        }
    }

    /// Locates `rad-bicep` through `RAD_BICEP`, falling back to `$HOME/.rad/bin`.
    pub fn from_env() -> Self {
        if let Some(path) = env::var_os(BINARY_PATH_ENV).filter(|path| !path.is_empty()) {
            return BicepCompiler::new(path);
        }

        let home = env::var_os("HOME").unwrap_or_default();
        BicepCompiler::new(Path::new(&home).join(".rad").join("bin").join(BINARY_NAME))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn is_installed(&self) -> bool {
        self.binary.is_file()
    }

    /// Runs `rad-bicep` with the given args and returns the captured stdout.
    /// The stderr is not captured but instead inherited from the current process.
    fn run(&self, args: &[&str]) -> Result<(String, Vec<u8>), Error> {
        if !self.is_installed() {
            return Err(Error::ToolNotInstalled {
                tool: BINARY_NAME.to_string(),
                remediation: "rad bicep download".to_string(),
            });
        }

        let command = format!("{} {}", self.binary.display(), args.join(" "));
        debug!("running {}", command);

        let output = match Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
        {
            Ok(output) => output,
            Err(source) => return Err(Error::ToolExecution { command, source }),
        };

        if !output.status.success() {
            return Err(Error::ToolExit {
                command,
                status: output.status.to_string(),
            });
        }

        Ok((command, output.stdout))
    }

    /// Builds the provided `.bicep` file and returns the deployment template.
    pub fn build(&self, file_path: &Path) -> Result<Map<String, Value>, Error> {
        let file_path = file_path.to_string_lossy();
        let (command, stdout) = self.run(&["build", "--stdout", &*file_path])?;

        match serde_json::from_slice(&stdout) {
            Ok(template) => Ok(template),
            Err(source) => Err(Error::ToolOutput { command, source }),
        }
    }
}

impl TemplateCompiler for BicepCompiler {
    fn compile(&self, file_path: &Path) -> Result<Map<String, Value>, Error> {
        self.build(file_path)
    }

    fn version(&self) -> String {
        let stdout = match self.run(&["--version"]) {
            Ok((_, stdout)) => stdout,
            Err(err) => return format!("unknown ({})", err),
        };

        let output = String::from_utf8_lossy(&stdout);
        let version = Regex::new(SEMANTIC_VERSION_REGEX)
            .ok()
            .and_then(|regex| regex.find(&output).map(|found| found.as_str().to_string()));

        match version {
            Some(version) => version,
            None => format!(
                "unknown (failed to parse bicep version from {:?})",
                output.trim()
            ),
        }
    }
}
