//! Language configuration for compilation and execution
//!
//! Each supported language knows its fixed source file name, an optional
//! compile command and a run command. Everything is named `Temp` so the run
//! step can find the compiled artifact without inspecting the source.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

use crate::error::UnsupportedLanguage;
use crate::runner::CommandSpec;

/// Class name the Java run step loads, and base name of every artifact
pub const ENTRY_NAME: &str = "Temp";

/// Executable names used to build step command lines
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    pub python: String,
    pub javac: String,
    pub java: String,
    pub csc: String,
    pub vbc: String,
    /// Launcher for `.exe` artifacts; empty means run them directly
    pub exe_shim: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        let windows = cfg!(windows);
        Self {
            python: if windows { "python" } else { "python3" }.into(),
            javac: "javac".into(),
            java: "java".into(),
            csc: "csc".into(),
            vbc: "vbc".into(),
            exe_shim: if windows { "" } else { "mono" }.into(),
        }
    }
}

impl Toolchain {
    /// Load overrides from a TOML file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read toolchain config {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid toolchain config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn shim(&self) -> Option<&str> {
        Some(self.exe_shim.as_str()).filter(|s| !s.is_empty())
    }
}

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Java,
    CSharp,
    VbNet,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::Java,
            Language::CSharp,
            Language::VbNet,
        ]
    }

    /// Identifier callers use to request this language
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::VbNet => "vbnet",
        }
    }

    pub fn source_file_name(&self) -> &'static str {
        match self {
            Language::Python => "temp.py",
            Language::Java => "Temp.java",
            Language::CSharp => "Temp.cs",
            Language::VbNet => "Temp.vb",
        }
    }

    /// Source text actually written to disk
    ///
    /// Java snippets without a class declaration are wrapped into `Temp.main`.
    /// Code that declares its own class is kept as is, and the run step still
    /// loads `Temp`, so such a class must be named `Temp`.
    pub fn prepare_source(&self, code: &str) -> String {
        match self {
            Language::Java if !code.contains("class ") => format!(
                "public class {ENTRY_NAME} {{ public static void main(String[] args) {{ {code} }} }}"
            ),
            _ => code.to_string(),
        }
    }

    pub fn compile_command(&self, toolchain: &Toolchain, workspace: &Path) -> Option<CommandSpec> {
        let source = path_arg(&workspace.join(self.source_file_name()));
        let cmd = match self {
            Language::Python => return None,
            Language::Java => CommandSpec::new(&toolchain.javac).with_args([source]),
            Language::CSharp | Language::VbNet => {
                let compiler = if *self == Language::CSharp {
                    &toolchain.csc
                } else {
                    &toolchain.vbc
                };
                let out = format!("-out:{}", path_arg(&exe_path(workspace)));
                CommandSpec::new(compiler).with_args(["-nologo".to_string(), out, source])
            }
        };
        Some(cmd.with_work_dir(workspace))
    }

    pub fn run_command(&self, toolchain: &Toolchain, workspace: &Path) -> CommandSpec {
        let cmd = match self {
            Language::Python => CommandSpec::new(&toolchain.python)
                .with_args([path_arg(&workspace.join(self.source_file_name()))]),
            Language::Java => CommandSpec::new(&toolchain.java).with_args([
                "-cp".to_string(),
                path_arg(workspace),
                ENTRY_NAME.to_string(),
            ]),
            Language::CSharp | Language::VbNet => {
                CommandSpec::prefixed(toolchain.shim(), path_arg(&exe_path(workspace)))
            }
        };
        cmd.with_work_dir(workspace)
    }

    /// Resolve the full, ordered pipeline for `code` inside `workspace`
    pub fn pipeline(&self, code: &str, toolchain: &Toolchain, workspace: &Path) -> Pipeline {
        let mut steps = Vec::with_capacity(2);
        if let Some(command) = self.compile_command(toolchain, workspace) {
            steps.push(PipelineStep {
                command,
                kind: StepKind::Compile,
            });
        }
        steps.push(PipelineStep {
            command: self.run_command(toolchain, workspace),
            kind: StepKind::Run,
        });

        Pipeline {
            source_file: workspace.join(self.source_file_name()),
            source: self.prepare_source(code),
            steps,
        }
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.name() == lowered)
            .ok_or(UnsupportedLanguage(lowered))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a step's exit status means for the rest of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Non-zero exit skips every following step
    Compile,
    Run,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStep {
    pub command: CommandSpec,
    pub kind: StepKind,
}

/// Everything needed to execute one request's code
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub source_file: PathBuf,
    pub source: String,
    pub steps: Vec<PipelineStep>,
}

fn exe_path(workspace: &Path) -> PathBuf {
    workspace.join(format!("{ENTRY_NAME}.exe"))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
