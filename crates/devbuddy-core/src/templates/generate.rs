//! Standalone files for `dbuddy generate`

use super::{base, docker, render};
use crate::error::StageError;
use crate::project::Ecosystem;
use crate::scaffold::{Artifact, ArtifactWriter};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// What `dbuddy generate` can write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generated {
    Gitignore,
    Dockerfile,
    Readme,
    License,
}

impl Generated {
    pub const ALL: [Generated; 4] = [
        Generated::Gitignore,
        Generated::Dockerfile,
        Generated::Readme,
        Generated::License,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Generated::Gitignore => "gitignore",
            Generated::Dockerfile => "dockerfile",
            Generated::Readme => "readme",
            Generated::License => "license",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Generated::Gitignore => ".gitignore",
            Generated::Dockerfile => "Dockerfile",
            Generated::Readme => "README.md",
            Generated::License => "LICENSE",
        }
    }
}

impl fmt::Display for Generated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Generated {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == lowered)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|g| g.as_str()).collect();
                format!("unknown template `{}` (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Map a `--lang` value to an ecosystem. Unknown languages get generic output.
pub fn parse_lang(lang: &str) -> Option<Ecosystem> {
    match lang.to_ascii_lowercase().as_str() {
        "python" | "py" => Some(Ecosystem::Python),
        "node" | "js" | "javascript" | "typescript" | "ts" => Some(Ecosystem::Node),
        "php" => Some(Ecosystem::Php),
        "java" => Some(Ecosystem::Java),
        "go" | "golang" => Some(Ecosystem::Go),
        "rust" => Some(Ecosystem::Rust),
        "dotnet" | "csharp" | "c#" => Some(Ecosystem::DotNet),
        _ => None,
    }
}

const GENERIC_GITIGNORE: &str = "# Basic .gitignore\n.env\n.vscode/\n.idea/\ntmp/\ntemp/\n";

const README: &str = "# {{name}}

## Installation

```sh
{{install}}
```

## Usage

```sh
{{run}}
```

## License

MIT
";

const LICENSE: &str = r#"MIT License

Copyright (c) the {{name}} authors

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
"#;

fn install_and_run(lang: Option<Ecosystem>) -> (&'static str, &'static str) {
    match lang {
        Some(Ecosystem::Node) => ("npm install", "npm start"),
        Some(Ecosystem::Php) => ("composer install", "php artisan serve"),
        Some(Ecosystem::Java) => ("mvn install", "mvn spring-boot:run"),
        Some(Ecosystem::Go) => ("go mod download", "go run ."),
        Some(Ecosystem::Rust) => ("cargo build", "cargo run"),
        Some(Ecosystem::DotNet) => ("dotnet restore", "dotnet run"),
        Some(Ecosystem::Python) | None => ("pip install -r requirements.txt", "python main.py"),
    }
}

/// Dockerfile target used when no project layout is known
fn default_target(lang: Option<Ecosystem>, name: &str) -> docker::DockerTarget {
    use docker::{DockerTarget, PythonEntry};
    match lang {
        Some(Ecosystem::Node) => DockerTarget::NodeServer {
            main: "index.js".to_string(),
        },
        Some(Ecosystem::Php) => DockerTarget::Laravel,
        Some(Ecosystem::Java) => DockerTarget::Spring,
        Some(Ecosystem::Go) => DockerTarget::Go,
        Some(Ecosystem::Rust) => DockerTarget::Rust {
            binary: name.to_string(),
        },
        Some(Ecosystem::DotNet) => DockerTarget::DotNet {
            assembly: format!("{}.dll", name),
        },
        Some(Ecosystem::Python) | None => DockerTarget::Python(PythonEntry::Script("main.py".into())),
    }
}

/// Body of `what` for a project called `name`
pub fn contents(what: Generated, lang: Option<Ecosystem>, name: &str) -> String {
    match what {
        Generated::Gitignore => lang
            .map(base::gitignore)
            .unwrap_or(GENERIC_GITIGNORE)
            .to_string(),
        Generated::Dockerfile => docker::dockerfile(&default_target(lang, name)),
        Generated::Readme => {
            let (install, run) = install_and_run(lang);
            render(README, &[("name", name), ("install", install), ("run", run)])
        }
        Generated::License => render(LICENSE, &[("name", name)]),
    }
}

/// Write `what` into `dir`. An existing file is left alone and reported as skipped.
pub async fn generate(
    what: Generated,
    lang: Option<Ecosystem>,
    dir: &Path,
) -> Result<Artifact, StageError> {
    let name = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "project".to_string());

    let mut writer = ArtifactWriter::new(dir);
    let artifact = writer
        .write(what.file_name(), contents(what, lang, &name))
        .await?
        .clone();
    tracing::info!(file = what.file_name(), created = artifact.is_created(), "generate");
    Ok(artifact)
}
