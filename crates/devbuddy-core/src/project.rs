//! Project kinds and the immutable scaffold request

use crate::error::ProjectSpecError;
use crate::runtime::venv_executable;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Supported project kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectKind {
    Python,
    Flask,
    Django,
    FastApi,
    React,
    Next,
    Vue,
    Express,
    Angular,
    Laravel,
    Spring,
    Go,
    Rust,
    DotNet,
}

/// Language ecosystem a kind belongs to; drives .gitignore and CI choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Python,
    Node,
    Php,
    Java,
    Go,
    Rust,
    DotNet,
}

impl ProjectKind {
    pub const ALL: [ProjectKind; 14] = [
        ProjectKind::Python,
        ProjectKind::Flask,
        ProjectKind::Django,
        ProjectKind::FastApi,
        ProjectKind::React,
        ProjectKind::Next,
        ProjectKind::Vue,
        ProjectKind::Express,
        ProjectKind::Angular,
        ProjectKind::Laravel,
        ProjectKind::Spring,
        ProjectKind::Go,
        ProjectKind::Rust,
        ProjectKind::DotNet,
    ];

    /// Identifier used on the command line (`flask-app`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Python => "python",
            ProjectKind::Flask => "flask",
            ProjectKind::Django => "django",
            ProjectKind::FastApi => "fastapi",
            ProjectKind::React => "react",
            ProjectKind::Next => "next",
            ProjectKind::Vue => "vue",
            ProjectKind::Express => "express",
            ProjectKind::Angular => "angular",
            ProjectKind::Laravel => "laravel",
            ProjectKind::Spring => "spring",
            ProjectKind::Go => "go",
            ProjectKind::Rust => "rust",
            ProjectKind::DotNet => "dotnet",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProjectKind::Python => "Python",
            ProjectKind::Flask => "Flask",
            ProjectKind::Django => "Django",
            ProjectKind::FastApi => "FastAPI",
            ProjectKind::React => "React",
            ProjectKind::Next => "Next.js",
            ProjectKind::Vue => "Vue",
            ProjectKind::Express => "Express",
            ProjectKind::Angular => "Angular",
            ProjectKind::Laravel => "Laravel",
            ProjectKind::Spring => "Spring Boot",
            ProjectKind::Go => "Go",
            ProjectKind::Rust => "Rust",
            ProjectKind::DotNet => ".NET",
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            ProjectKind::Python | ProjectKind::Flask | ProjectKind::Django | ProjectKind::FastApi => {
                Ecosystem::Python
            }
            ProjectKind::React
            | ProjectKind::Next
            | ProjectKind::Vue
            | ProjectKind::Express
            | ProjectKind::Angular => Ecosystem::Node,
            ProjectKind::Laravel => Ecosystem::Php,
            ProjectKind::Spring => Ecosystem::Java,
            ProjectKind::Go => Ecosystem::Go,
            ProjectKind::Rust => Ecosystem::Rust,
            ProjectKind::DotNet => Ecosystem::DotNet,
        }
    }

    /// Command that starts the freshly generated project
    pub fn run_hint(&self) -> &'static str {
        match self {
            ProjectKind::Python => "python main.py",
            ProjectKind::Flask => "flask --app app run --debug",
            ProjectKind::Django => "python manage.py runserver",
            ProjectKind::FastApi => "uvicorn main:app --reload",
            ProjectKind::React | ProjectKind::Vue | ProjectKind::Angular => "npm start",
            ProjectKind::Next | ProjectKind::Express => "npm run dev",
            ProjectKind::Laravel => "php artisan serve",
            ProjectKind::Spring => "mvn spring-boot:run",
            ProjectKind::Go => "go run .",
            ProjectKind::Rust => "cargo run",
            ProjectKind::DotNet => "dotnet run",
        }
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProjectKind {
    type Err = ProjectSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| ProjectSpecError::UnknownKind {
                kind: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

/// Optional stages requested by the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectFlags {
    pub dockerize: bool,
    pub git_init: bool,
    pub with_tests: bool,
    pub auto_ci: bool,
}

/// A validated scaffold request. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    name: String,
    kind: ProjectKind,
    flags: ProjectFlags,
}

impl ProjectSpec {
    pub fn new(
        name: impl Into<String>,
        kind: ProjectKind,
        flags: ProjectFlags,
    ) -> Result<Self, ProjectSpecError> {
        let name = name.into();
        if !is_valid_project_name(&name) {
            return Err(ProjectSpecError::InvalidName(name));
        }
        Ok(Self { name, kind, flags })
    }

    /// Parse the `<type>-<name>` form used by `dbuddy create flask-app`
    pub fn parse(argument: &str, flags: ProjectFlags) -> Result<Self, ProjectSpecError> {
        let (kind, name) = argument
            .split_once('-')
            .ok_or_else(|| ProjectSpecError::MissingSeparator(argument.to_string()))?;
        Self::new(name, kind.parse()?, flags)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProjectKind {
        self.kind
    }

    pub fn flags(&self) -> ProjectFlags {
        self.flags
    }

    /// Name usable as a Java package segment or C# identifier
    pub fn identifier(&self) -> String {
        let mut ident: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        if ident.starts_with(|c: char| c.is_ascii_digit()) {
            ident.insert(0, '_');
        }
        ident.to_ascii_lowercase()
    }

    /// "Next steps" shown after a successful scaffold
    pub fn next_steps(&self, project_dir: &Path) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        if current.as_deref() != Some(project_dir) {
            steps.push(format!("cd {}", project_dir.display()));
        }
        if self.kind.ecosystem() == Ecosystem::Python {
            let python = venv_executable(Path::new("venv"), "python");
            steps.push(format!(
                "python -m venv venv && {} -m pip install -r requirements.txt",
                python.display()
            ));
        }
        if self.kind == ProjectKind::Express {
            steps.push("npm install".to_string());
        }
        steps.push(self.kind.run_hint().to_string());
        steps
    }
}

pub(crate) fn is_valid_project_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_dash() {
        let spec = ProjectSpec::parse("flask-my-app", ProjectFlags::default()).unwrap();
        assert_eq!(spec.kind(), ProjectKind::Flask);
        assert_eq!(spec.name(), "my-app");
    }

    #[test]
    fn test_parse_requires_separator() {
        let err = ProjectSpec::parse("flask", ProjectFlags::default()).unwrap_err();
        assert_eq!(err, ProjectSpecError::MissingSeparator("flask".to_string()));
    }

    #[test]
    fn test_unknown_kind_lists_supported_types() {
        let err = ProjectSpec::parse("cobol-app", ProjectFlags::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("cobol"));
        assert!(message.contains("fastapi"));
        assert!(message.contains("dotnet"));
    }

    #[test]
    fn test_rejects_path_like_names() {
        for bad in ["../evil", "a/b", "", ".."] {
            assert!(
                ProjectSpec::new(bad, ProjectKind::Go, ProjectFlags::default()).is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_kind_round_trips_through_its_identifier() {
        for kind in ProjectKind::ALL {
            assert_eq!(kind.as_str().parse::<ProjectKind>().unwrap(), kind);
        }
        assert_eq!("FastAPI".parse::<ProjectKind>().unwrap(), ProjectKind::FastApi);
    }

    #[test]
    fn test_identifier_is_package_safe() {
        let spec = ProjectSpec::new("My-App.2", ProjectKind::Spring, ProjectFlags::default())
            .unwrap();
        assert_eq!(spec.identifier(), "my_app_2");

        let spec = ProjectSpec::new("9lives", ProjectKind::Spring, ProjectFlags::default())
            .unwrap();
        assert_eq!(spec.identifier(), "_9lives");
    }

    #[test]
    fn test_python_next_steps_install_into_the_venv() {
        let spec = ProjectSpec::new("shop", ProjectKind::Flask, ProjectFlags::default()).unwrap();
        let steps = spec.next_steps(Path::new("/nonexistent/shop"));
        let venv = steps.iter().find(|s| s.contains("-m venv")).unwrap();

        let python = venv_executable(Path::new("venv"), "python");
        assert!(venv.contains(&format!("&& {} -m pip install", python.display())), "{venv}");
        assert!(!venv.contains("&& pip "));

        let go = ProjectSpec::new("svc", ProjectKind::Go, ProjectFlags::default()).unwrap();
        assert!(!go.next_steps(Path::new("/nonexistent/svc")).iter().any(|s| s.contains("venv")));
    }
}
