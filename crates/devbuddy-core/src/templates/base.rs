//! Base project structure: README, .gitignore and per-kind source files

use super::{render_project, TemplateFile};
use crate::project::{Ecosystem, ProjectKind, ProjectSpec};

const README: &str = "# {{name}}

A {{kind}} project created with devbuddy.

## Getting started

```sh
{{run}}
```
";

pub fn readme(spec: &ProjectSpec) -> String {
    render_project(README, spec)
}

pub fn gitignore(ecosystem: Ecosystem) -> &'static str {
    match ecosystem {
        Ecosystem::Python => {
            "*.pyc\n__pycache__/\nvenv/\n.venv/\n.env\n.vscode/\n.idea/\n*.egg-info/\ndist/\nbuild/\n.pytest_cache/\n"
        }
        Ecosystem::Node => "node_modules/\n*.log\ndist/\nbuild/\n.next/\n.env\n.vscode/\n.idea/\n",
        Ecosystem::Php => "vendor/\nnode_modules/\n*.log\n.env\n.vscode/\n.idea/\n",
        Ecosystem::Java => "*.class\n*.jar\ntarget/\n.idea/\n.vscode/\n.settings/\n",
        Ecosystem::Go => "*.exe\n*.exe~\n*.dll\n*.so\n*.dylib\nvendor/\n.env\n.vscode/\n.idea/\n",
        Ecosystem::Rust => "target/\n.env\n.vscode/\n.idea/\n",
        Ecosystem::DotNet => "bin/\nobj/\n.vs/\n.vscode/\n.idea/\n",
    }
}

const PYTHON_MAIN: &str = r#"def main():
    print("Hello from {{name}}!")


if __name__ == "__main__":
    main()
"#;

const FLASK_APP: &str = r#"from flask import Flask, render_template

app = Flask(__name__)


@app.route("/")
def index():
    return render_template("index.html", title="{{name}}")


if __name__ == "__main__":
    app.run(host="0.0.0.0", port=8000, debug=True)
"#;

const FLASK_INDEX: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>{{ title }}</title>
</head>
<body>
    <h1>Hello from {{ title }}!</h1>
</body>
</html>
"#;

const FASTAPI_MAIN: &str = r#"from typing import Optional

from fastapi import FastAPI
from pydantic import BaseModel

app = FastAPI(title="{{name}}")


class Item(BaseModel):
    name: str
    description: Optional[str] = None


@app.get("/")
def read_root():
    return {"message": "Hello from {{name}}!"}


@app.post("/items/")
def create_item(item: Item):
    return item
"#;

const EXPRESS_INDEX: &str = r#"const express = require("express");
const path = require("path");

const app = express();
const PORT = process.env.PORT || 3000;

app.use(express.json());
app.use(express.static(path.join(__dirname, "../public")));

app.get("/api", (req, res) => {
  res.json({ message: "Hello from {{name}}!" });
});

if (require.main === module) {
  app.listen(PORT, () => {
    console.log(`Server running on port ${PORT}`);
  });
}

module.exports = app;
"#;

const EXPRESS_PUBLIC: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>{{name}}</title>
</head>
<body>
    <h1>{{name}}</h1>
    <div id="app"></div>
    <script>
        fetch("/api")
            .then((response) => response.json())
            .then((data) => {
                document.getElementById("app").textContent = data.message;
            });
    </script>
</body>
</html>
"#;

const EXPRESS_PACKAGE: &str = r#"{
  "name": "{{ident}}",
  "version": "1.0.0",
  "main": "src/index.js",
  "scripts": {
    "start": "node src/index.js",
    "dev": "nodemon src/index.js",
    "test": "node --test"
  },
  "dependencies": {
    "express": "^4.19.2"
  },
  "devDependencies": {
    "nodemon": "^3.1.0"
  }
}
"#;

const SPRING_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.springframework.boot</groupId>
    <artifactId>spring-boot-starter-parent</artifactId>
    <version>3.3.0</version>
  </parent>
  <groupId>com.example</groupId>
  <artifactId>{{name}}</artifactId>
  <version>0.0.1-SNAPSHOT</version>
  <properties>
    <java.version>17</java.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-web</artifactId>
    </dependency>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-test</artifactId>
      <scope>test</scope>
    </dependency>
  </dependencies>
  <build>
    <finalName>app</finalName>
    <plugins>
      <plugin>
        <groupId>org.springframework.boot</groupId>
        <artifactId>spring-boot-maven-plugin</artifactId>
      </plugin>
    </plugins>
  </build>
</project>
"#;

const SPRING_APPLICATION: &str = r#"package com.example.{{ident}};

import org.springframework.boot.SpringApplication;
import org.springframework.boot.autoconfigure.SpringBootApplication;
import org.springframework.web.bind.annotation.GetMapping;
import org.springframework.web.bind.annotation.RestController;

@SpringBootApplication
@RestController
public class Application {
    public static void main(String[] args) {
        SpringApplication.run(Application.class, args);
    }

    @GetMapping("/")
    public String hello() {
        return "Hello from {{name}}!";
    }
}
"#;

const GO_MAIN: &str = r#"package main

import (
	"fmt"
	"net/http"
)

func handler(w http.ResponseWriter, r *http.Request) {
	fmt.Fprintf(w, "Hello from {{name}}!")
}

func main() {
	http.HandleFunc("/", handler)
	fmt.Println("Server starting on port 8080...")
	if err := http.ListenAndServe(":8080", nil); err != nil {
		panic(err)
	}
}
"#;

const GO_MOD: &str = "module example.com/{{name}}\n\ngo 1.22\n";

const RUST_MANIFEST: &str = r#"[package]
name = "{{ident}}"
version = "0.1.0"
edition = "2021"

[dependencies]
actix-web = "4"
"#;

const RUST_MAIN: &str = r#"use actix_web::{web, App, HttpServer, Responder};

async fn hello() -> impl Responder {
    "Hello from {{name}}!"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Server running at http://0.0.0.0:8080");
    HttpServer::new(|| App::new().route("/", web::get().to(hello)))
        .bind("0.0.0.0:8080")?
        .run()
        .await
}
"#;

/// Python-ecosystem requirements for kinds generated without an external tool
fn requirements(kind: ProjectKind) -> &'static str {
    match kind {
        ProjectKind::Flask => "flask>=3.0\n",
        ProjectKind::Django => "django>=4.2\n",
        ProjectKind::FastApi => "fastapi>=0.110\nuvicorn>=0.29\npydantic>=2.0\n",
        _ => "# Add your dependencies here\n",
    }
}

/// Spring sources live under the project's Java package
pub fn spring_package_dir(spec: &ProjectSpec) -> String {
    format!("com/example/{}", spec.identifier())
}

/// Files written directly (not by a generator) for `spec.kind()`
pub fn kind_files(spec: &ProjectSpec) -> Vec<TemplateFile> {
    let file = |path: &str, template: &str| TemplateFile::new(path, render_project(template, spec));

    match spec.kind() {
        ProjectKind::Python => vec![
            file("main.py", PYTHON_MAIN),
            TemplateFile::new("requirements.txt", requirements(ProjectKind::Python)),
        ],
        ProjectKind::Flask => vec![
            file("app.py", FLASK_APP),
            // Jinja placeholders are left for Flask to fill
            TemplateFile::new("templates/index.html", FLASK_INDEX),
            TemplateFile::new("requirements.txt", requirements(ProjectKind::Flask)),
        ],
        ProjectKind::Django => vec![TemplateFile::new(
            "requirements.txt",
            requirements(ProjectKind::Django),
        )],
        ProjectKind::FastApi => vec![
            file("main.py", FASTAPI_MAIN),
            TemplateFile::new("requirements.txt", requirements(ProjectKind::FastApi)),
        ],
        ProjectKind::Express => vec![
            file("src/index.js", EXPRESS_INDEX),
            file("public/index.html", EXPRESS_PUBLIC),
            file("package.json", EXPRESS_PACKAGE),
        ],
        ProjectKind::Spring => {
            let package = spring_package_dir(spec);
            vec![
                file("pom.xml", SPRING_POM),
                file(
                    &format!("src/main/java/{}/Application.java", package),
                    SPRING_APPLICATION,
                ),
                TemplateFile::new(
                    "src/main/resources/application.properties",
                    "server.port=8080\n",
                ),
            ]
        }
        ProjectKind::Go => vec![file("main.go", GO_MAIN), file("go.mod", GO_MOD)],
        ProjectKind::Rust => vec![
            file("Cargo.toml", RUST_MANIFEST),
            file("src/main.rs", RUST_MAIN),
        ],
        // Produced by their generators
        ProjectKind::React
        | ProjectKind::Next
        | ProjectKind::Vue
        | ProjectKind::Angular
        | ProjectKind::Laravel
        | ProjectKind::DotNet => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectFlags;

    fn spec(kind: ProjectKind, name: &str) -> ProjectSpec {
        ProjectSpec::new(name, kind, ProjectFlags::default()).unwrap()
    }

    #[test]
    fn test_flask_keeps_jinja_placeholders() {
        let files = kind_files(&spec(ProjectKind::Flask, "shop"));
        let index = files
            .iter()
            .find(|f| f.path == "templates/index.html")
            .unwrap();
        assert!(index.contents.contains("{{ title }}"));
        let app = files.iter().find(|f| f.path == "app.py").unwrap();
        assert!(app.contents.contains("title=\"shop\""));
    }

    #[test]
    fn test_spring_uses_package_safe_identifier() {
        let files = kind_files(&spec(ProjectKind::Spring, "my-api"));
        assert!(files
            .iter()
            .any(|f| f.path == "src/main/java/com/example/my_api/Application.java"
                && f.contents.starts_with("package com.example.my_api;")));
    }

    #[test]
    fn test_rust_package_name() {
        let files = kind_files(&spec(ProjectKind::Rust, "Web-Svc"));
        let manifest = files.iter().find(|f| f.path == "Cargo.toml").unwrap();
        assert!(manifest.contents.contains("name = \"web_svc\""));
    }

    #[test]
    fn test_readme_mentions_run_command() {
        let readme = readme(&spec(ProjectKind::Go, "svc"));
        assert!(readme.starts_with("# svc"));
        assert!(readme.contains("go run ."));
    }
}
