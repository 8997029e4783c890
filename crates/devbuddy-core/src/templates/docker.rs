//! Dockerfile, .dockerignore and compose bodies

use super::render;
use crate::project::{Ecosystem, ProjectKind};

/// How a Python project is started inside the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PythonEntry {
    /// `python <file>`
    Script(String),
    /// `python manage.py runserver`
    Django,
    /// `uvicorn <module>:app`
    Asgi(String),
}

/// What the Dockerfile builds and runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerTarget {
    Python(PythonEntry),
    /// Built single-page app served by nginx from `dist_dir`
    StaticSite { dist_dir: String },
    NextServer,
    NodeServer { main: String },
    Laravel,
    Spring,
    Go,
    Rust { binary: String },
    DotNet { assembly: String },
}

impl DockerTarget {
    /// Port the container listens on
    pub fn port(&self) -> u16 {
        match self {
            DockerTarget::Python(_) => 8000,
            DockerTarget::StaticSite { .. } | DockerTarget::Laravel => 80,
            DockerTarget::NextServer | DockerTarget::NodeServer { .. } => 3000,
            DockerTarget::Spring | DockerTarget::Go | DockerTarget::Rust { .. } | DockerTarget::DotNet { .. } => {
                8080
            }
        }
    }
}

const PYTHON: &str = r#"FROM python:3.12-slim

WORKDIR /app

COPY requirements.txt .
RUN pip install --no-cache-dir -r requirements.txt

COPY . .

EXPOSE 8000
CMD {{cmd}}
"#;

const STATIC_SITE: &str = r#"FROM node:20-alpine AS build

WORKDIR /app
COPY package*.json ./
RUN npm ci
COPY . .
RUN npm run build

FROM nginx:alpine
COPY --from=build /app/{{dist}} /usr/share/nginx/html
EXPOSE 80
CMD ["nginx", "-g", "daemon off;"]
"#;

const NEXT: &str = r#"FROM node:20-alpine AS build

WORKDIR /app
COPY package*.json ./
RUN npm ci
COPY . .
RUN npm run build

FROM node:20-alpine
WORKDIR /app
ENV NODE_ENV=production
COPY --from=build /app ./
EXPOSE 3000
CMD ["npm", "start"]
"#;

const NODE_SERVER: &str = r#"FROM node:20-alpine

WORKDIR /app
COPY package*.json ./
RUN npm install --omit=dev
COPY . .

EXPOSE 3000
CMD ["node", "{{main}}"]
"#;

const LARAVEL: &str = r#"FROM composer:2 AS vendor

WORKDIR /app
COPY . .
RUN composer install --no-dev --optimize-autoloader

FROM php:8.3-apache
ENV APACHE_DOCUMENT_ROOT=/var/www/html/public
RUN sed -ri -e 's!/var/www/html!${APACHE_DOCUMENT_ROOT}!g' /etc/apache2/sites-available/*.conf \
    && a2enmod rewrite
COPY --from=vendor /app /var/www/html
RUN chown -R www-data:www-data /var/www/html/storage /var/www/html/bootstrap/cache
EXPOSE 80
"#;

const SPRING: &str = r#"FROM maven:3.9-eclipse-temurin-17 AS build

WORKDIR /app
COPY pom.xml .
RUN mvn -q dependency:go-offline
COPY src ./src
RUN mvn -q package -DskipTests

FROM eclipse-temurin:17-jre
COPY --from=build /app/target/app.jar /app/app.jar
EXPOSE 8080
CMD ["java", "-jar", "/app/app.jar"]
"#;

const GO: &str = r#"FROM golang:1.22-alpine AS build

WORKDIR /app
COPY go.* ./
RUN go mod download
COPY . .
RUN go build -o /app/server .

FROM alpine:latest
COPY --from=build /app/server /app/server
EXPOSE 8080
CMD ["/app/server"]
"#;

const RUST: &str = r#"FROM rust:1-slim AS build

WORKDIR /app
COPY . .
RUN cargo build --release

FROM debian:bookworm-slim
COPY --from=build /app/target/release/{{binary}} /usr/local/bin/{{binary}}
EXPOSE 8080
CMD ["{{binary}}"]
"#;

const DOTNET: &str = r#"FROM mcr.microsoft.com/dotnet/sdk:8.0 AS build

WORKDIR /src
COPY . .
RUN dotnet publish -c Release -o /app

FROM mcr.microsoft.com/dotnet/aspnet:8.0
WORKDIR /app
COPY --from=build /app .
ENV ASPNETCORE_URLS=http://+:8080
EXPOSE 8080
ENTRYPOINT ["dotnet", "{{assembly}}"]
"#;

pub fn dockerfile(target: &DockerTarget) -> String {
    match target {
        DockerTarget::Python(entry) => {
            let cmd = match entry {
                PythonEntry::Script(file) => format!(r#"["python", "{}"]"#, file),
                PythonEntry::Django => {
                    r#"["python", "manage.py", "runserver", "0.0.0.0:8000"]"#.to_string()
                }
                PythonEntry::Asgi(module) => format!(
                    r#"["uvicorn", "{}:app", "--host", "0.0.0.0", "--port", "8000"]"#,
                    module
                ),
            };
            render(PYTHON, &[("cmd", cmd.as_str())])
        }
        DockerTarget::StaticSite { dist_dir } => render(STATIC_SITE, &[("dist", dist_dir.as_str())]),
        DockerTarget::NextServer => NEXT.to_string(),
        DockerTarget::NodeServer { main } => render(NODE_SERVER, &[("main", main.as_str())]),
        DockerTarget::Laravel => LARAVEL.to_string(),
        DockerTarget::Spring => SPRING.to_string(),
        DockerTarget::Go => GO.to_string(),
        DockerTarget::Rust { binary } => render(RUST, &[("binary", binary.as_str())]),
        DockerTarget::DotNet { assembly } => render(DOTNET, &[("assembly", assembly.as_str())]),
    }
}

pub fn dockerignore(ecosystem: Ecosystem) -> String {
    let common = ".git\n.github\n.env\nDockerfile\ndocker-compose.yml\n";
    let specific = match ecosystem {
        Ecosystem::Python => "__pycache__/\n*.pyc\nvenv/\n.venv/\n.pytest_cache/\n",
        Ecosystem::Node => "node_modules/\nnpm-debug.log\n",
        Ecosystem::Php => "vendor/\nnode_modules/\n",
        Ecosystem::Java => "target/\n",
        Ecosystem::Go => "vendor/\n",
        Ecosystem::Rust => "target/\n",
        Ecosystem::DotNet => "bin/\nobj/\n",
    };
    format!("{}{}", common, specific)
}

const COMPOSE: &str = r#"services:
  app:
    build: .
    ports:
      - "{{port}}:{{port}}"
"#;

const COMPOSE_DJANGO: &str = r#"services:
  web:
    build: .
    ports:
      - "8000:8000"
    volumes:
      - .:/app
    depends_on:
      - db

  db:
    image: postgres:16
    environment:
      - POSTGRES_DB=postgres
      - POSTGRES_USER=postgres
      - POSTGRES_PASSWORD=postgres
    volumes:
      - postgres_data:/var/lib/postgresql/data/

volumes:
  postgres_data:
"#;

pub fn compose(kind: ProjectKind, target: &DockerTarget) -> String {
    if kind == ProjectKind::Django {
        return COMPOSE_DJANGO.to_string();
    }
    let port = target.port().to_string();
    render(COMPOSE, &[("port", port.as_str())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_entry_points() {
        let flask = dockerfile(&DockerTarget::Python(PythonEntry::Script("app.py".into())));
        assert!(flask.contains(r#"CMD ["python", "app.py"]"#));

        let fastapi = dockerfile(&DockerTarget::Python(PythonEntry::Asgi("main".into())));
        assert!(fastapi.contains(r#""uvicorn", "main:app""#));

        let django = dockerfile(&DockerTarget::Python(PythonEntry::Django));
        assert!(django.contains("manage.py"));
    }

    #[test]
    fn test_compose_exposes_target_port() {
        let go = compose(ProjectKind::Go, &DockerTarget::Go);
        assert!(go.contains("\"8080:8080\""));
        let django = compose(ProjectKind::Django, &DockerTarget::Python(PythonEntry::Django));
        assert!(django.contains("postgres"));
    }

    #[test]
    fn test_rust_binary_is_substituted() {
        let out = dockerfile(&DockerTarget::Rust {
            binary: "web_svc".into(),
        });
        assert!(out.contains("/app/target/release/web_svc"));
        assert!(!out.contains("{{"));
    }
}
