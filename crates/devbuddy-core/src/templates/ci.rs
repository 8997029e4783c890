//! GitHub Actions workflow bodies

use crate::project::Ecosystem;

const HEADER: &str = r#"name: CI

on:
  push:
    branches: [ main ]
  pull_request:
    branches: [ main ]

jobs:
"#;

const PYTHON: &str = r#"  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - name: Set up Python
        uses: actions/setup-python@v5
        with:
          python-version: '3.12'
      - name: Install dependencies
        run: |
          python -m pip install --upgrade pip
          if [ -f requirements.txt ]; then pip install -r requirements.txt; fi
          if [ -f requirements-dev.txt ]; then pip install -r requirements-dev.txt; else pip install pytest; fi
      - name: Lint with flake8
        run: |
          pip install flake8
          flake8 . --count --select=E9,F63,F7,F82 --show-source --statistics
      - name: Test with pytest
        run: pytest
"#;

const NODE: &str = r#"  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - name: Use Node.js
        uses: actions/setup-node@v4
        with:
          node-version: '20'
      - name: Install dependencies
        run: npm install
      - name: Build
        run: npm run build --if-present
      - name: Test
        run: npm test --if-present
"#;

const PHP: &str = r#"  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - name: Set up PHP
        uses: shivammathur/setup-php@v2
        with:
          php-version: '8.3'
      - name: Install dependencies
        run: composer install --prefer-dist --no-progress
      - name: Test
        run: php artisan test
"#;

const JAVA: &str = r#"  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - name: Set up JDK
        uses: actions/setup-java@v4
        with:
          distribution: temurin
          java-version: '17'
          cache: maven
      - name: Build and test
        run: mvn -B verify
"#;

const GO: &str = r#"  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - name: Set up Go
        uses: actions/setup-go@v5
        with:
          go-version: '1.22'
      - name: Build
        run: go build -v ./...
      - name: Test
        run: go test -v ./...
"#;

const RUST: &str = r#"  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - name: Build
        run: cargo build --verbose
      - name: Run tests
        run: cargo test --verbose
"#;

const DOTNET: &str = r#"  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - name: Setup .NET
        uses: actions/setup-dotnet@v4
        with:
          dotnet-version: 8.0.x
      - name: Restore dependencies
        run: dotnet restore
      - name: Build
        run: dotnet build --no-restore
      - name: Test
        run: dotnet test --no-build --verbosity normal
"#;

const DOCKER_JOB: &str = r#"
  docker:
    runs-on: ubuntu-latest
    needs: build
    steps:
      - uses: actions/checkout@v4
      - name: Build image
        run: docker build -t app:${{ github.sha }} .
"#;

/// Workflow for an ecosystem; `with_docker` adds an image build job
pub fn workflow(ecosystem: Ecosystem, with_docker: bool) -> String {
    let build = match ecosystem {
        Ecosystem::Python => PYTHON,
        Ecosystem::Node => NODE,
        Ecosystem::Php => PHP,
        Ecosystem::Java => JAVA,
        Ecosystem::Go => GO,
        Ecosystem::Rust => RUST,
        Ecosystem::DotNet => DOTNET,
    };

    let mut out = String::with_capacity(HEADER.len() + build.len() + DOCKER_JOB.len());
    out.push_str(HEADER);
    out.push_str(build);
    if with_docker {
        out.push_str(DOCKER_JOB);
    }
    out
}
