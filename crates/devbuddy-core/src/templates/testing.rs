//! Test scaffolding bodies

use super::{render_project, TemplateFile};
use crate::project::{ProjectKind, ProjectSpec};

const PY_INIT: &str = "# Tests for the project\n";

const PY_CONFTEST: &str = r#"import os
import sys

# Make the project root importable from tests
sys.path.insert(0, os.path.abspath(os.path.join(os.path.dirname(__file__), "..")))
"#;

const PY_BASIC: &str = r#"from main import main


def test_main_runs(capsys):
    main()
    assert "Hello" in capsys.readouterr().out
"#;

const FLASK_BASIC: &str = r#"from app import app


def test_index():
    client = app.test_client()
    response = client.get("/")
    assert response.status_code == 200
"#;

const FASTAPI_BASIC: &str = r#"from fastapi.testclient import TestClient

from main import app

client = TestClient(app)


def test_read_root():
    response = client.get("/")
    assert response.status_code == 200
    assert "message" in response.json()
"#;

const DJANGO_BASIC: &str = r#"def test_settings_load(settings):
    assert settings.ROOT_URLCONF == "config.urls"
"#;

const DJANGO_PYTEST_INI: &str = "[pytest]\nDJANGO_SETTINGS_MODULE = config.settings\n";

const GO_TEST: &str = r#"package main

import (
	"net/http"
	"net/http/httptest"
	"testing"
)

func TestHandler(t *testing.T) {
	req := httptest.NewRequest(http.MethodGet, "/", nil)
	rec := httptest.NewRecorder()

	handler(rec, req)

	if rec.Code != http.StatusOK {
		t.Fatalf("expected 200, got %d", rec.Code)
	}
}
"#;

const RUST_SMOKE: &str = r#"#[test]
fn package_metadata_is_set() {
    assert_eq!(env!("CARGO_PKG_NAME"), "{{ident}}");
}
"#;

const EXPRESS_TEST: &str = r#"const test = require("node:test");
const assert = require("node:assert");

const app = require("../src/index");

test("GET /api responds with a message", async () => {
  const server = app.listen(0);
  try {
    const { port } = server.address();
    const response = await fetch(`http://127.0.0.1:${port}/api`);
    assert.strictEqual(response.status, 200);
    const body = await response.json();
    assert.ok(body.message);
  } finally {
    server.close();
  }
});
"#;

const SPRING_TEST: &str = r#"package com.example.{{ident}};

import org.junit.jupiter.api.Test;
import org.springframework.boot.test.context.SpringBootTest;

@SpringBootTest
class ApplicationTests {
    @Test
    void contextLoads() {
    }
}
"#;

fn requirements_dev(kind: ProjectKind) -> String {
    let mut deps = String::from("-r requirements.txt\npytest\n");
    match kind {
        ProjectKind::FastApi => deps.push_str("httpx\n"),
        ProjectKind::Django => deps.push_str("pytest-django\n"),
        _ => {}
    }
    deps
}

/// Test files for `spec.kind()`; empty when the kind ships its own test setup
pub fn test_files(spec: &ProjectSpec) -> Vec<TemplateFile> {
    let file = |path: &str, template: &str| TemplateFile::new(path, render_project(template, spec));
    let kind = spec.kind();

    match kind {
        ProjectKind::Python | ProjectKind::Flask | ProjectKind::FastApi | ProjectKind::Django => {
            let basic = match kind {
                ProjectKind::Flask => FLASK_BASIC,
                ProjectKind::FastApi => FASTAPI_BASIC,
                ProjectKind::Django => DJANGO_BASIC,
                _ => PY_BASIC,
            };
            let mut files = vec![
                TemplateFile::new("tests/__init__.py", PY_INIT),
                TemplateFile::new("tests/conftest.py", PY_CONFTEST),
                TemplateFile::new("tests/test_basic.py", basic),
                TemplateFile::new("requirements-dev.txt", requirements_dev(kind)),
            ];
            if kind == ProjectKind::Django {
                files.push(TemplateFile::new("pytest.ini", DJANGO_PYTEST_INI));
            }
            files
        }
        ProjectKind::Go => vec![TemplateFile::new("main_test.go", GO_TEST)],
        ProjectKind::Rust => vec![file("tests/smoke.rs", RUST_SMOKE)],
        ProjectKind::Express => vec![TemplateFile::new("test/app.test.js", EXPRESS_TEST)],
        ProjectKind::Spring => vec![file(
            &format!(
                "src/test/java/{}/ApplicationTests.java",
                super::base::spring_package_dir(spec)
            ),
            SPRING_TEST,
        )],
        ProjectKind::React
        | ProjectKind::Next
        | ProjectKind::Vue
        | ProjectKind::Angular
        | ProjectKind::Laravel
        | ProjectKind::DotNet => Vec::new(),
    }
}
