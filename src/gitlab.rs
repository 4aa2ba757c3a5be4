//! GitLab CI pipeline generation
//!
//! Restates the container jobs as a declarative `.gitlab-ci.yml`. The
//! output is generated text only; nothing here executes.

use crate::config::ResolvedConfig;
use crate::jobs::{quality, test};
use std::fmt::Write;

/// One GitLab CI job description, assembled fluently
#[derive(Debug, Clone, Default)]
pub struct GitlabJob {
    stage: Option<String>,
    image: Option<String>,
    before_script: Vec<String>,
    script: Vec<String>,
    coverage: Option<String>,
    artifacts_name: Option<String>,
    artifact_paths: Vec<String>,
    reports: Vec<(String, String)>,
}

impl GitlabJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: &str) -> Self {
        self.stage = Some(stage.to_string());
        self
    }

    pub fn image(mut self, image: &str) -> Self {
        self.image = Some(image.to_string());
        self
    }

    pub fn before_script(mut self, line: &str) -> Self {
        self.before_script.push(line.to_string());
        self
    }

    pub fn script(mut self, line: &str) -> Self {
        self.script.push(line.to_string());
        self
    }

    pub fn coverage(mut self, pattern: &str) -> Self {
        self.coverage = Some(pattern.to_string());
        self
    }

    pub fn artifacts_name(mut self, name: &str) -> Self {
        self.artifacts_name = Some(name.to_string());
        self
    }

    pub fn artifact_path(mut self, path: &str) -> Self {
        self.artifact_paths.push(path.to_string());
        self
    }

    /// Classify an artifact as a report (`codequality`, `junit`, ...)
    pub fn report(mut self, kind: &str, path: &str) -> Self {
        self.reports.push((kind.to_string(), path.to_string()));
        self
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "{}:", name);
        if let Some(ref stage) = self.stage {
            let _ = writeln!(out, "  stage: {}", stage);
        }
        if let Some(ref image) = self.image {
            let _ = writeln!(out, "  image: {}", image);
        }
        if !self.before_script.is_empty() {
            let _ = writeln!(out, "  before_script:");
            for line in &self.before_script {
                let _ = writeln!(out, "    - {}", line);
            }
        }
        if !self.script.is_empty() {
            let _ = writeln!(out, "  script:");
            for line in &self.script {
                let _ = writeln!(out, "    - {}", line);
            }
        }
        if let Some(ref coverage) = self.coverage {
            let _ = writeln!(out, "  coverage: '{}'", coverage);
        }
        if self.artifacts_name.is_some() || !self.artifact_paths.is_empty() || !self.reports.is_empty()
        {
            let _ = writeln!(out, "  artifacts:");
            if let Some(ref artifacts_name) = self.artifacts_name {
                let _ = writeln!(out, "    name: {}", artifacts_name);
            }
            if !self.artifact_paths.is_empty() {
                let _ = writeln!(out, "    paths:");
                for path in &self.artifact_paths {
                    let _ = writeln!(out, "      - {}", path);
                }
            }
            if !self.reports.is_empty() {
                let _ = writeln!(out, "    reports:");
                for (kind, path) in &self.reports {
                    let _ = writeln!(out, "      {}: {}", kind, path);
                }
            }
        }
    }
}

/// An ordered set of named jobs rendering to `.gitlab-ci.yml`
#[derive(Debug, Clone, Default)]
pub struct GitlabPipeline {
    jobs: Vec<(String, GitlabJob)>,
}

impl GitlabPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_job(mut self, name: &str, job: GitlabJob) -> Self {
        self.jobs.push((name.to_string(), job));
        self
    }

    /// Render the pipeline as YAML
    pub fn render(&self) -> String {
        let mut out = String::from("# Generated by tarmac. Do not edit by hand.\n");
        for (name, job) in &self.jobs {
            out.push('\n');
            job.render(name, &mut out);
        }
        out
    }
}

/// The default pipeline: quality and test restated for GitLab runners
pub fn default_pipeline(cfg: &ResolvedConfig) -> GitlabPipeline {
    let image = cfg.image();

    let code_quality = GitlabJob::new()
        .stage("test")
        .image(&image)
        .before_script("flutter pub global activate dart_code_metrics")
        .before_script("export PATH=\"$PATH:$HOME/.pub-cache/bin\"")
        .script(&format!(
            "metrics lib -r codeclimate > {}",
            quality::REPORT_FILE
        ))
        .report("codequality", quality::REPORT_FILE);

    let test = GitlabJob::new()
        .stage("test")
        .image(&image)
        .before_script("flutter pub global activate junitreport")
        .before_script("export PATH=\"$PATH:$HOME/.pub-cache/bin\"")
        .script(&format!(
            "flutter test --machine --coverage | tojunit -o {}",
            test::REPORT_FILE
        ))
        .script("lcov --summary coverage/lcov.info")
        .script("genhtml coverage/lcov.info --output=coverage")
        .coverage(r"/lines\.*: \d+\.\d+\%/")
        .artifacts_name("coverage")
        .artifact_path("$CI_PROJECT_DIR/coverage")
        .report("junit", test::REPORT_FILE);

    GitlabPipeline::new()
        .add_job("code_quality", code_quality)
        .add_job("test", test)
}
