//! Integration tests for Tarmac

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn tarmac() -> Command {
        cargo_bin_cmd!("tarmac")
    }

    #[test]
    fn help_displays() {
        tarmac()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Container CI pipeline for Flutter apps"));
    }

    #[test]
    fn version_displays() {
        tarmac()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("tarmac"));
    }

    #[test]
    fn jobs_lists_registry() {
        tarmac()
            .arg("jobs")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("code-quality")
                    .and(predicate::str::contains("test"))
                    .and(predicate::str::contains("build"))
                    .and(predicate::str::contains("dev")),
            );
    }

    #[test]
    fn jobs_json_carries_descriptions() {
        tarmac()
            .args(["jobs", "--format", "json"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"name\": \"code-quality\"")
                    .and(predicate::str::contains("Run code quality checks")),
            );
    }

    #[test]
    fn jobs_plain_one_per_line() {
        tarmac()
            .args(["jobs", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("code-quality\ntest\nbuild\ndev\n"));
    }

    #[test]
    fn run_unknown_job_fails_fast() {
        tarmac()
            .args(["run", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown job: nope"));
    }

    #[test]
    fn run_missing_project_is_setup_failure() {
        tarmac()
            .args(["run", "test", "--project", "/nonexistent/project"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Source context not found"));
    }

    #[test]
    fn gitlab_writes_pipeline_file() {
        let dir = TempDir::new().unwrap();

        tarmac()
            .arg("gitlab")
            .current_dir(dir.path())
            .assert()
            .success();

        let yaml = std::fs::read_to_string(dir.path().join(".gitlab-ci.yml")).unwrap();
        assert!(yaml.contains("code_quality:"));
        assert!(yaml.contains("junit: report.xml"));
    }

    #[test]
    fn gitlab_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitlab-ci.yml"), "stages: []").unwrap();

        tarmac()
            .arg("gitlab")
            .current_dir(dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("file exists"));

        tarmac()
            .args(["gitlab", "--force"])
            .current_dir(dir.path())
            .assert()
            .success();
    }

    #[test]
    fn config_path() {
        tarmac()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        tarmac()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[pipeline]"));
    }

    #[test]
    fn status_runs() {
        // Status may fail if podman isn't installed, but should not panic
        let _ = tarmac().arg("status").assert();
    }

    #[test]
    fn completions_generate() {
        tarmac()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("tarmac"));
    }
}
