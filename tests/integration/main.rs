//! Integration tests for tree-cache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const HOST_VARS: &[&str] = &[
        "GITHUB_ACTIONS",
        "GITHUB_STATE",
        "GITHUB_ENV",
        "GITHUB_OUTPUT",
        "GITHUB_REPOSITORY",
        "GITHUB_RUN_ID",
        "GITHUB_RUN_ATTEMPT",
        "GITHUB_JOB",
        "RUNNER_TEMP",
        "CI_JOB_ID",
        "BUILDKITE_JOB_ID",
        "STATE_key",
        "STATE_hash",
        "TREE_CACHE_KEY",
        "TREE_CACHE_HASH",
        "INPUT_BUCKET-NAME",
        "INPUT_KEY-PREFIX",
        "INPUT_AWS-REGION",
        "INPUT_AWS-ACCESS-KEY-ID",
        "INPUT_AWS-SECRET-ACCESS-KEY",
        "TREE_CACHE_CONFIG",
        "TREE_CACHE_RUN_ID",
        "RUST_LOG",
    ];

    /// Binary running in `dir` with no CI variables inherited
    fn tree_cache(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("tree-cache");
        cmd.current_dir(dir);
        for var in HOST_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    fn git(dir: &Path, args: &[&str]) -> Option<String> {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Temp repository with one commit, or None when git is unavailable
    fn git_repo() -> Option<TempDir> {
        let dir = TempDir::new().unwrap();
        git(dir.path(), &["init", "-q"])?;
        std::fs::write(dir.path().join("README.md"), "hello\n").unwrap();
        git(dir.path(), &["add", "README.md"])?;
        git(
            dir.path(),
            &[
                "-c",
                "user.name=CI",
                "-c",
                "user.email=ci@example.com",
                "commit",
                "-q",
                "-m",
                "init",
            ],
        )?;
        Some(dir)
    }

    /// Decode `name<<DELIM` records from a runner file command
    fn read_file_commands(path: &Path) -> Vec<(String, String)> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        let mut entries = Vec::new();
        let mut lines = content.lines();
        while let Some(header) = lines.next() {
            let Some((name, delimiter)) = header.split_once("<<") else {
                continue;
            };
            let value: Vec<&str> = lines.by_ref().take_while(|l| *l != delimiter).collect();
            entries.push((name.to_string(), value.join("\n")));
        }
        entries
    }

    /// `aws` stand-in keeping objects under `$FAKE_S3/<bucket>/<key>`
    #[cfg(unix)]
    const FAKE_AWS: &str = r#"#!/bin/sh
case "$1 $2" in
  "s3api head-object")
    bucket=${3#--bucket=}
    key=${4#--key=}
    [ -f "$FAKE_S3/$bucket/$key" ] && exit 0
    echo "An error occurred (404) when calling the HeadObject operation: Not Found" >&2
    exit 254 ;;
  "s3 cp")
    dest="$FAKE_S3/${4#s3://}"
    mkdir -p "$(dirname "$dest")" && cp "$3" "$dest" ;;
  *)
    exit 2 ;;
esac
"#;

    /// A git checkout plus a fake bucket, driven one CI step at a time
    #[cfg(unix)]
    struct Job {
        repo: TempDir,
        scratch: TempDir,
    }

    #[cfg(unix)]
    impl Job {
        fn new() -> Option<Self> {
            use std::os::unix::fs::PermissionsExt;

            let repo = git_repo()?;
            let scratch = TempDir::new().unwrap();
            let bin = scratch.path().join("bin");
            std::fs::create_dir(&bin).unwrap();
            let aws = bin.join("aws");
            std::fs::write(&aws, FAKE_AWS).unwrap();
            std::fs::set_permissions(&aws, std::fs::Permissions::from_mode(0o755)).unwrap();
            Some(Self { repo, scratch })
        }

        fn path(&self, name: &str) -> PathBuf {
            self.scratch.path().join(name)
        }

        /// One step of the job; each step gets fresh runner files
        fn step(&self, subcommand: &str) -> Command {
            let path = format!(
                "{}:{}",
                self.path("bin").display(),
                std::env::var("PATH").unwrap_or_default()
            );
            let mut cmd = tree_cache(self.repo.path());
            cmd.arg(subcommand)
                .args(["--bucket", "ci"])
                .env("PATH", path)
                .env("FAKE_S3", self.path("s3"))
                .env("RUNNER_TEMP", self.path("tmp"));
            cmd
        }

        fn restore(&self) -> Command {
            let mut cmd = self.step("restore");
            cmd.args(["--repository", "o/r", "--key-prefix", "lint"]);
            cmd
        }

        fn save(&self) -> Command {
            self.step("save")
        }

        /// Markers uploaded under this job's key prefix
        fn uploaded(&self) -> usize {
            std::fs::read_dir(self.path("s3").join("ci/cache/o/r/lint"))
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        tree_cache(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("already processed"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        tree_cache(dir.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("tree-cache"));
    }

    #[test]
    fn save_without_bucket_fails() {
        let dir = TempDir::new().unwrap();
        tree_cache(dir.path())
            .arg("save")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Missing required input: bucket"));
    }

    #[test]
    fn failure_is_annotated_on_github() {
        let dir = TempDir::new().unwrap();
        tree_cache(dir.path())
            .arg("save")
            .env("GITHUB_ACTIONS", "true")
            .assert()
            .failure()
            .stdout(predicate::str::contains(
                "::error::Missing required input: bucket",
            ));
    }

    #[test]
    fn save_without_pending_state_skips() {
        let dir = TempDir::new().unwrap();
        tree_cache(dir.path())
            .args(["save", "--bucket", "my-bucket", "--handoff", "file"])
            .args(["--run-id", "no-restore-ran"])
            .arg("--state-dir")
            .arg(dir.path())
            .assert()
            .success()
            .stderr(predicate::str::contains(
                "skipping saving the cache file",
            ));
    }

    #[test]
    fn save_with_empty_github_state_skips() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join("state");
        tree_cache(dir.path())
            .args(["save", "--bucket", "my-bucket", "--handoff", "github"])
            .env("GITHUB_STATE", &state)
            .env("STATE_key", "")
            .env("STATE_hash", "")
            .assert()
            .success()
            .stderr(predicate::str::contains(
                "skipping saving the cache file",
            ));
    }

    #[test]
    fn save_without_job_scope_skips() {
        let dir = TempDir::new().unwrap();
        tree_cache(dir.path())
            .args(["save", "--bucket", "my-bucket", "--handoff", "file"])
            .assert()
            .success();
    }

    #[test]
    fn bucket_from_local_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".tree-cache.toml"),
            "[store]\nbucket = \"from-file\"\n",
        )
        .unwrap();

        tree_cache(dir.path())
            .args(["save", "--handoff", "file", "--run-id", "cfg"])
            .arg("--state-dir")
            .arg(dir.path())
            .assert()
            .success();
    }

    #[test]
    fn invalid_config_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".tree-cache.toml"), "[store\n").unwrap();

        tree_cache(dir.path())
            .args(["save", "--bucket", "b"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn restore_without_repository_fails() {
        let dir = TempDir::new().unwrap();
        tree_cache(dir.path())
            .args(["restore", "--bucket", "my-bucket"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "Missing required input: repository",
            ));
    }

    #[test]
    fn restore_rejects_malformed_repository() {
        let dir = TempDir::new().unwrap();
        tree_cache(dir.path())
            .args(["restore", "--bucket", "b", "--repository", "just-a-name"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid repository"));
    }

    #[test]
    fn restore_outside_repository_fails() {
        let dir = TempDir::new().unwrap();
        tree_cache(dir.path())
            .args(["restore", "--bucket", "b", "--repository", "o/r"])
            .args(["--handoff", "file", "--run-id", "outside"])
            .arg("--state-dir")
            .arg(dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("rev-parse"));
    }

    #[test]
    fn key_uses_root_tree_hash() {
        let Some(repo) = git_repo() else {
            return;
        };
        let tree = git(repo.path(), &["rev-parse", "HEAD:"]).unwrap();

        let sub = repo.path().join("nested");
        std::fs::create_dir(&sub).unwrap();

        // Same key from a subdirectory: the root tree is always used
        for dir in [repo.path(), sub.as_path()] {
            tree_cache(dir)
                .args(["key", "--repository", "my-org/my-repo", "--key-prefix", "lint"])
                .assert()
                .success()
                .stdout(format!("cache/my-org/my-repo/lint/{}\n", tree));
        }
    }

    #[test]
    fn key_changes_with_content() {
        let Some(repo) = git_repo() else {
            return;
        };
        let key = |dir: &Path| {
            let output = tree_cache(dir)
                .args(["key", "--repository", "o/r"])
                .output()
                .unwrap();
            String::from_utf8(output.stdout).unwrap()
        };

        let before = key(repo.path());
        assert_eq!(before, key(repo.path()));

        std::fs::write(repo.path().join("README.md"), "changed\n").unwrap();
        git(repo.path(), &["add", "README.md"]).unwrap();
        git(
            repo.path(),
            &[
                "-c",
                "user.name=CI",
                "-c",
                "user.email=ci@example.com",
                "commit",
                "-q",
                "-m",
                "change",
            ],
        )
        .unwrap();

        assert_ne!(before, key(repo.path()));
    }

    #[test]
    fn restore_reads_config_from_repo_dir() {
        let repo = TempDir::new().unwrap();
        std::fs::write(
            repo.path().join(".tree-cache.toml"),
            "[store]\nbucket = \"from-repo\"\n",
        )
        .unwrap();
        let elsewhere = TempDir::new().unwrap();

        // Gets past the bucket check and fails on the missing git checkout
        tree_cache(elsewhere.path())
            .args(["restore", "--repository", "o/r", "--repo-dir"])
            .arg(repo.path())
            .args(["--handoff", "file", "--run-id", "cfg", "--state-dir"])
            .arg(elsewhere.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("rev-parse"))
            .stderr(predicate::str::contains("bucket").not());
    }

    #[cfg(unix)]
    #[test]
    fn run_steps_hand_off_through_job_environment() {
        let Some(job) = Job::new() else {
            return;
        };

        job.restore()
            .env("GITHUB_ENV", job.path("env-restore"))
            .env("GITHUB_STATE", job.path("state-restore"))
            .assert()
            .success()
            .stdout(predicate::str::contains("processed=false"));

        // The runner exports the appended variables to later steps
        let exported = read_file_commands(&job.path("env-restore"));
        let names: Vec<&str> = exported.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["TREE_CACHE_KEY", "TREE_CACHE_HASH"]);

        job.save()
            .env("GITHUB_ENV", job.path("env-save"))
            .env("GITHUB_STATE", job.path("state-save"))
            .envs(exported.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .assert()
            .success()
            .stderr(predicate::str::contains("was processed, saved the"));
        assert_eq!(job.uploaded(), 1);

        // Save blanks the slots so a second save in the job skips
        let cleared = read_file_commands(&job.path("env-save"));
        assert!(cleared.iter().all(|(_, value)| value.is_empty()));
        assert_eq!(cleared.len(), 2);

        job.restore()
            .env("GITHUB_ENV", job.path("env-next-run"))
            .assert()
            .success()
            .stdout(predicate::str::contains("processed=true"));
    }

    #[cfg(unix)]
    #[test]
    fn run_steps_without_job_environment_use_scoped_file() {
        let Some(job) = Job::new() else {
            return;
        };
        let state_dir = job.path("handoff");

        // GITHUB_STATE alone does not reach a later run step
        job.restore()
            .env("GITHUB_STATE", job.path("state-restore"))
            .env("GITHUB_RUN_ID", "7")
            .env("GITHUB_JOB", "test")
            .arg("--state-dir")
            .arg(&state_dir)
            .assert()
            .success();

        job.save()
            .env("GITHUB_RUN_ID", "8")
            .env("GITHUB_JOB", "test")
            .arg("--state-dir")
            .arg(&state_dir)
            .assert()
            .success()
            .stderr(predicate::str::contains("skipping saving the cache file"));
        assert_eq!(job.uploaded(), 0);

        job.save()
            .env("GITHUB_STATE", job.path("state-save"))
            .env("GITHUB_RUN_ID", "7")
            .env("GITHUB_JOB", "test")
            .arg("--state-dir")
            .arg(&state_dir)
            .assert()
            .success()
            .stderr(predicate::str::contains("was processed, saved the"));
        assert_eq!(job.uploaded(), 1);

        // The record was consumed
        job.save()
            .env("GITHUB_RUN_ID", "7")
            .env("GITHUB_JOB", "test")
            .arg("--state-dir")
            .arg(&state_dir)
            .assert()
            .success()
            .stderr(predicate::str::contains("skipping saving the cache file"));
    }

    #[cfg(unix)]
    #[test]
    fn action_post_step_hands_off_through_state() {
        let Some(job) = Job::new() else {
            return;
        };

        job.restore()
            .args(["--handoff", "github"])
            .env("GITHUB_STATE", job.path("state-main"))
            .assert()
            .success();

        // The runner replays state to the post step as STATE_<name>
        let state = read_file_commands(&job.path("state-main"));
        job.save()
            .args(["--handoff", "github"])
            .envs(state.iter().map(|(k, v)| (format!("STATE_{}", k), v.clone())))
            .assert()
            .success()
            .stderr(predicate::str::contains("was processed, saved the"));
        assert_eq!(job.uploaded(), 1);
    }
}
