//! Rootless Podman container engine
//!
//! Implements the ContainerEngine trait by shelling out to podman. Job
//! containers are created idle (`sleep infinity`) and driven step by step
//! with `podman exec`, so a later step observes the filesystem state left
//! by all previous steps in the same job.

use crate::artifact::{self, ArtifactId};
use crate::cache::CacheVolume;
use crate::config::ConfigManager;
use crate::engine::{
    step_error_output, ContainerEngine, ContainerHandle, ContainerPlan, Step, StepOutput,
};
use crate::error::{TarmacError, TarmacResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};
use uuid::Uuid;

/// Container engine using rootless Podman
pub struct PodmanEngine {
    /// Leave containers and staged contexts in place after a job finishes
    keep_containers: bool,
}

impl PodmanEngine {
    pub fn new(keep_containers: bool) -> Self {
        Self { keep_containers }
    }

    /// Check if Podman is installed
    async fn podman_installed() -> bool {
        Command::new("podman")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Check if rootless Podman is properly configured
    async fn rootless_configured() -> TarmacResult<bool> {
        let output = Command::new("podman")
            .args(["info", "--format", "{{.Host.Security.Rootless}}"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TarmacError::command_failed("podman info", e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim() == "true")
    }

    /// Execute a Podman command and return the output
    async fn exec(&self, args: &[&str]) -> TarmacResult<std::process::Output> {
        debug!("Executing: podman {:?}", args);

        Command::new("podman")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TarmacError::command_failed(format!("podman {:?}", args), e))
    }

    /// Pull an image
    async fn pull(&self, image: &str) -> TarmacResult<()> {
        info!("Pulling image: {}", image);

        let output = self.exec(&["pull", image]).await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(TarmacError::ImagePull {
                image: image.to_string(),
                reason: stderr.to_string(),
            })
        }
    }

    /// Check if image exists locally
    async fn image_exists(&self, image: &str) -> TarmacResult<bool> {
        let output = self.exec(&["image", "exists", image]).await?;
        Ok(output.status.success())
    }

    /// Check if a volume exists
    async fn volume_exists(&self, name: &str) -> TarmacResult<bool> {
        let output = self.exec(&["volume", "exists", name]).await?;
        Ok(output.status.success())
    }

    /// Build the `podman create` argument list for a job container
    ///
    /// Cache volumes mount before the context directory; the context is
    /// already exclusion-filtered into `staging` by the time this runs.
    fn create_args(plan: &ContainerPlan, staging: &Path) -> Vec<String> {
        let mut args = vec![
            "create".to_string(),
            "--label".to_string(),
            format!("io.tarmac.job={}", plan.job),
            "-w".to_string(),
            plan.workdir.clone(),
        ];

        for mount in &plan.cache_mounts {
            args.push("-v".to_string());
            args.push(mount.volume_arg());
        }

        args.push("-v".to_string());
        args.push(format!("{}:{}", staging.display(), plan.context_path));

        for (k, v) in &plan.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", k, v));
        }

        args.push(plan.image.clone());
        args.push("sleep".to_string());
        args.push("infinity".to_string());

        args
    }
}

#[async_trait]
impl ContainerEngine for PodmanEngine {
    async fn is_available(&self) -> TarmacResult<bool> {
        if !Self::podman_installed().await {
            return Ok(false);
        }
        Self::rootless_configured().await
    }

    async fn ensure_ready(&self) -> TarmacResult<()> {
        if !Self::podman_installed().await {
            return Err(TarmacError::PodmanNotFound);
        }

        if !Self::rootless_configured().await? {
            return Err(TarmacError::PodmanRootlessSetup {
                reason: "Rootless Podman not configured. Run: podman system migrate".to_string(),
            });
        }

        Ok(())
    }

    async fn ensure_volume(&self, volume: &CacheVolume) -> TarmacResult<()> {
        let name = volume.volume_name();
        if self.volume_exists(&name).await? {
            debug!("Cache volume exists: {}", name);
            return Ok(());
        }

        let mut args = vec!["volume".to_string(), "create".to_string()];
        for (k, v) in volume.volume_labels() {
            args.push("--label".to_string());
            args.push(format!("{}={}", k, v));
        }
        args.push(name.clone());

        let args_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.exec(&args_refs).await?;

        if output.status.success() {
            info!("Created cache volume: {}", name);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(TarmacError::CacheVolumeCreate {
                name,
                reason: stderr.to_string(),
            })
        }
    }

    async fn prepare(&self, plan: &ContainerPlan) -> TarmacResult<ContainerHandle> {
        if !self.image_exists(&plan.image).await? {
            self.pull(&plan.image).await?;
        }

        // Materialize the exclusion-filtered context next to other run state
        let staging = ConfigManager::contexts_dir().join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|e| TarmacError::io(format!("creating {}", staging.display()), e))?;
        plan.context.materialize_into(&staging)?;

        let args = Self::create_args(plan, &staging);
        let args_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.exec(&args_refs).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TarmacError::ContainerStart(stderr.to_string()));
        }

        let container_id = String::from_utf8_lossy(&output.stdout).trim().to_string();

        let start = self.exec(&["start", &container_id]).await?;
        if !start.status.success() {
            let stderr = String::from_utf8_lossy(&start.stderr);
            return Err(TarmacError::ContainerStart(stderr.to_string()));
        }

        info!(
            "Container prepared for {}: {}",
            plan.job,
            &container_id[..12.min(container_id.len())]
        );

        Ok(ContainerHandle {
            id: container_id,
            job: plan.job.to_string(),
            workdir: plan.workdir.clone(),
            staging: Some(staging),
        })
    }

    async fn exec_step(
        &self,
        handle: &ContainerHandle,
        step: &Step,
    ) -> TarmacResult<StepOutput> {
        info!("[{}] {}", handle.job, step.label);

        let mut args = vec!["exec", "-w", handle.workdir.as_str(), handle.id.as_str()];
        args.extend(step.argv.iter().map(String::as_str));

        let output = self.exec(&args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        if exit_code != 0 {
            debug!(
                "[{}] step `{}` exited {}:\n{}",
                handle.job,
                step.label,
                exit_code,
                step_error_output(&stdout, &stderr)
            );
        }

        Ok(StepOutput {
            exit_code,
            stdout,
            stderr,
        })
    }

    async fn export(
        &self,
        handle: &ContainerHandle,
        container_path: &str,
        host_path: &Path,
    ) -> TarmacResult<()> {
        // A missing declared output is a layout mismatch, reported apart
        // from step failures
        let probe = self
            .exec(&["exec", &handle.id, "test", "-e", container_path])
            .await?;
        if !probe.status.success() {
            return Err(TarmacError::ArtifactMissing {
                job: handle.job.clone(),
                path: container_path.to_string(),
            });
        }

        if let Some(parent) = host_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TarmacError::io(format!("creating {}", parent.display()), e))?;
        }

        // podman cp nests into an existing directory target; replace instead
        if host_path.exists() {
            remove_host_path(host_path).await?;
        }

        let src = format!("{}:{}", handle.id, container_path);
        let dest = host_path.to_string_lossy().to_string();
        let output = self.exec(&["cp", &src, &dest]).await?;

        if output.status.success() {
            info!("[{}] exported {} -> {}", handle.job, container_path, dest);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(TarmacError::ExportFailed {
                path: container_path.to_string(),
                reason: stderr.to_string(),
            })
        }
    }

    async fn content_id(&self, host_path: &Path) -> TarmacResult<ArtifactId> {
        artifact::content_id(host_path)
    }

    async fn remove(&self, handle: &ContainerHandle) -> TarmacResult<()> {
        if self.keep_containers {
            info!("Keeping container {} (--keep)", handle.id);
            return Ok(());
        }

        debug!("Removing container: {}", handle.id);

        let output = self.exec(&["rm", "-f", &handle.id]).await?;

        if !output.status.success() {
            // Ignore error if container doesn't exist
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.contains("no such container") {
                return Err(TarmacError::command_exec("podman rm", stderr));
            }
        }

        if let Some(ref staging) = handle.staging {
            if let Err(e) = tokio::fs::remove_dir_all(staging).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(TarmacError::io(
                        format!("removing staged context {}", staging.display()),
                        e,
                    ));
                }
            }
        }

        Ok(())
    }

    fn engine_name(&self) -> &'static str {
        "Rootless Podman"
    }
}

async fn remove_host_path(path: &Path) -> TarmacResult<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| TarmacError::io(format!("reading metadata for {}", path.display()), e))?;
    let result = if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    result.map_err(|e| TarmacError::io(format!("removing {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheMount, ANDROID_BUILD, ANDROID_GRADLE, PUB_CACHE};
    use crate::context::BuildContext;
    use tempfile::TempDir;

    fn plan_for(dir: &TempDir) -> ContainerPlan {
        ContainerPlan {
            job: "build",
            image: "ghcr.io/cirruslabs/flutter:3.13.1".to_string(),
            workdir: "/app".to_string(),
            cache_mounts: vec![
                CacheMount::new(PUB_CACHE, "/root/.pub-cache"),
                CacheMount::new(ANDROID_GRADLE, "/app/android/.gradle"),
                CacheMount::new(ANDROID_BUILD, "/app/build"),
            ],
            context: BuildContext::resolve(Some(dir.path())).unwrap(),
            context_path: "/app".to_string(),
            env: vec![("PUB_CACHE".to_string(), "/root/.pub-cache".to_string())],
            steps: vec![],
        }
    }

    #[test]
    fn create_args_mount_order() {
        let dir = TempDir::new().unwrap();
        let plan = plan_for(&dir);
        let args = PodmanEngine::create_args(&plan, Path::new("/tmp/staged"));

        let volume_args: Vec<&String> = args
            .iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| *flag == "-v")
            .map(|(_, value)| value)
            .collect();

        // Caches mount first, then the context directory
        assert_eq!(volume_args.len(), 4);
        assert_eq!(volume_args[0], "tarmac-pub-cache:/root/.pub-cache");
        assert_eq!(volume_args[1], "tarmac-android-gradle:/app/android/.gradle");
        assert_eq!(volume_args[2], "tarmac-android-build:/app/build");
        assert_eq!(volume_args[3], "/tmp/staged:/app");
    }

    #[test]
    fn create_args_shape() {
        let dir = TempDir::new().unwrap();
        let plan = plan_for(&dir);
        let args = PodmanEngine::create_args(&plan, Path::new("/tmp/staged"));

        assert_eq!(args[0], "create");
        assert!(args.contains(&"io.tarmac.job=build".to_string()));
        assert!(args.contains(&"PUB_CACHE=/root/.pub-cache".to_string()));

        // Image comes right before the idle command
        let image_pos = args
            .iter()
            .position(|a| a == "ghcr.io/cirruslabs/flutter:3.13.1")
            .unwrap();
        assert_eq!(args[image_pos + 1], "sleep");
        assert_eq!(args[image_pos + 2], "infinity");
    }

    #[test]
    fn engine_name() {
        let engine = PodmanEngine::new(false);
        assert_eq!(engine.engine_name(), "Rootless Podman");
    }
}
