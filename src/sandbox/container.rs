//! Docker container-based execution
//!
//! Runs one request per ephemeral container: the session workspace is
//! bind-mounted read-write at a fixed internal path, the language profile's
//! command is invoked against the materialized file, and the container is
//! force-removed however the run ends. The wall-clock deadline is enforced
//! from the host, outside the sandboxed process, so a hung program cannot
//! stall the caller beyond the timeout plus teardown latency.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures::StreamExt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ExecutorConfig;
use crate::error::{Error, Result};
use crate::sandbox::executor::{CodeExecutor, ExecutionOptions, ExecutionRequest, ExecutionResult};
use crate::sandbox::languages::{resolve_profile, LanguageProfile};
use crate::sandbox::workspace::ExecutionSession;

/// Fixed path the session workspace is mounted at inside the container
const WORKSPACE_MOUNT: &str = "/workspace";

/// Docker container executor
pub struct ContainerExecutor {
    /// Docker client
    docker: Docker,
    /// Executor configuration
    config: ExecutorConfig,
}

impl ContainerExecutor {
    /// Create a new container executor.
    ///
    /// Connecting is lazy: a down engine does not fail construction, it
    /// surfaces later as a `Failed` result and a `false` availability probe.
    pub fn new(config: &ExecutorConfig) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::Container(format!("Failed to connect to Docker: {}", e)))?;

        info!("Container executor initialized");

        Ok(ContainerExecutor {
            docker,
            config: config.clone(),
        })
    }

    /// Ensure the required Docker image is available
    async fn ensure_image(&self, image: &str) -> Result<()> {
        let images = self
            .docker
            .list_images::<String>(None)
            .await
            .map_err(|e| Error::Container(format!("Failed to list images: {}", e)))?;

        let image_exists = images
            .iter()
            .any(|img| img.repo_tags.iter().any(|tag| tag.contains(image)));

        if !image_exists {
            info!("Pulling Docker image: {}", image);

            let options = CreateImageOptions {
                from_image: image.to_string(),
                ..Default::default()
            };

            let mut stream = self.docker.create_image(Some(options), None, None);

            while let Some(result) = stream.next().await {
                match result {
                    Ok(info) => {
                        if let Some(status) = info.status {
                            debug!("Pull status: {}", status);
                        }
                    }
                    Err(e) => {
                        return Err(Error::Container(format!("Failed to pull image: {}", e)));
                    }
                }
            }

            info!("Image pulled successfully");
        }

        Ok(())
    }

    /// Run one request inside an already created session.
    ///
    /// Launch failures, engine faults, program failures, and timeouts all
    /// fold into the returned result; nothing here raises past the caller.
    async fn run_in_session(
        &self,
        session: &ExecutionSession,
        request: &ExecutionRequest,
    ) -> ExecutionResult {
        let start = Instant::now();
        let profile = resolve_profile(&request.language);

        let file_name = match session.materialize(&request.code, profile) {
            Ok(name) => name,
            Err(e) => {
                return ExecutionResult::failed(
                    format!("Failed to materialize source: {}", e),
                    start.elapsed(),
                )
            }
        };

        if self.config.pull_images {
            if let Err(e) = self.ensure_image(profile.image).await {
                // A genuinely missing image fails the launch below
                warn!("Image check for {} failed: {}", profile.image, e);
            }
        }

        let container_name = format!("runcell-{}", session.id());
        let container_config =
            build_container_config(profile, &request.options, session.root(), &file_name);

        debug!(
            session = %session.id(),
            language = profile.name,
            image = profile.image,
            "Launching sandbox container"
        );

        let create_options = CreateContainerOptions {
            name: &container_name,
            platform: None,
        };

        if let Err(e) = self
            .docker
            .create_container(Some(create_options), container_config)
            .await
        {
            return ExecutionResult::failed(
                format!("Failed to create container: {}", e),
                start.elapsed(),
            );
        }

        if let Err(e) = self
            .docker
            .start_container(&container_name, None::<StartContainerOptions<String>>)
            .await
        {
            self.remove_container(&container_name).await;
            return ExecutionResult::failed(
                format!("Failed to start container: {}", e),
                start.elapsed(),
            );
        }

        // Race completion against the wall-clock deadline
        let wait_result = tokio::time::timeout(
            request.options.timeout,
            self.wait_for_container(&container_name),
        )
        .await;

        let elapsed = start.elapsed();

        // On timeout the container is still running; logs return whatever
        // was buffered so far, and removal below force-kills it
        let (stdout, stderr) = self.capture_logs(&container_name).await;
        self.remove_container(&container_name).await;

        match wait_result {
            Ok(Ok(exit_code)) => {
                debug!(session = %session.id(), exit_code, ?elapsed, "Sandbox completed");
                ExecutionResult::completed(exit_code, stdout, stderr, elapsed)
            }
            Ok(Err(e)) => {
                let mut result = ExecutionResult::failed(format!("Wait failed: {}", e), elapsed);
                result.stdout = stdout;
                result
            }
            Err(_) => {
                warn!(session = %session.id(), timeout = ?request.options.timeout, "Sandbox timed out");
                ExecutionResult::timed_out(stdout, stderr, elapsed)
            }
        }
    }

    /// Wait for a container to finish and return its exit code
    async fn wait_for_container(&self, name: &str) -> Result<i32> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut stream = self.docker.wait_container(name, Some(options));

        if let Some(result) = stream.next().await {
            match result {
                Ok(response) => Ok(response.status_code as i32),
                Err(e) => Err(Error::Container(format!("Wait failed: {}", e))),
            }
        } else {
            Err(Error::Container("Container wait stream ended".to_string()))
        }
    }

    /// Capture container stdout/stderr, best effort
    async fn capture_logs(&self, name: &str) -> (String, String) {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };

        let mut stream = self.docker.logs(name, Some(options));

        let mut stdout = String::new();
        let mut stderr = String::new();

        while let Some(result) = stream.next().await {
            match result {
                Ok(LogOutput::StdOut { message }) => {
                    stdout.push_str(&String::from_utf8_lossy(&message));
                }
                Ok(LogOutput::StdErr { message }) => {
                    stderr.push_str(&String::from_utf8_lossy(&message));
                }
                Err(e) => {
                    warn!("Error reading logs: {}", e);
                }
                _ => {}
            }
        }

        if let Some(cap) = self.config.max_output_bytes {
            truncate_output(&mut stdout, cap);
            truncate_output(&mut stderr, cap);
        }

        (stdout, stderr)
    }

    /// Force-remove a container, tolerating it already being gone
    async fn remove_container(&self, name: &str) {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        match self.docker.remove_container(name, Some(options)).await {
            Ok(()) => debug!("Removed container: {}", name),
            Err(e) => warn!("Failed to remove container {}: {}", name, e),
        }
    }
}

/// Compose the container invocation for one execution.
///
/// Pure command composition with no side effects. Injection-safe by
/// construction: the file name and workspace path are generated by the
/// system, and the user's code text never appears here, only inside the
/// materialized file.
fn build_container_config(
    profile: &LanguageProfile,
    options: &ExecutionOptions,
    workspace: &Path,
    file_name: &str,
) -> Config<String> {
    let cmd = profile.command_for(file_name);

    let network_mode = if options.network_disabled {
        Some("none".to_string())
    } else {
        None
    };

    Config {
        image: Some(profile.image.to_string()),
        cmd: Some(cmd),
        working_dir: Some(WORKSPACE_MOUNT.to_string()),
        network_disabled: Some(options.network_disabled),
        host_config: Some(bollard::service::HostConfig {
            binds: Some(vec![format!("{}:{}", workspace.display(), WORKSPACE_MOUNT)]),
            memory: parse_memory_limit(&options.memory_limit),
            nano_cpus: Some((options.cpu_limit * 1_000_000_000.0) as i64),
            network_mode,
            auto_remove: Some(false), // removed manually after capturing logs
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Parse a memory limit string (e.g., "512m", "1g") to bytes
fn parse_memory_limit(limit: &str) -> Option<i64> {
    let limit = limit.to_lowercase();
    let (num_str, unit) = if limit.ends_with('g') || limit.ends_with("gb") {
        (limit.trim_end_matches(|c| c == 'g' || c == 'b'), "g")
    } else if limit.ends_with('m') || limit.ends_with("mb") {
        (limit.trim_end_matches(|c| c == 'm' || c == 'b'), "m")
    } else if limit.ends_with('k') || limit.ends_with("kb") {
        (limit.trim_end_matches(|c| c == 'k' || c == 'b'), "k")
    } else {
        (limit.as_str(), "b")
    };

    let num: i64 = num_str.parse().ok()?;

    Some(match unit {
        "g" => num * 1024 * 1024 * 1024,
        "m" => num * 1024 * 1024,
        "k" => num * 1024,
        _ => num,
    })
}

/// Truncate captured output at a byte cap, on a char boundary
fn truncate_output(output: &mut String, cap: usize) {
    if output.len() <= cap {
        return;
    }
    let mut cut = cap;
    while cut > 0 && !output.is_char_boundary(cut) {
        cut -= 1;
    }
    output.truncate(cut);
    output.push_str("\n[output truncated]");
}

#[async_trait]
impl CodeExecutor for ContainerExecutor {
    fn name(&self) -> &str {
        "container"
    }

    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult> {
        // Workspace creation is the one failure that propagates: no session
        // exists yet, so there is no result shape to fold it into
        let mut session = ExecutionSession::create(&self.config.scratch_root)?;

        let result = self.run_in_session(&session, &request).await;

        // Explicit teardown; Drop covers panics and early returns
        session.cleanup();

        Ok(result)
    }

    async fn is_available(&self) -> bool {
        match self.docker.version().await {
            Ok(version) => {
                debug!(version = ?version.version, "Container runtime reachable");
                true
            }
            Err(e) => {
                warn!("Container runtime unavailable: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_limit() {
        assert_eq!(parse_memory_limit("512m"), Some(512 * 1024 * 1024));
        assert_eq!(parse_memory_limit("1g"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_memory_limit("1024k"), Some(1024 * 1024));
        assert_eq!(parse_memory_limit("1024"), Some(1024));
        assert_eq!(parse_memory_limit("lots"), None);
    }

    #[test]
    fn test_command_never_embeds_code() {
        // Property: for every registered language, the composed invocation
        // carries only generated names, never the submitted code text
        let code = "print('; rm -rf / #')";
        let options = ExecutionOptions::default();

        for language in crate::sandbox::languages::supported_languages() {
            let profile = resolve_profile(language);
            let file_name = format!("code.{}", profile.extension);
            let config =
                build_container_config(profile, &options, Path::new("/tmp/ws"), &file_name);

            let cmd = config.cmd.expect("run command composed");
            assert!(
                cmd.iter().all(|arg| !arg.contains(code)),
                "{} embeds code in its command line",
                language
            );
            assert!(cmd.iter().any(|arg| arg.contains(&file_name)));
        }
    }

    #[test]
    fn test_workspace_mounted_at_fixed_path() {
        let profile = resolve_profile("python");
        let config = build_container_config(
            profile,
            &ExecutionOptions::default(),
            Path::new("/tmp/runcell/abc"),
            "code.py",
        );

        assert_eq!(config.working_dir.as_deref(), Some(WORKSPACE_MOUNT));

        let host_config = config.host_config.unwrap();
        let binds = host_config.binds.unwrap();
        assert_eq!(binds, vec![format!("/tmp/runcell/abc:{}", WORKSPACE_MOUNT)]);
        assert_eq!(host_config.memory, Some(256 * 1024 * 1024));
    }

    #[test]
    fn test_network_flag_composition() {
        let profile = resolve_profile("python");

        let isolated = build_container_config(
            profile,
            &ExecutionOptions::default(),
            Path::new("/tmp/ws"),
            "code.py",
        );
        assert_eq!(isolated.network_disabled, Some(true));
        assert_eq!(
            isolated.host_config.unwrap().network_mode.as_deref(),
            Some("none")
        );

        let mut options = ExecutionOptions::default();
        options.network_disabled = false;
        let open = build_container_config(profile, &options, Path::new("/tmp/ws"), "code.py");
        assert_eq!(open.network_disabled, Some(false));
        assert_eq!(open.host_config.unwrap().network_mode, None);
    }

    #[test]
    fn test_unknown_language_composes_generic_invocation() {
        let profile = resolve_profile("cobol-74");
        let config = build_container_config(
            profile,
            &ExecutionOptions::default(),
            Path::new("/tmp/ws"),
            "code.txt",
        );

        assert_eq!(config.image.as_deref(), Some("alpine:3.20"));
        assert_eq!(config.cmd.unwrap(), vec!["sh", "code.txt"]);
    }

    #[test]
    fn test_truncate_output() {
        let mut s = "abcdef".to_string();
        truncate_output(&mut s, 10);
        assert_eq!(s, "abcdef");

        truncate_output(&mut s, 3);
        assert_eq!(s, "abc\n[output truncated]");

        // Cuts land on char boundaries
        let mut s = "héllo".to_string();
        truncate_output(&mut s, 2);
        assert!(s.starts_with('h'));
        assert!(s.ends_with("[output truncated]"));
    }
}
