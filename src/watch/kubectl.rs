//! kubectl 协作方 - 启动 watch 流、查询单个 pod

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::debug;

use super::PodObject;
use crate::controller::{FetchError, PodState, ResourceFetcher};
use crate::notification::ResourceRef;

/// kubectl 命令封装
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: PathBuf,
    context: Option<String>,
}

impl Kubectl {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            context: None,
        }
    }

    /// 在 PATH 中查找 kubectl
    pub fn discover() -> Option<Self> {
        which::which("kubectl").ok().map(Self::new)
    }

    /// 指定 kubeconfig context
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(context) = &self.context {
            cmd.args(["--context", context.as_str()]);
        }
        cmd
    }

    /// `kubectl get pods --watch` 的参数
    pub fn watch_args(namespace: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = ["get", "pods", "--watch", "--output-watch-events", "-o", "json"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        match namespace {
            Some(ns) => args.extend(["--namespace".to_string(), ns.to_string()]),
            None => args.push("--all-namespaces".to_string()),
        }
        args
    }

    /// 启动 watch 进程，stdout 为 watch 流
    pub fn watch_pods(&self, namespace: Option<&str>) -> std::io::Result<Child> {
        let args = Self::watch_args(namespace);
        debug!(program = %self.program.display(), ?args, "Starting kubectl watch");
        self.command()
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
    }
}

/// 通过 `kubectl get pod` 查询资源
#[derive(Debug, Clone)]
pub struct KubectlFetcher {
    kubectl: Kubectl,
}

impl KubectlFetcher {
    pub fn new(kubectl: Kubectl) -> Self {
        Self { kubectl }
    }
}

/// kubectl 对不存在的资源输出 `Error from server (NotFound)`
fn is_not_found(stderr: &str) -> bool {
    stderr.contains("(NotFound)") || stderr.contains(" not found")
}

impl ResourceFetcher for KubectlFetcher {
    fn fetch(&self, resource: &ResourceRef) -> Result<Option<PodState>, FetchError> {
        let output = self
            .kubectl
            .command()
            .args([
                "get", "pod", resource.name.as_str(),
                "--namespace", resource.namespace.as_str(),
                "-o", "json",
            ])
            .output()
            .map_err(|source| FetchError::Spawn {
                command: self.kubectl.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_not_found(&stderr) {
                return Ok(None);
            }
            return Err(FetchError::Failed(stderr.trim().to_string()));
        }

        let pod: PodObject = serde_json::from_slice(&output.stdout)?;
        Ok(Some(PodState {
            resource: resource.clone(),
            labels: pod.labels(),
        }))
    }
}
