//! External trainer invocation parameters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Parameters for the external RL training entry point.
///
/// One training subprocess is launched per motion; everything here is fixed
/// across tasks except the run name, which carries the motion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct TrainerParams {
    /// Python interpreter used to launch the training script.
    #[serde(default = "default_python")]
    #[cfg_attr(feature = "clap", arg(long, default_value = "python"))]
    pub python: String,
    /// Training script path, relative to `workdir` when set.
    #[serde(default = "default_script")]
    #[cfg_attr(feature = "clap", arg(long, default_value = "scripts/rsl_rl/train.py"))]
    pub script: String,
    /// Gym task id passed as `--task=<id>`.
    #[serde(default = "default_task")]
    #[cfg_attr(feature = "clap", arg(long, default_value = "Tracking-Flat-G1-v0"))]
    pub task: String,
    #[serde(default = "default_registry_name")]
    #[cfg_attr(feature = "clap", arg(long, default_value = "dummy_value"))]
    pub registry_name: String,
    /// Logger backend the trainer reports to.
    #[serde(default = "default_logger")]
    #[cfg_attr(feature = "clap", arg(long, default_value = "wandb"))]
    pub logger: String,
    #[serde(default = "default_log_project_name")]
    #[cfg_attr(feature = "clap", arg(long, default_value = "ttg"))]
    pub log_project_name: String,
    /// Run the simulator without a viewer.
    #[serde(default = "default_true")]
    #[cfg_attr(
        feature = "clap",
        arg(long, default_value = "true", action = clap::ArgAction::Set)
    )]
    pub headless: bool,
    /// Working directory for the training subprocess.
    #[serde(default)]
    #[cfg_attr(feature = "clap", arg(long))]
    pub workdir: Option<PathBuf>,
    /// Additional arguments appended verbatim to every invocation.
    #[serde(default)]
    #[cfg_attr(feature = "clap", arg(long = "extra_arg"))]
    pub extra_args: Vec<String>,
}

fn default_python() -> String {
    "python".into()
}
fn default_script() -> String {
    "scripts/rsl_rl/train.py".into()
}
fn default_task() -> String {
    "Tracking-Flat-G1-v0".into()
}
fn default_registry_name() -> String {
    "dummy_value".into()
}
fn default_logger() -> String {
    "wandb".into()
}
fn default_log_project_name() -> String {
    "ttg".into()
}
fn default_true() -> bool {
    true
}

impl Default for TrainerParams {
    fn default() -> Self {
        Self {
            python: default_python(),
            script: default_script(),
            task: default_task(),
            registry_name: default_registry_name(),
            logger: default_logger(),
            log_project_name: default_log_project_name(),
            headless: default_true(),
            workdir: None,
            extra_args: Vec::new(),
        }
    }
}

impl TrainerParams {
    /// Build the argument vector for one training invocation.
    ///
    /// The motion name becomes the trainer's `--run_name`, which is what ties
    /// the resulting run directory back to the task.
    #[must_use]
    pub fn to_cli_args(&self, motion: &str) -> Vec<String> {
        let mut args = vec![
            self.script.clone(),
            format!("--task={}", self.task),
            "--registry_name".into(),
            self.registry_name.clone(),
        ];
        if self.headless {
            args.push("--headless".into());
        }
        args.extend([
            "--logger".into(),
            self.logger.clone(),
            "--log_project_name".into(),
            self.log_project_name.clone(),
            "--run_name".into(),
            motion.to_string(),
        ]);
        args.extend(self.extra_args.iter().cloned());
        args
    }
}
