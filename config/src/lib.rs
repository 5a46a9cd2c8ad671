//! Configuration types shared between whole-body tracking dispatcher crates.

mod trainer;

pub use trainer::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trainer_params_default() {
        let params = TrainerParams::default();
        assert_eq!(params.python, "python");
        assert_eq!(params.task, "Tracking-Flat-G1-v0");
        assert_eq!(params.logger, "wandb");
        assert!(params.headless);
    }

    #[test]
    fn test_to_cli_args_shape() {
        let params = TrainerParams::default();
        let args = params.to_cli_args("dance_a1");

        assert_eq!(args[0], "scripts/rsl_rl/train.py");
        assert!(args.contains(&"--task=Tracking-Flat-G1-v0".to_string()));
        assert!(args.contains(&"--headless".to_string()));

        // --run_name is always followed by the motion name
        let idx = args.iter().position(|a| a == "--run_name").unwrap();
        assert_eq!(args[idx + 1], "dance_a1");
    }

    #[test]
    fn test_to_cli_args_no_headless() {
        let params = TrainerParams {
            headless: false,
            ..Default::default()
        };
        let args = params.to_cli_args("walk");
        assert!(!args.contains(&"--headless".to_string()));
    }

    #[test]
    fn test_extra_args_appended_last() {
        let params = TrainerParams {
            extra_args: vec!["--video".to_string()],
            ..Default::default()
        };
        let args = params.to_cli_args("walk");
        assert_eq!(args.last().unwrap(), "--video");
    }

    #[test]
    fn test_params_from_toml() {
        let params: TrainerParams = toml::from_str(
            r#"
python = "python3"
log_project_name = "ttg_ablation"
"#,
        )
        .unwrap();
        assert_eq!(params.python, "python3");
        assert_eq!(params.log_project_name, "ttg_ablation");
        // Unset fields fall back to the stock trainer invocation
        assert_eq!(params.script, "scripts/rsl_rl/train.py");
        assert_eq!(params.registry_name, "dummy_value");
    }
}
