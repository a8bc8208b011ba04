//! Library integration tests.

use taskchain::TaskChainError;

#[test]
fn error_types_are_public() {
    let err = TaskChainError::DuplicateGroup {
        name: "test".into(),
    };
    assert!(err.to_string().contains("test"));
    assert_eq!(err.kind(), taskchain::ErrorKind::Duplicate);
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> taskchain::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn task_errors_pass_through_unchanged() {
    let err: TaskChainError = anyhow::anyhow!("custom failure").into();
    assert_eq!(err.to_string(), "custom failure");
    assert_eq!(err.kind(), taskchain::ErrorKind::Task);
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use taskchain::cli::{Cli, Commands};

    let cli = Cli::parse_from(["taskchain", "run", "plan.yml", "--json"]);
    if let Commands::Run(args) = cli.command {
        assert!(args.json);
    } else {
        panic!("Expected Run command");
    }
}
