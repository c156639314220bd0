//! Integration tests for runner command synthesis from stored settings

mod common;

use actbench::command::{CommandArgs, RunTarget};
use actbench::settings::{Category, CustomOption, Setting, SettingFile};
use actbench::subprocess::MockProcessRunner;
use actbench::ActContext;
use common::{TestWorkspace, TestWorkspaceBuilder, BUILD_WORKFLOW};

async fn setup() -> (TestWorkspace, ActContext) {
    let workspace = TestWorkspaceBuilder::new()
        .unwrap()
        .with_workflow("build.yml", BUILD_WORKFLOW)
        .build()
        .unwrap();
    let ctx = workspace.context(MockProcessRunner::new()).await;
    (workspace, ctx)
}

async fn select_secret(ctx: &ActContext, workspace: &TestWorkspace, value: &str) {
    ctx.settings()
        .edit_setting(
            workspace.folder(),
            Setting::new(Category::Secrets, "API_KEY")
                .with_value(value)
                .selected(true),
            Category::Secrets,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_secret_with_quote_is_escaped_in_display() {
    let (workspace, ctx) = setup().await;
    select_secret(&ctx, &workspace, "p@ss\"word").await;

    let command = ctx
        .synthesize(&CommandArgs::new(workspace.folder(), RunTarget::AllWorkflows))
        .await
        .unwrap();

    assert!(command
        .display_command
        .contains(r#"--secret API_KEY=p@ss\"word"#));
    assert_eq!(command.argv, vec!["act", "--secret", "API_KEY=p@ss\"word"]);

    let reparsed = shell_words::split(&command.display_command).unwrap();
    assert_eq!(reparsed, command.argv);

    assert!(!command.redacted_display().contains("p@ss"));
}

#[tokio::test]
async fn test_unselected_entries_are_not_injected() {
    let (workspace, ctx) = setup().await;
    ctx.settings()
        .edit_setting(
            workspace.folder(),
            Setting::new(Category::Variables, "REGION").with_value("us-east-1"),
            Category::Variables,
        )
        .await
        .unwrap();

    let command = ctx
        .synthesize(&CommandArgs::new(workspace.folder(), RunTarget::AllWorkflows))
        .await
        .unwrap();
    assert_eq!(command.argv, vec!["act"]);
}

#[tokio::test]
async fn test_full_command_layout() {
    let (workspace, ctx) = setup().await;
    let folder = workspace.folder();
    select_secret(&ctx, &workspace, "abc").await;

    ctx.settings()
        .edit_setting(
            folder,
            Setting::new(Category::Variables, "REGION")
                .with_value("us-east-1")
                .selected(true),
            Category::Variables,
        )
        .await
        .unwrap();
    ctx.settings()
        .edit_setting(
            folder,
            Setting::new(Category::Runners, "ubuntu-latest")
                .with_value("catthehacker/ubuntu:act-latest")
                .selected(true),
            Category::Runners,
        )
        .await
        .unwrap();

    let mut payload = SettingFile::new("push", folder.join("push.json"));
    payload.selected = true;
    ctx.settings()
        .add_setting_file(folder, Category::Payload, payload)
        .await
        .unwrap();

    let reuse = ctx
        .settings()
        .list_custom_options(folder)
        .await
        .unwrap()
        .into_iter()
        .find(|o| o.name == "--reuse")
        .map(|o| CustomOption {
            selected: true,
            ..o
        })
        .unwrap();
    ctx.settings().edit_custom_option(folder, reuse).await.unwrap();

    let workflow = folder.join(".github/workflows/build.yml");
    let command = ctx
        .synthesize(&CommandArgs::new(
            folder,
            RunTarget::Job {
                workflow,
                job: "test".into(),
            },
        ))
        .await
        .unwrap();

    let expected: Vec<String> = vec![
        "act".to_string(),
        "--workflows".to_string(),
        ".github/workflows/build.yml".to_string(),
        "--job".to_string(),
        "test".to_string(),
        "--reuse".to_string(),
        "--secret".to_string(),
        "API_KEY=abc".to_string(),
        "--var".to_string(),
        "REGION=us-east-1".to_string(),
        "--platform".to_string(),
        "ubuntu-latest=catthehacker/ubuntu:act-latest".to_string(),
        "--eventpath".to_string(),
        folder.join("push.json").to_string_lossy().to_string(),
    ];
    assert_eq!(command.argv, expected);
}

#[tokio::test]
async fn test_synthesis_is_deterministic() {
    let (workspace, ctx) = setup().await;
    select_secret(&ctx, &workspace, "abc").await;
    let args = CommandArgs::new(
        workspace.folder(),
        RunTarget::Event {
            event: "workflow_dispatch".into(),
        },
    );

    let first = ctx.synthesize(&args).await.unwrap();
    let second = ctx.synthesize(&args).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.argv[1], "workflow_dispatch");
}
