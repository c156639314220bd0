//! Workflows command implementation

use anyhow::Result;
use std::path::PathBuf;

use super::print_folder_heading;
use crate::workflow::Workflow;
use crate::ActContext;

/// List each folder's workflows with triggers and jobs
pub async fn run_workflows_command(ctx: &ActContext, folders: &[PathBuf]) -> Result<()> {
    let scanned = ctx.workflows().scan_all(folders).await?;

    for (folder, workflows) in &scanned {
        print_folder_heading(folder, folders);
        if workflows.is_empty() {
            println!(
                "No workflows found in {}",
                ctx.workflows().workflows_dir(folder).display()
            );
            continue;
        }

        for workflow in workflows {
            let relative = workflow.path.strip_prefix(folder).unwrap_or(&workflow.path);
            println!("{}", describe(workflow, &relative.display().to_string()));
        }
    }
    Ok(())
}

fn describe(workflow: &Workflow, relative: &str) -> String {
    if let Some(error) = workflow.error() {
        return format!("✗ {} ({})\n    {}", workflow.name, relative, error);
    }

    let events = workflow.events();
    let mut text = format!(
        "{} ({}) on: {}",
        workflow.name,
        relative,
        if events.is_empty() {
            "-".to_string()
        } else {
            events.join(", ")
        }
    );
    for job in workflow.jobs() {
        if job.name == job.key {
            text.push_str(&format!("\n    - {}", job.key));
        } else {
            text.push_str(&format!("\n    - {} ({})", job.key, job.name));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_describe_lists_jobs_and_events() {
        let workflow = Workflow::from_text(
            Path::new("/repo/.github/workflows/ci.yml"),
            "name: CI\non: [push, pull_request]\njobs:\n  test:\n    name: Unit tests\n  lint: {}\n"
                .to_string(),
        );
        let text = describe(&workflow, ".github/workflows/ci.yml");
        assert_eq!(
            text,
            "CI (.github/workflows/ci.yml) on: push, pull_request\n    - test (Unit tests)\n    - lint"
        );
    }

    #[test]
    fn test_describe_shows_parse_error() {
        let workflow = Workflow::failed(Path::new("/repo/broken.yml"), "bad indentation");
        let text = describe(&workflow, "broken.yml");
        assert!(text.starts_with("✗ broken.yml (broken.yml)"));
        assert!(text.contains("bad indentation"));
    }
}
