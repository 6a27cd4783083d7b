//! Deps command - show the merged dependency request

use crate::cli::args::{DepsArgs, OutputFormat};
use crate::cli::commands::ProjectContext;
use crate::dependency::MergedRequest;
use crate::error::AarsyncResult;
use crate::ui::UiContext;
use serde::Serialize;

/// Execute the deps command
pub async fn execute(args: DepsArgs, project: &ProjectContext) -> AarsyncResult<()> {
    let ctx = UiContext::detect();
    let declarations = project.declarations(&ctx);
    let request = project.resolver().merge(&declarations.dependencies);

    match args.format {
        OutputFormat::Table => print_table(&request),
        OutputFormat::Json => print_json(&request)?,
        OutputFormat::Plain => print_plain(&request),
    }

    Ok(())
}

fn print_table(request: &MergedRequest) {
    if request.packages.is_empty() {
        println!("No dependencies declared.");
        return;
    }

    println!("{:<50} {:<40}", "PACKAGE", "DECLARED BY");
    println!("{}", "-".repeat(90));
    for spec in &request.packages {
        let declared_by = request
            .by_spec
            .get(spec)
            .map(|dep| dep.created_by.as_str())
            .unwrap_or_default();
        println!("{:<50} {:<40}", spec, declared_by);
    }

    println!();
    println!("{:<50} {:<40}", "REPOSITORY", "SOURCES");
    println!("{}", "-".repeat(90));
    for repo in &request.repositories {
        println!("{:<50} {:<40}", repo.uri, repo.sources.join(", "));
    }

    for warning in &request.warnings {
        println!();
        println!("warning: {}", warning);
    }

    println!();
    println!(
        "Total: {} package(s), {} repositories",
        request.packages.len(),
        request.repositories.len()
    );
}

fn print_json(request: &MergedRequest) -> AarsyncResult<()> {
    #[derive(Serialize)]
    struct PackageJson<'a> {
        spec: &'a str,
        declared_by: &'a str,
    }

    #[derive(Serialize)]
    struct RepositoryJson<'a> {
        uri: &'a str,
        sources: &'a [String],
    }

    #[derive(Serialize)]
    struct RequestJson<'a> {
        packages: Vec<PackageJson<'a>>,
        repositories: Vec<RepositoryJson<'a>>,
        warnings: &'a [String],
    }

    let json = RequestJson {
        packages: request
            .packages
            .iter()
            .map(|spec| PackageJson {
                spec,
                declared_by: request
                    .by_spec
                    .get(spec)
                    .map(|dep| dep.created_by.as_str())
                    .unwrap_or_default(),
            })
            .collect(),
        repositories: request
            .repositories
            .iter()
            .map(|repo| RepositoryJson {
                uri: &repo.uri,
                sources: &repo.sources,
            })
            .collect(),
        warnings: &request.warnings,
    };

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_plain(request: &MergedRequest) {
    for spec in &request.packages {
        println!("{}", spec);
    }
}
