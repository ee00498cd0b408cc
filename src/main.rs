use std::env;
use std::path::Path;
use std::process;

use log::{error, info};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use workload_render::models::workload::{InstantiatedWorkload, Workload};
use workload_render::renderers::container::ContainerRenderer;
use workload_render::renderers::dapr::DaprRenderer;
use workload_render::utils::bicep::{BicepCompiler, TemplateCompiler};
use workload_render::utils::logging::init_logger;
use workload_render::{Error, RenderContext, WorkloadRenderer};

const USAGE: &str = "usage:
    workload-render <workload.json> [application] [namespace]
    workload-render --bicep <file.bicep>
    workload-render --bicep-version";

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    // Logger configuration errors are fatal at startup.
    if let Err(err) = init_logger("workload-render") {
        eprintln!("{}", err);
        process::exit(2);
    }

    if let Err(err) = run(&args).await {
        error!("{}", err);
        process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<(), Error> {
    match args.first().map(String::as_str) {
        Some("--bicep-version") => {
            println!("{}", BicepCompiler::from_env().version());
            Ok(())
        }
        Some("--bicep") => match args.get(1) {
            Some(file) => {
                let template = BicepCompiler::from_env().compile(Path::new(file))?;
                println!("{}", serde_json::to_string_pretty(&template)?);
                Ok(())
            }
            None => {
                eprintln!("{}", USAGE);
                process::exit(2);
            }
        },
        Some(file) => {
            let application = args.get(1).map(String::as_str).unwrap_or("default");
            let namespace = args.get(2).map(String::as_str).unwrap_or("default");
            render(Path::new(file), application, namespace).await
        }
        None => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    }
}

/// Renders a single workload read from a JSON file and prints the resulting
/// bindings and resources.
async fn render(file: &Path, application: &str, namespace: &str) -> Result<(), Error> {
    let content = std::fs::read_to_string(file)?;
    let workload: Workload = serde_json::from_str(&content)?;
    let workload = InstantiatedWorkload::new(application, namespace, workload);

    let ctx = RenderContext::new(CancellationToken::new())
        .with_value("application", application)
        .with_value("workload", &workload.name);
    let renderer = DaprRenderer::new(ContainerRenderer::new());

    let bindings = renderer.allocate_bindings(&ctx, &workload, &[]).await?;

    let (resources, render_error) = renderer.render(&ctx, &workload).await.into_parts();
    if let Some(err) = render_error {
        // Resources constructed before the failure still need cleaning up by the caller.
        let partial: Vec<&str> = resources.iter().map(|r| r.local_id.as_str()).collect();
        error!("{}: render failed with partial resources {:?}", ctx, partial);
        return Err(err);
    }

    info!("{}: rendered {} resources", ctx, resources.len());
    let output = json!({
        "bindings": bindings,
        "resources": resources,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
