use crate::cli::{AddArgs, Cli, Commands, FetchArgs, ListArgs, RemoveArgs, ShowArgs};
use fetchkit::catalog::{Resource, ResourceCatalog, validate_entry};
use fetchkit::config::Config;
use fetchkit::fetcher::TaskStatus;
use fetchkit::humanize::ByteSize;
use fetchkit::service::{BatchOutcome, FetchService};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

const EXIT_FAILED: u8 = 1;
const EXIT_REJECTED: u8 = 2;

pub async fn run(cli: Cli) -> Result<ExitCode, AnyError> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if let Some(catalog) = cli.catalog {
        config.catalog.path = catalog;
    }

    match cli.command {
        Commands::Fetch(args) => fetch(config, args).await,
        Commands::List(args) => list(&config, args),
        Commands::Show(args) => show(&config, args),
        Commands::Add(args) => add(&config, args),
        Commands::Remove(args) => remove(&config, args),
    }
}

async fn fetch(mut config: Config, args: FetchArgs) -> Result<ExitCode, AnyError> {
    if let Some(workers) = args.workers {
        config.fetcher.workers = workers;
    }
    if let Some(output) = args.output {
        config.output.dir = output;
    }
    config.validate()?;

    let service = Arc::new(FetchService::from_config(&config)?);

    let interrupt = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling downloads");
                service.cancel();
            }
        })
    };

    let result = service.fetch(args.names.as_slice()).await;
    interrupt.abort();
    let outcome = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    let code = match &outcome {
        BatchOutcome::Rejected(_) => ExitCode::from(EXIT_REJECTED),
        BatchOutcome::Completed { report, .. } if report.is_success() => ExitCode::SUCCESS,
        BatchOutcome::Completed { .. } => ExitCode::from(EXIT_FAILED),
    };
    Ok(code)
}

fn print_outcome(outcome: &BatchOutcome) {
    match outcome {
        BatchOutcome::Rejected(rejection) => {
            println!("nothing fetched: {}", rejection);
        }
        BatchOutcome::Completed { report, .. } => {
            for task in report.outcomes() {
                match &task.status {
                    TaskStatus::Succeeded { bytes } => println!(
                        "ok      {:<20} {} ({})",
                        task.name,
                        task.destination.display(),
                        ByteSize(*bytes)
                    ),
                    TaskStatus::Failed { error } => {
                        println!("failed  {:<20} {}", task.name, error)
                    }
                }
            }
            println!(
                "{} fetched, {} failed, {} written",
                report.succeeded().count(),
                report.failed().count(),
                ByteSize(report.total_bytes())
            );
        }
    }
}

fn list(config: &Config, args: ListArgs) -> Result<ExitCode, AnyError> {
    let catalog = ResourceCatalog::load(&config.catalog.path)?;
    let entries = match &args.tag {
        Some(tag) => catalog.find_by_tag(tag),
        None => catalog.list_all(),
    };

    for (name, resource) in entries {
        println!(
            "{:<20} {:<24} {:<40} {}",
            name,
            resource.filename.display(),
            resource.url,
            resource.description.as_deref().unwrap_or("")
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn show(config: &Config, args: ShowArgs) -> Result<ExitCode, AnyError> {
    let catalog = ResourceCatalog::load(&config.catalog.path)?;
    let Some(resource) = catalog.resolve(&args.name) else {
        eprintln!("unknown resource '{}'", args.name);
        return Ok(ExitCode::from(EXIT_FAILED));
    };

    println!("name:        {}", args.name);
    println!("filename:    {}", resource.filename.display());
    println!("url:         {}", resource.url);
    if let Some(description) = &resource.description {
        println!("description: {}", description);
    }
    if !resource.tags.is_empty() {
        println!("tags:        {}", resource.tags.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

fn add(config: &Config, args: AddArgs) -> Result<ExitCode, AnyError> {
    let path = &config.catalog.path;
    let mut catalog = if path.exists() {
        ResourceCatalog::load(path)?
    } else {
        ResourceCatalog::new()
    };

    let mut resource = Resource::new(args.filename, args.url).with_tags(args.tags);
    resource.description = args.description;
    validate_entry(&args.name, &resource)?;

    if !catalog.insert(args.name.clone(), resource) {
        eprintln!("resource '{}' already exists", args.name);
        return Ok(ExitCode::from(EXIT_FAILED));
    }

    catalog.save(path)?;
    info!(name = %args.name, path = %path.display(), "Resource added");
    Ok(ExitCode::SUCCESS)
}

fn remove(config: &Config, args: RemoveArgs) -> Result<ExitCode, AnyError> {
    let path = &config.catalog.path;
    let mut catalog = ResourceCatalog::load(path)?;

    if !catalog.remove(&args.name) {
        eprintln!("unknown resource '{}'", args.name);
        return Ok(ExitCode::from(EXIT_FAILED));
    }

    catalog.save(path)?;
    info!(name = %args.name, path = %path.display(), "Resource removed");
    Ok(ExitCode::SUCCESS)
}
