use log::{debug, info};
use std::env;
use std::path::PathBuf;

use nyetcooking::path::{has_scheme, recipe_slug};
use nyetcooking::{recipe_to_markdown, AppConfig, RecipeService};

const USAGE: &str = "Usage: nyetcooking <url-or-path> [--markdown] [--refresh] [--output DIR]";

struct Args {
    target: String,
    markdown: bool,
    refresh: bool,
    output: Option<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut target = None;
    let mut markdown = false;
    let mut refresh = false;
    let mut output = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--markdown" | "-m" => markdown = true,
            "--refresh" | "-r" => refresh = true,
            "--output" | "-o" => {
                let dir = args.next().ok_or("--output needs a directory")?;
                output = Some(PathBuf::from(dir));
            }
            "--help" | "-h" => return Err(USAGE.to_string()),
            flag if flag.starts_with('-') => return Err(format!("Unknown option {flag}\n{USAGE}")),
            _ if target.is_none() => target = Some(arg),
            _ => return Err(format!("Unexpected argument {arg}\n{USAGE}")),
        }
    }

    Ok(Args {
        target: target.ok_or(USAGE)?,
        markdown,
        refresh,
        output,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = parse_args(env::args().skip(1))?;
    let config = AppConfig::load()?;
    let service = RecipeService::from_config(&config).await?;
    debug!("Cache backend: {}", service.health().cache_backend);

    // full URLs are fetched as given, anything else is a route path
    let recipe = if has_scheme(&args.target) {
        service.recipe_for_url(&args.target, args.refresh).await?.1
    } else {
        service.recipe_for_path(&args.target, args.refresh).await?
    };

    if let Some(dir) = args.output {
        tokio::fs::create_dir_all(&dir).await?;
        let file = dir.join(format!(
            "{}.md",
            recipe_slug(&recipe.title, Some(&recipe.source_url))
        ));
        tokio::fs::write(&file, recipe_to_markdown(&recipe)).await?;
        info!("Wrote {}", file.display());
        println!("{}", file.display());
    } else if args.markdown {
        print!("{}", recipe_to_markdown(&recipe));
    } else {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    }

    Ok(())
}
