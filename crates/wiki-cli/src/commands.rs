use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use tracing::debug;
use wiki_sdk::{FileKind, TagUpdate, Wiki, WikiConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.root.as_deref())?;
    debug!(
        config = ?cli.config,
        root = %config.storage.root.display(),
        "loaded configuration"
    );
    if let Command::Config(_) = cli.command {
        return cmd_config(&config, cli.format);
    }

    let wiki = Wiki::open(&config).context("failed to open wiki storage")?;
    let format = cli.format;
    match cli.command {
        Command::Init(_) => cmd_init(&wiki, &config, format),
        Command::Page(args) => cmd_page(&wiki, args, format),
        Command::Upload(args) => cmd_upload(&wiki, args, format),
        Command::Image(args) => cmd_image(&wiki, args),
        Command::Tag(args) => cmd_tag(&wiki, args, format),
        Command::Search(args) => cmd_search(&wiki, args, format),
        Command::Signup(args) => cmd_signup(&wiki, args, format),
        Command::Signin(args) => cmd_signin(&wiki, args, format),
        Command::Validate(args) => cmd_validate(&wiki, args, format),
        Command::Config(_) => cmd_config(&config, format),
    }
}

/// The configuration file (or defaults) with `--root` applied on top.
pub fn load_config(path: Option<&Path>, root: Option<&Path>) -> anyhow::Result<WikiConfig> {
    let mut config = match path {
        Some(path) => WikiConfig::load(path)?,
        None => WikiConfig::default(),
    };
    if let Some(root) = root {
        config.storage.root = root.to_path_buf();
    }
    Ok(config)
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(wiki: &Wiki, config: &WikiConfig, format: OutputFormat) -> anyhow::Result<()> {
    let created = wiki.init()?;
    if format == OutputFormat::Json {
        return print_json(&json!({ "created": created, "root": config.storage.root }));
    }
    if created {
        println!(
            "{} Initialized wiki in {}",
            "✓".green().bold(),
            config.storage.root.display().to_string().bold()
        );
    } else {
        println!("Wiki in {} already initialized.", config.storage.root.display());
    }
    println!("  Tag document: {}", config.tags.document.cyan());
    Ok(())
}

fn cmd_page(wiki: &Wiki, args: PageArgs, format: OutputFormat) -> anyhow::Result<()> {
    match args.action {
        PageAction::Get { name } => {
            let Some(page) = wiki.get_wiki_page(&name)? else {
                bail!("page not found: {name}");
            };
            match format {
                OutputFormat::Json => print_json(&serde_json::to_value(&page)?),
                OutputFormat::Text => {
                    println!("{}", page.content);
                    Ok(())
                }
            }
        }
        PageAction::List => {
            let names = wiki.list_page_names()?;
            if format == OutputFormat::Json {
                return print_json(&json!(names));
            }
            if names.is_empty() {
                println!("No pages.");
            }
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn cmd_upload(wiki: &Wiki, args: UploadArgs, format: OutputFormat) -> anyhow::Result<()> {
    let content = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let original = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let receipt = if FileKind::from_filename(&original) == FileKind::Image || args.raw {
        wiki.upload(&content, &args.name, &original)?
    } else {
        let html = String::from_utf8(content)
            .with_context(|| format!("{} is not UTF-8 text", args.file.display()))?;
        wiki.publish_page(&args.name, &html)?
    };

    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(&receipt)?);
    }
    let verb = if receipt.replaced { "Replaced" } else { "Uploaded" };
    println!(
        "{} {} {} {}",
        "✓".green().bold(),
        verb,
        receipt.kind,
        receipt.key.as_str().yellow()
    );
    println!("  Size: {} bytes", receipt.size);
    println!("  ETag: {}", receipt.etag.short_hex().dimmed());
    Ok(())
}

fn cmd_image(wiki: &Wiki, args: ImageArgs) -> anyhow::Result<()> {
    match args.action {
        ImageAction::Get { name, output } => {
            let bytes = wiki.get_image(&name)?;
            if bytes.is_empty() {
                bail!("image not found: {name}");
            }
            match output {
                Some(path) => {
                    fs::write(&path, &bytes)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => std::io::stdout().lock().write_all(&bytes)?,
            }
            Ok(())
        }
    }
}

fn cmd_tag(wiki: &Wiki, args: TagArgs, format: OutputFormat) -> anyhow::Result<()> {
    match args.action {
        TagAction::Find { tag } => {
            let files = wiki.get_filenames_by_tag(&tag)?;
            if format == OutputFormat::Json {
                return print_json(&json!(files));
            }
            if files.is_empty() {
                println!("No files tagged {}.", tag.yellow());
            }
            for file in files {
                println!("{file}");
            }
        }
        TagAction::Add { filename, tag } => {
            let update = wiki.add_tag_to_csv(&filename, &tag)?;
            if format == OutputFormat::Json {
                return print_json(&json!({ "filename": filename, "tag": tag, "update": update }));
            }
            match update {
                TagUpdate::Added => {
                    println!("{} Tagged {} with {}", "✓".green(), filename.bold(), tag.yellow())
                }
                TagUpdate::AlreadyPresent => {
                    println!("{} already tagged {}", filename.bold(), tag.yellow())
                }
                TagUpdate::UnknownFile => println!(
                    "{} {} is not in the tag index; nothing changed",
                    "!".yellow().bold(),
                    filename.bold()
                ),
            }
        }
        TagAction::Register { filename } => {
            let created = wiki.add_file_to_csv(&filename)?;
            if format == OutputFormat::Json {
                return print_json(&json!({ "filename": filename, "created": created }));
            }
            if created {
                println!("{} Registered {}", "✓".green(), filename.bold());
            } else {
                println!("{} is already registered", filename.bold());
            }
        }
        TagAction::List => {
            let map = wiki.tag_map()?;
            if format == OutputFormat::Json {
                return print_json(&json!(map));
            }
            if map.is_empty() {
                println!("No files registered.");
            }
            for (file, tags) in map {
                let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
                println!("{}: {}", file.bold(), tags.join(", ").cyan());
            }
        }
    }
    Ok(())
}

fn cmd_search(wiki: &Wiki, args: SearchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let results = wiki.search(&args.query)?;
    if format == OutputFormat::Json {
        return print_json(&json!(results));
    }
    if results.is_empty() {
        println!("No results for {}.", args.query.yellow());
    }
    for name in results {
        println!("{name}");
    }
    Ok(())
}

fn cmd_signup(wiki: &Wiki, args: AccountArgs, format: OutputFormat) -> anyhow::Result<()> {
    let created = match wiki.sign_up(&args.username, &args.password) {
        Err(e) if e.is_invalid_username() => {
            return Err(anyhow::Error::new(e)
                .context(format!("invalid username: {:?}", args.username)));
        }
        result => result?,
    };
    if format == OutputFormat::Json {
        return print_json(&json!({ "username": args.username, "created": created }));
    }
    if !created {
        bail!("username already exists: {}", args.username);
    }
    println!("{} Created account {}", "✓".green().bold(), args.username.bold());
    Ok(())
}

fn cmd_signin(wiki: &Wiki, args: AccountArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ok = wiki.sign_in(&args.username, &args.password)?;
    if format == OutputFormat::Json {
        return print_json(&json!({ "username": args.username, "authenticated": ok }));
    }
    if !ok {
        bail!("incorrect username or password");
    }
    println!("{} Signed in as {}", "✓".green().bold(), args.username.bold());
    Ok(())
}

fn cmd_validate(wiki: &Wiki, args: ValidateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let html = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let valid = wiki.is_valid_html(&html);
    if format == OutputFormat::Json {
        return print_json(&json!({ "file": args.file, "valid": valid }));
    }
    if !valid {
        bail!("{} contains HTML outside the allow-list", args.file.display());
    }
    println!("{} {} is valid", "✓".green().bold(), args.file.display());
    Ok(())
}

fn cmd_config(config: &WikiConfig, format: OutputFormat) -> anyhow::Result<()> {
    config.validate()?;
    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(config)?),
        OutputFormat::Text => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}
