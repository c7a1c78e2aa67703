use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "wiki",
    about = "WikiTrees: pages, tags and accounts in object storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root directory, overriding the configuration file
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the storage containers and an empty tag document
    Init(InitArgs),
    /// Read or list pages
    Page(PageArgs),
    /// Upload a page or an image
    Upload(UploadArgs),
    /// Read images
    Image(ImageArgs),
    /// Look up and edit the tag index
    Tag(TagArgs),
    /// Search page names and tags
    Search(SearchArgs),
    /// Create an account
    Signup(AccountArgs),
    /// Check account credentials
    Signin(AccountArgs),
    /// Check a page file against the HTML allow-list
    Validate(ValidateArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct InitArgs {}

#[derive(Args)]
pub struct PageArgs {
    #[command(subcommand)]
    pub action: PageAction,
}

#[derive(Subcommand)]
pub enum PageAction {
    /// Print a page's content
    Get { name: String },
    /// List page names
    List,
}

#[derive(Args)]
pub struct UploadArgs {
    /// Name to store the file under
    pub name: String,
    /// File to upload; its extension decides page or image
    pub file: PathBuf,
    /// Store a page as-is: skip HTML validation and tag registration
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args)]
pub struct ImageArgs {
    #[command(subcommand)]
    pub action: ImageAction,
}

#[derive(Subcommand)]
pub enum ImageAction {
    /// Write an image's bytes to a file or stdout
    Get {
        name: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct TagArgs {
    #[command(subcommand)]
    pub action: TagAction,
}

#[derive(Subcommand)]
pub enum TagAction {
    /// Filenames whose tags match
    Find { tag: String },
    /// Add a tag to a registered file
    Add { filename: String, tag: String },
    /// Register a file, tagged with its own name
    Register { filename: String },
    /// Show every file and its tags
    List,
}

#[derive(Args)]
pub struct SearchArgs {
    pub query: String,
}

#[derive(Args)]
pub struct AccountArgs {
    pub username: String,
    #[arg(short, long)]
    pub password: String,
}

#[derive(Args)]
pub struct ValidateArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ConfigArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["wiki", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init(_)));
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_global_options_after_command() {
        let cli = Cli::try_parse_from([
            "wiki", "page", "list", "--root", "/srv/wiki", "--format", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/srv/wiki")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Page(PageArgs { action: PageAction::List })
        ));
    }

    #[test]
    fn parse_page_get() {
        let cli = Cli::try_parse_from(["wiki", "page", "get", "Water Oak"]).unwrap();
        if let Command::Page(PageArgs { action: PageAction::Get { name } }) = cli.command {
            assert_eq!(name, "Water Oak");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_upload_raw() {
        let cli = Cli::try_parse_from(["wiki", "upload", "Palm", "palm.html", "--raw"]).unwrap();
        if let Command::Upload(args) = cli.command {
            assert_eq!(args.name, "Palm");
            assert_eq!(args.file, PathBuf::from("palm.html"));
            assert!(args.raw);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_image_get_output() {
        let cli = Cli::try_parse_from(["wiki", "image", "get", "oak.png", "-o", "out.png"]).unwrap();
        if let Command::Image(ImageArgs {
            action: ImageAction::Get { name, output },
        }) = cli.command
        {
            assert_eq!(name, "oak.png");
            assert_eq!(output, Some(PathBuf::from("out.png")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_tag_add() {
        let cli = Cli::try_parse_from(["wiki", "tag", "add", "Water Oak", "oak"]).unwrap();
        if let Command::Tag(TagArgs {
            action: TagAction::Add { filename, tag },
        }) = cli.command
        {
            assert_eq!(filename, "Water Oak");
            assert_eq!(tag, "oak");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_signup_requires_password() {
        assert!(Cli::try_parse_from(["wiki", "signup", "amy"]).is_err());
        let cli = Cli::try_parse_from(["wiki", "signup", "amy", "-p", "acorn"]).unwrap();
        if let Command::Signup(args) = cli.command {
            assert_eq!(args.username, "amy");
            assert_eq!(args.password, "acorn");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_config_file() {
        let cli = Cli::try_parse_from(["wiki", "--config", "wiki.toml", "config"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("wiki.toml")));
        assert!(matches!(cli.command, Command::Config(_)));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["wiki", "search", "oak", "--format", "xml"]).is_err());
    }
}
