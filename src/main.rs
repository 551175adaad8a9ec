use std::path::PathBuf;

use clap::{Parser, Subcommand};

use dataset_annotator::config::AppConfig;
use dataset_annotator::core::app::App;
use dataset_annotator::core::forms::TagEditor;
use dataset_annotator::core::replay;
use dataset_annotator::domain::{Collection, TagRequest};
use dataset_annotator::store::{DatasetStore, LocalStore};

#[derive(Parser)]
#[command(name = "dataset-annotator", version, about = "Crop and arrow annotation for image datasets")]
struct Cli {
    /// Directory holding `originals/` and `datasets/`; defaults to the configured root
    #[arg(long, env = "DATASET_ROOT")]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List both collections; `*` marks tagged images
    List,
    /// Replay a JSON gesture script against the dataset
    Replay { script: PathBuf },
    /// Save tag text for an image
    Tag { image_path: String, text: String },
    /// Delete images
    Delete {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Print the effective configuration
    Config {
        /// Write it to the config file, including a `--root` override
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let mut config = AppConfig::load();
    if let Some(root) = cli.root {
        config.storage_root = root;
    }

    if let Command::Config { save } = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        if save {
            config.save();
        }
        return Ok(());
    }

    let store = LocalStore::open(config.storage_root.clone(), config.arrow_color)?;
    match cli.command {
        Command::List => {
            let listing = store.list_images().await?;
            for collection in Collection::ALL {
                println!("{}:", collection.as_str());
                for file in listing.get(collection) {
                    let marker = if file.has_tag { "*" } else { " " };
                    println!("  {marker} {}", file.path);
                }
            }
        }
        Command::Replay { script } => {
            let steps = replay::load_script(&script)?;
            let mut app = App::new(store, &config);
            for line in replay::replay(&mut app, steps).await {
                println!("{line}");
            }
        }
        Command::Tag { image_path, text } => {
            let tag_content = TagEditor::with_manual_text(text).manual_tag()?;
            store
                .save_tag(TagRequest {
                    image_path: image_path.clone(),
                    tag_content,
                })
                .await?;
            println!("tagged {image_path}");
        }
        Command::Delete { paths } => {
            let report = store.delete_images(paths).await?;
            for path in &report.deleted {
                println!("deleted {path}");
            }
            for path in &report.failed {
                eprintln!("failed {path}");
            }
        }
        Command::Config { .. } => {}
    }
    Ok(())
}
