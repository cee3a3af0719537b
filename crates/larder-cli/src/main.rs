//! Larder CLI - generate and render recipes from the command line

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use larder_ai::{IngredientList, LlmClient, RecipeGenerator, TextGenerator};
use larder_document::{render, to_plain_text};

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Turn the ingredients you have into a recipe")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a recipe (requires GEMINI_API_KEY or OPENAI_API_KEY)
    Generate {
        /// Ingredients to cook with
        #[arg(required = true)]
        ingredients: Vec<String>,

        /// Also write the recipe as a PDF to this path
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Give up on the model after this many seconds
        #[arg(long, env = "AI_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,
    },

    /// Render an existing markdown recipe as a PDF
    Render {
        /// Comma-separated ingredients shown in the document
        #[arg(short, long, value_delimiter = ',', required = true)]
        ingredients: Vec<String>,

        /// Path to the markdown recipe
        #[arg(short, long)]
        recipe: PathBuf,

        /// Output path for the PDF
        #[arg(short, long, default_value = "recipe.pdf")]
        output: PathBuf,
    },

    /// Print a markdown recipe as plain text
    Plain {
        /// Path to the markdown recipe
        recipe: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Generate {
            ingredients,
            pdf,
            timeout_secs,
        } => {
            generate(ingredients, pdf.as_deref(), timeout_secs).await?;
        }
        Commands::Render {
            ingredients,
            recipe,
            output,
        } => {
            let markdown = read_recipe(&recipe)?;
            let ingredients: Vec<String> = ingredients
                .into_iter()
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect();
            write_pdf(&ingredients, &markdown, "AI", &output)?;
        }
        Commands::Plain { recipe } => {
            println!("{}", to_plain_text(&read_recipe(&recipe)?));
        }
    }

    Ok(())
}

async fn generate(ingredients: Vec<String>, pdf: Option<&Path>, timeout_secs: Option<u64>) -> Result<()> {
    let ingredients = IngredientList::new(ingredients).context("Invalid ingredient list")?;

    let mut client = LlmClient::from_env()?;
    if let Some(secs) = timeout_secs {
        client = client.with_timeout(Duration::from_secs(secs));
    }
    let label = client.provider_label().to_string();
    info!("Asking {} for a recipe with {}", client.model(), ingredients.joined());

    let generator = RecipeGenerator::new(Arc::new(client));
    let recipe = generator.generate_recipe(&ingredients).await?;
    println!("{}", recipe);

    if let Some(path) = pdf {
        write_pdf(ingredients.as_slice(), &recipe, &label, path)?;
    }
    Ok(())
}

fn read_recipe(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read recipe {:?}", path))
}

fn write_pdf(ingredients: &[String], markdown: &str, generated_by: &str, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    render(
        ingredients,
        &to_plain_text(markdown),
        generated_by,
        &chrono::Local::now(),
        BufWriter::new(file),
    )
    .with_context(|| format!("Failed to render {:?}", path))?;
    info!("Wrote {:?}", path);
    Ok(())
}
