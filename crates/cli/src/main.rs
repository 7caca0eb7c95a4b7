//! Storecart CLI - drive the cart engine from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart (guest cart unless a token is configured)
//! storecart show
//!
//! # Add two of a product, then an album
//! storecart add product --id 4 --name "Tee" --price 20.00 --quantity 2
//! storecart add album --id 6 --title "Blue Train" --price 25.00
//!
//! # Change or remove a line by the key shown in the cart output
//! storecart update album:6 3
//! storecart remove product:4
//!
//! # Work on the account cart instead
//! storecart --token "$TOKEN" show
//! ```
//!
//! # Commands
//!
//! - `show` - Print the current cart
//! - `add product|album` - Add an item
//! - `update <key> <quantity>` - Set a line's quantity (zero or below removes it)
//! - `remove <key>` - Remove a line
//! - `clear` - Empty the cart
//!
//! Output is JSON on stdout; logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use storecart::CartInput;
use storecart_core::{Album, AlbumId, EntryKey, Product, ProductId, VariantId};

mod commands;

#[derive(Parser)]
#[command(name = "storecart")]
#[command(author, version, about = "Storecart cart tools")]
struct Cli {
    /// Bearer token for the account cart (overrides `STORECART_ACCESS_TOKEN`)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current cart
    Show,
    /// Add an item to the cart
    Add {
        #[command(subcommand)]
        item: AddItem,
    },
    /// Set the quantity of a line
    Update {
        /// Line key, e.g. `product:4`, `album:6` or `line:31`
        key: EntryKey,

        /// New quantity; zero or below removes the line
        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Line key, e.g. `product:4`, `album:6` or `line:31`
        key: EntryKey,
    },
    /// Remove every line
    Clear,
}

#[derive(Subcommand)]
enum AddItem {
    /// Add a product
    Product {
        #[arg(long)]
        id: ProductId,

        /// Display name
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        pricing: Pricing,

        /// Selected variant
        #[arg(long)]
        variant_id: Option<VariantId>,

        /// Image URL
        #[arg(long)]
        image: Option<String>,

        #[arg(long)]
        slug: Option<String>,
    },
    /// Add an album
    Album {
        #[arg(long)]
        id: AlbumId,

        /// Album title
        #[arg(short, long)]
        title: String,

        #[command(flatten)]
        pricing: Pricing,

        #[arg(short, long)]
        artist: Option<String>,

        /// Cover art URL
        #[arg(long)]
        cover_image: Option<String>,
    },
}

#[derive(Args)]
struct Pricing {
    /// Unit price
    #[arg(short, long)]
    price: Decimal,

    /// Discounted unit price, used instead of `price` when above zero
    #[arg(long)]
    discount_price: Option<Decimal>,

    /// Units to add
    #[arg(short, long, default_value_t = 1)]
    quantity: u32,
}

impl AddItem {
    fn into_input(self) -> (CartInput, u32) {
        match self {
            Self::Product {
                id,
                name,
                pricing,
                variant_id,
                image,
                slug,
            } => {
                let product = Product {
                    id,
                    name,
                    price: pricing.price,
                    discount_price: pricing.discount_price,
                    image,
                    slug,
                    variant_id: None,
                };
                (
                    CartInput::Product {
                        product,
                        variant_id,
                    },
                    pricing.quantity,
                )
            }
            Self::Album {
                id,
                title,
                pricing,
                artist,
                cover_image,
            } => {
                let album = Album {
                    id,
                    title,
                    artist,
                    price: pricing.price,
                    discount_price: pricing.discount_price,
                    cover_image,
                };
                (CartInput::Album(album), pricing.quantity)
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays machine-readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storecart=info,storecart_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let facade = commands::cart::open(cli.token)?;

    match cli.command {
        Commands::Show => commands::cart::show(&facade).await?,
        Commands::Add { item } => {
            let (input, quantity) = item.into_input();
            commands::cart::add(&facade, input, quantity).await?;
        }
        Commands::Update { key, quantity } => {
            commands::cart::update(&facade, key, quantity).await?;
        }
        Commands::Remove { key } => commands::cart::remove(&facade, key).await?,
        Commands::Clear => commands::cart::clear(&facade).await?,
    }
    Ok(())
}
