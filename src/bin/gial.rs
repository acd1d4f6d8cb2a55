//! GIAL command line
//!
//! Builds `.index` files from an asset map and a blocks directory, and reads
//! them back to search assets and plan block downloads.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use gial_rs::{
    format_size, index_file_name, load_asset_map, meta_file_name, scan_block_sizes,
    write_index_file, AssetIndex, EncoderConfig, IndexConfig, IndexEncoder, IndexError,
    IndexPipeline, VersionHashes, SUPPORTED_GAME,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "gial")]
#[command(about = "Game asset index builder and reader")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full build from a config file
    Build {
        /// Path to indexConfig.json (or .toml)
        #[arg(short, long, default_value = "indexConfig.json")]
        config: PathBuf,

        /// Path to the version -> hash table
        #[arg(long, default_value = "hashes.json")]
        hashes: PathBuf,
    },

    /// Encode an existing asset map against a blocks directory
    Encode {
        /// Asset map JSON
        #[arg(short, long)]
        map: PathBuf,

        /// Directory holding the `.blk` files
        #[arg(short, long)]
        blocks_dir: PathBuf,

        #[arg(long, default_value = SUPPORTED_GAME)]
        game: String,

        #[arg(short, long)]
        version: String,

        /// Build hash recorded in the header
        #[arg(long)]
        hash: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Also write the id lookup JSON
        #[arg(long)]
        meta: bool,
    },

    /// Print header and table summary of an index
    Inspect { index: PathBuf },

    /// Find assets by name and type substring
    Search {
        index: PathBuf,

        #[arg(short, long, default_value = "")]
        name: String,

        #[arg(short = 't', long = "type", default_value = "")]
        asset_type: String,
    },

    /// Show the blocks and extraction jobs for the given assets
    Plan {
        index: PathBuf,

        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Build { config, hashes } => {
            let config = IndexConfig::load(&config)
                .with_context(|| format!("loading config {:?}", config))?;
            let hashes = VersionHashes::load(&hashes)
                .with_context(|| format!("loading hashes {:?}", hashes))?;
            let hash = hashes.hash_for(&config.version)?.to_string();

            let output = IndexPipeline::new(config, hash).run()?;
            println!(
                "{} assets -> {:?} ({})",
                output.asset_count,
                output.index_path,
                format_size(output.byte_len as u64)
            );
            if let Some(meta) = output.meta_path {
                println!("meta -> {:?}", meta);
            }
        }

        Command::Encode {
            map,
            blocks_dir,
            game,
            version,
            hash,
            out,
            meta,
        } => {
            let assets = load_asset_map(&map)?;
            let sizes = scan_block_sizes(&blocks_dir)?;
            info!("{} assets, {} blocks on disk", assets.len(), sizes.len());

            let mut config = EncoderConfig::new(game, version, hash);
            if meta {
                config = config.with_meta();
            }
            let encoder = IndexEncoder::new(config);
            let encoded = encoder.encode(&assets, &sizes)?;

            std::fs::create_dir_all(&out)?;
            let config = encoder.config();
            let path = out.join(index_file_name(&config.game, &config.version));
            write_index_file(&path, &encoded.bytes)?;
            println!("wrote {:?} ({})", path, format_size(encoded.bytes.len() as u64));

            if let Some(meta) = encoded.meta {
                let meta_path = out.join(meta_file_name(&config.game, &config.version));
                meta.write(&meta_path)?;
                println!("wrote {:?}", meta_path);
            }
        }

        Command::Inspect { index } => {
            let index = open(&index)?;
            println!("game:       {}", index.game);
            println!("version:    {}", index.version);
            println!("hash:       {}", index.hash);
            println!("assets:     {}", index.len());
            println!(
                "blocks:     {} ({})",
                index.blocks.len(),
                format_size(index.blocks.total_size())
            );
            println!("types:      {}", index.types().join(", "));
        }

        Command::Search {
            index,
            name,
            asset_type,
        } => {
            let index = open(&index)?;
            let hits = index.search(&name, &asset_type);
            for (name, info) in &hits {
                println!(
                    "{}\t{}\t{}/{}\t{}",
                    name, info.asset_type, info.source.folder, info.source.block, info.container
                );
            }
            println!("{} matches", hits.len());
        }

        Command::Plan { index, names } => {
            let index = open(&index)?;
            let plan = index.plan(&names)?;
            for block in &plan.blocks {
                println!("{}\t{}", block.remote_path(), format_size(block.size as u64));
            }
            for job in &plan.jobs {
                println!("{}\t{}\t{}", job.block, job.asset_type, job.name);
            }
            println!(
                "{} blocks, {} to download",
                plan.blocks.len(),
                format_size(plan.total_size)
            );
        }
    }

    Ok(())
}

/// Decode an index, collapsing every format error into one message
fn open(path: &Path) -> anyhow::Result<AssetIndex> {
    AssetIndex::open(path).map_err(|e| open_error(path, e))
}

fn open_error(path: &Path, err: IndexError) -> anyhow::Error {
    if err.is_invalid_index() {
        debug!("{}: {}", path.display(), err);
        return anyhow!("invalid index file {}", path.display());
    }
    match err {
        IndexError::Io(e) => anyhow::Error::new(e).context(format!("reading {}", path.display())),
        e => e.into(),
    }
}
