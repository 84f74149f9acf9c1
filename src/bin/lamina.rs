use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use lamina::{
    ComposedArtwork, Composer, EngineConfig, GatewayClient, HttpLayerSource, InMemoryMetadataSource,
    IpfsMetadataSource, MasterMetadata, Viewport, flatten,
};

#[derive(Parser, Debug)]
#[command(name = "lamina", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a master artwork and write the flattened PNG.
    Render(RenderArgs),
    /// Print the resolved layer stack (source URIs and pixel boxes) as JSON.
    Inspect(ComposeArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    compose: ComposeArgs,

    /// Output PNG path.
    #[arg(long, default_value = "artwork.png")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct ComposeArgs {
    /// Metadata document: a local JSON path or an ipfs://... URI.
    #[arg(long)]
    metadata: String,

    /// Master token id (offsets relative control token ids).
    #[arg(long, default_value_t = 0)]
    token_id: u64,

    /// Viewport as WIDTHxHEIGHT.
    #[arg(long, default_value = "1920x1080")]
    viewport: String,

    /// Control value override, KEY=VALUE with absolute keys; repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Preferred IPFS gateway base URL, tried before the defaults.
    #[arg(long)]
    gateway: Option<String>,

    /// Timeout per gateway attempt in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => {
            let artwork = compose(&args.compose).await?;
            let frame = flatten(artwork.canvas.width, artwork.canvas.height, &artwork.layers)?;
            let image =
                image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba8_premul)
                    .context("assemble output image")?;
            image
                .save(&args.out)
                .with_context(|| format!("write '{}'", args.out.display()))?;
            eprintln!(
                "wrote {} ({} layers)",
                args.out.display(),
                artwork.layers.len(),
            );
            Ok(())
        }
        Command::Inspect(args) => {
            let artwork = compose(&args).await?;
            for layer in &artwork.layers {
                println!(
                    "{}",
                    serde_json::json!({
                        "id": layer.id,
                        "source": layer.source_uri,
                        "box": [
                            layer.frame.x0,
                            layer.frame.y0,
                            layer.frame.width(),
                            layer.frame.height(),
                        ],
                        "opacity": layer.opacity,
                    })
                );
            }
            Ok(())
        }
    }
}

async fn compose(args: &ComposeArgs) -> anyhow::Result<ComposedArtwork> {
    let mut config = EngineConfig {
        gateway_timeout_secs: args.timeout,
        ..EngineConfig::default()
    };
    if let Some(gateway) = &args.gateway {
        config = config.with_preferred_gateway(gateway.clone());
    }

    let client = GatewayClient::new(config)?;
    let composer = Composer::new(HttpLayerSource::new(client.clone()));
    let viewport = parse_viewport(&args.viewport)?;
    let overrides = parse_overrides(&args.overrides)?;

    let local = PathBuf::from(&args.metadata);
    let artwork = if local.is_file() {
        let raw = std::fs::read(&local)
            .with_context(|| format!("read '{}'", local.display()))?;
        let metadata: MasterMetadata =
            serde_json::from_slice(&raw).context("parse metadata document")?;
        let mut source = InMemoryMetadataSource::new();
        source.insert(args.metadata.clone(), metadata);
        composer
            .render(
                &source,
                &args.metadata,
                args.token_id,
                BTreeMap::new(),
                overrides,
                viewport,
                None,
            )
            .await?
    } else {
        let source = IpfsMetadataSource::new(client);
        composer
            .render(
                &source,
                &args.metadata,
                args.token_id,
                BTreeMap::new(),
                overrides,
                viewport,
                None,
            )
            .await?
    };
    Ok(artwork)
}

fn parse_viewport(raw: &str) -> anyhow::Result<Viewport> {
    let (w, h) = raw
        .split_once('x')
        .context("viewport must look like 1920x1080")?;
    Ok(Viewport {
        width: w.trim().parse().context("viewport width")?,
        height: h.trim().parse().context("viewport height")?,
    })
}

fn parse_overrides(pairs: &[String]) -> anyhow::Result<BTreeMap<String, f64>> {
    let mut out = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("override '{pair}' must look like KEY=VALUE"))?;
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("override '{pair}' value must be a number"))?;
        out.insert(key.trim().to_string(), value);
    }
    Ok(out)
}
