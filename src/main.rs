use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spatial_tags::anchors::SqliteAnchorStore;
use spatial_tags::api::{self, SharedStore};
use spatial_tags::codec::PersistenceCodec;
use spatial_tags::config::AppConfig;
use spatial_tags::dictation::DetachedDictation;
use spatial_tags::models::{EntityRef, Pose, TagKind};
use spatial_tags::placement::CameraPlacement;
use spatial_tags::store::{AnnotationStore, Collaborators};

#[derive(Parser)]
#[command(name = "stag")]
#[command(about = "Spatially anchored tags and bounding boxes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the local command API
    Serve {
        /// Port for HTTP API (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List every saved bounding box and tag
    List,
    /// Spawn a new entity in front of the camera
    Spawn {
        #[arg(value_enum)]
        kind: SpawnKind,
    },
    /// Show one entity by name
    Show { name: String },
    /// Delete one entity by name
    Delete { name: String },
    /// Delete every entity and its anchor
    DeleteAll {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Write the current configuration to the config directory
    InitConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum SpawnKind {
    Box,
    Fault,
    History,
    Label,
}

/// Initialize tracing with output to stderr so command output stays clean
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "spatial_tags=info,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_store(config: &AppConfig) -> anyhow::Result<AnnotationStore> {
    let codec = PersistenceCodec::new(config.resolved_data_dir()?);

    let anchors = SqliteAnchorStore::open(config.resolved_anchor_db()?)
        .context("Failed to open anchor database")?;
    anchors.migrate()?;

    let collaborators = Collaborators {
        anchors: Box::new(anchors),
        placement: Box::new(CameraPlacement::new(Pose::default(), config.spawn_distance)),
        dictation: Box::new(DetachedDictation::new()),
    };

    Ok(AnnotationStore::open(codec, collaborators, config.page_layout()))
}

fn describe(store: &AnnotationStore, entity: EntityRef) -> Option<String> {
    match entity {
        EntityRef::BoundingBox(id) => store.bounding_box(id).map(|b| {
            format!(
                "{}  scale=({}, {}, {})  position=({}, {}, {})  anchor={:?}",
                b.name,
                b.scale.x,
                b.scale.y,
                b.scale.z,
                b.pose.position.x,
                b.pose.position.y,
                b.pose.position.z,
                b.anchor
            )
        }),
        EntityRef::Annotation(id) => store.annotation(id).map(|a| {
            let page = store.page_label(id).unwrap_or_default();
            let text = store.visible_text(id).unwrap_or_default();
            format!(
                "{} [{}] {}\n  position=({}, {}, {})  anchor={:?}\n  {}",
                a.name,
                a.kind.as_str(),
                page,
                a.pose.position.x,
                a.pose.position.y,
                a.pose.position.z,
                a.anchor,
                text
            )
        }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::load();

    match cli.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(config.port);
            let store = SharedStore::new(open_store(&config)?);
            let app = api::create_router(store);

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("spatial-tags API listening on http://127.0.0.1:{}", port);

            axum::serve(listener, app).await?;
        }
        Some(Commands::List) | None => {
            let store = open_store(&config)?;
            println!("Bounding boxes:");
            for name in store.bounding_box_names() {
                println!("  {}", name);
            }
            println!("Tags:");
            for name in store.annotation_names() {
                println!("  {}", name);
            }
        }
        Some(Commands::Spawn { kind }) => {
            let mut store = open_store(&config)?;
            let entity = match kind {
                SpawnKind::Box => store.spawn_bounding_box(),
                SpawnKind::Fault => store.spawn_annotation(TagKind::Fault),
                SpawnKind::History => store.spawn_annotation(TagKind::History),
                SpawnKind::Label => store.spawn_annotation(TagKind::Label),
            };
            if let Some(line) = describe(&store, entity) {
                println!("{}", line);
            }
        }
        Some(Commands::Show { name }) => {
            let store = open_store(&config)?;
            let entity = store
                .find_by_name(&name)
                .ok_or_else(|| anyhow::anyhow!("No entity named {}", name))?;
            if let Some(line) = describe(&store, entity) {
                println!("{}", line);
            }
        }
        Some(Commands::Delete { name }) => {
            let mut store = open_store(&config)?;
            let Some(entity) = store.find_by_name(&name) else {
                println!("No entity named {}", name);
                return Ok(());
            };
            store.focus_enter(entity);
            store.delete_focused();
            println!("Deleted {}", name);
        }
        Some(Commands::DeleteAll { yes }) => {
            if !yes {
                anyhow::bail!("Refusing to delete everything without --yes");
            }
            let mut store = open_store(&config)?;
            store.delete_all();
            println!("Deleted all bounding boxes and tags");
        }
        Some(Commands::InitConfig) => {
            config.save()?;
            println!("Configuration written");
        }
    }

    Ok(())
}
