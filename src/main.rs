use boletim::collections::Newsletter;
use boletim::content::{CollectionKind, missing_in};
use boletim::imaging::{ImageFile, RustBackend, UploadPolicy};
use boletim::store::{
    Fields, Gateway, GatewayError, MemoryStore, Operation, Query, Response,
};
use boletim::{config, dashboard, output};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Field name the editor stores images under.
const IMAGE_FIELD: &str = "imagem";

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "boletim")]
#[command(about = "Content store for a student newsletter")]
#[command(long_about = "\
Content store for a student newsletter

Documents live in five collections: noticias, eventos, avisos, galeria and
destaques. Every document gets an id, createdAt and updatedAt. Images are
stored inline as data: URIs, downscaled to fit 800x600 and re-encoded as
JPEG unless compression is turned off.

Examples:

  boletim create avisos --field titulo=Prova --field tipo=urgente --field 'conteudo=Sala 3'
  boletim list avisos --order-by tipo --equal-to urgente
  boletim update noticias -Nx4abc --field status=rascunho
  boletim create galeria --field titulo=Feira --field categoria=Eventos --image feira.png

Field values that parse as JSON (numbers, true/false, objects) are stored as
JSON; anything else is stored as a string.

Run 'boletim gen-config' to generate a documented boletim.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Store snapshot file (overrides [store] snapshot)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Print inline images in full instead of shortening them
    #[arg(long, global = true)]
    full_images: bool,

    #[command(subcommand)]
    command: Command,
}

/// Query flags shared by listing commands.
#[derive(clap::Args, Clone)]
struct QueryArgs {
    /// Order children by this field (store order, no newest-first sort)
    #[arg(long)]
    order_by: Option<String>,
    /// Keep only children whose order-by field equals this value
    #[arg(long, requires = "order_by", value_parser = parse_value)]
    equal_to: Option<Value>,
    /// Keep the last N children under the ordering
    #[arg(long)]
    limit: Option<usize>,
}

impl QueryArgs {
    fn to_query(&self) -> Query {
        Query {
            order_by: self.order_by.clone(),
            equal_to: self.equal_to.clone(),
            limit: self.limit,
        }
    }
}

/// Field flags shared by create and update.
#[derive(clap::Args, Clone)]
struct FieldArgs {
    /// Field to set, as key=value (repeatable)
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, Value)>,
    /// Image file to encode into the `imagem` field
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// List the documents of a collection
    List {
        collection: CollectionKind,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Show one document
    Show {
        collection: CollectionKind,
        #[arg(allow_hyphen_values = true)]
        id: String,
    },
    /// Create a document
    Create {
        collection: CollectionKind,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Merge fields into a document
    Update {
        collection: CollectionKind,
        #[arg(allow_hyphen_values = true)]
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a document
    Delete {
        collection: CollectionKind,
        #[arg(allow_hyphen_values = true)]
        id: String,
    },
    /// Encode an image file as a data: URI and print it
    EncodeImage {
        path: PathBuf,
        /// Keep the original bytes instead of downscaling to JPEG
        #[arg(long)]
        no_compress: bool,
    },
    /// Show content counts and recent activity
    Dashboard,
    /// Print a stock boletim.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.config)?;
    let policy = UploadPolicy::from_config(&config.images);

    if let Command::EncodeImage { path, no_compress } = &cli.command {
        let policy = UploadPolicy {
            compress: policy.compress && !*no_compress,
            ..policy
        };
        let file = ImageFile::open(path);
        let uri = policy.process(&RustBackend::new(), Some(&file))?;
        eprintln!("{}", output::format_image_summary(file.name(), &uri));
        println!("{uri}");
        return Ok(());
    }

    let snapshot = cli.store.clone().unwrap_or(config.store.snapshot.clone());
    let store = Arc::new(MemoryStore::load(&snapshot)?);
    let gateway = Gateway::new(store.clone());

    let (response, wrote) = match cli.command {
        Command::List { collection, query } => (
            Response::listing(&gateway.list(collection.path(), &query.to_query())),
            false,
        ),
        Command::Show { collection, id } => (
            Response::document(&gateway.read(collection.path(), &id)),
            false,
        ),
        Command::Create { collection, fields } => {
            let fields = collect_fields(&fields, &policy)?;
            let missing = missing_in(&fields, collection.required());
            let response = if missing.is_empty() {
                Response::created(&gateway.create(collection.path(), fields))
            } else {
                Response::failure(&GatewayError::Invalid {
                    collection: collection.to_string(),
                    missing: missing.into_iter().map(String::from).collect(),
                })
            };
            (response, true)
        }
        Command::Update {
            collection,
            id,
            fields,
        } => {
            let fields = collect_fields(&fields, &policy)?;
            let result = gateway.update(collection.path(), &id, fields);
            (Response::done(Operation::Update, &result), true)
        }
        Command::Delete { collection, id } => {
            let result = gateway.delete(collection.path(), &id);
            (Response::done(Operation::Delete, &result), true)
        }
        Command::Dashboard => {
            let newsletter = Newsletter::new(gateway);
            let summary = dashboard::summarize(&newsletter, config.dashboard.recent_limit);
            output::print_dashboard(&summary);
            return Ok(());
        }
        Command::EncodeImage { .. } | Command::GenConfig => return Ok(()),
    };

    if wrote && response.success {
        save_snapshot(&store, &snapshot)?;
    }
    output::print_response(&response, cli.full_images);
    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the `warn` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn save_snapshot(store: &MemoryStore, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    store.save(path)?;
    tracing::debug!(path = %path.display(), "snapshot saved");
    Ok(())
}

/// Build the document fields from `--field` pairs plus an optional image.
fn collect_fields(
    args: &FieldArgs,
    policy: &UploadPolicy,
) -> Result<Fields, Box<dyn std::error::Error>> {
    let mut fields: Fields = args.fields.iter().cloned().collect();
    if let Some(path) = &args.image {
        let file = ImageFile::open(path);
        let uri = policy.process(&RustBackend::new(), Some(&file))?;
        fields.insert(IMAGE_FIELD.to_string(), Value::String(uri));
    }
    Ok(fields)
}

/// Parse a value as JSON when possible, else keep it as a string.
fn parse_value(raw: &str) -> Result<Value, String> {
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

/// Parse `key=value`.
fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in `{raw}`"));
    }
    Ok((key.to_string(), parse_value(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_shows_quoted_example() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("--field 'conteudo=Sala 3'"));
    }

    #[test]
    fn push_ids_starting_with_dash_parse_as_ids() {
        let cli = Cli::try_parse_from(["boletim", "delete", "noticias", "-Nx4abc"]).unwrap();
        match cli.command {
            Command::Delete { id, .. } => assert_eq!(id, "-Nx4abc"),
            _ => panic!("expected delete"),
        }
    }

    #[test]
    fn field_values_parse_as_json_when_possible() {
        assert_eq!(parse_field("n=3").unwrap(), ("n".into(), Value::from(3)));
        assert_eq!(
            parse_field("conteudo=Sala 3").unwrap(),
            ("conteudo".into(), Value::from("Sala 3"))
        );
        assert!(parse_field("=x").is_err());
        assert!(parse_field("novalue").is_err());
    }
}
