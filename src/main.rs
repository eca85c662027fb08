//! folio CLI — browse a CTS text library from the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing_subscriber::EnvFilter;

use folio::client::HttpTransport;
use folio::store::{CatalogStore, SortKind};
use folio::urn::Urn;

/// Default public library API host.
const DEFAULT_BASE_URL: &str = "https://scaife.perseus.org";

#[derive(Parser, Debug)]
#[clap(name = "folio", about = "Browse a CTS text library catalog", version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Base URL of the library API
    #[clap(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Log level (error, warn, info, debug, trace)
    #[clap(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the text groups in the catalog
    Groups {
        /// Case-insensitive label filter (matches group or work labels)
        #[clap(long)]
        filter: Option<String>,

        /// Sort order
        #[clap(long, value_enum, default_value = "text-group")]
        sort: SortFlag,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// List the works of one text group, with their texts
    Works {
        /// Text group URN
        urn: String,

        /// Case-insensitive work label filter
        #[clap(long)]
        filter: Option<String>,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Print the table of contents of one text
    Toc {
        /// Text URN
        urn: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortFlag {
    /// By group label
    TextGroup,
    /// By URN
    Urn,
}

impl From<SortFlag> for SortKind {
    fn from(flag: SortFlag) -> SortKind {
        match flag {
            SortFlag::TextGroup => SortKind::TextGroup,
            SortFlag::Urn => SortKind::Urn,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let transport = HttpTransport::new().context("failed to build HTTP transport")?;
    let mut store = CatalogStore::new(Box::new(transport), &cli.base_url);

    match cli.command {
        Command::Groups { filter, sort, json } => {
            groups_command(&mut store, filter.as_deref(), sort.into(), json).await
        }
        Command::Works { urn, filter, json } => {
            works_command(&mut store, &urn, filter.as_deref(), json).await
        }
        Command::Toc { urn, json } => toc_command(&mut store, &urn, json).await,
    }
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "URN")]
    urn: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Works")]
    works: usize,
}

async fn groups_command(
    store: &mut CatalogStore,
    filter: Option<&str>,
    sort: SortKind,
    json: bool,
) -> Result<()> {
    store
        .load_text_groups()
        .await
        .context("failed to load the text-group catalog")?;

    if let Some(query) = filter {
        store.filter_text_groups(query);
    }
    store.set_sort(sort);
    let groups = store.sorted_text_groups();

    if groups.is_empty() {
        println!("No text groups found.");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        let rows: Vec<GroupRow> = groups
            .iter()
            .map(|group| GroupRow {
                urn: group.urn.to_string(),
                label: group.label.clone(),
                works: group.works.len(),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();

        println!("{table}");
        println!("\n{} text group(s)", groups.len());
    }

    Ok(())
}

#[derive(Tabled)]
struct WorkRow {
    #[tabled(rename = "URN")]
    urn: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Texts")]
    texts: usize,
}

async fn works_command(
    store: &mut CatalogStore,
    urn: &str,
    filter: Option<&str>,
    json: bool,
) -> Result<()> {
    let urn = Urn::parse(urn).context("invalid text group URN")?;

    store
        .load_works(&urn)
        .await
        .with_context(|| format!("failed to load works for {urn}"))?;

    if let Some(query) = filter {
        store.filter_works(query);
    }
    let works = store.works();

    if works.is_empty() {
        println!("No works found.");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(works)?);
    } else {
        if let Some(group) = works.iter().find_map(|work| work.text_group.as_ref()) {
            println!("{} ({})\n", group.label, group.urn);
        }

        let rows: Vec<WorkRow> = works
            .iter()
            .map(|work| WorkRow {
                urn: work.urn.to_string(),
                label: work.label.clone(),
                texts: work.texts.len(),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();

        println!("{table}");
    }

    Ok(())
}

async fn toc_command(store: &mut CatalogStore, urn: &str, json: bool) -> Result<()> {
    let urn = Urn::parse(urn).context("invalid text URN")?;

    store
        .load_toc(&urn)
        .await
        .with_context(|| format!("failed to load table of contents for {urn}"))?;

    let toc = store.toc();

    if toc.is_empty() {
        println!("No table of contents available.");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(toc)?);
    } else {
        for (i, entry) in toc.iter().enumerate() {
            println!("{:>4}  {entry}", i + 1);
        }
    }

    Ok(())
}
