use anyhow::{Context, bail};
use dbnav_core::{
    LogNotificationSink, NavConfig, NavConfigStore, NavigationEvent, NavigationTabs, Navigator,
    NodeTree, ObjectPage, ObjectPageRegistry, ObjectViewerTabService, TabRegistry,
    TabSessionStore,
};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayArgs {
    pub tree: PathBuf,
    pub events: PathBuf,
    pub session_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl ReplayArgs {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut positional = Vec::new();
        let mut session_dir = None;
        let mut config = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--session" => {
                    let dir = iter.next().context("--session needs a directory")?;
                    session_dir = Some(PathBuf::from(dir));
                }
                "--config" => {
                    let file = iter.next().context("--config needs a file")?;
                    config = Some(PathBuf::from(file));
                }
                flag if flag.starts_with("--") => bail!("Unknown option {}", flag),
                value => positional.push(PathBuf::from(value)),
            }
        }

        let [tree, events]: [PathBuf; 2] = positional
            .try_into()
            .map_err(|_| anyhow::anyhow!("Expected a tree file and an events file"))?;

        Ok(Self {
            tree,
            events,
            session_dir,
            config,
        })
    }
}

fn default_pages() -> [ObjectPage; 3] {
    [
        ObjectPage::new("properties", "Properties", 0),
        ObjectPage::new("ddl", "DDL", 10),
        ObjectPage::new("data", "Data", 20),
    ]
}

pub fn run(args: ReplayArgs) -> anyhow::Result<Vec<String>> {
    let config = match &args.config {
        Some(path) => NavConfigStore::from_path(path).load()?,
        None => NavConfigStore::new()?.load()?,
    };

    let tree_json = fs::read_to_string(&args.tree)
        .with_context(|| format!("Failed to read {}", args.tree.display()))?;
    let tree = NodeTree::from_json(&tree_json)?;

    let events_json = fs::read_to_string(&args.events)
        .with_context(|| format!("Failed to read {}", args.events.display()))?;
    let events: Vec<NavigationEvent> =
        serde_json::from_str(&events_json).context("Invalid events file")?;

    let session = args
        .session_dir
        .as_ref()
        .map(TabSessionStore::from_dir)
        .transpose()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(replay_events(tree, events, config, session.as_ref()))
}

/// Replays navigation events over `tree` and describes the resulting tabs,
/// one line per tab. The active tab is marked with `*`.
pub async fn replay_events(
    tree: NodeTree,
    events: Vec<NavigationEvent>,
    config: NavConfig,
    session: Option<&TabSessionStore>,
) -> anyhow::Result<Vec<String>> {
    let tabs = Arc::new(TabRegistry::new());
    let pages = Arc::new(ObjectPageRegistry::new(
        tabs.clone() as Arc<dyn NavigationTabs>
    ));
    for page in default_pages() {
        pages.register(page);
    }

    let service = Arc::new(ObjectViewerTabService::new(
        Arc::new(tree),
        pages,
        tabs.clone(),
        Arc::new(LogNotificationSink),
        config,
    ));
    service.register_tab_handler();

    let navigator = Navigator::new();
    service.register_navigation_handler(&navigator);

    if let Some(manifest) = session.and_then(|s| s.load_manifest()) {
        let restored = tabs.restore(manifest).await;
        info!("Restored {} tabs", restored);
    }

    for event in events {
        navigator.navigate(event).await;
    }

    if let Some(session) = session {
        session.save_manifest(&tabs.snapshot())?;
    }

    let active = tabs.active_id();
    let lines = tabs
        .tabs()
        .iter()
        .filter_map(|tab| {
            let presentation = tabs.presentation(tab.id)?;
            let marker = if Some(tab.id) == active { "*" } else { " " };
            let icon = presentation.icon.unwrap_or_default();
            Some(format!("{} [{}] {}", marker, icon, presentation.title))
        })
        .collect();

    Ok(lines)
}
