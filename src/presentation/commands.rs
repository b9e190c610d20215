// Command handlers - wire the CLI to the panel use cases
use crate::application::chart::{ChartController, CursorEvent};
use crate::application::metadata::SeriesMetadataResolver;
use crate::application::metrics_repository::MetricsRepository;
use crate::application::panel_service::{PanelService, PanelSnapshot};
use crate::application::range_fetcher::{FetchState, RangeFetcher};
use crate::application::resize::observe_size;
use crate::application::series_sync::sync_series_names;
use crate::domain::dashboard::{DashboardDocument, DocumentError, PanelDocument};
use crate::domain::export::export_csv;
use crate::domain::query::{QueryInput, QueryNormalizer};
use crate::domain::series::SeriesPoint;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::document_store::DocumentStore;
use crate::presentation::cli::{
    Command, ExportArgs, FileArgs, ImportPanelArgs, QueryArgs, RenderArgs, SeriesArgs,
    TooltipArgs, ValidateArgs, ViewArgs, WatchArgs,
};
use crate::presentation::terminal_surface::{
    axis_line, legend_lines, tooltip_lines, TerminalSurface, TERMINAL_PLOT_SIZE,
};
use anyhow::{bail, Context, Result};
use std::collections::{BTreeSet, HashSet};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;

pub struct App {
    config: AppConfig,
    service: PanelService,
}

impl App {
    pub fn new(config: AppConfig, repository: Arc<dyn MetricsRepository>) -> Self {
        Self {
            config,
            service: PanelService::new(repository),
        }
    }

    pub async fn run(&self, command: Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::Render(args) => self.render(args, out).await,
            Command::Tooltip(args) => self.tooltip(args, out).await,
            Command::Watch(args) => self.watch(args, out).await,
            Command::ExportCsv(args) => self.export_csv(args, out).await,
            Command::ExportPanel(args) => self.export_panel(args, out).await,
            Command::ImportPanel(args) => self.import_panel(args, out).await,
            Command::ImportDashboard(args) => self.import_dashboard(args, out).await,
            Command::Series(args) => self.update_series(args, out).await,
            Command::Validate(args) => validate(args, out).await,
            Command::Query(args) => self.query(args, out).await,
            Command::Config => {
                write!(out, "{}", toml::to_string_pretty(&self.config)?)?;
                Ok(())
            }
        }
    }

    async fn open_store(&self) -> Result<DocumentStore> {
        DocumentStore::open(&self.config.dashboard.path).await
    }

    /// One fetch cycle against the stored dashboard; a failed cycle is an error.
    async fn fetch(
        &self,
        store: &mut DocumentStore,
        panel_id: &str,
        hidden: &HashSet<String>,
    ) -> Result<PanelSnapshot> {
        let snapshot = self
            .service
            .fetch_panel(store.document_mut(), panel_id, hidden)
            .await?;
        if let Some(error) = &snapshot.state.error {
            bail!("{error}");
        }
        Ok(snapshot)
    }

    async fn render(&self, args: RenderArgs, out: &mut dyn Write) -> Result<()> {
        let mut store = self.open_store().await?;
        let snapshot = self.fetch(&mut store, &args.panel, &HashSet::new()).await?;
        let mut chart = chart_for(&snapshot.input, snapshot.state.data.clone());
        apply_view(&mut chart, &args.view);
        if let Some(index) = args.isolate {
            if !chart.isolate_series(index) {
                tracing::warn!(index, "no series at legend position");
            }
        }
        if let Some(delta) = args.legend_scroll {
            chart.on_legend_wheel(delta);
        }

        writeln!(out, "{}", snapshot.title)?;
        match chart.frame().filter(|frame| !frame.is_empty()) {
            Some(frame) => {
                writeln!(
                    out,
                    "{} series, {} points",
                    frame.len() - 1,
                    chart.surface().points()
                )?;
                if let Some(axis) = axis_line(&chart) {
                    writeln!(out, "axis: {axis}")?;
                }
                for line in legend_lines(&chart) {
                    writeln!(out, "{line}")?;
                }
            }
            None => writeln!(out, "No data")?,
        }

        if snapshot.sync.changed {
            if args.save {
                store.save().await?;
            } else {
                tracing::info!(panel_id = %snapshot.panel_id, "new series discovered, pass --save to keep them");
            }
        }
        Ok(())
    }

    async fn tooltip(&self, args: TooltipArgs, out: &mut dyn Write) -> Result<()> {
        let hidden: HashSet<String> = args.hidden.into_iter().collect();
        let mut store = self.open_store().await?;
        let snapshot = self.fetch(&mut store, &args.panel, &hidden).await?;

        let mut chart = chart_for(&snapshot.input, snapshot.state.data);
        apply_view(&mut chart, &args.view);
        let tooltip = chart.on_cursor(CursorEvent {
            left: Some(0.0),
            top: 0.0,
            idx: Some(args.index),
        });

        if !tooltip.is_shown() {
            writeln!(out, "No values at index {}", args.index)?;
        }
        for line in tooltip_lines(tooltip) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    async fn watch(&self, args: WatchArgs, out: &mut dyn Write) -> Result<()> {
        let mut store = self.open_store().await?;
        let mut normalizer = QueryNormalizer::new();
        let fetcher = RangeFetcher::new(self.service.repository());
        fetcher.submit(normalizer.normalize(&panel_input(store.document(), &args.panel)?).to_vec());

        let chart = Arc::new(Mutex::new(ChartController::new(TerminalSurface::default())));
        let (_size_tx, sizes) = watch::channel(TERMINAL_PLOT_SIZE);
        let _observer = observe_size(chart.clone(), sizes);

        let mut updates = fetcher.updates();
        let mut ticker = tokio::time::interval(Duration::from_secs(args.interval));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let mut completed = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // pick up query edits made since the last cycle
                    match self.open_store().await {
                        Ok(reopened) => store = reopened,
                        Err(e) => tracing::warn!(
                            error = %format!("{e:#}"),
                            "keeping previously loaded dashboard"
                        ),
                    }
                    let input = panel_input(store.document(), &args.panel)?;
                    if !fetcher.submit(normalizer.normalize(&input).to_vec()) {
                        fetcher.refresh();
                    }
                }
                update = updates.next() => {
                    let Some(state) = update else { break };
                    if state.generation == 0 {
                        continue;
                    }
                    if state.loading {
                        writeln!(out, "#{} loading", state.generation)?;
                        continue;
                    }

                    write_state(out, &mut *chart.lock().await, store.document(), &args.panel, &state)?;
                    if let Some(series) = &state.data {
                        if sync_series_names(store.document_mut(), &args.panel, series).changed {
                            store.save().await?;
                        }
                    }

                    completed += 1;
                    if args.count.is_some_and(|count| completed >= count) {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted");
                    break;
                }
            }
        }

        tracing::debug!(generation = fetcher.state().generation, completed, "watch stopped");
        Ok(())
    }

    async fn export_csv(&self, args: ExportArgs, out: &mut dyn Write) -> Result<()> {
        let mut store = self.open_store().await?;
        let snapshot = self.fetch(&mut store, &args.panel, &HashSet::new()).await?;
        let csv = snapshot
            .state
            .data
            .as_deref()
            .and_then(|series| export_csv(series, snapshot.input.query_configs()))
            .context("No data available to download.")?;

        match args.out {
            Some(path) => {
                tokio::fs::write(&path, csv)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                writeln!(out, "Wrote {}", path.display())?;
            }
            None => writeln!(out, "{csv}")?,
        }
        Ok(())
    }

    async fn export_panel(&self, args: ExportArgs, out: &mut dyn Write) -> Result<()> {
        let store = self.open_store().await?;
        let path = store.export_panel(&args.panel, args.out.as_deref()).await?;
        writeln!(out, "Wrote {}", path.display())?;
        Ok(())
    }

    async fn import_panel(&self, args: ImportPanelArgs, out: &mut dyn Write) -> Result<()> {
        let mut store = self.open_store().await?;
        store.import_panel(&args.panel, &args.file).await?;
        store.save().await?;
        writeln!(out, "Imported panel {}", args.panel)?;
        Ok(())
    }

    async fn import_dashboard(&self, args: FileArgs, out: &mut dyn Write) -> Result<()> {
        let mut store = self.open_store().await?;
        store.import_dashboard(&args.file).await?;
        store.save().await?;
        writeln!(
            out,
            "Imported {} panels into {}",
            store.document().panels.len(),
            store.path().display()
        )?;
        Ok(())
    }

    async fn update_series(&self, args: SeriesArgs, out: &mut dyn Write) -> Result<()> {
        if args.rename.is_none() && args.units.is_none() && args.resolution.is_none() {
            bail!("Nothing to update, pass --rename, --units or --resolution");
        }

        let mut store = self.open_store().await?;
        let document = store.document_mut();
        let mut found = true;
        if let Some(rename) = &args.rename {
            found &= document.update_series_rename(&args.panel, &args.query, &args.name, rename);
        }
        if args.units.is_some() || args.resolution.is_some() {
            found &= document.update_series_overrides(
                &args.panel,
                &args.query,
                &args.name,
                args.units.as_deref(),
                args.resolution,
            );
        }
        if !found {
            bail!(
                "No series {} for query {} in panel {}",
                args.name,
                args.query,
                args.panel
            );
        }

        store.save().await?;
        writeln!(out, "Updated {}", args.name)?;
        Ok(())
    }

    async fn query(&self, args: QueryArgs, out: &mut dyn Write) -> Result<()> {
        let text = tokio::fs::read_to_string(&args.file)
            .await
            .with_context(|| format!("Failed to read {}", args.file.display()))?;
        let values: Vec<serde_json::Value> = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON array of queries", args.file.display()))?;

        let input = QueryInput::detect(&values);
        let state = self.service.fetch_input(&input).await;
        if let Some(error) = &state.error {
            bail!("{error}");
        }

        let chart = chart_for(&input, state.data);
        if chart.frame().is_none() {
            writeln!(out, "No data")?;
        }
        for line in legend_lines(&chart) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

async fn validate(args: ValidateArgs, out: &mut dyn Write) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    if args.panel_file {
        let panel = PanelDocument::from_json(&text)?;
        writeln!(out, "Panel '{}' with {} queries", panel.title, panel.queries.len())?;
    } else {
        let document = DashboardDocument::from_json(&text)?;
        let queries: usize = document.panels.iter().map(|p| p.queries.len()).sum();
        writeln!(out, "{} panels, {} queries", document.panels.len(), queries)?;
    }
    Ok(())
}

fn panel_input(document: &DashboardDocument, panel_id: &str) -> Result<QueryInput, DocumentError> {
    document
        .panel(panel_id)
        .map(|p| QueryInput::Stored(p.queries.clone()))
        .ok_or_else(|| DocumentError::UnknownPanel(panel_id.to_string()))
}

fn chart_for(input: &QueryInput, data: Option<Vec<SeriesPoint>>) -> ChartController<TerminalSurface> {
    let resolver = SeriesMetadataResolver::new(input.query_configs());
    let mut chart = ChartController::new(TerminalSurface::default());
    chart.resize(TERMINAL_PLOT_SIZE);
    chart.load(data, &resolver);
    chart
}

fn apply_view(chart: &mut ChartController<TerminalSurface>, view: &ViewArgs) {
    for &index in view.hidden_series.iter().collect::<BTreeSet<_>>() {
        if !chart.toggle_series(index) {
            tracing::warn!(index, "no series at legend position");
        }
    }
}

fn write_state(
    out: &mut dyn Write,
    chart: &mut ChartController<TerminalSurface>,
    document: &DashboardDocument,
    panel_id: &str,
    state: &FetchState,
) -> Result<()> {
    let resolver = SeriesMetadataResolver::new(
        document
            .panel(panel_id)
            .into_iter()
            .flat_map(|p| p.queries.iter()),
    );
    chart.load(state.data.clone(), &resolver);
    // each settled cycle re-ranges the axes
    chart.reset_zoom();

    match (&state.error, &state.data) {
        (Some(error), _) => writeln!(out, "#{} {error}", state.generation)?,
        (None, None) => writeln!(out, "#{} no data", state.generation)?,
        (None, Some(series)) => {
            writeln!(out, "#{} {} series", state.generation, series.len())?;
            for line in legend_lines(chart) {
                writeln!(out, "  {line}")?;
            }
        }
    }
    Ok(())
}
