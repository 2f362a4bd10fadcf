pub mod app;
pub mod async_ops;
pub mod clipboard;
pub mod config;
pub mod logging;
pub mod refresh;
pub mod theme;
pub mod ui;
pub mod views;

use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use app::{App, AppOptions};
use async_ops::{CommandContext, CommandResult};
use config::{Profile, TimeoutConfig, UiConfig};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use refresh::AutoRefresh;
use tempo_client::{ExecutionRef, WorkflowProvider};
use tracing::info;

/// Everything a session needs, resolved from config and flags.
pub struct RunOptions {
    pub provider: Arc<dyn WorkflowProvider>,
    pub profile: Profile,
    pub ui: UiConfig,
    pub timeouts: TimeoutConfig,
    /// Open this execution's history right away.
    pub open: Option<ExecutionRef>,
}

/// Launch the terminal console.
pub fn run(options: RunOptions) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tempo-worker")
        .build()
        .context("failed to start async runtime")?;

    let ctx = CommandContext {
        provider: Arc::clone(&options.provider),
        namespace: options.profile.namespace.clone(),
        timeouts: options.timeouts,
    };
    let mut app = App::new(AppOptions {
        provider_name: options.provider.name(),
        namespace: options.profile.namespace.clone(),
        default_projection: options.ui.default_projection,
        preserve_tree: options.ui.preserve_tree_expansion,
        auto_refresh: AutoRefresh::new(options.ui.auto_refresh_interval(), options.ui.auto_refresh),
    });
    app.refresh_list();
    if let Some(execution) = options.open {
        app.open_workflow(execution);
    }
    info!(provider = %app.provider_name, namespace = %app.namespace, "session started");

    // Terminal setup
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, rt.handle(), &ctx);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // In-flight commands are abandoned, not awaited.
    rt.shutdown_background();
    info!("session ended");
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    rt: &tokio::runtime::Handle,
    ctx: &CommandContext,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<CommandResult>();

    loop {
        // ── Apply finished commands ──────────────────────────────────
        while let Ok(result) = rx.try_recv() {
            app.apply_command_result(result);
        }

        app.tick(Instant::now());

        // ── Spawn queued commands ────────────────────────────────────
        for cmd in app.take_pending() {
            async_ops::spawn(rt, ctx.clone(), cmd, tx.clone());
        }

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key.code) {
                    break;
                }
            }
        }
    }
    Ok(())
}
