use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser as ClapParser;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ascm::config::{self, AppConfig};
use ascm::exec::{CommandExecutor, JobReport, RootMethod};
use ascm::menu_file::{LoadOptions, load_menu};
use ascm::nav::Navigator;
use ascm::theme::{self, ThemeTokens};
use ascm::{MenuNode, MenuTree};

mod frame;
mod view;
mod screens {
    pub mod help;
    pub mod menu;
}

use crate::screens::help::HelpScreen;
use crate::screens::menu::MenuScreen;
use crate::view::{Action, View};

const TICK: Duration = Duration::from_millis(250);

#[derive(ClapParser, Debug)]
#[command(name = "ascm", version, about = "Foldable terminal menu of user-defined commands")]
struct Cli {
    /// Menu file (text format, or TOML/YAML/JSON)
    #[arg(value_name = "MENU_FILE", required_unless_present = "init_config")]
    menu_file: Option<PathBuf>,

    /// Config file (default: ~/.ascm/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// How commands flagged for root permissions are elevated
    #[arg(long, value_enum)]
    root: Option<RootMethod>,

    /// Load and validate the menu and config, then exit
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Print the fully unfolded menu and exit
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Write the default config to ~/.ascm/config.toml if it does not exist
    #[arg(long, default_value_t = false)]
    init_config: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Help,
}

struct App {
    screen: Screen,
    menu: MenuScreen,
    help: HelpScreen,
    menu_path: PathBuf,
    load_options: LoadOptions,
    executor: CommandExecutor,
    theme: ThemeTokens,
    needs_clear: bool,
    status_text: Option<String>,
    status_tx: mpsc::Sender<JobReport>,
    status_rx: mpsc::Receiver<JobReport>,
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let is_json = matches!(
        std::env::var("ASCM_LOG_FORMAT").ok().as_deref(),
        Some("json") | Some("JSON")
    );
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match (log_file, is_json) {
        (Some(path), json) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let builder = builder.with_writer(Mutex::new(file)).with_ansi(false);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
        (None, true) => builder.with_writer(io::stderr).json().init(),
        (None, false) => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.log_file.as_deref()) {
        eprintln!("ascm: {e:#}");
        std::process::exit(1);
    }
    let code = match cli_main(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "ascm error");
            1
        }
    };
    std::process::exit(code);
}

fn cli_main(cli: Cli) -> Result<i32> {
    if cli.init_config {
        let Some(path) = config::default_config_path() else {
            bail!("HOME is not set");
        };
        if path.exists() {
            println!("{} already exists", path.display());
        } else {
            config::save_app_config(&path, &AppConfig::default())?;
            println!("wrote {}", path.display());
        }
    }
    let Some(menu_file) = cli.menu_file else {
        return Ok(0);
    };

    let mut cfg = config::load_app_config(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        cfg.root_method = root;
    }
    let (errors, warnings) = config::validate_app_config(&cfg);
    for w in &warnings {
        warn!("config: {w}");
    }
    if !errors.is_empty() {
        bail!("invalid config: {}", errors.join("; "));
    }

    let load_options = cfg.load_options();
    let tree = load_menu(&menu_file, &load_options)?;

    if cli.check {
        println!("{}", summarize(&tree));
        return Ok(0);
    }
    if cli.list {
        for id in tree.flatten(false) {
            println!("{}", tree.node(id).display_label());
        }
        return Ok(0);
    }

    let nav = Navigator::new(tree)?;
    let (status_tx, status_rx) = mpsc::channel::<JobReport>(64);
    let app = App {
        screen: Screen::Menu,
        menu: MenuScreen::new(nav, cfg.wrap),
        help: HelpScreen,
        menu_path: menu_file,
        load_options,
        executor: cfg.executor(),
        theme: theme::load_theme(cfg.theme.as_deref(), cfg.theme_overrides.as_ref()),
        needs_clear: true,
        status_text: None,
        status_tx,
        status_rx,
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.map(|()| 0)
}

fn summarize(tree: &MenuTree) -> String {
    let (mut submenus, mut commands, mut separators) = (0usize, 0usize, 0usize);
    for id in tree.flatten(false) {
        match tree.node(id) {
            MenuNode::Submenu(_) => submenus += 1,
            MenuNode::Command(_) => commands += 1,
            MenuNode::Separator(_) => separators += 1,
        }
    }
    format!(
        "Menu '{}': {} entries ({submenus} submenus, {commands} commands, {separators} separators)",
        tree.name(),
        tree.len()
    )
}

fn run_app<B: Backend + io::Write>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        while let Ok(report) = app.status_rx.try_recv() {
            info!(label = %report.label, code = ?report.code, "background command finished");
            app.status_text = Some(report.to_string());
            // a failed job may have logged to stderr underneath the TUI
            app.needs_clear = true;
        }

        if app.needs_clear {
            terminal.clear()?;
            app.needs_clear = false;
        }
        terminal.draw(|f| draw(f, &mut app))?;

        if !event::poll(TICK)? {
            continue;
        }
        match event::read()? {
            CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                let action = match app.screen {
                    Screen::Menu => app.menu.handle_event(key)?,
                    Screen::Help => app.help.handle_event(key)?,
                };
                if perform(terminal, &mut app, action)? {
                    break;
                }
            }
            // The menu re-fits itself to the new area on the next draw
            CEvent::Resize(_, _) => app.needs_clear = true,
            _ => {}
        }
    }
    Ok(())
}

fn draw(f: &mut ratatui::Frame, app: &mut App) {
    let (menu_area, status_area) = frame::split_main_area(f.area());
    app.menu.render(f, menu_area, &app.theme);
    if app.screen == Screen::Help {
        app.help.render(f, menu_area, &app.theme);
    }
    let (status, fg) = match &app.status_text {
        Some(s) if s.starts_with("[✖]") => (s.clone(), app.theme.accent_danger),
        Some(s) => (s.clone(), app.theme.status_fg),
        None => (" ?: help   q: quit".to_string(), app.theme.text_muted),
    };
    let line = Line::from(Span::styled(
        status,
        Style::default().fg(fg).bg(app.theme.status_bg),
    ));
    frame::render_status_bar(line, status_area, f);
}

/// Returns true when the program should exit.
fn perform<B: Backend + io::Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    action: Action,
) -> Result<bool> {
    match action {
        Action::None => {}
        Action::Quit => return Ok(true),
        Action::ShowHelp => app.screen = Screen::Help,
        Action::CloseHelp => {
            app.screen = Screen::Menu;
            app.needs_clear = true;
            app.menu.redraw();
        }
        Action::Redraw => {
            app.needs_clear = true;
            app.menu.redraw();
        }
        Action::Run { label, command } => {
            if command.attribs().run_in_background {
                match app
                    .executor
                    .spawn_background(&label, &command, app.status_tx.clone())
                {
                    Ok(()) => app.status_text = Some(format!("[…] {label} started")),
                    Err(e) => {
                        warn!(error = %e, command = %label, "cannot start command");
                        app.status_text = Some(format!("[✖] {label}: {e}"));
                        app.needs_clear = true;
                    }
                }
            } else {
                let status = with_released_terminal(terminal, || {
                    println!("{}", "_".repeat(60));
                    app.executor.run_foreground(&command)
                })?;
                app.status_text = Some(match status {
                    Ok(st) => match st.code() {
                        Some(0) => format!("[✔] {label}"),
                        Some(code) => format!("[✖] {label} (exit {code})"),
                        None => format!("[⛔] {label} terminated"),
                    },
                    Err(e) => format!("[✖] {label}: {e}"),
                });
                app.needs_clear = true;
                app.menu.redraw();
            }
        }
        Action::EditMenu => {
            let path = app.menu_path.clone();
            let status = with_released_terminal(terminal, || app.executor.edit(&path))?;
            if let Err(e) = status {
                app.status_text = Some(format!("[✖] editor: {e}"));
            }
            app.needs_clear = true;
            reload_menu(app);
        }
        Action::Reload => reload_menu(app),
    }
    Ok(false)
}

fn reload_menu(app: &mut App) {
    let result = load_menu(&app.menu_path, &app.load_options)
        .and_then(|tree| app.menu.reload(tree));
    match result {
        Ok(()) => {
            info!(path = %app.menu_path.display(), "menu reloaded");
            app.status_text = Some(format!("Reloaded {}", app.menu_path.display()));
        }
        Err(e) => {
            warn!(error = %e, "menu reload failed");
            app.status_text = Some(format!("[✖] {e}"));
            app.menu.redraw();
        }
    }
    app.needs_clear = true;
}

/// Hands the terminal to a child process for the duration of `f`.
fn with_released_terminal<B: Backend + io::Write, T>(
    terminal: &mut Terminal<B>,
    f: impl FnOnce() -> T,
) -> Result<T> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let out = f();

    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.hide_cursor()?;
    Ok(out)
}
