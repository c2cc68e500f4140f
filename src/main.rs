// 📊 Bursary Dashboard - CLI
// Renders the dashboard page to disk, or opens it in the terminal with `view`

use anyhow::{Context, Result};
use bursary_dashboard::{html, Dashboard, DashboardConfig, Dataset, CONFIG_FILE};
use std::env;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let config = DashboardConfig::load_or_default(Path::new(CONFIG_FILE))?;

    if args.len() > 1 && args[1] == "view" {
        // Terminal mode
        run_ui_mode(&config)?;
    } else {
        // Render mode (default)
        run_render(&config)?;
    }

    Ok(())
}

fn build_dashboard(config: &DashboardConfig) -> Result<Dashboard> {
    let dataset = Dataset::load(config)?;
    let dashboard = Dashboard::build(&dataset, config)?;
    Ok(dashboard)
}

fn run_render(config: &DashboardConfig) -> Result<()> {
    let dashboard = build_dashboard(config)?;
    let page = html::render_page(&dashboard);

    fs::write(&config.output_path, page)
        .with_context(|| format!("writing {}", config.output_path.display()))?;

    info!(
        output = %config.output_path.display(),
        grand_total = dashboard.grand_total(),
        notes = dashboard.notes.len(),
        "dashboard rendered"
    );
    println!("✓ Wrote {}", config.output_path.display());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &DashboardConfig) -> Result<()> {
    use bursary_dashboard::ui;

    let dashboard = build_dashboard(config)?;
    info!(title = %dashboard.title, "starting terminal dashboard");

    let mut app = ui::App::new(dashboard);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &DashboardConfig) -> Result<()> {
    eprintln!("❌ Terminal mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web view: cargo run --bin bursary-server --features server");
    std::process::exit(1);
}
