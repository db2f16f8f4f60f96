mod app;

use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let file_path = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "Diagrammer",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::DiagramApp::new(cc, file_path)))),
    )
}
