use clap::Parser;
use eframe::egui;

use op_explorer::app::OpExplorerApp;
use op_explorer::config::{Args, Settings, read_condition_specs};
use op_explorer::state::{Session, Status};

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let mut session = Session::new(Settings::from(&args));
    if let Some(path) = &args.path {
        if session.load_path(path) {
            if let Some(conditions) = &args.conditions {
                match read_condition_specs(conditions) {
                    Ok(specs) => {
                        session.add_condition_specs(&specs);
                    }
                    Err(e) => {
                        log::error!("{e:#}");
                        session.status = Some(Status::Error(format!("Error: {e:#}")));
                    }
                }
            }
        }
        // Rejections are reported through the session status.
        let _ = session.plot_from_draft();
    } else if args.conditions.is_some() {
        log::warn!("--conditions ignored: no table given");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "OP Explorer – Operating Point Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(OpExplorerApp::new(session)))),
    )
}
