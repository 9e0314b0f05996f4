//! Main application entry point.

use whiteboardly_app::{App, AppConfig, CliArgs};

fn main() {
    env_logger::init();
    log::info!("Starting Whiteboardly");

    let args = CliArgs::parse_with_reference();
    let list = args.list;
    let config = match AppConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    let app = App::with_config(config);

    if list {
        match pollster::block_on(app.list()) {
            Ok(boards) => {
                for board in boards {
                    println!("{}\t{}\t{}", board.id, board.updated_at, board.name);
                }
            }
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    match pollster::block_on(app.run()) {
        Ok(summary) => {
            log::info!(
                "Whiteboard {} ({}): {} steps, {} history entries, saved: {}",
                summary.whiteboard_id,
                summary.name.as_deref().unwrap_or("unnamed"),
                summary.steps,
                summary.history_len,
                summary.saved
            );
            println!("{}", summary.whiteboard_id);
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
