use dhcpconn_cli::{execute, Cli};
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    dhcpconn_core::logging::init(cli.verbose);

    let mut stdout = std::io::stdout();
    match execute(&cli, &mut stdout) {
        Ok(Some(true)) | Ok(None) => ExitCode::SUCCESS,
        Ok(Some(false)) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "dhcpconn failed");
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
