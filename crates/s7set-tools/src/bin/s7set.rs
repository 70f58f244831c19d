use clap::error::ErrorKind as ClapErrorKind;
use clap::{CommandFactory, Parser};
use s7set_tools::app;
use s7set_tools::cli::Args;
use s7set_tools::common::init_tracing;
use s7set_tools::plc::S7PlcClient;
use s7set_tools::SetError;
use std::process::ExitCode;

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    let mut client = S7PlcClient::default();
    let mut stdout = std::io::stdout().lock();

    match app::run(&args, &mut client, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(SetError::Usage(message)) => Args::command()
            .error(ClapErrorKind::InvalidValue, message)
            .exit(),
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}
