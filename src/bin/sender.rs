use std::{io, process::ExitCode};

use amqp_types_shim::{
    shim::{self, Args},
    ShimResult,
};
use clap::Parser;

async fn run(args: Args) -> ShimResult<()> {
    let values = shim::read_values(io::stdin().lock(), args.count)?;
    shim::run_sender(&args, values).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    shim::init_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
