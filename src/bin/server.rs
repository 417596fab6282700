use clap::Parser;

use minidis::server::{self, DEFAULT_HOST, DEFAULT_PORT};
use minidis::Error;

#[derive(Parser, Debug)]
struct Args {
    /// The host to bind
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// The port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    server::run(&args.host, args.port).await
}
