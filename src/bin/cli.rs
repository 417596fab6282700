use std::io::{self, Write};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use minidis::server::{DEFAULT_HOST, DEFAULT_PORT};
use minidis::value::Value;
use minidis::Error;

#[derive(Parser, Debug)]
struct Args {
    /// The host to connect to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// The port to connect to
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let stream = TcpStream::connect((args.host.as_str(), args.port)).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut replies = BufReader::new(read_half);

    let stdin = io::stdin();
    let mut input = String::new();
    let mut reply = String::new();

    loop {
        print!("minidis> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        write_half.write_all(&frame_request(line).to_resp()).await?;

        reply.clear();
        if replies.read_line(&mut reply).await? == 0 {
            println!("(server closed the connection)");
            break;
        }
        print!("{reply}");
    }

    Ok(())
}

/// Frames a whitespace-separated command line as an array of bulk strings,
/// the shape the server expects requests in.
fn frame_request(line: &str) -> Value {
    let items = line
        .split_whitespace()
        .map(|token| Value::Bulk(Some(token.as_bytes().to_vec().into())))
        .collect();
    Value::Array(items)
}
