use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument};

use crate::commands;
use crate::connection::Connection;
use crate::store::Store;
use crate::Error;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6382;

pub async fn run(host: &str, port: u16) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((host, port)).await?;
    let store = Store::new();

    info!("listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        debug!("accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store).await {
                error!(error = %e, "connection failed");
            }
        });
    }
}

#[instrument(name = "connection", skip(stream, store), fields(client_address))]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream);

    tracing::Span::current().record("client_address", client_address.to_string());

    while let Some(decoded) = conn.read_requests().await? {
        for request in decoded.commands {
            debug!("received request: {:?}", request);
            let reply = commands::dispatch(request, store.clone());
            conn.write_reply(&reply).await?;
        }
        // Commands decoded before a fault have already replied; the fault
        // itself becomes the final reply line for this chunk.
        if let Some(fault) = decoded.error {
            conn.write_reply(&fault.to_reply()).await?;
        }
    }

    debug!("connection closed");
    Ok(())
}
