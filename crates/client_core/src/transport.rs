use shared::domain::ConnectionEndpoint;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};
use tracing::debug;

pub(crate) type ControllerStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub(crate) async fn open(
    endpoint: &ConnectionEndpoint,
) -> Result<ControllerStream, tungstenite::Error> {
    let (stream, response) = connect_async(endpoint.as_str()).await?;
    debug!(
        %endpoint,
        status = %response.status(),
        "controller: websocket handshake complete"
    );
    Ok(stream)
}
