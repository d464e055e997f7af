//! `sift mock-server`: start the OpenAI-compatible mock API.

use sift_config::{AppConfig, split_keys};

pub async fn run(
    config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    api_keys: Option<String>,
    stream_delay_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut server = config.mock_server;
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }
    if let Some(keys) = api_keys {
        server.api_keys = split_keys(&keys);
    }
    if let Some(delay) = stream_delay_ms {
        server.stream_delay_ms = delay;
    }

    println!("🧪 Sift mock API");
    println!("   Listening: http://{}:{}/api/v1", server.host, server.port);
    println!("   API keys:  {}", server.api_keys.len());

    sift_mockapi::start(&server).await
}
