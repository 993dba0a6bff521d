//! Runs an originator node on the loopback link and prints what a sniffer on
//! the medium would decode.
//!
//! ```text
//! cargo run --example simulated_node [node.yaml]
//! RUST_LOG=nodemeta=debug cargo run --example simulated_node
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use nodemeta::link::LoopbackLink;
use nodemeta::stream::DecodeFramesExt;
use nodemeta::{ContentName, DeviceRole, LinkAddr, Node, NodeConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => NodeConfig::load(path)?,
        None => {
            let mut config = NodeConfig::default();
            config.node_id = "Node A".to_string();
            config.role = DeviceRole::Originator;
            config.publisher.interval_secs = Some(7);
            config
        }
    };

    let link = Arc::new(LoopbackLink::new(8));
    let mut reports = link.frames().decode_frames();
    let node = Node::new(config, link).start()?;

    let sniffer = tokio::spawn(async move {
        while let Some(report) = reports.next().await {
            match serde_yaml_ng::to_string(&report) {
                Ok(yaml) => println!("---\n{}", yaml.trim_end()),
                Err(e) => eprintln!("unprintable report: {e}"),
            }
        }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    node.routing.set_prefix("/HAW");
    node.routing.parent_added(LinkAddr::new(&[0x02, 0x1a, 0x4f, 0xff, 0xfe, 0x10, 0x22, 0x31])?, 3);

    tokio::time::sleep(Duration::from_secs(2)).await;
    node.cache.learn_name(&ContentName::parse("/HAW/2/temp/1")?)?;
    node.press_button();

    tokio::time::sleep(Duration::from_secs(9)).await;
    node.routing.parent_dropped();
    tokio::time::sleep(Duration::from_secs(1)).await;

    node.shutdown().await;
    sniffer.abort();
    Ok(())
}
