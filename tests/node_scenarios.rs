//! End-to-end scenarios for a running node on the loopback link.

use std::sync::Arc;
use std::time::Duration;

use nodemeta::display::LedBar;
use nodemeta::link::LoopbackLink;
use nodemeta::{
    ContentName, DeviceRole, Event, LinkAddr, Node, NodeConfig, NodeHandle, NodeReport,
    TelemetryError,
};
use tokio::sync::broadcast;
use tokio::time::Instant;

const PARENT: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

fn config(role: DeviceRole) -> NodeConfig {
    NodeConfig { node_id: "Node A".to_string(), role, ..NodeConfig::default() }
}

fn start(config: NodeConfig) -> (NodeHandle, Arc<LoopbackLink>, broadcast::Receiver<Arc<[u8]>>) {
    let _ = tracing_subscriber::fmt::try_init();
    let link = Arc::new(LoopbackLink::new(4));
    let listener = link.listen();
    let node = Node::new(config, link.clone()).with_sampler(Box::new(|| 42)).start().unwrap();
    (node, link, listener)
}

async fn next_report(listener: &mut broadcast::Receiver<Arc<[u8]>>) -> NodeReport {
    let frame = listener.recv().await.unwrap();
    NodeReport::decode(&frame).unwrap()
}

fn name(uri: &str) -> ContentName {
    ContentName::parse(uri).unwrap()
}

#[tokio::test(start_paused = true)]
async fn routing_and_cache_changes_are_reported_in_order() {
    let (node, _link, mut listener) = start(config(DeviceRole::DisplayOnly));

    node.routing.parent_added(LinkAddr::new(&PARENT).unwrap(), 3);
    node.cache.learn_name(&name("/HAW/1/gas/7")).unwrap();

    let first = next_report(&mut listener).await;
    assert_eq!(first.id.as_deref(), Some("NodeA"));
    assert_eq!(first.new_route.unwrap().as_bytes(), PARENT);
    assert_eq!(first.cache.unwrap().cached, Some(1), "count is scanned at encode time");

    let second = next_report(&mut listener).await;
    assert!(second.new_route.is_none());
    assert_eq!(second.cache.unwrap().cached, Some(1));
    assert_eq!(second.cache.unwrap().cache_size, Some(16));

    node.routing.parent_dropped();
    let third = next_report(&mut listener).await;
    assert_eq!(third.lost_route.unwrap().as_bytes(), PARENT);
    assert!(third.cache.is_none());

    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn idle_node_ticks_every_interval() {
    let (node, _link, mut listener) = start(config(DeviceRole::DisplayOnly));
    let started = Instant::now();

    let report = next_report(&mut listener).await;
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert!(report.new_route.is_none(), "no route yet");
    assert_eq!(report.cache.unwrap().cached, Some(0));

    next_report(&mut listener).await;
    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert_eq!(node.stats().borrow().periodic_ticks, 2);

    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn events_push_the_next_tick_back() {
    let (node, _link, mut listener) = start(config(DeviceRole::DisplayOnly));
    let started = Instant::now();

    tokio::time::sleep(Duration::from_secs(3)).await;
    node.events().raise(Event::CacheEntryAdded).unwrap();
    next_report(&mut listener).await;
    next_report(&mut listener).await;

    assert_eq!(started.elapsed(), Duration::from_secs(8));
    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn ticks_survive_transmit_failures() {
    let (node, link, mut listener) = start(config(DeviceRole::DisplayOnly));
    let mut stats = node.stats();

    link.set_rejecting(true);
    node.routing.parent_added(LinkAddr::new(&PARENT).unwrap(), 3);
    stats.wait_for(|s| s.transmit_failures == 1).await.unwrap();
    link.set_rejecting(false);

    let started = Instant::now();
    let report = next_report(&mut listener).await;
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(report.new_route.unwrap().as_bytes(), PARENT);
    assert_eq!(stats.borrow().last_event, Some(Event::PeriodicTick));
    assert_eq!(link.pool().available(), link.pool().size(), "no buffer leaked");

    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn full_mailbox_drops_the_newest_event() {
    let (node, _link, _listener) = start(config(DeviceRole::DisplayOnly));
    let events = node.events();

    for _ in 0..8 {
        events.raise(Event::CacheEntryAdded).unwrap();
    }
    let err = events.raise(Event::CacheEntryRemoved).unwrap_err();
    assert!(matches!(err, TelemetryError::MailboxFull { event: Event::CacheEntryRemoved }));

    let mut stats = node.stats();
    stats.wait_for(|s| s.events == 8).await.unwrap();
    assert_eq!(stats.borrow().frames_sent, 8);
    assert_eq!(stats.borrow().last_event, Some(Event::CacheEntryAdded));

    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn button_publishes_only_with_a_route() {
    let (node, _link, mut listener) = start(config(DeviceRole::Originator));
    let mut stats = node.stats();
    node.routing.set_prefix("/HAW");

    assert!(node.press_button());
    stats.wait_for(|s| s.publish_rejections == 1).await.unwrap();
    assert_eq!(node.cache.content_len(), 0);

    node.routing.parent_added(LinkAddr::new(&PARENT).unwrap(), 3);
    assert!(node.press_button());
    stats.wait_for(|s| s.publications == 1).await.unwrap();

    let added = next_report(&mut listener).await;
    assert!(added.new_route.is_some());
    let notify = next_report(&mut listener).await;
    assert_eq!(notify.cache.unwrap().cached, Some(1));
    assert_eq!(stats.borrow().last_event, Some(Event::ContentCacheNotify));

    let announced = node.cache.announced();
    assert_eq!(announced.len(), 1);
    assert!(announced[0].starts_with(&name("/HAW/1/gas")));
    assert_eq!(node.cache.content(&announced[0]).unwrap().payload, b"42");

    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn originator_publishes_periodically() {
    let mut config = config(DeviceRole::Originator);
    config.publisher.interval_secs = Some(30);
    let (node, _link, _listener) = start(config);
    node.routing.set_prefix("/HAW");
    node.routing.parent_added(LinkAddr::new(&PARENT).unwrap(), 3);

    let started = Instant::now();
    let mut stats = node.stats();
    stats.wait_for(|s| s.publications == 2).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(60));
    assert_eq!(node.cache.names_in_use(), 2);

    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn non_originators_ignore_the_button() {
    let (node, link, _listener) = start(config(DeviceRole::SensorGate));
    let mut stats = node.stats();
    node.routing.set_prefix("/HAW");
    node.routing.parent_added(LinkAddr::new(&PARENT).unwrap(), 3);

    node.press_button();
    stats.wait_for(|s| s.publish_rejections == 1).await.unwrap();
    assert_eq!(node.cache.content_len(), 0);
    assert_eq!(link.sent(), 1);

    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn led_bar_tracks_learned_names() {
    let bar = Arc::new(LedBar::default());
    let link = Arc::new(LoopbackLink::new(4));
    let node = Node::new(config(DeviceRole::DisplayOnly), link)
        .with_display(bar.clone())
        .start()
        .unwrap();
    let mut stats = node.stats();

    node.cache.learn_name(&name("/HAW/a")).unwrap();
    node.cache.learn_name(&name("/HAW/b")).unwrap();
    stats.wait_for(|s| s.frames_sent == 2).await.unwrap();
    assert_eq!(bar.lit(), 4);

    node.cache.evict_name(&name("/HAW/a"));
    stats.wait_for(|s| s.frames_sent == 3).await.unwrap();
    assert_eq!(bar.lit(), 2);

    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn ticks_survive_buffer_exhaustion() {
    let link = Arc::new(LoopbackLink::new(0));
    let node = Node::new(config(DeviceRole::DisplayOnly), link.clone()).start().unwrap();
    let mut stats = node.stats();

    node.events().raise(Event::CacheEntryAdded).unwrap();
    stats.wait_for(|s| s.transmit_failures == 1).await.unwrap();
    assert_eq!(stats.borrow().periodic_ticks, 0);

    let started = Instant::now();
    stats.wait_for(|s| s.periodic_ticks == 1).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(stats.borrow().transmit_failures, 2);

    stats.wait_for(|s| s.periodic_ticks == 2).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert_eq!(link.sent(), 0);

    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn button_presses_keep_the_publish_schedule() {
    let mut config = config(DeviceRole::Originator);
    config.publisher.interval_secs = Some(30);
    let (node, _link, _listener) = start(config);
    node.routing.set_prefix("/HAW");
    node.routing.parent_added(LinkAddr::new(&PARENT).unwrap(), 3);
    let started = Instant::now();
    let mut stats = node.stats();

    tokio::time::sleep(Duration::from_secs(20)).await;
    node.press_button();
    stats.wait_for(|s| s.publications == 1).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(20));

    stats.wait_for(|s| s.publications == 2).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(30));

    node.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn originator_keeps_publishing_past_the_slot_count() {
    let mut config = config(DeviceRole::Originator);
    config.publisher.interval_secs = Some(30);
    let (node, _link, _listener) = start(config);
    node.routing.set_prefix("/HAW");
    node.routing.parent_added(LinkAddr::new(&PARENT).unwrap(), 3);

    let mut stats = node.stats();
    stats.wait_for(|s| s.publications == 20).await.unwrap();
    assert_eq!(stats.borrow().publish_rejections, 0);
    assert_eq!(node.cache.names_in_use(), 16);

    node.shutdown().await;
}
