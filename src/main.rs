// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Mutex;
use tokio::time::{Duration, interval};
use tracing::{debug, error, info, warn};

use total_connect_bridge::constants::{
    APPLICATION_ID, APPLICATION_VERSION, DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_MS,
    POLL_TICK_SECS,
};
use total_connect_bridge::{
    BridgeEvent, ClientConfig, Keypad, KeypadAction, KeypadMonitor, KeypadState, Location,
    SoapTransport, TotalConnectClient,
};

type Monitor = KeypadMonitor<SoapTransport>;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "tc2mqtt")]
#[command(about = "Bridge between a Honeywell Total Connect 2.0 security panel and MQTT")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    total_connect: TotalConnectToml,
    mqtt: MqttToml,
    #[serde(default)]
    keypads: Vec<KeypadToml>,
}

#[derive(Debug, Deserialize)]
struct TotalConnectToml {
    username: String,
    password: String,
    /// Minutes between status polls; 0 disables periodic polling.
    #[serde(default)]
    refresh_interval_minutes: u32,
    #[serde(default = "default_endpoint")]
    endpoint: String,
    #[serde(default = "default_request_timeout")]
    request_timeout_ms: u64,
    #[serde(default = "default_application_id")]
    application_id: String,
    #[serde(default = "default_application_version")]
    application_version: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
fn default_application_id() -> String {
    APPLICATION_ID.to_string()
}
fn default_application_version() -> String {
    APPLICATION_VERSION.to_string()
}

#[derive(Debug, Deserialize)]
struct KeypadToml {
    name: String,
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
struct MqttToml {
    url: String,
    #[serde(default = "default_client_id")]
    client_id: String,
    #[serde(default = "default_subscribe_topic")]
    subscribe_topic: String,
    #[serde(default = "default_publish_topic")]
    publish_topic: String,
    #[serde(default = "default_snapshot_interval")]
    snapshot_interval_secs: u64,
}

fn default_client_id() -> String {
    "tc2-bridge".to_string()
}
fn default_subscribe_topic() -> String {
    "tc2/cmd".to_string()
}
fn default_publish_topic() -> String {
    "tc2".to_string()
}
fn default_snapshot_interval() -> u64 {
    60
}

fn load_config(path: &str) -> Result<Config> {
    let text = std::fs::read_to_string(path).context("Failed to read config file")?;
    let config: Config = toml::from_str(&text).context("Failed to parse config file")?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    let mut names = HashSet::new();
    for keypad in &config.keypads {
        if keypad.location.trim().is_empty() {
            anyhow::bail!(
                "Keypad {} must be associated with a location",
                keypad.name
            );
        }
        if !names.insert(keypad.name.as_str()) {
            anyhow::bail!("Duplicate keypad name: {}", keypad.name);
        }
    }
    url::Url::parse(&config.total_connect.endpoint).with_context(|| {
        format!(
            "Invalid Total Connect endpoint: {}",
            config.total_connect.endpoint
        )
    })?;
    if config.mqtt.snapshot_interval_secs == 0 {
        anyhow::bail!("mqtt.snapshot_interval_secs must be greater than 0");
    }
    if config.total_connect.username.is_empty() {
        warn!("No Total Connect username configured");
    }
    Ok(())
}

fn build_client_config(toml: &TotalConnectToml) -> ClientConfig {
    ClientConfig::builder()
        .username(&toml.username)
        .password(&toml.password)
        .endpoint(&toml.endpoint)
        .request_timeout_ms(toml.request_timeout_ms)
        .application_id(&toml.application_id)
        .application_version(&toml.application_version)
        .build()
}

fn build_keypads(config: &[KeypadToml]) -> Vec<Keypad> {
    config
        .iter()
        .map(|k| Keypad::new(&k.name, &k.location))
        .collect()
}

// ---------------------------------------------------------------------------
// MQTT JSON types
// ---------------------------------------------------------------------------

// Published messages share the {now, op, ...} flat structure

#[derive(Serialize)]
struct MqttSnapshot {
    now: u64,
    op: String,
    state: MqttSnapshotState,
}

#[derive(Serialize)]
struct MqttSnapshotState {
    keypads: Vec<MqttKeypadState>,
    locations: Vec<MqttLocation>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MqttKeypadState {
    name: String,
    location: String,
    status_code: Option<i64>,
    state: Option<&'static str>,
    state_display: Option<&'static str>,
    detail: Option<&'static str>,
    detail_display: Option<&'static str>,
    is_armed: Option<bool>,
    is_bypass: Option<bool>,
    last_status_update: Option<String>,
}

impl From<&Keypad> for MqttKeypadState {
    fn from(keypad: &Keypad) -> Self {
        let state = keypad.state.as_ref();
        Self {
            name: keypad.name.clone(),
            location: keypad.location_name.clone(),
            status_code: state.map(|s| s.status.code()),
            state: state.map(|s| s.state),
            state_display: state.map(|s| s.state_display),
            detail: state.map(|s| s.detail),
            detail_display: state.map(|s| s.detail_display),
            is_armed: state.map(|s| s.is_armed),
            is_bypass: state.map(|s| s.is_bypass),
            last_status_update: state.map(|s| s.last_status_update_str()),
        }
    }
}

#[derive(Serialize)]
struct MqttLocation {
    id: i64,
    name: String,
    devices: Vec<MqttDevice>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MqttDevice {
    id: i64,
    name: String,
    class_id: Option<i64>,
    security_panel: bool,
}

impl From<&Location> for MqttLocation {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id,
            name: location.name.clone(),
            devices: location
                .devices
                .iter()
                .map(|d| MqttDevice {
                    id: d.id,
                    name: d.name.clone(),
                    class_id: d.class_id,
                    security_panel: d.is_security_panel(),
                })
                .collect(),
        }
    }
}

// Keypad status: {now, op, keypad, changed}
#[derive(Serialize)]
struct MqttKeypadStatus {
    now: u64,
    op: String,
    keypad: MqttKeypadState,
    changed: bool,
}

// CMD_ACK response
#[derive(Serialize)]
struct MqttCmdAck {
    now: u64,
    op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    op_id: Option<String>,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// Inbound command (subscribed)
#[derive(Deserialize)]
struct MqttCommand {
    op: String,
    #[serde(default)]
    op_id: Option<String>,
    #[serde(default)]
    keypad: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

async fn publish_json(client: &AsyncClient, topic: &str, payload: &impl Serialize, retain: bool) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            if let Err(e) = client.publish(topic, QoS::AtLeastOnce, retain, json).await {
                error!("Failed to publish to {topic}: {e}");
            }
        }
        Err(e) => error!("Failed to serialize MQTT payload: {e}"),
    }
}

impl MqttCmdAck {
    /// An ack for a command, echoing its `op_id` when one was given.
    fn new(cmd: &MqttCommand, success: bool, src: Option<serde_json::Value>) -> Self {
        Self {
            now: now_epoch_ms(),
            op: "CMD_ACK".to_string(),
            op_id: cmd.op_id.clone(),
            success,
            src,
            data: None,
            error: None,
        }
    }

    fn with_data(mut self, data: Option<serde_json::Value>) -> Self {
        self.data = data;
        self
    }

    fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

fn build_snapshot(monitor: &Monitor) -> MqttSnapshot {
    MqttSnapshot {
        now: now_epoch_ms(),
        op: "SNAPSHOT".to_string(),
        state: MqttSnapshotState {
            keypads: monitor.keypads().iter().map(MqttKeypadState::from).collect(),
            locations: monitor
                .client()
                .locations()
                .iter()
                .map(MqttLocation::from)
                .collect(),
        },
    }
}

async fn publish_snapshot(client: &AsyncClient, topic: &str, monitor: &Monitor) {
    let snapshot = build_snapshot(monitor);
    publish_json(client, topic, &snapshot, true).await;
}

// ---------------------------------------------------------------------------
// Monitor event → MQTT
// ---------------------------------------------------------------------------

/// Silent readings (the initial one at startup) never report a change.
fn keypad_status_message(
    keypad: String,
    location: String,
    state: KeypadState,
    changed: bool,
    trigger_events: bool,
) -> MqttKeypadStatus {
    let mut tracked = Keypad::new(keypad, location);
    tracked.state = Some(state);
    MqttKeypadStatus {
        now: now_epoch_ms(),
        op: "KEYPAD_STATUS".to_string(),
        keypad: MqttKeypadState::from(&tracked),
        changed: changed && trigger_events,
    }
}

async fn handle_monitor_event(event: BridgeEvent, client: &AsyncClient, topic: &str) {
    match event {
        BridgeEvent::DetailsLoaded { locations } => {
            info!("Total Connect locations: {}", locations.join(", "));
        }

        BridgeEvent::KeypadUpdated {
            keypad,
            location,
            state,
            changed,
            trigger_events,
        } => {
            let msg = keypad_status_message(keypad, location, state, changed, trigger_events);
            publish_json(client, topic, &msg, false).await;
        }

        BridgeEvent::StatusUnavailable { keypad, status } => {
            warn!("Status of {keypad} could not be read ({status})");
        }
    }
}

// ---------------------------------------------------------------------------
// MQTT command handler
// ---------------------------------------------------------------------------

fn parse_action(op: &str) -> Option<KeypadAction> {
    match op {
        "DISARM" => Some(KeypadAction::Disarm),
        "ARM_AWAY" => Some(KeypadAction::ArmAway),
        "ARM_STAY" => Some(KeypadAction::ArmStay),
        "ARM_STAY_NIGHT" => Some(KeypadAction::ArmStayNight),
        "ARM_STAY_INSTANT" => Some(KeypadAction::ArmStayInstant),
        "ARM_AWAY_INSTANT" => Some(KeypadAction::ArmAwayInstant),
        "REFRESH" => Some(KeypadAction::RefreshStatus),
        _ => None,
    }
}

/// Run one keypad action and log the result. Returns success and an error
/// message for the ack.
async fn exec_keypad_action(
    monitor: &mut Monitor,
    action: KeypadAction,
    keypad: &str,
) -> (bool, Option<String>) {
    match monitor.perform(action, keypad).await {
        Ok(true) => {
            info!("{action:?} {keypad}: success");
            (true, None)
        }
        Ok(false) => {
            warn!("{action:?} {keypad}: Total Connect did not confirm the request");
            (false, Some("request not confirmed".to_string()))
        }
        Err(e) => {
            error!("{action:?} {keypad} failed: {e}");
            (false, Some(e.to_string()))
        }
    }
}

async fn handle_command(
    payload_str: &str,
    cmd: MqttCommand,
    client: &AsyncClient,
    topic: &str,
    monitor: &mut Monitor,
) {
    // Parse the raw payload as a JSON value for the CMD_ACK src field
    let src_json = serde_json::from_str::<serde_json::Value>(payload_str).ok();

    match (cmd.op.as_str(), parse_action(&cmd.op)) {
        ("SNAPSHOT", _) => {
            debug!("Command: SNAPSHOT");
            let snapshot = build_snapshot(monitor);
            let snapshot_value = serde_json::to_value(&snapshot).ok();
            publish_json(client, topic, &snapshot, true).await;
            let ack = MqttCmdAck::new(&cmd, true, src_json).with_data(snapshot_value);
            publish_json(client, topic, &ack, false).await;
        }

        ("PING", _) => {
            info!("Command: PING");
            publish_json(client, topic, &MqttCmdAck::new(&cmd, true, src_json), false).await;
        }

        // REFRESH without a keypad refreshes all of them
        ("REFRESH", Some(action)) if cmd.keypad.is_none() => {
            info!("Command: REFRESH all keypads");
            let names: Vec<String> = monitor.keypads().iter().map(|k| k.name.clone()).collect();
            let mut success = true;
            let mut last_error = None;
            for name in &names {
                let (ok, err) = exec_keypad_action(monitor, action, name).await;
                success &= ok;
                last_error = err.or(last_error);
            }
            let ack = MqttCmdAck::new(&cmd, success, src_json).with_error(last_error);
            publish_json(client, topic, &ack, false).await;
        }

        (op, Some(action)) => {
            let Some(keypad) = cmd.keypad.as_deref() else {
                warn!("{op}: missing keypad");
                let error = Some("missing keypad".to_string());
                let ack = MqttCmdAck::new(&cmd, false, src_json).with_error(error);
                publish_json(client, topic, &ack, false).await;
                return;
            };
            info!("Command: {op} keypad {keypad}");
            let (success, error) = exec_keypad_action(monitor, action, keypad).await;
            let ack = MqttCmdAck::new(&cmd, success, src_json).with_error(error);
            publish_json(client, topic, &ack, false).await;
        }

        (other, None) => {
            warn!("Unknown command: {other}");
            let error = Some(format!("unknown command: {other}"));
            let ack = MqttCmdAck::new(&cmd, false, src_json).with_error(error);
            publish_json(client, topic, &ack, false).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=total_connect_bridge=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    let (mut mqtt_host, mut mqtt_port) = parse_mqtt_url(&config.mqtt.url)?;

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        // Log in and read the initial keypad status
        let client_config = build_client_config(&config.total_connect);
        info!(
            "Connecting to Total Connect at {} as {}",
            client_config.endpoint, client_config.username
        );
        let tc_client = TotalConnectClient::connect(client_config)
            .await
            .context("Failed to create Total Connect client")?;
        let mut monitor = KeypadMonitor::new(
            tc_client,
            build_keypads(&config.keypads),
            config.total_connect.refresh_interval_minutes,
        );
        let event_rx = monitor.subscribe();
        if !monitor.start().await {
            warn!("Total Connect details not loaded; keypads will report errors until the next refresh");
        }
        let monitor = Arc::new(Mutex::new(monitor));

        let publish_topic = config.mqtt.publish_topic.clone();
        let subscribe_topic = config.mqtt.subscribe_topic.clone();

        // Set up MQTT
        let mut mqtt_opts = MqttOptions::new(&config.mqtt.client_id, &mqtt_host, mqtt_port);
        mqtt_opts.set_keep_alive(Duration::from_secs(30));
        let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 256);

        client
            .subscribe(&subscribe_topic, QoS::AtLeastOnce)
            .await
            .context("Failed to subscribe to MQTT topic")?;
        info!("MQTT: subscribed to {subscribe_topic}");

        {
            let monitor_lock = monitor.lock().await;
            publish_snapshot(&client, &publish_topic, &monitor_lock).await;
        }

        // Task 1: monitor event listener
        let client_events = client.clone();
        let topic_events = publish_topic.clone();
        let event_handle = tokio::spawn(async move {
            let mut rx = event_rx;
            loop {
                match rx.recv().await {
                    Ok(event) => handle_monitor_event(event, &client_events, &topic_events).await,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Event receiver lagged, missed {n} events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        info!("Event channel closed");
                        break;
                    }
                }
            }
        });

        // Task 2: MQTT event loop (receives messages, handles commands)
        let monitor_cmds = Arc::clone(&monitor);
        let client_cmds = client.clone();
        let topic_cmds = publish_topic.clone();
        let sub_topic = subscribe_topic.clone();
        let mqtt_handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        // rumqttc does not resubscribe after a broker reconnect
                        info!("MQTT: connected, subscribing to {sub_topic}");
                        if let Err(e) = client_cmds.subscribe(&sub_topic, QoS::AtLeastOnce).await
                        {
                            error!("Failed to subscribe to {sub_topic}: {e}");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) => {
                        if msg.topic == sub_topic {
                            let payload = String::from_utf8_lossy(&msg.payload);
                            match serde_json::from_str::<MqttCommand>(&payload) {
                                Ok(cmd) => {
                                    if cmd.op == "SNAPSHOT" {
                                        debug!("MQTT command received: {payload}");
                                    } else {
                                        info!("MQTT command received: {payload}");
                                    }
                                    let mut monitor_lock = monitor_cmds.lock().await;
                                    handle_command(
                                        &payload,
                                        cmd,
                                        &client_cmds,
                                        &topic_cmds,
                                        &mut monitor_lock,
                                    )
                                    .await;
                                }
                                Err(e) => {
                                    warn!("Failed to parse MQTT command: {e}");
                                }
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT event loop error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        // Task 3: poll loop (keep-alive and keypad refresh)
        let monitor_poll = Arc::clone(&monitor);
        let poll_handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(POLL_TICK_SECS));
            // The first tick fires immediately; start() has just polled
            ticker.tick().await;
            loop {
                ticker.tick().await;
                monitor_poll.lock().await.tick().await;
            }
        });

        // Task 4: snapshot timer
        let monitor_snap = Arc::clone(&monitor);
        let client_snap = client.clone();
        let topic_snap = publish_topic.clone();
        let snapshot_interval_secs = config.mqtt.snapshot_interval_secs;
        let snap_handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(snapshot_interval_secs));
            // Skip the first immediate tick (we already published an initial snapshot)
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let monitor_lock = monitor_snap.lock().await;
                publish_snapshot(&client_snap, &topic_snap, &monitor_lock).await;
            }
        });

        // Wait for a signal
        info!("MQTT bridge running. Send SIGHUP to reload, SIGINT/SIGTERM to stop.");
        let restart = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                false
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                false
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading config and restarting...");
                true
            }
        };

        event_handle.abort();
        mqtt_handle.abort();
        poll_handle.abort();
        snap_handle.abort();

        // Best effort: the server expires the session anyway
        if !monitor.lock().await.logout().await {
            warn!("Total Connect session was not logged out cleanly");
        }

        if !restart {
            break;
        }

        // Reload config from disk; keep previous config on failure
        info!("Reloading config from {}", cli.config);
        match load_config(&cli.config) {
            Ok(new_config) => match parse_mqtt_url(&new_config.mqtt.url) {
                Ok((new_host, new_port)) => {
                    mqtt_host = new_host;
                    mqtt_port = new_port;
                    config = new_config;
                    info!("Config reloaded successfully");
                }
                Err(e) => warn!("Invalid MQTT URL in new config, keeping previous: {e}"),
            },
            Err(e) => warn!("Failed to reload config, keeping previous: {e:#}"),
        }

        info!("Restarting...");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port_str) = stripped
        .rsplit_once(':')
        .context("MQTT URL must be in format mqtt://host:port")?;

    let port: u16 = port_str.parse().context("Invalid MQTT port number")?;

    Ok((host.to_string(), port))
}
