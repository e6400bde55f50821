//! Example: Track a keypad, stay-arm its location, then disarm it.

use total_connect_bridge::{
    BridgeEvent, ClientConfig, Keypad, KeypadAction, KeypadMonitor, TotalConnectClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::builder()
        .username(std::env::var("TC2_USERNAME")?)
        .password(std::env::var("TC2_PASSWORD")?)
        .build();
    let location = std::env::var("TC2_LOCATION").unwrap_or_else(|_| "Home".to_string());

    let client = TotalConnectClient::connect(config).await?;
    let mut monitor = KeypadMonitor::new(client, vec![Keypad::new("Keypad", &location)], 5);

    let mut events = monitor.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let BridgeEvent::KeypadUpdated { keypad, state, changed, .. } = event {
                println!(
                    "{keypad}: {} ({}){}",
                    state.state_display,
                    state.detail_display,
                    if changed { " [changed]" } else { "" }
                );
            }
        }
    });

    monitor.start().await;

    println!("\nStay-arming {location}...");
    match monitor.perform(KeypadAction::ArmStay, "Keypad").await {
        Ok(true) => println!("Arm request accepted"),
        Ok(false) => println!("Arm request not confirmed"),
        Err(e) => println!("Error arming: {e}"),
    }

    // Let the panel settle, polling while it is still arming
    for _ in 0..4 {
        tokio::time::sleep(tokio::time::Duration::from_secs(15)).await;
        monitor.tick().await;
    }

    println!("\nDisarming {location}...");
    match monitor.perform(KeypadAction::Disarm, "Keypad").await {
        Ok(true) => println!("Disarm request accepted"),
        Ok(false) => println!("Disarm request not confirmed"),
        Err(e) => println!("Error disarming: {e}"),
    }

    monitor.logout().await;
    Ok(())
}
