//! Example: Log in to Total Connect and print every location's panel status.

use total_connect_bridge::{ClientConfig, TotalConnectClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::builder()
        .username(std::env::var("TC2_USERNAME")?)
        .password(std::env::var("TC2_PASSWORD")?)
        .build();

    println!("Logging in to Total Connect...");
    let mut client = TotalConnectClient::connect(config).await?;
    if !client.populate_details().await {
        anyhow::bail!("could not load location details");
    }

    let names: Vec<String> = client
        .location_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    println!("\n--- Locations ({}) ---", names.len());
    for location in client.locations() {
        println!("  {:6} {}", location.id, location.name);
        for device in &location.devices {
            println!(
                "         device {:6}: {:20} class={:?}{}",
                device.id,
                device.name,
                device.class_id,
                if device.is_security_panel() { " (panel)" } else { "" },
            );
        }
    }

    println!("\n--- Status ---");
    for name in &names {
        let status = client.get_armed_status(Some(name.as_str())).await?;
        println!(
            "  {:20} {:12} {} armed={:?} bypass={:?}",
            name,
            status.type_display_string().unwrap_or("?"),
            status,
            status.is_armed(),
            status.is_bypass(),
        );
    }

    client.logout().await;
    Ok(())
}
