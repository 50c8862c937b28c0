//! Demo-Binary: fährt die Sitzung gegen das simulierte SDK hoch,
//! löst einen eingehenden Anruf aus und legt wieder auf.

use deskphone::sdk::SimulatedSdk;
use deskphone::token::StaticTokenProvider;
use deskphone::CallSessionController;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging initialisieren
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("deskphone=debug".parse()?),
        )
        .init();

    let sdk = Arc::new(SimulatedSdk::new());
    let tokens = Arc::new(StaticTokenProvider::from_env());
    let controller = CallSessionController::new(
        Arc::clone(&sdk) as Arc<dyn deskphone::sdk::CallingClient>,
        tokens,
    );

    // Events als JSON ausgeben, wie eine Oberfläche sie konsumieren würde
    let mut events = controller.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!("Failed to serialize event: {}", e),
            }
        }
    });

    controller.initialize().await?;

    // Eingehenden Anruf simulieren und automatisch annehmen lassen
    let call_id = sdk.ring();
    tracing::info!("Simulated incoming call {}", call_id);
    tokio::time::sleep(Duration::from_millis(100)).await;

    controller.hang_up().await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    Ok(())
}
