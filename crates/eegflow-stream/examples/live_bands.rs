//! Stream synthetic alpha-dominant EEG and print live band powers.
//!
//! Run with: cargo run --example live_bands

use eegflow_core::{PipelineFrame, PipelineMode, PipelineSettings};
use eegflow_simulation::{GeneratorConfig, SourceConfig, WaveformPattern};
use eegflow_stream::{
    DiskSink, RecordingLimit, RecordingSession, ServiceCommand, StreamService,
};
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = PipelineSettings {
        duration: 1024,
        interval: 256,
        bins: 256,
        srate: 256.0,
        channel_count: 4,
        ..Default::default()
    };
    let source = SourceConfig {
        update_rate: 20.0,
        generator: GeneratorConfig {
            pattern: WaveformPattern::Mixed {
                components: vec![(10.0, 20.0), (6.0, 8.0), (20.0, 4.0)],
            },
            noise_std: 2.0,
            seed: Some(1),
            ..Default::default()
        },
        ..Default::default()
    };

    let sink = Box::new(DiskSink::new("recordings"));
    let mut service =
        StreamService::connect(source, settings, PipelineMode::BandPower, sink).await?;
    let mut frames = service.subscribe_frames();
    let control = service.control_handle();

    tokio::spawn(async move {
        if let Err(e) = service.run().await {
            tracing::error!(error = %e, "service stopped");
        }
    });

    tokio::spawn(async move {
        while let Ok(frame) = frames.recv().await {
            if let PipelineFrame::Bands(bands) = &*frame {
                for (channel, powers) in bands.channels.iter().enumerate() {
                    println!(
                        "ch{} | delta {:7.2} theta {:7.2} alpha {:7.2} beta {:7.2} gamma {:7.2}",
                        channel, powers.delta, powers.theta, powers.alpha, powers.beta, powers.gamma
                    );
                }
                println!();
            }
        }
    });

    control
        .send(ServiceCommand::StartRecording(RecordingSession::new(
            "Bands",
            "RestingMix",
            RecordingLimit::Seconds(15.0),
        )))
        .await?;

    sleep(Duration::from_secs(20)).await;
    control.send(ServiceCommand::StopRecording).await?;
    control.send(ServiceCommand::Shutdown).await?;
    Ok(())
}
