use healthdesk::{
    configuration::get_configuration,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration()?;

    let (subscriber, tracer_provider) =
        get_subscriber(&configuration.telemetry, std::io::stdout)?;
    init_subscriber(subscriber)?;

    let application = Application::build(configuration).await?;
    let outcome = application.run_until_stopped().await;

    if tracer_provider.is_some() {
        opentelemetry::global::shutdown_tracer_provider();
    }
    outcome?;
    Ok(())
}
