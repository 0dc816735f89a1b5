use std::path::Path;

use env_logger::Env;
use webfire::{
    configuration::{get_configuration, Settings},
    domain::{
        document_link::DocumentLink,
        search_parameters::{load_search_parameters, SearchParameters},
    },
    services::{
        collect_document_links, download_documents, extract_archives, fill_search_form,
        prepare_destination, Droid, UNZIPPED_DIR,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let parameters =
        load_search_parameters(Path::new(&configuration.application.parameters_file))?;
    log::info!(
        "Searching reports from {} to {} under part {} subpart {} across {} result pages",
        parameters.portal_start_date(),
        parameters.portal_end_date(),
        parameters.cfr_part,
        parameters.cfr_subpart,
        parameters.page_count,
    );

    let destination = prepare_destination(Path::new(&configuration.application.output_root))?;

    let droid = Droid::new(&configuration.webdriver).await?;
    let scrape_result = scrape_document_links(&droid, &configuration, &parameters).await;
    let links = match scrape_result {
        Ok(links) => {
            droid.quit().await?;
            links
        }
        Err(error) => {
            if let Err(quit_error) = droid.quit().await {
                log::error!("Failed to close the browser session: {:?}", quit_error);
            }
            return Err(error);
        }
    };
    log::info!("Collected {} document links in total", links.len());

    let archives = download_documents(
        &links,
        &destination,
        configuration.downloads.request_timeout(),
    )
    .await?;
    log::info!(
        "Downloaded {} files into {}",
        archives.len(),
        destination.display()
    );

    let extracted = extract_archives(&destination)?;
    log::info!(
        "Extracted {} entries into {}",
        extracted,
        destination.join(UNZIPPED_DIR).display()
    );

    Ok(())
}

async fn scrape_document_links(
    droid: &Droid,
    configuration: &Settings,
    parameters: &SearchParameters,
) -> anyhow::Result<Vec<DocumentLink>> {
    droid.open(&configuration.application.search_url).await?;
    fill_search_form(droid, parameters).await?;
    collect_document_links(droid, parameters.page_count).await
}
