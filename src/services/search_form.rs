use thirtyfour::{components::SelectElement, error::WebDriverResult, By};

use crate::domain::search_parameters::SearchParameters;

use super::droid::Droid;

const DATE_PANEL_TAB: &str = "ui-id-3";
const REGULATION_PANEL_TAB: &str = "ui-id-7";
const START_DATE_INPUT: &str = "startdate";
const END_DATE_INPUT: &str = "enddate";
const PART_SELECT: &str = "CFRpart";
const SUBPART_SELECT: &str = "CFRSubpart";
const SUBMIT_BUTTON: &str = "Submit";

/// Fills out the report search form and submits it.
///
/// The portal reveals the date and regulation panels from an accordion, and
/// repopulates the subpart dropdown after a part is chosen; each transition
/// is awaited by polling for the element it reveals.
pub async fn fill_search_form(droid: &Droid, parameters: &SearchParameters) -> WebDriverResult<()> {
    let date_tab = droid.wait_for(By::Id(DATE_PANEL_TAB)).first().await?;
    date_tab.click().await?;

    let start_date = droid.wait_for(By::Name(START_DATE_INPUT)).first().await?;
    droid.wait_displayed(&start_date).await?;
    start_date.send_keys(parameters.portal_start_date()).await?;

    let end_date = droid.driver.find(By::Name(END_DATE_INPUT)).await?;
    end_date.send_keys(parameters.portal_end_date()).await?;

    let regulation_tab = droid.wait_for(By::Id(REGULATION_PANEL_TAB)).first().await?;
    regulation_tab.click().await?;

    let part = droid.wait_for(By::Id(PART_SELECT)).first().await?;
    droid.wait_displayed(&part).await?;
    SelectElement::new(&part)
        .await?
        .select_by_value(&parameters.cfr_part)
        .await?;

    // Choosing a part reloads the subpart options; wait for ours to show up.
    let subpart_option = format!(
        r#"select#{} option[value="{}"]"#,
        SUBPART_SELECT, parameters.cfr_subpart
    );
    droid.wait_for(By::Css(subpart_option)).first().await?;

    let subpart = droid.driver.find(By::Id(SUBPART_SELECT)).await?;
    SelectElement::new(&subpart)
        .await?
        .select_by_value(&parameters.cfr_subpart)
        .await?;

    droid.driver.find(By::Id(SUBMIT_BUTTON)).await?.click().await?;

    log::info!(
        "Submitted search for 40 CFR part {} subpart {}, {} to {}",
        parameters.cfr_part,
        parameters.cfr_subpart,
        parameters.portal_start_date(),
        parameters.portal_end_date()
    );

    Ok(())
}
