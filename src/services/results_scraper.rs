use std::time::Instant;

use anyhow::{bail, Context, Result};
use scraper::{Html, Selector};
use thirtyfour::By;
use url::Url;

use crate::domain::document_link::DocumentLink;

use super::droid::Droid;

const RESULTS_TABLE: &str = "myDocTable";
const NEXT_PAGE_BUTTON: &str = "myDocTable_next";

/// Walks the paginated results, harvesting each page and then advancing to
/// the next until `page_count` pages have been read. There is no
/// end-of-results detection; a `page_count` past the real last page leaves
/// the final page in place and the advance wait below errors out.
pub async fn collect_document_links(droid: &Droid, page_count: u32) -> Result<Vec<DocumentLink>> {
    let mut links: Vec<DocumentLink> = vec![];

    for page_number in 1..=page_count {
        droid
            .wait_for(By::Id(RESULTS_TABLE))
            .first()
            .await
            .with_context(|| format!("Results table never appeared on page {}", page_number))?;

        let page_url = droid.driver.current_url().await?;
        let page_source = droid.driver.source().await?;

        let page_links = harvest_results_page(&page_source, &page_url);
        log::info!(
            "Found {} document links on results page {}",
            page_links.len(),
            page_number
        );
        links.extend(page_links);

        if page_number < page_count {
            let signature = results_table_signature(&page_source);
            advance_to_next_page(droid, page_number, signature).await?;
        }
    }

    Ok(links)
}

/// Clicks the next-page control, then polls until the results table has
/// repainted with content differing from the page just harvested. The
/// table element never leaves the DOM between pages, so presence alone
/// cannot tell one page from the next. A click that changes nothing
/// within the timeout means the portal had no further page to show.
async fn advance_to_next_page(
    droid: &Droid,
    page_number: u32,
    previous: Option<String>,
) -> Result<()> {
    let next_button = droid
        .wait_for(By::Id(NEXT_PAGE_BUTTON))
        .first()
        .await
        .with_context(|| format!("No next-page control after page {}", page_number))?;
    next_button.click().await?;

    let deadline = Instant::now() + droid.wait_timeout();

    loop {
        let page_source = droid.driver.source().await?;
        let signature = results_table_signature(&page_source);
        if signature.is_some() && signature != previous {
            return Ok(());
        }

        if Instant::now() >= deadline {
            bail!("Results did not advance past page {}", page_number);
        }

        tokio::time::sleep(droid.poll_interval()).await;
    }
}

/// The results table's rendered HTML. Changes outside the table (banners,
/// timestamps) do not count as a page change.
fn results_table_signature(page_source: &str) -> Option<String> {
    let table_selector = Selector::parse(&format!("table#{}", RESULTS_TABLE)).unwrap();

    Html::parse_document(page_source)
        .select(&table_selector)
        .next()
        .map(|table| table.html())
}

/// Reads every anchor in the results table, in row order, as a download
/// link. Relative hrefs are resolved against the page URL; an anchor with
/// no href has nothing to download and is skipped. A missing title falls
/// back to the anchor text.
pub fn harvest_results_page(page_source: &str, page_url: &Url) -> Vec<DocumentLink> {
    let table_selector = Selector::parse(&format!("table#{}", RESULTS_TABLE)).unwrap();
    let a_tag_selector = Selector::parse("a").unwrap();

    let html_document = Html::parse_document(page_source);
    let mut links = vec![];

    let Some(table) = html_document.select(&table_selector).next() else {
        return links;
    };

    for a_tag in table.select(&a_tag_selector) {
        let Some(href) = a_tag.value().attr("href") else {
            log::warn!("Skipping a results-table anchor without an href");
            continue;
        };

        let url = match page_url.join(href) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Skipping unparsable document link {:?}: {:?}", href, e);
                continue;
            }
        };

        let title = match a_tag.value().attr("title") {
            Some(title) => title.to_string(),
            None => a_tag.text().collect::<String>().trim().to_string(),
        };

        links.push(DocumentLink { url, title });
    }

    links
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::{harvest_results_page, results_table_signature};

    const SEARCH_URL: &str = "https://cfpub.epa.gov/webfire/reports/esearch2.cfm";

    fn page_url() -> Url {
        Url::parse(SEARCH_URL).unwrap()
    }

    fn results_page(rows: &[(&str, &str)]) -> String {
        let rows: String = rows
            .iter()
            .map(|(href, title)| {
                format!(
                    r#"<tr><td>Facility</td><td><a href="{}" title="{}">ZIP</a></td></tr>"#,
                    href, title
                )
            })
            .collect();

        format!(
            r#"<html><body>
            <table id="myDocTable"><tbody>{}</tbody></table>
            <div id="myDocTable_next">Next</div>
            </body></html>"#,
            rows
        )
    }

    #[test]
    fn harvests_links_and_titles_in_row_order() {
        let page = results_page(&[
            (
                "https://cfpub.epa.gov/webfire/getreport.cfm?id=101",
                "Boiler MACT Compliance Report.zip",
            ),
            (
                "https://cfpub.epa.gov/webfire/getreport.cfm?id=102",
                "Benzene Waste NESHAP Report.zip",
            ),
        ]);

        let links = harvest_results_page(&page, &page_url());

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "Boiler MACT Compliance Report.zip");
        assert_eq!(
            links[0].url.as_str(),
            "https://cfpub.epa.gov/webfire/getreport.cfm?id=101"
        );
        assert_eq!(links[1].title, "Benzene Waste NESHAP Report.zip");
    }

    #[test]
    fn relative_hrefs_resolve_against_the_page_url() {
        let page = results_page(&[("getreport.cfm?id=7", "Subpart FF Report.zip")]);

        let links = harvest_results_page(&page, &page_url());

        assert_eq!(
            links[0].url.as_str(),
            "https://cfpub.epa.gov/webfire/reports/getreport.cfm?id=7"
        );
    }

    #[test]
    fn anchors_outside_the_results_table_are_ignored() {
        let page = r#"<html><body>
            <a href="https://www.epa.gov/" title="EPA Home">home</a>
            <table id="myDocTable"><tbody>
            <tr><td><a href="getreport.cfm?id=1" title="Report.zip">ZIP</a></td></tr>
            </tbody></table>
            </body></html>"#;

        let links = harvest_results_page(page, &page_url());

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title, "Report.zip");
    }

    #[test]
    fn anchor_without_href_is_skipped_and_missing_title_uses_text() {
        let page = r#"<html><body>
            <table id="myDocTable"><tbody>
            <tr><td><a title="No link here">pending</a></td></tr>
            <tr><td><a href="getreport.cfm?id=2">Flare Report.zip</a></td></tr>
            </tbody></table>
            </body></html>"#;

        let links = harvest_results_page(page, &page_url());

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title, "Flare Report.zip");
    }

    #[test]
    fn page_without_a_results_table_yields_nothing() {
        let page = "<html><body><p>No documents matched your search.</p></body></html>";

        assert!(harvest_results_page(page, &page_url()).is_empty());
    }

    #[test]
    fn harvest_over_several_pages_accumulates_in_page_order() {
        let pages = [
            results_page(&[
                ("getreport.cfm?id=1", "First.zip"),
                ("getreport.cfm?id=2", "Second.zip"),
            ]),
            results_page(&[("getreport.cfm?id=3", "Third.zip")]),
            results_page(&[("getreport.cfm?id=4", "Fourth.zip")]),
        ];

        let mut links = vec![];
        for page in &pages {
            links.extend(harvest_results_page(page, &page_url()));
        }

        let titles: Vec<&str> = links.iter().map(|link| link.title.as_str()).collect();
        assert_eq!(titles, ["First.zip", "Second.zip", "Third.zip", "Fourth.zip"]);
    }

    #[test]
    fn table_signature_changes_only_when_the_rows_change() {
        let page_one = results_page(&[("getreport.cfm?id=1", "First.zip")]);
        let page_two = results_page(&[("getreport.cfm?id=2", "Second.zip")]);

        let signature = results_table_signature(&page_one).unwrap();

        assert_eq!(results_table_signature(&page_one).unwrap(), signature);
        assert_ne!(results_table_signature(&page_two).unwrap(), signature);
    }

    #[test]
    fn table_signature_ignores_changes_outside_the_table() {
        let table = r#"<table id="myDocTable"><tbody>
            <tr><td><a href="getreport.cfm?id=1" title="Report.zip">ZIP</a></td></tr>
            </tbody></table>"#;
        let before = format!("<html><body><p>Queried at 10:01</p>{}</body></html>", table);
        let after = format!("<html><body><p>Queried at 10:02</p>{}</body></html>", table);

        assert_eq!(
            results_table_signature(&before).unwrap(),
            results_table_signature(&after).unwrap()
        );
    }

    #[test]
    fn page_without_a_results_table_has_no_signature() {
        let page = "<html><body><p>Loading...</p></body></html>";

        assert!(results_table_signature(page).is_none());
    }
}
