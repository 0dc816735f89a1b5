use url::Url;

/// One downloadable document discovered in the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLink {
    pub url: Url,
    pub title: String,
}

/// File name for the archive at `index` in collection order. Titles repeat
/// across facilities, so the numeric prefix is what keeps downloads from
/// overwriting each other; path separators in the title are flattened so the
/// file cannot land outside the destination folder.
pub fn archive_file_name(index: usize, title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            _ => c,
        })
        .collect();

    match cleaned.is_empty() {
        true => format!("{}_document", index),
        false => format!("{}_{}", index, cleaned),
    }
}
