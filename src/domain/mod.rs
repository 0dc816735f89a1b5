pub mod document_link;
pub mod search_parameters;
