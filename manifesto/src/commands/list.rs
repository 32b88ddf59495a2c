use crate::context::AppContext;
use crate::format::{self, Formattable, OutputFormat};
use libmanifesto::Manifesto;
use serde::Serialize;

/// Metadata types stored for one image
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MetadataList {
    pub image: String,
    pub metadata: Vec<String>,
}

impl Formattable for MetadataList {
    fn format_pretty(&self) -> String {
        if self.metadata.is_empty() {
            return format!("No metadata stored for image '{}'", self.image);
        }

        let mut output = format!("Metadata types stored for image '{}':", self.image);
        for metadata_type in &self.metadata {
            output.push_str(&format!("\n    {}", metadata_type));
        }
        output
    }
}

/// List the metadata types stored for `image`
pub fn list_metadata(manifesto: &Manifesto, image: &str) -> Result<MetadataList, String> {
    let (metadata, image) = manifesto.list(image).map_err(|e| e.to_string())?;
    Ok(MetadataList { image, metadata })
}

/// Handle the list subcommand
pub fn handle_list(ctx: &AppContext, image: &str, format: OutputFormat) {
    let manifesto = match super::open_manifesto(ctx) {
        Ok(manifesto) => manifesto,
        Err(e) => super::fail(ctx, &e),
    };

    let spinner = format::create_formatter(ctx).spinner("Fetching metadata index...");
    let result = list_metadata(&manifesto, image);
    spinner.finish_and_clear();

    match result.and_then(|list| format::format_output(&list, format)) {
        Ok(output) => println!("{}", output),
        Err(e) => super::fail(ctx, &e),
    }
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
