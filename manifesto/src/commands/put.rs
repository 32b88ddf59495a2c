use crate::context::{AppContext, VerbosityLevel};
use crate::format;
use libmanifesto::Manifesto;
use std::path::Path;

/// Store the contents of `file` as the `metadata_type` blob of `image`
///
/// Returns the name of the image the metadata was attached to.
pub fn put_metadata(
    manifesto: &Manifesto,
    image: &str,
    metadata_type: &str,
    file: &Path,
) -> Result<String, String> {
    manifesto
        .put(image, metadata_type, file)
        .map_err(|e| e.to_string())
}

/// Handle the put subcommand
pub fn handle_put(ctx: &AppContext, image: &str, metadata_type: &str, file: &Path) {
    let manifesto = match super::open_manifesto(ctx) {
        Ok(manifesto) => manifesto,
        Err(e) => super::fail(ctx, &e),
    };

    format::print(
        ctx,
        VerbosityLevel::Verbose,
        &format!(
            "Adding/Updating '{}' metadata in manifesto for '{}'",
            metadata_type, image
        ),
    );

    let formatter = format::create_formatter(ctx);
    let spinner = formatter.spinner(&format!("Storing '{}' metadata...", metadata_type));
    let result = put_metadata(&manifesto, image, metadata_type, file);
    spinner.finish_and_clear();

    match result {
        Ok(name) => formatter.success(&format!(
            "Metadata '{}' for image '{}' stored",
            metadata_type, name
        )),
        Err(e) => super::fail(ctx, &e),
    }
}

#[cfg(test)]
#[path = "put_tests.rs"]
mod tests;
